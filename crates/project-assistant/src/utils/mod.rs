pub mod error;
pub mod text;

pub use error::{looks_like_failure, GenerationError};
