//! Menu-driven project assistant: sessions, the menu engine and its collaborators.

mod extraction;
mod manager;
mod project_index;
mod store;
mod types;

pub use extraction::{derive_name_from_idea, extract_project_name, extract_tasks};
pub use manager::{MenuManager, ProjectStore, TextGenerator};
pub use project_index::ProjectIndex;
pub use store::{spawn_sweeper, InMemorySessionStore, SessionHandle, SessionStore};
pub use types::{Completion, Progress, SessionId, SessionPhase, SessionSnapshot, SessionState};
