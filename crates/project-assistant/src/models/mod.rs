pub mod menu;

pub use menu::{MenuOption, MenuReply, MenuResponse};
