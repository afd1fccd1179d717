pub mod llm_service;
pub mod menu;

pub use llm_service::LlmService;
pub use menu::MenuManager;
