mod settings;

pub use settings::{LlmConfig, LoggingConfig, PromptsConfig, SessionConfig, Settings, SETTINGS_FILE};
