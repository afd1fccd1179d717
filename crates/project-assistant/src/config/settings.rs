use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::logging::LoggerConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub llm: LlmConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub prompts: PromptsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_max_tokens() -> usize {
    3000
}

fn default_temperature() -> f32 {
    0.7
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    /// Seconds an exited session stays readable before the sweeper drops it
    pub eviction_delay_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            eviction_delay_seconds: 30,
            sweep_interval_seconds: 5,
        }
    }
}

impl SessionConfig {
    pub fn eviction_delay(&self) -> Duration {
        Duration::from_secs(self.eviction_delay_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub queue_capacity: usize,
    pub batch_size: usize,
    pub batch_timeout_ms: u64,
    pub worker_count: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let defaults = LoggerConfig::default();
        Self {
            queue_capacity: defaults.queue_capacity,
            batch_size: defaults.batch_size,
            batch_timeout_ms: defaults.batch_timeout_ms,
            worker_count: defaults.worker_count,
        }
    }
}

impl From<&LoggingConfig> for LoggerConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            queue_capacity: config.queue_capacity,
            batch_size: config.batch_size,
            batch_timeout_ms: config.batch_timeout_ms,
            worker_count: config.worker_count,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PromptsConfig {
    /// Template for option 1; `{{IDEA}}` is replaced with the user's idea
    pub project_idea_prompt: String,
}

/// Settings file read by [`Settings::load`]
pub const SETTINGS_FILE: &str = "config/settings.toml";

impl Settings {
    pub fn load() -> Result<Self> {
        Self::load_from(SETTINGS_FILE)
    }

    /// Read `path`, then apply `APP__`-prefixed environment overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::from(path.as_ref()).required(true))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const SAMPLE: &str = r#"
        [llm]
        base_url = "http://localhost:8080"
        model = "local-model"
        timeout_seconds = 60

        [session]
        eviction_delay_seconds = 10
        sweep_interval_seconds = 0

        [prompts]
        project_idea_prompt = "Idea: {{IDEA}}"
    "#;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(SAMPLE, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.llm.max_tokens, 3000);
        assert!(settings.llm.api_key.is_none());
        assert_eq!(settings.session.eviction_delay(), Duration::from_secs(10));
        assert_eq!(settings.session.sweep_interval(), Duration::from_secs(1));
        assert_eq!(settings.logging.batch_size, LoggerConfig::default().batch_size);
    }

    #[test]
    fn test_load_from_reads_named_file() {
        let path = std::env::temp_dir().join(format!(
            "project-assistant-settings-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, SAMPLE).unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.llm.model, "local-model");
        assert_eq!(settings.prompts.project_idea_prompt, "Idea: {{IDEA}}");
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn test_shipped_settings_file_loads() {
        let workspace = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
        let settings = Settings::load_from(workspace.join(SETTINGS_FILE)).unwrap();

        assert_eq!(settings.llm.max_tokens, 3000);
        assert_eq!(settings.session.eviction_delay_seconds, 30);
        assert!(settings.prompts.project_idea_prompt.contains("{{IDEA}}"));
    }
}
