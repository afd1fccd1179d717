use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::LlmConfig;
use crate::services::menu::TextGenerator;
use crate::utils::error::GenerationError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: usize,
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/v1/chat/completions` endpoint
#[derive(Clone)]
pub struct LlmService {
    client: Client,
    config: LlmConfig,
}

impl LlmService {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Generate completion without streaming (wait for full response)
    pub async fn generate_chat(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: usize,
    ) -> Result<String, GenerationError> {
        debug!("Starting chat generation with {} messages", messages.len());

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens,
            temperature: self.config.temperature,
            stream: false,
        };

        let mut builder = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = self.config.api_key.as_deref().filter(|key| !key.is_empty()) {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GenerationError::Transport(format!("Failed to call LLM API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(format!("Failed to parse LLM response: {}", e)))?;

        extract_content(chat_response)
    }
}

fn classify_status(status: StatusCode, body: String) -> GenerationError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GenerationError::Unauthorized(body),
        _ => GenerationError::Upstream {
            status: status.as_u16(),
            body,
        },
    }
}

fn extract_content(response: ChatCompletionResponse) -> Result<String, GenerationError> {
    let content = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Malformed("No choices returned from LLM".to_string()))?
        .message
        .content
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(content)
}

#[async_trait::async_trait]
impl TextGenerator for LlmService {
    async fn generate(&self, prompt: &str, max_tokens: usize) -> Result<String, GenerationError> {
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }];
        self.generate_chat(messages, max_tokens).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ChatCompletionResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_extract_content() {
        let ok = parse(r#"{"choices":[{"message":{"role":"assistant","content":"1. Plan"}}]}"#);
        assert_eq!(extract_content(ok).unwrap(), "1. Plan");

        let empty = parse(r#"{"choices":[{"message":{"content":"  "}}]}"#);
        assert_eq!(extract_content(empty), Err(GenerationError::EmptyResponse));

        let none = parse(r#"{"choices":[]}"#);
        assert_eq!(extract_content(none).unwrap_err().reason_code(), "malformed");
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(
            classify_status(StatusCode::UNAUTHORIZED, "bad key".into()).reason_code(),
            "unauthorized"
        );
        assert_eq!(
            classify_status(StatusCode::BAD_GATEWAY, "down".into()),
            GenerationError::Upstream {
                status: 502,
                body: "down".into()
            }
        );
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let service = LlmService::new(LlmConfig {
            base_url: "http://localhost:8080/".to_string(),
            api_key: None,
            model: "m".to_string(),
            timeout_seconds: 5,
            max_tokens: 100,
            temperature: 0.2,
        })
        .unwrap();
        assert_eq!(service.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
