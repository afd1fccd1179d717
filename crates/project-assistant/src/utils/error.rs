use thiserror::Error;

/// Failure reported by a text-generation backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upstream error: {status} - {body}")]
    Upstream { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Empty response from text generator")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl GenerationError {
    /// Stable short code for logs and activity records
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "unauthorized",
            Self::Upstream { .. } => "upstream",
            Self::Transport(_) => "transport",
            Self::EmptyResponse => "empty_response",
            Self::Malformed(_) => "malformed",
        }
    }
}

const FAILURE_PHRASES: &[&str] = &[
    "unauthorized",
    "error processing",
    "authentication error",
    "could not connect",
    "unexpected error",
    "401",
];

/// True when a successful generation still reads like a failure message.
///
/// Some providers report errors in-band as ordinary text; blank text counts too.
pub fn looks_like_failure(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.trim().is_empty() || FAILURE_PHRASES.iter().any(|phrase| lower.contains(phrase))
}
