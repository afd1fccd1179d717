use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Activity type categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    RequestReceived,
    SessionCreated,
    ProjectCreated,
    ProjectReplaced,
    TaskAdded,
    TaskCompleted,
    GenerationFailed,
    PersistenceFailed,
    SessionEnded,
    SessionEvicted,
}

impl ActivityType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::RequestReceived => "request_received",
            Self::SessionCreated => "session_created",
            Self::ProjectCreated => "project_created",
            Self::ProjectReplaced => "project_replaced",
            Self::TaskAdded => "task_added",
            Self::TaskCompleted => "task_completed",
            Self::GenerationFailed => "generation_failed",
            Self::PersistenceFailed => "persistence_failed",
            Self::SessionEnded => "session_ended",
            Self::SessionEvicted => "session_evicted",
        }
    }
}

/// Activity status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Error,
    Warning,
    Info,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

/// One activity record, flushed in batches by the logger workers
#[derive(Debug, Clone)]
pub struct ActivityLog {
    pub session_id: String,
    pub user_id: Option<i64>,

    pub activity_type: ActivityType,
    pub activity_status: ActivityStatus,

    pub message_content: Option<String>,
    pub processing_time_ms: Option<i64>,

    pub error_message: Option<String>,
    pub error_type: Option<String>,

    pub created_at: DateTime<Utc>,

    pub custom_fields: Option<HashMap<String, Value>>,
}

impl ActivityLog {
    /// Create builder for fluent API
    pub fn builder(session_id: impl Into<String>, activity_type: ActivityType) -> ActivityLogBuilder {
        ActivityLogBuilder::new(session_id, activity_type)
    }

    /// Flatten custom fields into one JSON object for structured output
    pub fn custom_json(&self) -> Value {
        match &self.custom_fields {
            Some(fields) => Value::Object(fields.clone().into_iter().collect()),
            None => Value::Null,
        }
    }
}

/// Builder pattern for ActivityLog
pub struct ActivityLogBuilder {
    log: ActivityLog,
}

impl ActivityLogBuilder {
    pub fn new(session_id: impl Into<String>, activity_type: ActivityType) -> Self {
        Self {
            log: ActivityLog {
                session_id: session_id.into(),
                user_id: None,
                activity_type,
                activity_status: ActivityStatus::Success,
                message_content: None,
                processing_time_ms: None,
                error_message: None,
                error_type: None,
                created_at: Utc::now(),
                custom_fields: None,
            },
        }
    }

    pub fn user_id(mut self, user_id: Option<i64>) -> Self {
        self.log.user_id = user_id;
        self
    }

    pub fn status(mut self, status: ActivityStatus) -> Self {
        self.log.activity_status = status;
        self
    }

    pub fn message(mut self, content: impl Into<String>) -> Self {
        self.log.message_content = Some(content.into());
        self
    }

    pub fn processing_time(mut self, ms: i64) -> Self {
        self.log.processing_time_ms = Some(ms);
        self
    }

    pub fn error(mut self, message: impl Into<String>, error_type: impl Into<String>) -> Self {
        self.log.error_message = Some(message.into());
        self.log.error_type = Some(error_type.into());
        self.log.activity_status = ActivityStatus::Error;
        self
    }

    /// Add custom key-value data
    pub fn custom(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.log
            .custom_fields
            .get_or_insert_with(HashMap::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn build(self) -> ActivityLog {
        self.log
    }
}
