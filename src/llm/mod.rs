use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::actions::{parse_actions, Action};
use crate::context::{PromptTurn, TicketTurn};

pub mod backend;

pub use backend::HttpReasoningBackend;

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("API request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("API responded with status: {status}, body: {body}")]
    Status { status: u16, body: String },
    #[error("API request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("API response could not be decoded: {0}")]
    Decode(String),
}

/// Body of `POST /api/v1/user-message`.
#[derive(Debug, Clone, Serialize)]
pub struct UserMessageBody {
    pub messages: Vec<TicketTurn>,
}

/// Body of `POST /api/v1/manager-prompt`.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerPromptBody {
    pub prompt_id: Uuid,
    pub conversation_id: Uuid,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
    pub chat_history: Vec<PromptTurn>,
}

/// Raw reply as sent by the backend.
#[derive(Debug, Deserialize)]
pub struct ReplyPayload {
    pub response: String,
    #[serde(default)]
    pub actions: Option<Value>,
    #[serde(default)]
    pub escalate: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub text: String,
    pub actions: Vec<Action>,
    pub escalate: bool,
}

impl From<ReplyPayload> for BackendReply {
    fn from(payload: ReplyPayload) -> Self {
        Self {
            text: payload.response,
            actions: parse_actions(payload.actions),
            escalate: payload.escalate.as_ref().is_some_and(is_truthy),
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// The external service that decides what to say and do next. One call per
/// request, no retries; the caller decides what a failure means.
#[async_trait]
pub trait ReasoningBackend: Send + Sync {
    async fn user_message(&self, body: &UserMessageBody) -> Result<BackendReply, BackendError>;

    async fn manager_prompt(&self, body: &ManagerPromptBody)
        -> Result<BackendReply, BackendError>;
}
