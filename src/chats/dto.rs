use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Chat;

#[derive(Debug, Default, Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
    /// Optional background text handed to the responder.
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub response: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ChatItem {
    pub id: Uuid,
    pub message: String,
    pub response: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl From<Chat> for ChatItem {
    fn from(c: Chat) -> Self {
        Self {
            id: c.id,
            message: c.message,
            response: c.response,
            timestamp: c.timestamp,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatHistory {
    pub chats: Vec<ChatItem>,
}
