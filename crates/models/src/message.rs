use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;

/// Direct message between two users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessage {
    pub receiver_id: Uuid,
    pub message: String,
}

impl SendMessage {
    pub fn new(receiver_id: Uuid, message: &str) -> Result<Self, ModelError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ModelError::Validation("message must not be empty".into()));
        }
        Ok(Self { receiver_id, message: message.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_message_trims_and_rejects_blank() {
        let to = Uuid::new_v4();
        assert_eq!(SendMessage::new(to, "  hi  ").unwrap().message, "hi");
        assert!(SendMessage::new(to, "   ").is_err());
    }
}
