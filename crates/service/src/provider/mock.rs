use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use models::message::SendMessage;
use models::{ChatMessage, StreakStats};
use uuid::Uuid;

use super::DataProvider;
use crate::errors::ServiceError;

/// Sample data for offline development and demos.
///
/// Conversations are kept in memory, so sent messages show up on the next
/// fetch just as they would against the live API.
pub struct MockDataProvider {
    me: Uuid,
    conversations: Mutex<HashMap<Uuid, Vec<ChatMessage>>>,
}

impl Default for MockDataProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDataProvider {
    pub fn new() -> Self {
        Self { me: Uuid::new_v4(), conversations: Mutex::new(HashMap::new()) }
    }

    fn seed(&self, other: Uuid) -> Vec<ChatMessage> {
        let now = Utc::now();
        vec![
            ChatMessage {
                id: Uuid::new_v4(),
                sender_id: other,
                receiver_id: self.me,
                message: "Hey! Did you try today's graph problem?".into(),
                is_read: true,
                created_at: now - Duration::minutes(12),
            },
            ChatMessage {
                id: Uuid::new_v4(),
                sender_id: self.me,
                receiver_id: other,
                message: "Yes, BFS did the trick.".into(),
                is_read: true,
                created_at: now - Duration::minutes(10),
            },
        ]
    }
}

#[async_trait]
impl DataProvider for MockDataProvider {
    async fn streak_stats(&self) -> Result<StreakStats, ServiceError> {
        Ok(StreakStats {
            current_streak: 5,
            longest_streak: 12,
            last_active: Utc::now(),
            streak_percentage: 36.7,
            problems_solved_today: 2,
            weekly_activity: vec![false, false, true, true, true, true, true],
        })
    }

    async fn messages_with(&self, user_id: Uuid) -> Result<Vec<ChatMessage>, ServiceError> {
        let mut conversations = self.conversations.lock().unwrap_or_else(PoisonError::into_inner);
        let thread = conversations.entry(user_id).or_insert_with(|| self.seed(user_id));
        Ok(thread.clone())
    }

    async fn send_message(&self, receiver_id: Uuid, text: &str) -> Result<ChatMessage, ServiceError> {
        let body = SendMessage::new(receiver_id, text)?;
        let message = ChatMessage {
            id: Uuid::new_v4(),
            sender_id: self.me,
            receiver_id,
            message: body.message,
            is_read: false,
            created_at: Utc::now(),
        };
        let mut conversations = self.conversations.lock().unwrap_or_else(PoisonError::into_inner);
        conversations.entry(receiver_id).or_insert_with(|| self.seed(receiver_id)).push(message.clone());
        Ok(message)
    }
}
