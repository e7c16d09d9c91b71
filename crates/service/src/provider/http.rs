use async_trait::async_trait;
use models::message::SendMessage;
use models::{ChatMessage, StreakStats};
use tracing::instrument;
use uuid::Uuid;

use super::DataProvider;
use crate::errors::ServiceError;
use crate::http::ApiClient;

pub const STREAK_STATS_PATH: &str = "/api/streaks/stats";
pub const CHAT_PATH: &str = "/api/chat";

/// Live REST data.
pub struct HttpDataProvider {
    client: ApiClient,
}

impl HttpDataProvider {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataProvider for HttpDataProvider {
    #[instrument(skip(self))]
    async fn streak_stats(&self) -> Result<StreakStats, ServiceError> {
        let stats: StreakStats = self.client.get_json(STREAK_STATS_PATH).await?;
        stats.validate()?;
        Ok(stats)
    }

    async fn messages_with(&self, user_id: Uuid) -> Result<Vec<ChatMessage>, ServiceError> {
        self.client.get_json(&format!("{CHAT_PATH}/{user_id}")).await
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, receiver_id: Uuid, text: &str) -> Result<ChatMessage, ServiceError> {
        let body = SendMessage::new(receiver_id, text)?;
        self.client.post_json(CHAT_PATH, &body).await
    }
}
