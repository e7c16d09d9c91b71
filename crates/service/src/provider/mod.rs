//! Source of feature data (streak stats, chat).
//!
//! Live and mock sources are chosen once from configuration, so a build
//! never mixes sample data into real responses.

pub mod http;
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use configs::DataSource;
use models::{ChatMessage, StreakStats};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::http::ApiClient;

pub use http::HttpDataProvider;
pub use mock::MockDataProvider;

#[async_trait]
pub trait DataProvider: Send + Sync {
    async fn streak_stats(&self) -> Result<StreakStats, ServiceError>;
    async fn messages_with(&self, user_id: Uuid) -> Result<Vec<ChatMessage>, ServiceError>;
    async fn send_message(&self, receiver_id: Uuid, text: &str) -> Result<ChatMessage, ServiceError>;
}

/// `client` should already carry session credentials for the live source.
pub fn build_provider(source: DataSource, client: ApiClient) -> Arc<dyn DataProvider> {
    match source {
        DataSource::Live => Arc::new(HttpDataProvider::new(client)),
        DataSource::Mock => {
            tracing::info!("using mock data provider");
            Arc::new(MockDataProvider::new())
        }
    }
}
