//! Wiring for a running client: one session, one authenticated API client,
//! and the feature services built on top of them.

use std::sync::Arc;

use configs::AppConfig;
use tracing::info;

use crate::auth::repo::HttpAuthRepository;
use crate::auth::SessionManager;
use crate::chat::ChatService;
use crate::errors::ServiceError;
use crate::http::ApiClient;
use crate::provider::build_provider;
use crate::storage::{JsonFileSessionStore, SessionStore};
use crate::streak::StreakService;

pub struct AppContext {
    pub session: Arc<SessionManager<HttpAuthRepository>>,
    pub client: ApiClient,
    pub streaks: StreakService,
    pub chat: ChatService,
}

impl AppContext {
    /// Build every component from configuration. The session is not
    /// restored yet; call [`AppContext::restore`] before reading it.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self, ServiceError> {
        let store: Arc<dyn SessionStore> = JsonFileSessionStore::open(cfg.session.store_path.clone()).await?;
        Self::with_store(cfg, store)
    }

    pub fn with_store(cfg: &AppConfig, store: Arc<dyn SessionStore>) -> Result<Self, ServiceError> {
        // auth calls go out without credentials; everything else carries
        // the session token and expires it on 401
        let base = ApiClient::from_config(&cfg.api)?;
        let session = Arc::new(SessionManager::new(Arc::new(HttpAuthRepository::new(base.clone())), store));
        let client = base.with_credentials(session.clone());

        let provider = build_provider(cfg.data.source, client.clone());
        info!(base_url = client.base_url(), source = ?cfg.data.source, "client context ready");
        Ok(Self {
            streaks: StreakService::new(Arc::clone(&provider)),
            chat: ChatService::new(provider, cfg.polling.chat_interval()),
            session,
            client,
        })
    }

    pub async fn restore(&self) {
        self.session.restore().await;
    }

    /// Stop background polling.
    pub fn shutdown(&self) {
        self.chat.close_all();
    }
}
