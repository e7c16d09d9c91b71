use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use models::User;
use tracing::{debug, info, instrument, warn};

use super::domain::{AuthEvent, AuthEventKind, AuthResponse, AuthSession, LoginInput, RegisterInput, Session};
use super::errors::AuthError;
use super::events::{AuthEventBus, Subscription};
use super::repository::AuthRepository;
use crate::http::CredentialProvider;
use crate::storage::{SessionStore, TOKEN_KEY, USER_KEY};

/// Single owner of the client session.
///
/// Every transition writes persisted storage first, then the in-memory
/// state, and only then emits the matching [`AuthEvent`], so listeners can
/// trust [`SessionManager::is_authenticated`] from inside their callback.
/// Failed transitions never leave a partial session behind.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use service::auth::{SessionManager, repository::mock::MockAuthRepository};
/// use service::storage::MemorySessionStore;
///
/// let manager = SessionManager::new(Arc::new(MockAuthRepository::default()), MemorySessionStore::new());
/// tokio_test::block_on(manager.restore());
/// assert!(!manager.is_loading());
/// assert!(!manager.is_authenticated());
/// let user = tokio_test::block_on(manager.register("ada", "ada@example.com", "pw")).unwrap();
/// assert_eq!(manager.current_user(), Some(user));
/// ```
pub struct SessionManager<R: AuthRepository> {
    repo: Arc<R>,
    store: Arc<dyn SessionStore>,
    state: RwLock<Session>,
    events: AuthEventBus,
}

impl<R: AuthRepository> SessionManager<R> {
    pub fn new(repo: Arc<R>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            repo,
            store,
            state: RwLock::new(Session { token: None, user: None, loading: true }),
            events: AuthEventBus::new(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn session(&self) -> Session {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    pub fn current_user(&self) -> Option<User> {
        let state = self.read();
        state.is_authenticated().then(|| state.user.clone()).flatten()
    }

    pub fn token(&self) -> Option<String> {
        let state = self.read();
        state.is_authenticated().then(|| state.token.clone()).flatten()
    }

    /// Register `callback` for `kind`; drop or `unsubscribe` the handle to stop.
    pub fn on_auth_event<F>(&self, kind: AuthEventKind, callback: F) -> Subscription
    where
        F: Fn(&AuthEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, callback)
    }

    /// Load the persisted session at startup.
    ///
    /// Anything other than a token plus a parseable user record with an id
    /// (a lone entry, bad JSON, a blank id) is cleared. Always ends with
    /// `loading == false`.
    #[instrument(skip(self))]
    pub async fn restore(&self) {
        match self.read_persisted().await {
            Ok(Some(AuthSession { token, user })) => {
                info!(user_id = %user.id, username = %user.username, "session restored");
                let mut state = self.write();
                state.token = Some(token);
                state.user = Some(user);
            }
            Ok(None) => debug!("no persisted session"),
            Err(reason) => {
                warn!(%reason, "persisted session is corrupted; clearing it");
                self.clear_persisted().await;
                let mut state = self.write();
                state.token = None;
                state.user = None;
            }
        }
        self.write().loading = false;
    }

    async fn read_persisted(&self) -> Result<Option<AuthSession>, String> {
        let token = self.store.get(TOKEN_KEY).await.map_err(|e| e.to_string())?;
        let user = self.store.get(USER_KEY).await.map_err(|e| e.to_string())?;
        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(raw)) => {
                if token.trim().is_empty() {
                    return Err("empty token".into());
                }
                let user = User::parse_record(&raw).map_err(|e| e.to_string())?;
                Ok(Some(AuthSession { token, user }))
            }
            (Some(_), None) => Err("token without user record".into()),
            (None, Some(_)) => Err("user record without token".into()),
        }
    }

    /// Authenticate with email and password; emits [`AuthEventKind::Login`] on success.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let attempt = async {
            let input = LoginInput::new(email, password)?;
            self.repo.login(&input).await
        };
        self.authenticate(AuthEventKind::Login, "Login failed", attempt).await
    }

    /// Create an account; emits [`AuthEventKind::Register`] on success.
    #[instrument(skip(self, password))]
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User, AuthError> {
        let attempt = async {
            let input = RegisterInput::new(username, email, password)?;
            self.repo.register(&input).await
        };
        self.authenticate(AuthEventKind::Register, "Registration failed", attempt).await
    }

    async fn authenticate<F>(&self, kind: AuthEventKind, fallback: &str, attempt: F) -> Result<User, AuthError>
    where
        F: Future<Output = Result<AuthResponse, AuthError>>,
    {
        self.write().loading = true;

        let outcome = match attempt.await.and_then(AuthResponse::into_session) {
            Ok(session) => self.commit(session).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(user) => {
                self.write().loading = false;
                info!(%kind, user_id = %user.id, username = %user.username, "authenticated");
                self.events.emit(&AuthEvent::new(kind, Some(user.clone())));
                Ok(user)
            }
            Err(error) => {
                self.clear_persisted().await;
                {
                    let mut state = self.write();
                    state.token = None;
                    state.user = None;
                    state.loading = false;
                }
                let error = error.or_fallback(fallback);
                warn!(%kind, code = error.code(), %error, "authentication failed");
                Err(error)
            }
        }
    }

    async fn commit(&self, session: AuthSession) -> Result<User, AuthError> {
        let record = session.user.to_record().map_err(|e| AuthError::Storage(e.to_string()))?;
        self.store
            .set_many(&[(TOKEN_KEY, session.token.clone()), (USER_KEY, record)])
            .await
            .map_err(|e| AuthError::Storage(e.to_string()))?;

        let mut state = self.write();
        state.token = Some(session.token);
        state.user = Some(session.user.clone());
        Ok(session.user)
    }

    /// Clear the session and emit [`AuthEventKind::Logout`] with the previous
    /// user. Safe to call when already logged out.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let previous = self.read().user.clone();
        self.clear_persisted().await;
        {
            let mut state = self.write();
            state.token = None;
            state.user = None;
        }
        match &previous {
            Some(user) => info!(user_id = %user.id, username = %user.username, "logged out"),
            None => debug!("logout without an active session"),
        }
        self.events.emit(&AuthEvent::new(AuthEventKind::Logout, previous));
    }

    /// Force-clear after the server rejected the token; behaves like [`Self::logout`].
    pub async fn expire(&self) {
        warn!("session expired; clearing credentials");
        self.logout().await;
    }

    /// Expire only if `token` is still the active one. A rejection of a token
    /// that was already cleared or replaced by a newer login is ignored.
    pub async fn expire_if_current(&self, token: &str) -> bool {
        if self.token().as_deref() != Some(token) {
            debug!("ignoring rejection of a stale token");
            return false;
        }
        self.expire().await;
        true
    }

    async fn clear_persisted(&self) {
        if let Err(e) = self.store.remove_many(&[TOKEN_KEY, USER_KEY]).await {
            warn!(error = %e, "failed to clear persisted session");
        }
    }
}

#[async_trait::async_trait]
impl<R: AuthRepository + 'static> CredentialProvider for SessionManager<R> {
    fn bearer_token(&self) -> Option<String> {
        self.token()
    }

    async fn token_rejected(&self, token: &str) {
        self.expire_if_current(token).await;
    }
}
