//! REST plumbing: a reqwest-backed client that attaches the bearer token,
//! turns error bodies into messages and reports expired sessions.

pub mod client;
pub mod retry;

use async_trait::async_trait;

pub use client::ApiClient;
pub use retry::RetryPolicy;

/// Source of the bearer token, told when the server rejects it.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;

    /// Called after a 401 on a non-auth request that carried `token`.
    async fn token_rejected(&self, token: &str);
}
