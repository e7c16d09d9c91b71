use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use super::retry::{retry_with_policy, RetryPolicy};
use super::CredentialProvider;
use crate::errors::ServiceError;

/// Longest backend error message surfaced to callers.
const MAX_ERROR_MESSAGE: usize = 200;

/// JSON REST client for the BrainJar API.
///
/// Requests outside `/auth/` carry `Authorization: Bearer <token>` when a
/// [`CredentialProvider`] is attached, and a 401 on such a request reports
/// the token it carried before returning [`ServiceError::Unauthorized`].
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Arc<str>,
    retry: RetryPolicy,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("retry", &self.retry)
            .field("authenticated", &self.credentials.is_some())
            .finish()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, retry: RetryPolicy) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("brainjar-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;
        Ok(Self {
            http,
            base_url: Arc::from(base_url.trim_end_matches('/')),
            retry,
            credentials: None,
        })
    }

    pub fn from_config(cfg: &configs::ApiConfig) -> Result<Self, ServiceError> {
        Self::new(&cfg.base_url, cfg.timeout(), RetryPolicy::from_config(&cfg.retry))
    }

    /// Same connection pool, with bearer tokens taken from `provider`.
    pub fn with_credentials(&self, provider: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials: Some(provider), ..self.clone() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET with retry on transient failures.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ServiceError> {
        retry_with_policy(&self.retry, || async {
            let (builder, token) = self.request(Method::GET, path);
            let response = self.send(builder, token, path).await?;
            decode(response).await
        })
        .await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let (builder, token) = self.request(Method::POST, path);
        let response = self.send(builder.json(body), token, path).await?;
        decode(response).await
    }

    /// Build a request; also returns the bearer token it carries, if any.
    fn request(&self, method: Method, path: &str) -> (RequestBuilder, Option<String>) {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.http.request(method, url);
        if is_auth_path(path) {
            return (builder, None);
        }
        match self.credentials.as_ref().and_then(|c| c.bearer_token()) {
            Some(token) => (builder.bearer_auth(&token), Some(token)),
            None => (builder, None),
        }
    }

    async fn send(&self, builder: RequestBuilder, token: Option<String>, path: &str) -> Result<Response, ServiceError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ServiceError::Network("request timed out".into())
            } else {
                ServiceError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        debug!(path, status = status.as_u16(), "api response");
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && !is_auth_path(path) {
            // only a token we actually sent can be reported as rejected
            if let (Some(credentials), Some(token)) = (&self.credentials, token.as_deref()) {
                warn!(path, "bearer token rejected");
                credentials.token_rejected(token).await;
            } else {
                debug!(path, "unauthorized without credentials");
            }
            return Err(ServiceError::Unauthorized);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ServiceError::Remote { status: status.as_u16(), message: error_message(&body).unwrap_or_default() })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let bytes = response.bytes().await.map_err(|e| ServiceError::Network(e.to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::Decode(e.to_string()))
}

/// Login and signup answer 401 for bad credentials; that is not an expired session.
pub fn is_auth_path(path: &str) -> bool {
    path.trim_start_matches('/').starts_with("auth/")
}

/// Pull a human-readable message out of an error body: the JSON `message` or
/// `error` field, or the body itself when it is plain text.
pub fn error_message(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    let message = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(json) => ["message", "error"]
            .iter()
            .find_map(|k| json.get(k).and_then(|v| v.as_str()).map(str::to_string))?,
        Err(_) => body.to_string(),
    };
    let message = message.trim();
    if message.is_empty() {
        return None;
    }
    Some(message.chars().take(MAX_ERROR_MESSAGE).collect())
}
