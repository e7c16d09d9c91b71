use tracing::instrument;

use crate::auth::domain::{AuthResponse, LoginInput, RegisterInput};
use crate::auth::errors::AuthError;
use crate::auth::repository::AuthRepository;
use crate::http::ApiClient;

pub const LOGIN_PATH: &str = "/auth/login";
pub const SIGNUP_PATH: &str = "/auth/signup";

/// Auth endpoints of the BrainJar REST API.
pub struct HttpAuthRepository {
    pub client: ApiClient,
}

impl HttpAuthRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl AuthRepository for HttpAuthRepository {
    #[instrument(skip_all, fields(email = %input.email))]
    async fn login(&self, input: &LoginInput) -> Result<AuthResponse, AuthError> {
        Ok(self.client.post_json(LOGIN_PATH, input).await?)
    }

    #[instrument(skip_all, fields(email = %input.email, username = %input.username))]
    async fn register(&self, input: &RegisterInput) -> Result<AuthResponse, AuthError> {
        Ok(self.client.post_json(SIGNUP_PATH, input).await?)
    }
}
