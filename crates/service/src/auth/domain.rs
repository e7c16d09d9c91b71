use std::fmt;

use chrono::{DateTime, Utc};
use models::User;
use serde::{Deserialize, Serialize};

use super::errors::AuthError;

/// Body of `POST /auth/login`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(email: &str, password: &str) -> Result<Self, AuthError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("email and password are required".into()));
        }
        Ok(Self { email: email.to_string(), password: password.to_string() })
    }
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput").field("email", &self.email).finish_non_exhaustive()
    }
}

/// Body of `POST /auth/signup`.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(username: &str, email: &str, password: &str) -> Result<Self, AuthError> {
        let (username, email) = (username.trim(), email.trim());
        if username.is_empty() {
            return Err(AuthError::Validation("username is required".into()));
        }
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation("email and password are required".into()));
        }
        Ok(Self { username: username.to_string(), email: email.to_string(), password: password.to_string() })
    }
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Raw login/signup answer; both fields are optional until validated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

impl AuthResponse {
    pub fn new(token: impl Into<String>, user: User) -> Self {
        Self { token: Some(token.into()), user: Some(user) }
    }

    /// Accept the answer only when it carries a token and a user with an id.
    pub fn into_session(self) -> Result<AuthSession, AuthError> {
        match (self.token, self.user) {
            (Some(token), Some(user)) if !token.trim().is_empty() && user.has_identity() => {
                Ok(AuthSession { token, user })
            }
            _ => Err(AuthError::InvalidResponse),
        }
    }
}

/// A validated token and user pair, ready to be committed.
#[derive(Clone, PartialEq)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

impl fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSession").field("user", &self.user).finish_non_exhaustive()
    }
}

/// Read-only view of the session held by the manager.
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<User>,
    /// True until the first restore finishes and while a login/register is in flight.
    pub loading: bool,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
            && self.user.as_ref().is_some_and(User::has_identity)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("has_token", &self.token.is_some())
            .field("loading", &self.loading)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthEventKind {
    Login,
    Register,
    Logout,
}

impl fmt::Display for AuthEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthEventKind::Login => "auth:login",
            AuthEventKind::Register => "auth:register",
            AuthEventKind::Logout => "auth:logout",
        };
        f.write_str(name)
    }
}

/// Notification that the session transitioned.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    /// New user for login/register, previous user (if any) for logout.
    pub user: Option<User>,
    pub timestamp: DateTime<Utc>,
}

impl AuthEvent {
    pub fn new(kind: AuthEventKind, user: Option<User>) -> Self {
        Self { kind, user, timestamp: Utc::now() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_session_requires_token_and_identity() {
        let user = User::new("u1", "ada", "ada@example.com");
        assert!(AuthResponse::new("tok", user.clone()).into_session().is_ok());
        assert!(matches!(AuthResponse::new("  ", user.clone()).into_session(), Err(AuthError::InvalidResponse)));
        assert!(matches!(AuthResponse::new("tok", User::new("", "ada", "")).into_session(), Err(AuthError::InvalidResponse)));
        assert!(matches!(AuthResponse { token: Some("tok".into()), user: None }.into_session(), Err(AuthError::InvalidResponse)));
        assert!(matches!(AuthResponse { token: None, user: Some(user) }.into_session(), Err(AuthError::InvalidResponse)));
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let resp: AuthResponse = serde_json::from_str(r#"{"user":{"id":"1"}}"#).unwrap();
        assert!(resp.token.is_none());
        assert!(resp.into_session().is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let input = LoginInput::new("a@b.c", "hunter22").unwrap();
        assert!(!format!("{input:?}").contains("hunter22"));
        let session = Session { token: Some("sekrit".into()), user: None, loading: false };
        assert!(!format!("{session:?}").contains("sekrit"));
    }

    #[test]
    fn inputs_validate_required_fields() {
        assert!(LoginInput::new("  ", "pw").is_err());
        assert!(RegisterInput::new("", "a@b.c", "pw").is_err());
        assert_eq!(RegisterInput::new(" ada ", "a@b.c", "pw").unwrap().username, "ada");
    }

    #[test]
    fn session_authentication_is_derived() {
        let mut s = Session::default();
        assert!(!s.is_authenticated());
        s.token = Some("t".into());
        assert!(!s.is_authenticated());
        s.user = Some(User::new("1", "a", "a@b.c"));
        assert!(s.is_authenticated());
    }
}
