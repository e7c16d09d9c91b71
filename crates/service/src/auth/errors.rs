use thiserror::Error;

use crate::errors::ServiceError;

/// Failures of login/register. `Display` is the user-facing message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    /// The server answered with an error status.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Network(String),
    #[error("Invalid response from server")]
    InvalidResponse,
    #[error("could not save session: {0}")]
    Storage(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::Rejected { .. } => 1004,
            AuthError::Network(_) => 1005,
            AuthError::InvalidResponse => 1006,
            AuthError::Storage(_) => 1200,
        }
    }

    /// Replace an empty message with the operation's generic one.
    pub fn or_fallback(self, fallback: &str) -> Self {
        match self {
            AuthError::Rejected { status, message } if message.trim().is_empty() => {
                AuthError::Rejected { status, message: fallback.to_string() }
            }
            AuthError::Network(message) if message.trim().is_empty() => AuthError::Network(fallback.to_string()),
            other => other,
        }
    }
}

impl From<ServiceError> for AuthError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Validation(m) => AuthError::Validation(m),
            ServiceError::Remote { status, message } => AuthError::Rejected { status, message },
            ServiceError::Unauthorized => AuthError::Rejected { status: 401, message: String::new() },
            ServiceError::Network(m) => AuthError::Network(m),
            ServiceError::Decode(_) | ServiceError::Model(_) => AuthError::InvalidResponse,
            ServiceError::Storage(m) => AuthError::Storage(m),
        }
    }
}
