use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("{0}")]
    Network(String),
    /// Non-2xx answer; `message` comes from the response body when it has one.
    #[error("{message}")]
    Remote { status: u16, message: String },
    /// 401 on an authenticated request; the session has already been cleared.
    #[error("session expired, please log in again")]
    Unauthorized,
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("model error: {0}")]
    Model(#[from] models::ModelError),
}

impl ServiceError {
    pub fn storage(e: impl std::fmt::Display) -> Self { Self::Storage(e.to_string()) }

    /// Transport failures and gateway-style 5xx answers are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Network(_) => true,
            ServiceError::Remote { status, .. } => matches!(status, 502 | 503 | 504),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(ServiceError::Network("connection refused".into()).is_retryable());
        assert!(ServiceError::Remote { status: 503, message: "busy".into() }.is_retryable());
        assert!(!ServiceError::Remote { status: 400, message: "bad".into() }.is_retryable());
        assert!(!ServiceError::Unauthorized.is_retryable());
    }

    #[test]
    fn remote_displays_backend_message() {
        let e = ServiceError::Remote { status: 409, message: "Email already registered".into() };
        assert_eq!(e.to_string(), "Email already registered");
    }
}
