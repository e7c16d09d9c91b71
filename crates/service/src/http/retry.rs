use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::ServiceError;

/// Exponential backoff for idempotent requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    enabled: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration, backoff_max: Duration, enabled: bool) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff_base, backoff_max, enabled }
    }

    pub fn from_config(cfg: &configs::RetryConfig) -> Self {
        Self::new(
            cfg.max_attempts,
            Duration::from_millis(cfg.backoff_base_ms),
            Duration::from_millis(cfg.backoff_max_ms),
            cfg.enabled,
        )
    }

    pub fn disabled() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO, false)
    }

    pub fn max_attempts(&self) -> u32 {
        if self.enabled { self.max_attempts } else { 1 }
    }

    /// Delay before attempt number `attempt` (1-based count of retries so far).
    pub fn backoff(&self, attempt: u32) -> Duration {
        if !self.enabled || attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }

    pub fn should_retry(&self, attempt: u32, error: &ServiceError) -> bool {
        if !self.enabled {
            return false;
        }
        if attempt >= self.max_attempts {
            debug!(max_attempts = self.max_attempts, "retry budget exhausted");
            return false;
        }
        error.is_retryable()
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt budget runs out.
pub async fn retry_with_policy<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!(retries = attempt, "request succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                attempt += 1;
                if !policy.should_retry(attempt, &error) {
                    return Err(error);
                }
                let delay = policy.backoff(attempt);
                warn!(attempt, ?delay, error = %error, "request failed; retrying");
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(100), Duration::from_millis(150), true)
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = policy();
        assert_eq!(p.backoff(0), Duration::ZERO);
        assert_eq!(p.backoff(1), Duration::from_millis(100));
        assert_eq!(p.backoff(2), Duration::from_millis(150));
        assert_eq!(RetryPolicy::disabled().max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_errors_up_to_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_policy(&policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ServiceError::Network("connection reset".into()))
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_permanent_error_and_returns_success() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_policy(&policy(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ServiceError::Remote { status: 404, message: "nope".into() })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let calls = AtomicU32::new(0);
        let value = retry_with_policy(&policy(), || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(ServiceError::Remote { status: 503, message: "busy".into() })
            } else {
                Ok(7)
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
    }
}
