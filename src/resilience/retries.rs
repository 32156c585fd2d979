//! Retry logic.
//!
//! # Responsibilities
//! - Re-run an operation while it fails with a transient store error
//! - Wait a jittered exponential backoff between attempts
//!
//! # Design Decisions
//! - Non-transient errors (duplicates, invalid data) are returned at once
//! - The attempt budget is bounded; the last error is returned when spent

use std::future::Future;

use crate::config::SeedingConfig;
use crate::persistence::StoreError;
use crate::resilience::backoff::calculate_backoff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &SeedingConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }
}

/// Run `operation`, retrying transient failures per `policy`.
pub async fn retry_transient<T, F, Fut>(
    what: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_retries => {
                attempt += 1;
                let delay = calculate_backoff(attempt, policy.base_delay_ms, policy.max_delay_ms);
                tracing::warn!(
                    operation = what,
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    const FAST: RetryPolicy = RetryPolicy {
        max_retries: 3,
        base_delay_ms: 1,
        max_delay_ms: 2,
    };

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let calls = &AtomicU32::new(0);
        let result = retry_transient("warmup", FAST, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(StoreError::Unavailable("warming up".into()))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_budget_exhaustion_returns_last_error() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry_transient("warmup", FAST, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Unavailable("down".into()))
        })
        .await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_permanent_errors_fail_fast() {
        let calls = &AtomicU32::new(0);
        let result: Result<(), _> = retry_transient("warmup", FAST, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Duplicate("exists".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
