//! Exponential backoff for idempotent requests.

use backoff::ExponentialBackoffBuilder;
use runbridge_core::config::RetryConfig;
use runbridge_core::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Backoff settings for listing and describing tools.
///
/// Run submission never goes through this: creating a run is not idempotent.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    initial_interval: Duration,
    max_interval: Duration,
    max_elapsed: Duration,
}

impl RetryPolicy {
    pub fn new(initial_interval: Duration, max_interval: Duration, max_elapsed: Duration) -> Self {
        Self {
            initial_interval,
            max_interval,
            max_elapsed,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.initial_interval(),
            config.max_interval(),
            config.max_elapsed(),
        )
    }

    /// Run `op` until it succeeds, fails permanently, or the elapsed budget
    /// is spent. Transient failures are decided by [`Error::is_transient`].
    pub async fn retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if self.max_elapsed.is_zero() {
            return op().await;
        }

        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_interval(self.max_interval)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build();

        backoff::future::retry(backoff, || {
            let attempt = op();
            async move {
                attempt.await.map_err(|e| {
                    if e.is_transient() {
                        warn!(operation = %what, error = %e, "Transient failure, retrying");
                        backoff::Error::transient(e)
                    } else {
                        error!(operation = %what, error = %e, "Permanent failure, not retrying");
                        backoff::Error::permanent(e)
                    }
                })
            }
        })
        .await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Convenience for building a `Status` error from a response
pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> Error {
    Error::Status {
        status: status.as_u16(),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(1),
            Duration::from_millis(2),
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);

        let result = fast_policy()
            .retry("flaky", || {
                let calls = &calls;
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(Error::Status {
                            status: 503,
                            body: "unavailable".into(),
                        })
                    } else {
                        Ok("ok")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = fast_policy()
            .retry("missing", || {
                let calls = &calls;
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Error::Status {
                        status: 404,
                        body: "not found".into(),
                    })
                }
            })
            .await;

        assert!(matches!(result, Err(Error::Status { status: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_makes_one_attempt() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = RetryPolicy::new(Duration::ZERO, Duration::ZERO, Duration::ZERO)
            .retry("once", || {
                let calls = &calls;
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(Error::Status {
                        status: 500,
                        body: String::new(),
                    })
                }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
