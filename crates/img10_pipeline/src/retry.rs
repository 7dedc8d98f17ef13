//! Bounded retry of transient storage failures.

use crate::RetryConfig;
use img10_error::{Img10Error, Img10Result};
use std::future::Future;
use std::time::Duration;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::warn;

/// Run `action`, retrying while it fails with a retryable error.
///
/// Only [`Img10Error::is_retryable`] errors are retried; anything else, such
/// as `QuotaExceeded`, fails on the first attempt. After the configured
/// number of retries the last error is returned.
pub(crate) async fn with_retry<T, F, Fut>(
    policy: &RetryConfig,
    operation: &'static str,
    mut action: F,
) -> Img10Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Img10Result<T>>,
{
    let strategy = ExponentialBackoff::from_millis(policy.initial_backoff_ms.max(1))
        .factor(2)
        .max_delay(Duration::from_millis(policy.max_delay_ms))
        .map(jitter)
        .take(policy.max_retries);

    Retry::spawn(strategy, || {
        let attempt = action();
        async move {
            attempt.await.map_err(|e: Img10Error| {
                if e.is_retryable() {
                    warn!(operation, error = %e, "Transient storage failure, will retry");
                    RetryError::Transient {
                        err: e,
                        retry_after: None,
                    }
                } else {
                    RetryError::Permanent(e)
                }
            })
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use img10_error::{StorageError, StorageErrorKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn unavailable() -> Img10Error {
        StorageError::new(StorageErrorKind::Unavailable("busy".into())).into()
    }

    fn quota_exceeded() -> Img10Error {
        StorageError::new(StorageErrorKind::QuotaExceeded("full".into())).into()
    }

    fn fast(max_retries: usize) -> RetryConfig {
        RetryConfig {
            initial_backoff_ms: 1,
            max_delay_ms: 5,
            max_retries,
        }
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let attempts = AtomicUsize::new(0);
        let value = with_retry(&fast(3), "put", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(unavailable())
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(value, 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_fail_immediately() {
        let attempts = AtomicUsize::new(0);
        let result: Img10Result<()> = with_retry(&fast(3), "put", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(quota_exceeded()) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let attempts = AtomicUsize::new(0);
        let result: Img10Result<()> = with_retry(&fast(2), "get", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(unavailable()) }
        })
        .await;
        assert!(result.unwrap_err().is_retryable());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
