//! Deadline and retry primitives shared by signing and cleanup.
//!
//! Both run on the tokio timer. When a deadline fires the operation future
//! is dropped, so an abandoned wallet call is cancelled at its next await
//! point and a late result can never reach the caller.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::error::{RetryError, TimingError};

pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1_000);

/// Race `operation` against a timer of `timeout`.
pub async fn with_deadline<T, E, F>(
    operation: F,
    timeout: Duration,
    label: &str,
) -> Result<T, TimingError<E>>
where
    F: Future<Output = Result<T, E>>,
    E: std::error::Error + 'static,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(TimingError::Failed(err)),
        Err(_) => {
            tracing::debug!(label, timeout_ms = timeout.as_millis() as u64, "deadline elapsed");
            Err(TimingError::TimedOut {
                label: label.to_string(),
                timeout,
            })
        }
    }
}

/// Call `operation` up to `max_attempts` times, sleeping `base_delay * n`
/// after the n-th failure. No sleep follows the final attempt.
pub async fn retry_with_backoff<T, E, F, Fut>(
    mut operation: F,
    max_attempts: u32,
    base_delay: Duration,
    label: &str,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_error = err.to_string();
                tracing::debug!(label, attempt, max_attempts, error = %last_error, "attempt failed");
                if attempt < max_attempts {
                    tokio::time::sleep(base_delay * attempt).await;
                }
            }
        }
    }

    Err(RetryError {
        label: label.to_string(),
        attempts: max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use tokio::time::Instant;

    use super::*;
    use crate::error::WalletError;

    #[tokio::test(start_paused = true)]
    async fn deadline_passes_through_fast_results() {
        let result = with_deadline(
            async { Ok::<_, WalletError>("0xabc") },
            Duration::from_secs(1),
            "Fast",
        )
        .await;
        assert_eq!(result.unwrap(), "0xabc");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_propagates_operation_failure() {
        let result: Result<(), _> = with_deadline(
            async { Err(WalletError::new("User rejected the request")) },
            Duration::from_secs(1),
            "Sign",
        )
        .await;
        match result {
            Err(TimingError::Failed(err)) => assert_eq!(err.message, "User rejected the request"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fires_for_stalled_operation() {
        let started = Instant::now();
        let result: Result<(), TimingError<WalletError>> = with_deadline(
            std::future::pending(),
            Duration::from_millis(15_000),
            "Personal sign request",
        )
        .await;
        let err = result.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Personal sign request timed out after 15 seconds"
        );
        assert_eq!(started.elapsed(), Duration::from_millis(15_000));
    }

    #[tokio::test(start_paused = true)]
    async fn retry_uses_linear_backoff_and_reports_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let started = Instant::now();

        let result: Result<(), _> = retry_with_backoff(
            || {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Err::<(), _>(WalletError::new(format!("failure {n}")))
                }
            },
            3,
            Duration::from_millis(1_000),
            "Sign out",
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1000ms after the first failure, 2000ms after the second, none after the last.
        assert_eq!(started.elapsed(), Duration::from_millis(3_000));
        assert_eq!(
            result.unwrap_err().to_string(),
            "Sign out failed after 3 attempts: failure 3"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn retry_stops_on_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let value = retry_with_backoff(
            || {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(WalletError::new("flaky"))
                    } else {
                        Ok(7)
                    }
                }
            },
            DEFAULT_RETRY_ATTEMPTS,
            DEFAULT_RETRY_BASE_DELAY,
            "Flaky",
        )
        .await
        .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
