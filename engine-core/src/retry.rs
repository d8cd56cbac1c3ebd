//! Bounded retry with exponential backoff for ledger transactions.
//!
//! Only optimistic write contention (`AppError::Conflict`) is retried; the
//! closure re-reads state on every attempt, so a race loser that retries
//! against the post-transition snapshot fails with the domain error instead
//! of silently overwriting.

use crate::error::AppError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Configuration for retry behavior.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Initial backoff duration before first retry.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to backoff duration.
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the specified max retries.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Create a config with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Create a config for quick retries (smaller backoffs, for tests).
    pub fn quick() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(5),
            max_backoff: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Calculate backoff duration for a given attempt.
    fn backoff_duration(&self, attempt: u32) -> Duration {
        let backoff =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let backoff_ms = backoff.min(self.max_backoff.as_millis() as f64) as u64;

        let mut duration = Duration::from_millis(backoff_ms);

        if self.add_jitter {
            // Add up to 25% jitter
            let jitter = (backoff_ms as f64 * 0.25 * rand_jitter()) as u64;
            duration += Duration::from_millis(jitter);
        }

        duration
    }
}

/// Simple pseudo-random jitter (0.0 to 1.0) without external dependencies.
fn rand_jitter() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Execute a ledger transaction with retry on write contention.
///
/// The closure must perform the full read-validate-commit sequence so that
/// every attempt operates on a fresh snapshot.
pub async fn retry_transaction<F, Fut, T>(
    config: &RetryConfig,
    operation: &str,
    f: F,
) -> Result<T, AppError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 0;

    loop {
        match f().await {
            Ok(result) => {
                if attempt > 0 {
                    info!(
                        operation = operation,
                        attempt = attempt + 1,
                        "transaction committed after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if err.is_retryable() && attempt < config.max_retries => {
                let backoff = config.backoff_duration(attempt);
                warn!(
                    operation = operation,
                    attempt = attempt + 1,
                    backoff_ms = backoff.as_millis() as u64,
                    "transaction conflicted, retrying after backoff"
                );
                sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_retryable() {
                    warn!(
                        operation = operation,
                        attempt = attempt + 1,
                        "transaction conflicted, retry budget exhausted"
                    );
                } else {
                    warn!(
                        operation = operation,
                        error = %err,
                        "transaction failed with permanent error, not retrying"
                    );
                }
                return Err(err);
            }
        }
    }
}
