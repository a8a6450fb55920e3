//! Fixed-delay retry logic for portal requests
//!
//! The portal fails in two transient ways: connection-level errors and
//! spurious 401 responses. Both are retried after a fixed delay until the
//! attempt budget runs out. Anything else fails immediately.
//!
//! # Example
//!
//! ```no_run
//! use cognos_dl::config::RetryConfig;
//! use cognos_dl::retry::{IsRetryable, RetryFailure, with_retry};
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     Transient,
//!     Permanent,
//! }
//!
//! impl std::fmt::Display for MyError {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         write!(f, "{:?}", self)
//!     }
//! }
//!
//! impl IsRetryable for MyError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, MyError::Transient)
//!     }
//! }
//!
//! # async fn example() -> Result<(), RetryFailure<MyError>> {
//! let config = RetryConfig::default();
//! let cancel = CancellationToken::new();
//! with_retry(&config, &cancel, || async {
//!     // Your operation here
//!     Ok::<_, MyError>(())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Trait for errors that can be classified as retryable or not
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection resets, timeouts, truncated bodies
            Error::Network(_) => true,
            // The portal hands these out at random; a real auth failure exhausts the budget
            Error::Unauthorized { .. } => true,
            Error::HttpStatus { .. }
            | Error::RetriesExhausted { .. }
            | Error::Protocol(_)
            | Error::UnsupportedReport { .. }
            | Error::Path(_)
            | Error::PollLimitExceeded { .. }
            | Error::Cancelled
            | Error::AdmissionTimeout { .. }
            | Error::Config { .. }
            | Error::Serialization(_) => false,
        }
    }
}

/// Why a retried operation ultimately failed
#[derive(Debug)]
pub enum RetryFailure<E> {
    /// The operation failed with an error that is not worth retrying
    Permanent(E),
    /// Every allowed attempt failed with a retryable error
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// The error from the last attempt
        last_error: E,
    },
    /// The cancellation token fired while waiting between attempts
    Cancelled,
}

impl<E: std::fmt::Display> std::fmt::Display for RetryFailure<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryFailure::Permanent(e) => write!(f, "{}", e),
            RetryFailure::Exhausted {
                attempts,
                last_error,
            } => write!(f, "failed after {} attempts: {}", attempts, last_error),
            RetryFailure::Cancelled => write!(f, "cancelled while waiting to retry"),
        }
    }
}

/// Execute an async operation, retrying transient failures after a fixed delay
///
/// # Arguments
///
/// * `config` - Retry configuration (delay, retry count, jitter)
/// * `cancel` - Token that aborts the wait between attempts
/// * `operation` - Async closure that returns `Result<T, E>` where E implements [`IsRetryable`]
///
/// The operation runs at most `1 + config.max_retries` times. Attempts are
/// separated by at least `config.delay`.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    cancel: &CancellationToken,
    mut operation: F,
) -> std::result::Result<T, RetryFailure<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;

                let delay = if config.jitter {
                    add_jitter(config.delay)
                } else {
                    config.delay
                };

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );

                tokio::select! {
                    _ = cancel.cancelled() => return Err(RetryFailure::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
            Err(e) if e.is_retryable() => {
                tracing::error!(
                    error = %e,
                    attempts = attempt + 1,
                    "Operation failed after all retry attempts exhausted"
                );
                return Err(RetryFailure::Exhausted {
                    attempts: attempt + 1,
                    last_error: e,
                });
            }
            Err(e) => {
                tracing::debug!(error = %e, "Operation failed with non-retryable error");
                return Err(RetryFailure::Permanent(e));
            }
        }
    }
}

/// Add random jitter to a delay
///
/// The result lies between `delay` and `2 * delay`, so the minimum spacing
/// between attempts is preserved.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::from_secs_f64(jittered_secs)
}
