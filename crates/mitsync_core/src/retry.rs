//! Bounded retry for bulk findings fetches.
//!
//! The findings listing can fail transiently while the platform is
//! recomputing a scan's result set. Those fetches are retried on a
//! fixed cadence; annotation posts are never retried here, they use
//! the replayer's skip-and-continue handling instead.

use std::future::Future;
use std::time::Duration;

use mitsync_api::ApiError;
use tracing::warn;

/// Default maximum fetch attempts, including the first.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

/// Default delay between attempts, in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: u64 = 1;

/// Delay strategy between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Retry immediately with no delay.
    None,
    /// Wait a fixed duration between attempts.
    Fixed(Duration),
}

/// Bounded retry policy for a fallible remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Delay strategy applied between attempts.
    pub backoff: Backoff,
}

impl RetryPolicy {
    /// Bounded retry with a fixed delay between attempts.
    #[must_use]
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    /// A single attempt with no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(
            DEFAULT_MAX_ATTEMPTS,
            Duration::from_secs(DEFAULT_RETRY_DELAY_SECS),
        )
    }
}

/// Runs `operation` until it succeeds, fails non-transiently, or the
/// policy's attempts are exhausted.
///
/// Only errors whose [`ApiError::is_transient`] is true are retried;
/// everything else propagates immediately. The last error is returned
/// on exhaustion.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < policy.max_attempts => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %error,
                    "transient request failure, retrying"
                );
                if let Backoff::Fixed(delay) = policy.backoff {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
