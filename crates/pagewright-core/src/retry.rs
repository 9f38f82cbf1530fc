//! Bounded exponential backoff for transient generation failures
//!
//! Only errors carrying a transient [`GenerationFailure`](crate::GenerationFailure)
//! are retried. Everything else is returned to the caller on the first attempt.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::Result;

/// How many times to try and how long to wait in between
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (minimum 1)
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    /// Try once, never wait
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Delay before the given retry (1-based), doubling and capped
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000), Duration::from_millis(8000))
    }
}

/// Run `f` until it succeeds, fails permanently, or attempts run out
///
/// `f` receives the 1-based attempt number.
///
/// # Usage
///
/// ```no_run
/// use pagewright_core::retry::{retry_transient, RetryPolicy};
/// use pagewright_core::Result;
///
/// async fn call_service() -> Result<String> {
///     Ok("<!DOCTYPE html>...".to_string())
/// }
///
/// async fn example() -> Result<String> {
///     retry_transient("generate", &RetryPolicy::default(), |_attempt| call_service()).await
/// }
/// ```
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut f: F,
) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match f(attempt).await {
            Ok(val) => return Ok(val),
            Err(e) => {
                let transient = e
                    .generation_failure()
                    .map(|failure| failure.is_transient())
                    .unwrap_or(false);

                if !transient || attempt >= max_attempts {
                    return Err(e);
                }

                let delay = policy.backoff_for(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    operation_name, attempt, max_attempts, e, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
