//! Bounded retry with exponential backoff for transient failures.

use std::future::Future;
use std::time::Duration;

/// How many attempts to make and how long to wait between them.
///
/// The delay doubles with every retry (`base_delay * 2^(attempt-1)`),
/// capped by `max_delay`.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

/// Run `op` until it succeeds or the policy's attempts are exhausted.
///
/// Only errors the `is_retryable` predicate approves are retried; a
/// permanent failure is returned after the first attempt, with no sleep.
/// The operation name is used purely for log context.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: RetryPolicy,
    op_name: &str,
    is_retryable: P,
    mut op: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_err = None;
    for attempt in 1..=policy.attempts.max(1) {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !is_retryable(&e) {
                    tracing::error!(
                        op = op_name,
                        attempt,
                        error = %e,
                        "permanent failure, not retrying"
                    );
                    return Err(e);
                }
                if attempt < policy.attempts {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        op = op_name,
                        attempt,
                        attempts = policy.attempts,
                        error = %e,
                        "attempt failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    tracing::error!(
                        op = op_name,
                        attempts = policy.attempts,
                        error = %e,
                        "all attempts failed"
                    );
                }
                last_err = Some(e);
            }
        }
    }
    // attempts >= 1, so at least one error was recorded.
    Err(last_err.expect("retry loop ran at least once"))
}
