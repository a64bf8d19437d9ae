use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::StorageError;

/// Bounded retry for storage writes.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles after each failure.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy runs out.
///
/// Only [`StorageError::is_transient`] failures are retried. When attempts are
/// exhausted the last error is wrapped in [`StorageError::Transient`].
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    key: &str,
    mut op: F,
) -> Result<T, StorageError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    key,
                    attempt,
                    max_attempts,
                    error = %err,
                    "transient storage failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) if err.is_transient() => {
                return Err(StorageError::Transient {
                    key: key.to_string(),
                    attempts: attempt,
                    source: Box::new(err),
                });
            }
            Err(err) => return Err(err),
        }
    }
}
