//! Bounded retry with exponential back-off for upstream calls.

use std::{fmt::Display, future::Future, num::NonZeroU32, time::Duration};

use tracing::warn;

/// Errors that know whether a repeated attempt can succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;

    /// Server-provided hint for the next attempt, if any.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: NonZeroU32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: NonZeroU32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay: max_delay.max(base_delay),
        }
    }

    /// Single attempt, no back-off.
    pub fn none() -> Self {
        Self::new(NonZeroU32::MIN, Duration::ZERO, Duration::ZERO)
    }

    /// Delay before attempt `failed_attempts + 1`; doubles per failure, capped.
    pub fn backoff(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds, returns a non-retryable error, or the
    /// attempt budget is spent. The last error is returned unchanged.
    pub async fn run<T, E, F, Fut>(&self, operation: &'static str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_attempts.get() => {
                    let delay = err
                        .retry_after()
                        .map(|hint| hint.min(self.max_delay))
                        .unwrap_or_else(|| self.backoff(attempt));
                    warn!(
                        target = "folio::retry",
                        operation,
                        attempt,
                        max_attempts = self.max_attempts.get(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "upstream call failed; retrying",
                    );
                    metrics::counter!("folio_upstream_retry_total", "operation" => operation)
                        .increment(1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
