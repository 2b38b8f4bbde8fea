//! Bounded exponential-backoff retry for transient upstream failures.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use scribe_core::{defaults, Error, Result};

/// Retry budget for upstream calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, initial call included.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each subsequent attempt.
    pub base_delay: Duration,
    /// Delay ceiling.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: defaults::RETRY_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(defaults::RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(defaults::RETRY_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries (single attempt).
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Run `op`, retrying on transient errors with exponential backoff.
///
/// Only errors classified transient by [`Error::is_transient`] (upstream
/// rate-limit signal, transport failure) are retried; anything else
/// propagates immediately. When the budget is exhausted the last transient
/// error is surfaced as [`Error::UpstreamTimeout`].
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    op_name: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.base_delay;
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                warn!(
                    subsystem = "upstream",
                    component = "retry",
                    op = op_name,
                    attempt,
                    backoff_ms = delay.as_millis() as u64,
                    error = %e,
                    "Transient upstream failure, backing off"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
                attempt += 1;
            }
            Err(e) if e.is_transient() => {
                return Err(Error::UpstreamTimeout(format!(
                    "{} failed after {} attempts: {}",
                    op_name, attempt, e
                )));
            }
            Err(e) => return Err(e),
        }
    }
}
