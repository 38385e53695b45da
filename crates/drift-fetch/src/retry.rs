//! Bounded exponential-backoff retry for health-check calls.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::Transport;

/// Retry parameters: 3 retries, 1s base delay, doubling, 8s cap.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: u32,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            multiplier: 2,
            max_delay: Duration::from_millis(8000),
        }
    }
}

impl RetryPolicy {
    /// Delay before the given retry attempt (1-based):
    /// `min(base * multiplier^(attempt-1), max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        (self.base_delay * factor).min(self.max_delay)
    }
}

/// Issues fetches through a [`Transport`], retrying idempotent
/// health-check calls on network failures and 5xx responses.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Fetch one URL. `retry_eligible` is true only for health-check
    /// endpoints; other requests fail on the first error. 4xx failures
    /// never retry.
    pub async fn fetch(&self, url: &str, retry_eligible: bool) -> Result<Value, FetchError> {
        let mut attempt = 0u32;
        loop {
            match self.transport.get(url).await {
                Ok(payload) => return Ok(payload),
                Err(e) => {
                    if !retry_eligible || !e.is_retryable() || attempt >= self.policy.max_retries {
                        return Err(e);
                    }
                    attempt += 1;
                    let delay = self.policy.delay_for(attempt);
                    debug!(
                        %url,
                        attempt,
                        max = self.policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying health check"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
