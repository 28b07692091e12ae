//! Bounded retry with exponential backoff
//!
//! Every adapter funnels its transient-failure retries through here so the
//! backoff behavior stays uniform across sources.

use crate::config::SearchSettings;
use crate::error::ScrapeError;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Retry policy: a fixed number of attempts with doubling delays
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles per attempt
    pub initial_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay: Duration) -> Self {
        Self {
            max_retries,
            initial_delay,
        }
    }

    pub fn from_settings(settings: &SearchSettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_delay: Duration::from_millis(settings.retry_initial_delay_ms),
        }
    }

    /// Delay before retry number `attempt` (0-indexed)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay * 2u32.saturating_pow(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Duration::from_secs(1))
    }
}

/// Run `op`, retrying transient failures within the policy and deadline.
///
/// A retry whose backoff delay would overrun `deadline` is skipped rather
/// than started, so callers never blow their timeout budget waiting here.
pub async fn retry_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    deadline: Option<Instant>,
    mut op: F,
) -> Result<T, ScrapeError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScrapeError>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                if let Some(deadline) = deadline {
                    if Instant::now() + delay >= deadline {
                        debug!("skipping retry {}: would overrun deadline", attempt + 1);
                        return Err(err);
                    }
                }
                debug!("retry {} in {:?} after: {}", attempt + 1, delay, err);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
