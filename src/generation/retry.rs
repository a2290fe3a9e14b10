//! Bounded retry with exponential backoff

use super::GenerationError;
use crate::config::GenerationConfig;
use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

/// Retry settings for provider calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure
    pub attempts: usize,
    /// Delay before the first retry; doubles for each further retry
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            attempts: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            attempts: config.retry_attempts,
            backoff: config.retry_backoff(),
        }
    }

    /// Calculate exponential backoff for a 1-based attempt number
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as u32;
        self.backoff.saturating_mul(2_u32.pow(exponent))
    }

    /// Run `call` until it succeeds, fails with a non-retryable error, or
    /// the attempts are used up
    pub async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, GenerationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, GenerationError>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt <= self.attempts => {
                    let backoff = self.backoff_for(attempt);
                    warn!(
                        "{} attempt {} failed: {}, retrying in {:?}",
                        operation, attempt, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => {
                    if attempt > 1 {
                        error!("{} failed after {} attempts: {}", operation, attempt, e);
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}
