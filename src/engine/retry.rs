//! Attempt retry logic
//!
//! A dropped connection says nothing about the candidate, so transport
//! failures are retried on a fresh connection with exponential backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::enumerate::{AttemptError, Finding, TransactionDriver};
use crate::session::ScreenSession;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of retries per candidate
    pub max_retries: usize,

    /// Initial backoff in milliseconds
    pub initial_backoff_ms: u64,

    /// Backoff multiplier for each retry
    pub backoff_multiplier: f64,

    /// Maximum backoff in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
            backoff_multiplier: 2.0,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Set custom backoff parameters
    pub fn with_backoff(mut self, initial_ms: u64, multiplier: f64, max_ms: u64) -> Self {
        self.initial_backoff_ms = initial_ms;
        self.backoff_multiplier = multiplier;
        self.max_backoff_ms = max_ms;
        self
    }
}

/// Backoff before retry number `attempt` (0-based)
pub fn calculate_backoff(attempt: usize, config: &RetryConfig) -> Duration {
    let delay_ms = (config.initial_backoff_ms as f64
        * config.backoff_multiplier.powi(attempt as i32))
    .min(config.max_backoff_ms as f64);

    Duration::from_millis(delay_ms as u64)
}

/// Run one candidate, reconnecting and retrying on transient transport
/// errors. Rejections and classification errors are returned as they are.
/// Any transport error leaves the driver disconnected, so the next
/// candidate starts on a fresh connection.
pub async fn attempt_with_retry<S>(
    driver: &mut TransactionDriver<S>,
    candidate: &str,
    config: &RetryConfig,
) -> Result<Finding, AttemptError>
where
    S: ScreenSession,
{
    let mut attempt = 0;

    loop {
        let result = match driver.connect().await {
            Ok(()) => driver.attempt(candidate).await,
            Err(e) => Err(AttemptError::Transport(e)),
        };

        match result {
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = calculate_backoff(attempt, config);
                warn!(
                    "Attempt {}/{} for {} failed, retrying in {:?}: {}",
                    attempt + 1,
                    config.max_retries + 1,
                    candidate,
                    delay,
                    e
                );
                driver.disconnect().await;
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) if e.is_retryable() => {
                info!("Giving up on {} after {} attempts", candidate, attempt + 1);
                driver.disconnect().await;
                return Err(e);
            }
            Err(e) => {
                if matches!(e, AttemptError::Transport(_)) {
                    driver.disconnect().await;
                }
                return Err(e);
            }
            Ok(finding) => return Ok(finding),
        }
    }
}
