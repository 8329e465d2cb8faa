//! Retry backoff for transient store failures.
//!
//! Failed mutations are not retried immediately: each failure pushes the next
//! eligible attempt out by an exponentially growing, capped delay.

use std::time::Duration;

use tempo_config::QueueConfig;

/// Configuration for retry behavior on transient store errors.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Delay after the first failure.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&QueueConfig::default())
    }
}

impl From<&QueueConfig> for RetryConfig {
    fn from(config: &QueueConfig) -> Self {
        Self {
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
        }
    }
}

impl RetryConfig {
    /// Delay before the next attempt after `attempts` consecutive failures.
    #[must_use]
    pub fn delay_for(&self, attempts: u32) -> Duration {
        let exponent = attempts.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay)
    }
}
