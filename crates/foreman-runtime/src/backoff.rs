//! Bounded exponential backoff for transient probe failures.

use std::time::Duration;

use foreman_core::ForemanConfig;

/// How often, and how patiently, a failing probe is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first failed attempt. Zero disables retrying.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Fail on the first transient error.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn from_config(config: &ForemanConfig) -> Self {
        Self {
            max_retries: config.probe_retries,
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
            ..Self::default()
        }
    }

    /// Delay before the given retry (1-based), capped at `max_backoff`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1);
        self.initial_backoff
            .saturating_mul(self.multiplier.saturating_pow(exponent))
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: foreman_core::config::DEFAULT_PROBE_RETRIES,
            initial_backoff: Duration::from_millis(foreman_core::config::DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(foreman_core::config::DEFAULT_MAX_BACKOFF_MS),
            multiplier: 2,
        }
    }
}
