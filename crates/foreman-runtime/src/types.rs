//! Runtime types.

use std::time::Duration;

use foreman_core::{ForemanConfig, Observation};

use crate::backoff::RetryPolicy;

/// Polling behavior of one orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Sleep between consecutive probes.
    pub interval: Duration,
    /// Give up after this long. `None` waits indefinitely.
    pub max_wait: Option<Duration>,
    pub retry: RetryPolicy,
}

impl PollOptions {
    pub fn from_config(config: &ForemanConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_wait: config.max_wait(),
            retry: RetryPolicy::from_config(config),
        }
    }

    /// No sleeps, no guard, no backoff delay. For tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            interval: Duration::ZERO,
            max_wait: None,
            retry: RetryPolicy {
                initial_backoff: Duration::ZERO,
                max_backoff: Duration::ZERO,
                ..RetryPolicy::default()
            },
        }
    }
}

impl Default for PollOptions {
    fn default() -> Self {
        Self::from_config(&ForemanConfig::default())
    }
}

/// Outcome of a wait that reached a successful terminal status.
#[derive(Debug, Clone)]
pub struct PollReport {
    /// The last (terminal) observation.
    pub observation: Observation,
    /// Probes that produced an observation.
    pub probes: u32,
    /// Sleeps between probes, not counting retry backoff.
    pub sleeps: u32,
    /// Probe attempts repeated after a transient error.
    pub retries: u32,
    pub elapsed: Duration,
}

impl PollReport {
    pub fn status(&self) -> &str {
        &self.observation.status
    }

    pub fn into_observation(self) -> Observation {
        self.observation
    }
}
