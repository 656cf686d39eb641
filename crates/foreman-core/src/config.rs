//! Service endpoint and polling configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Default wait guard: twelve hours.
pub const DEFAULT_MAX_WAIT_SECS: u64 = 12 * 60 * 60;
pub const DEFAULT_PROBE_RETRIES: u32 = 4;
pub const DEFAULT_INITIAL_BACKOFF_MS: u64 = 1_000;
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 30_000;

/// Stored Foreman configuration (persisted to `foreman.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForemanConfig {
    #[serde(default = "default_region")]
    pub region: String,
    /// Service endpoint; derived from the region when absent.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Forecast query endpoint; derived from the region when absent.
    #[serde(default)]
    pub query_endpoint: Option<String>,
    /// Bearer token for an authenticating gateway in front of the service.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// `None` disables the wait guard.
    #[serde(default = "default_max_wait")]
    pub max_wait_secs: Option<u64>,
    #[serde(default = "default_probe_retries")]
    pub probe_retries: u32,
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    /// Path to config file for saving.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_region() -> String {
    DEFAULT_REGION.into()
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}
fn default_max_wait() -> Option<u64> {
    Some(DEFAULT_MAX_WAIT_SECS)
}
fn default_probe_retries() -> u32 {
    DEFAULT_PROBE_RETRIES
}
fn default_initial_backoff() -> u64 {
    DEFAULT_INITIAL_BACKOFF_MS
}
fn default_max_backoff() -> u64 {
    DEFAULT_MAX_BACKOFF_MS
}

impl Default for ForemanConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.into(),
            endpoint: None,
            query_endpoint: None,
            api_token: None,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_wait_secs: Some(DEFAULT_MAX_WAIT_SECS),
            probe_retries: DEFAULT_PROBE_RETRIES,
            initial_backoff_ms: DEFAULT_INITIAL_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
            config_path: PathBuf::new(),
        }
    }
}

impl ForemanConfig {
    /// Load config from file, then apply `FOREMAN_*` environment overrides.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(config_path: &Path) -> Result<Self> {
        let mut config: ForemanConfig = match std::fs::read_to_string(config_path) {
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => ForemanConfig::default(),
            Err(e) => return Err(e.into()),
        };
        config.config_path = config_path.to_path_buf();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = lookup("FOREMAN_REGION") {
            self.region = region;
        }
        if let Some(endpoint) = lookup("FOREMAN_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(endpoint) = lookup("FOREMAN_QUERY_ENDPOINT") {
            self.query_endpoint = Some(endpoint);
        }
        if self.api_token.is_none() {
            self.api_token = lookup("FOREMAN_API_TOKEN");
        }
        if let Some(v) = lookup("FOREMAN_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = v
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("Invalid FOREMAN_POLL_INTERVAL_SECS: {}", v)))?;
        }
        if let Some(v) = lookup("FOREMAN_MAX_WAIT_SECS") {
            self.max_wait_secs = parse_max_wait(&v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(Error::Config("region must not be empty".into()));
        }
        if matches!(self.endpoint.as_deref(), Some(e) if e.trim().is_empty()) {
            return Err(Error::Config("endpoint must not be empty".into()));
        }
        if self.initial_backoff_ms > self.max_backoff_ms {
            return Err(Error::Config(format!(
                "initial_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.initial_backoff_ms, self.max_backoff_ms
            )));
        }
        Ok(())
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved Foreman config to {}", self.config_path.display());
        Ok(())
    }

    pub fn service_endpoint(&self) -> String {
        self.endpoint
            .clone()
            .unwrap_or_else(|| format!("https://forecast.{}.amazonaws.com", self.region))
    }

    pub fn query_service_endpoint(&self) -> String {
        self.query_endpoint
            .clone()
            .unwrap_or_else(|| format!("https://forecastquery.{}.amazonaws.com", self.region))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Parse a max-wait value in seconds; `unbounded` (or `none`) disables the guard.
pub fn parse_max_wait(raw: &str) -> Result<Option<u64>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("unbounded") || raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    raw.parse::<u64>()
        .map(Some)
        .map_err(|_| Error::Config(format!("Invalid max wait '{}': expected seconds or 'unbounded'", raw)))
}
