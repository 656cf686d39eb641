//! Error types for Foreman.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The remote resource reached a terminal failure status.
    #[error("Resource {resource} failed with status {status}: {}", .reason.as_deref().unwrap_or("no reason reported"))]
    ResourceFailed {
        resource: String,
        status: String,
        reason: Option<String>,
        payload: serde_json::Value,
    },

    /// The wait guard expired while the resource was still non-terminal.
    #[error("Timed out after {waited:?} waiting for {resource} (last status: {})", .last_status.as_deref().unwrap_or("none"))]
    PollTimeout {
        resource: String,
        waited: Duration,
        last_status: Option<String>,
    },

    /// The describe call kept failing transiently until the retry budget ran out.
    #[error("Probe for {resource} unavailable after {attempts} attempts: {last_error}")]
    ProbeUnavailable {
        resource: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Unexpected status '{status}' reported for {resource}")]
    UnexpectedStatus { resource: String, status: String },

    #[error("Wait for {resource} was cancelled")]
    Cancelled { resource: String },

    #[error("Transient error: {0}")]
    Transient(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Service error {code}: {message}")]
    Service { code: String, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether a failed probe is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
