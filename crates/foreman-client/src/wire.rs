//! JSON protocol details: targets, headers, error bodies.

use foreman_core::Error;
use serde::Deserialize;

pub const CONTENT_TYPE: &str = "application/x-amz-json-1.1";
pub const FORECAST_TARGET_PREFIX: &str = "AmazonForecast";
pub const QUERY_TARGET_PREFIX: &str = "AmazonForecastRuntime";

/// Error codes the service uses for throttling and temporary unavailability.
const TRANSIENT_CODES: &[&str] = &[
    "ThrottlingException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "ServiceUnavailable",
    "ServiceUnavailableException",
    "InternalServerError",
    "InternalFailure",
];

pub fn target(prefix: &str, action: &str) -> String {
    format!("{}.{}", prefix, action)
}

/// Error body returned alongside non-2xx responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "__type")]
    error_type: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// Map a non-2xx response onto the error taxonomy.
pub fn classify_error(status: u16, body: &str) -> Error {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    // `__type` may be namespaced: "com.amazonaws.forecast#ThrottlingException"
    let code = parsed
        .error_type
        .as_deref()
        .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
        .unwrap_or_else(|| format!("HTTP{}", status));
    let message = parsed.message.unwrap_or_else(|| body.trim().to_string());

    if status == 429 || status >= 500 || TRANSIENT_CODES.contains(&code.as_str()) {
        Error::Transient(format!("{}: {}", code, message))
    } else if code == "ResourceNotFoundException" || status == 404 {
        Error::NotFound(message)
    } else {
        Error::Service { code, message }
    }
}

/// Transport failures are retryable; anything else about the exchange is not.
pub fn transport_error(err: reqwest::Error) -> Error {
    if err.is_decode() || err.is_builder() {
        Error::Http(err.to_string())
    } else {
        Error::Transient(format!("Request failed: {}", err))
    }
}
