//! Foreman HTTP client
//!
//! [`HttpForecastService`] implements [`foreman_core::ForecastService`] against
//! the forecasting service's JSON-over-POST API.

pub mod service;
pub mod wire;

pub use service::HttpForecastService;
