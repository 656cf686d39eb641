//! Foreman Core — resource model, status vocabulary, service port, configuration.

pub mod arn;
pub mod config;
pub mod error;
pub mod service;
pub mod status;
pub mod types;

pub use arn::{mask_accounts, mask_json, Arn};
pub use config::ForemanConfig;
pub use error::{Error, Result};
pub use service::ForecastService;
pub use status::{ForecastVocabulary, ResourceStatus, StatusClass, StatusVocabulary};
pub use types::*;
