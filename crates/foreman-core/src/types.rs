//! Resource handles, kinds, observations and read-only service records.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Opaque identifier (an ARN) returned by a create call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ResourceHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResourceHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kinds of resources the forecasting service manages asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    DatasetGroup,
    Dataset,
    DatasetImportJob,
    Predictor,
    /// Predictor created through the AutoML entry point.
    AutoPredictor,
    PredictorBacktestExportJob,
    Forecast,
    ForecastExportJob,
    Monitor,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 9] = [
        Self::DatasetGroup,
        Self::Dataset,
        Self::DatasetImportJob,
        Self::Predictor,
        Self::AutoPredictor,
        Self::PredictorBacktestExportJob,
        Self::Forecast,
        Self::ForecastExportJob,
        Self::Monitor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::DatasetGroup => "dataset-group",
            Self::Dataset => "dataset",
            Self::DatasetImportJob => "dataset-import-job",
            Self::Predictor => "predictor",
            Self::AutoPredictor => "auto-predictor",
            Self::PredictorBacktestExportJob => "predictor-backtest-export-job",
            Self::Forecast => "forecast",
            Self::ForecastExportJob => "forecast-export-job",
            Self::Monitor => "monitor",
        }
    }

    /// Service name of the resource, as used in API action names.
    fn api_name(&self) -> &'static str {
        match self {
            Self::DatasetGroup => "DatasetGroup",
            Self::Dataset => "Dataset",
            Self::DatasetImportJob => "DatasetImportJob",
            Self::Predictor => "Predictor",
            Self::AutoPredictor => "AutoPredictor",
            Self::PredictorBacktestExportJob => "PredictorBacktestExportJob",
            Self::Forecast => "Forecast",
            Self::ForecastExportJob => "ForecastExportJob",
            Self::Monitor => "Monitor",
        }
    }

    pub fn create_action(&self) -> String {
        format!("Create{}", self.api_name())
    }

    pub fn describe_action(&self) -> String {
        format!("Describe{}", self.api_name())
    }

    pub fn delete_action(&self) -> String {
        match self {
            // Auto predictors are deleted through the plain predictor call.
            Self::AutoPredictor => "DeletePredictor".to_string(),
            _ => format!("Delete{}", self.api_name()),
        }
    }

    /// Request/response field carrying this kind's ARN.
    pub fn arn_field(&self) -> &'static str {
        match self {
            Self::DatasetGroup => "DatasetGroupArn",
            Self::Dataset => "DatasetArn",
            Self::DatasetImportJob => "DatasetImportJobArn",
            Self::Predictor | Self::AutoPredictor => "PredictorArn",
            Self::PredictorBacktestExportJob => "PredictorBacktestExportJobArn",
            Self::Forecast => "ForecastArn",
            Self::ForecastExportJob => "ForecastExportJobArn",
            Self::Monitor => "MonitorArn",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|k| k.label() == normalized)
            .ok_or_else(|| Error::Config(format!("Unknown resource kind: {}", s)))
    }
}

/// Result of one describe call: the raw status plus the full response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub status: String,
    pub payload: serde_json::Value,
}

impl Observation {
    pub fn new(status: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            status: status.into(),
            payload,
        }
    }

    /// Build from a describe response, reading its `Status` field.
    pub fn from_payload(payload: serde_json::Value) -> Option<Self> {
        let status = payload.get("Status")?.as_str()?.to_string();
        Some(Self { status, payload })
    }

    /// Failure reason reported by the service, if any.
    pub fn reason(&self) -> Option<&str> {
        self.payload.get("Message").and_then(|m| m.as_str())
    }
}

// ---------------------------------------------------------------
// Monitor evaluations
// ---------------------------------------------------------------

/// One predictor-monitor evaluation produced by the service.
///
/// Display only; nothing in Foreman interprets the metric values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitorEvaluation {
    #[serde(default)]
    pub resource_arn: Option<String>,
    #[serde(default)]
    pub monitor_arn: Option<String>,
    #[serde(default, with = "epoch_seconds")]
    pub evaluation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub evaluation_state: Option<String>,
    #[serde(default, with = "epoch_seconds")]
    pub window_start_datetime: Option<DateTime<Utc>>,
    #[serde(default, with = "epoch_seconds")]
    pub window_end_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub predictor_event: Option<PredictorEvent>,
    #[serde(default)]
    pub monitor_data_source: Option<MonitorDataSource>,
    #[serde(default)]
    pub metric_results: Vec<MetricResult>,
    #[serde(default)]
    pub num_items_evaluated: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl MonitorEvaluation {
    /// The most specific data source the evaluation was computed from.
    pub fn data_source(&self) -> Option<&str> {
        let source = self.monitor_data_source.as_ref()?;
        source
            .dataset_import_job_arn
            .as_deref()
            .or(source.forecast_arn.as_deref())
            .or(source.predictor_arn.as_deref())
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metric_results
            .iter()
            .find(|m| m.metric_name.as_deref() == Some(name))
            .and_then(|m| m.metric_value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MonitorDataSource {
    #[serde(default)]
    pub dataset_import_job_arn: Option<String>,
    #[serde(default)]
    pub forecast_arn: Option<String>,
    #[serde(default)]
    pub predictor_arn: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PredictorEvent {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default, with = "epoch_seconds")]
    pub datetime: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricResult {
    #[serde(default)]
    pub metric_name: Option<String>,
    #[serde(default)]
    pub metric_value: Option<f64>,
}

// ---------------------------------------------------------------
// Forecast queries
// ---------------------------------------------------------------

/// Forecast values per statistic (`p10`, `p50`, `p90`, `mean`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ForecastQueryResult {
    #[serde(default)]
    pub predictions: BTreeMap<String, Vec<DataPoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataPoint {
    pub timestamp: String,
    pub value: f64,
}

/// Optional epoch-second timestamps, the service's wire format for dates.
mod epoch_seconds {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(dt) => serializer.serialize_f64(dt.timestamp_millis() as f64 / 1000.0),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<f64>::deserialize(deserializer)?;
        Ok(secs.and_then(|s| DateTime::<Utc>::from_timestamp_millis((s * 1000.0).round() as i64)))
    }
}
