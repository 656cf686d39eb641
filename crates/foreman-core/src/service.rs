//! Port to the managed forecasting service.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ForecastQueryResult, MonitorEvaluation, Observation, ResourceHandle, ResourceKind};

/// Request/response operations of the forecasting service.
///
/// Implementations hold their own client and credentials; nothing in Foreman
/// keeps a process-wide session. Probe errors worth retrying must surface as
/// [`crate::Error::Transient`].
#[async_trait]
pub trait ForecastService: Send + Sync {
    /// Issue a create call. Not idempotent: callers must not resubmit blindly.
    async fn submit(&self, kind: ResourceKind, params: serde_json::Value) -> Result<ResourceHandle>;

    /// One describe call. No side effects on the resource.
    async fn describe(&self, kind: ResourceKind, handle: &ResourceHandle) -> Result<Observation>;

    async fn delete(&self, kind: ResourceKind, handle: &ResourceHandle) -> Result<()>;

    /// Monitor evaluations for a monitor, newest first, across all pages.
    async fn list_monitor_evaluations(
        &self,
        monitor: &ResourceHandle,
        max_results: Option<u32>,
    ) -> Result<Vec<MonitorEvaluation>>;

    /// Backtest accuracy metrics of a predictor, as returned by the service.
    async fn get_accuracy_metrics(&self, predictor: &ResourceHandle) -> Result<serde_json::Value>;

    async fn query_forecast(
        &self,
        forecast: &ResourceHandle,
        filters: &BTreeMap<String, String>,
    ) -> Result<ForecastQueryResult>;
}
