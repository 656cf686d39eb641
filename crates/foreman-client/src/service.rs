//! `ForecastService` over HTTP.
//!
//! Every operation is a POST of a JSON body to the service endpoint, with the
//! action named in the `X-Amz-Target` header. Forecast queries go to a
//! separate endpoint under their own target prefix.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use foreman_core::{
    Error, ForecastQueryResult, ForecastService, ForemanConfig, MonitorEvaluation, Observation,
    ResourceHandle, ResourceKind, Result,
};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::wire::{self, FORECAST_TARGET_PREFIX, QUERY_TARGET_PREFIX};

const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Reqwest-backed client for the forecasting service.
#[derive(Clone)]
pub struct HttpForecastService {
    client: Client,
    endpoint: String,
    query_endpoint: String,
    api_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct EvaluationsPage {
    #[serde(default)]
    predictor_monitor_evaluations: Vec<MonitorEvaluation>,
    #[serde(default)]
    next_token: Option<String>,
}

impl HttpForecastService {
    pub fn from_config(config: &ForemanConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Http(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(client, config))
    }

    /// Use a caller-supplied client (shared connection pool, custom TLS).
    pub fn with_client(client: Client, config: &ForemanConfig) -> Self {
        Self {
            client,
            endpoint: config.service_endpoint(),
            query_endpoint: config.query_service_endpoint(),
            api_token: config.api_token.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, endpoint: &str, target: String, body: &Value) -> Result<Value> {
        debug!("POST {} {}", endpoint, target);
        let mut request = self
            .client
            .post(endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static(wire::CONTENT_TYPE))
            .header("X-Amz-Target", target.as_str())
            .body(serde_json::to_vec(body)?);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(wire::transport_error)?;
        let status = response.status();
        let text = response.text().await.map_err(wire::transport_error)?;

        if !status.is_success() {
            let err = wire::classify_error(status.as_u16(), &text);
            warn!("{} failed with HTTP {}: {}", target, status.as_u16(), err);
            return Err(err);
        }
        if text.trim().is_empty() {
            return Ok(json!({}));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn forecast_call(&self, action: &str, body: Value) -> Result<Value> {
        self.call(&self.endpoint, wire::target(FORECAST_TARGET_PREFIX, action), &body)
            .await
    }
}

#[async_trait]
impl ForecastService for HttpForecastService {
    async fn submit(&self, kind: ResourceKind, params: Value) -> Result<ResourceHandle> {
        if !params.is_object() {
            return Err(Error::Config(format!(
                "{} parameters must be a JSON object",
                kind.create_action()
            )));
        }
        let response = self.forecast_call(&kind.create_action(), params).await?;
        response
            .get(kind.arn_field())
            .and_then(Value::as_str)
            .map(ResourceHandle::new)
            .ok_or_else(|| {
                Error::Http(format!(
                    "{} response has no {}",
                    kind.create_action(),
                    kind.arn_field()
                ))
            })
    }

    async fn describe(&self, kind: ResourceKind, handle: &ResourceHandle) -> Result<Observation> {
        let body = json!({ (kind.arn_field()): handle.as_str() });
        let payload = self.forecast_call(&kind.describe_action(), body).await?;
        Observation::from_payload(payload).ok_or_else(|| Error::UnexpectedStatus {
            resource: handle.to_string(),
            status: "<missing>".to_string(),
        })
    }

    async fn delete(&self, kind: ResourceKind, handle: &ResourceHandle) -> Result<()> {
        let body = json!({ (kind.arn_field()): handle.as_str() });
        self.forecast_call(&kind.delete_action(), body).await?;
        Ok(())
    }

    async fn list_monitor_evaluations(
        &self,
        monitor: &ResourceHandle,
        max_results: Option<u32>,
    ) -> Result<Vec<MonitorEvaluation>> {
        if max_results == Some(0) {
            return Ok(Vec::new());
        }
        let mut evaluations = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut body = json!({ "MonitorArn": monitor.as_str() });
            if let Some(max) = max_results {
                let remaining = (max as usize).saturating_sub(evaluations.len());
                body["MaxResults"] = json!(remaining);
            }
            if let Some(token) = &next_token {
                body["NextToken"] = json!(token);
            }

            let response = self.forecast_call("ListMonitorEvaluations", body).await?;
            let page: EvaluationsPage = serde_json::from_value(response)?;
            evaluations.extend(page.predictor_monitor_evaluations);

            if let Some(max) = max_results {
                if evaluations.len() >= max as usize {
                    evaluations.truncate(max as usize);
                    break;
                }
            }
            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        debug!("{} evaluations for {}", evaluations.len(), monitor);
        Ok(evaluations)
    }

    async fn get_accuracy_metrics(&self, predictor: &ResourceHandle) -> Result<Value> {
        self.forecast_call("GetAccuracyMetrics", json!({ "PredictorArn": predictor.as_str() }))
            .await
    }

    async fn query_forecast(
        &self,
        forecast: &ResourceHandle,
        filters: &BTreeMap<String, String>,
    ) -> Result<ForecastQueryResult> {
        let body = json!({ "ForecastArn": forecast.as_str(), "Filters": filters });
        let response = self
            .call(
                &self.query_endpoint,
                wire::target(QUERY_TARGET_PREFIX, "QueryForecast"),
                &body,
            )
            .await?;
        let forecast_body = response.get("Forecast").cloned().unwrap_or_else(|| json!({}));
        Ok(serde_json::from_value(forecast_body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const PREDICTOR: &str = "arn:aws:forecast:us-east-1:123456789012:predictor/demand";
    const MONITOR: &str = "arn:aws:forecast:us-east-1:123456789012:monitor/demand-monitor";

    fn service_for(server: &mockito::ServerGuard) -> HttpForecastService {
        let config = ForemanConfig {
            endpoint: Some(server.url()),
            query_endpoint: Some(server.url()),
            api_token: Some("test-token".to_string()),
            ..ForemanConfig::default()
        };
        HttpForecastService::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_describe_sends_target_and_arn() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-amz-target", "AmazonForecast.DescribeAutoPredictor")
            .match_header("content-type", "application/x-amz-json-1.1")
            .match_header("authorization", "Bearer test-token")
            .match_body(Matcher::Json(json!({ "PredictorArn": PREDICTOR })))
            .with_status(200)
            .with_body(r#"{"PredictorArn":"arn","Status":"CREATE_IN_PROGRESS"}"#)
            .create_async()
            .await;

        let service = service_for(&server);
        let obs = service
            .describe(ResourceKind::AutoPredictor, &ResourceHandle::new(PREDICTOR))
            .await
            .unwrap();
        assert_eq!(obs.status, "CREATE_IN_PROGRESS");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_describe_without_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"PredictorArn":"arn"}"#)
            .create_async()
            .await;

        let err = service_for(&server)
            .describe(ResourceKind::AutoPredictor, &ResourceHandle::new(PREDICTOR))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnexpectedStatus { .. }));
    }

    #[tokio::test]
    async fn test_throttling_is_transient() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(400)
            .with_body(r#"{"__type":"ThrottlingException","message":"Rate exceeded"}"#)
            .create_async()
            .await;

        let err = service_for(&server)
            .describe(ResourceKind::Predictor, &ResourceHandle::new(PREDICTOR))
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(400)
            .with_body(r#"{"__type":"ResourceNotFoundException","message":"gone"}"#)
            .create_async()
            .await;

        let err = service_for(&server)
            .delete(ResourceKind::Predictor, &ResourceHandle::new(PREDICTOR))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(ref m) if m == "gone"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let config = ForemanConfig {
            endpoint: Some("http://127.0.0.1:1".to_string()),
            ..ForemanConfig::default()
        };
        let service = HttpForecastService::from_config(&config).unwrap();
        let err = service
            .describe(ResourceKind::Dataset, &ResourceHandle::new("arn"))
            .await
            .unwrap_err();
        assert!(err.is_transient(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_submit_returns_arn() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-amz-target", "AmazonForecast.CreateDatasetGroup")
            .match_body(Matcher::PartialJson(json!({ "DatasetGroupName": "retail" })))
            .with_status(200)
            .with_body(r#"{"DatasetGroupArn":"arn:aws:forecast:us-east-1:123456789012:dataset-group/retail"}"#)
            .create_async()
            .await;

        let handle = service_for(&server)
            .submit(
                ResourceKind::DatasetGroup,
                json!({ "DatasetGroupName": "retail", "Domain": "RETAIL" }),
            )
            .await
            .unwrap();
        assert_eq!(
            handle.as_str(),
            "arn:aws:forecast:us-east-1:123456789012:dataset-group/retail"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_submit_rejects_non_object() {
        let server = mockito::Server::new_async().await;
        let err = service_for(&server)
            .submit(ResourceKind::Dataset, json!(["not", "an", "object"]))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_monitor_evaluations_follow_next_token() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/")
            .match_header("x-amz-target", "AmazonForecast.ListMonitorEvaluations")
            .match_body(Matcher::Json(json!({ "MonitorArn": MONITOR })))
            .with_status(200)
            .with_body(
                json!({
                    "PredictorMonitorEvaluations": [
                        { "EvaluationState": "SUCCESS", "NumItemsEvaluated": 10 }
                    ],
                    "NextToken": "page-2"
                })
                .to_string(),
            )
            .create_async()
            .await;
        let second = server
            .mock("POST", "/")
            .match_body(Matcher::Json(json!({ "MonitorArn": MONITOR, "NextToken": "page-2" })))
            .with_status(200)
            .with_body(
                json!({
                    "PredictorMonitorEvaluations": [
                        { "EvaluationState": "FAILURE", "Message": "no data" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let evaluations = service_for(&server)
            .list_monitor_evaluations(&ResourceHandle::new(MONITOR), None)
            .await
            .unwrap();
        assert_eq!(evaluations.len(), 2);
        assert_eq!(evaluations[0].num_items_evaluated, Some(10));
        assert_eq!(evaluations[1].message.as_deref(), Some("no data"));
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_monitor_evaluations_respect_max_results() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "MaxResults": 1 })))
            .with_status(200)
            .with_body(
                json!({
                    "PredictorMonitorEvaluations": [
                        { "EvaluationState": "SUCCESS" },
                        { "EvaluationState": "SUCCESS" }
                    ],
                    "NextToken": "more"
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let evaluations = service_for(&server)
            .list_monitor_evaluations(&ResourceHandle::new(MONITOR), Some(1))
            .await
            .unwrap();
        assert_eq!(evaluations.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_zero_max_results_skips_the_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .with_status(400)
            .with_body(r#"{"__type":"ValidationException","message":"MaxResults must be at least 1"}"#)
            .expect(0)
            .create_async()
            .await;

        let evaluations = service_for(&server)
            .list_monitor_evaluations(&ResourceHandle::new(MONITOR), Some(0))
            .await
            .unwrap();
        assert!(evaluations.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_forecast_uses_runtime_target() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-amz-target", "AmazonForecastRuntime.QueryForecast")
            .match_body(Matcher::PartialJson(json!({ "Filters": { "item_id": "sku-1" } })))
            .with_status(200)
            .with_body(
                json!({
                    "Forecast": {
                        "Predictions": {
                            "p50": [ { "Timestamp": "2026-01-01T00:00:00", "Value": 12.5 } ]
                        }
                    }
                })
                .to_string(),
            )
            .create_async()
            .await;

        let mut filters = BTreeMap::new();
        filters.insert("item_id".to_string(), "sku-1".to_string());
        let result = service_for(&server)
            .query_forecast(&ResourceHandle::new("arn:forecast"), &filters)
            .await
            .unwrap();
        assert_eq!(result.predictions["p50"][0].value, 12.5);
        mock.assert_async().await;
    }
}
