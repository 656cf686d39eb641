//! Human-readable output: tables, pretty JSON, account masking.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use foreman_core::{mask_accounts, mask_json, ForecastQueryResult, MonitorEvaluation};
use foreman_runtime::PollReport;
use serde_json::{json, Value};

/// Renders command output, masking ARN account ids unless told otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    pub mask: bool,
}

impl Renderer {
    pub fn new(mask: bool) -> Self {
        Self { mask }
    }

    pub fn text(&self, s: &str) -> String {
        if self.mask {
            mask_accounts(s)
        } else {
            s.to_string()
        }
    }

    pub fn json(&self, value: &Value) -> String {
        let value = if self.mask { mask_json(value) } else { value.clone() };
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
    }

    /// One-line summary of a finished wait.
    pub fn report(&self, resource: &str, report: &PollReport) -> String {
        format!(
            "{} {} after {} probes in {}",
            self.text(resource),
            report.status(),
            report.probes,
            format_elapsed(report.elapsed.as_secs())
        )
    }

    pub fn report_json(&self, resource: &str, report: &PollReport) -> Value {
        let body = json!({
            "resource": resource,
            "status": report.status(),
            "probes": report.probes,
            "sleeps": report.sleeps,
            "retries": report.retries,
            "elapsedSecs": report.elapsed.as_secs_f64(),
            "payload": report.observation.payload,
        });
        if self.mask {
            mask_json(&body)
        } else {
            body
        }
    }

    pub fn evaluations(&self, evaluations: &[MonitorEvaluation]) -> String {
        if evaluations.is_empty() {
            return "No evaluations\n".to_string();
        }
        let header = vec![
            "EVALUATED".to_string(),
            "STATE".to_string(),
            "WINDOW".to_string(),
            "SOURCE".to_string(),
            "ITEMS".to_string(),
            "METRICS".to_string(),
        ];
        let mut rows = vec![header];
        for e in evaluations {
            let window = match (e.window_start_datetime, e.window_end_datetime) {
                (Some(start), Some(end)) => format!("{} .. {}", fmt_time(start), fmt_time(end)),
                _ => "-".to_string(),
            };
            let metrics = e
                .metric_results
                .iter()
                .filter_map(|m| Some(format!("{}={:.4}", m.metric_name.as_deref()?, m.metric_value?)))
                .collect::<Vec<_>>()
                .join(",");
            rows.push(vec![
                e.evaluation_time.map(fmt_time).unwrap_or_else(|| "-".into()),
                e.evaluation_state.clone().unwrap_or_else(|| "-".into()),
                window,
                e.data_source().map(|s| self.text(s)).unwrap_or_else(|| "-".into()),
                e.num_items_evaluated
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".into()),
                if metrics.is_empty() { "-".into() } else { metrics },
            ]);
        }
        table(&rows)
    }

    /// One row per timestamp, one column per statistic.
    pub fn forecast(&self, result: &ForecastQueryResult) -> String {
        if result.predictions.is_empty() {
            return "No predictions\n".to_string();
        }
        let timestamps: BTreeSet<&str> = result
            .predictions
            .values()
            .flatten()
            .map(|p| p.timestamp.as_str())
            .collect();

        let mut header = vec!["TIMESTAMP".to_string()];
        header.extend(result.predictions.keys().cloned());
        let mut rows = vec![header];
        for ts in timestamps {
            let mut row = vec![ts.to_string()];
            for points in result.predictions.values() {
                let cell = points
                    .iter()
                    .find(|p| p.timestamp == ts)
                    .map(|p| format!("{:.3}", p.value))
                    .unwrap_or_else(|| "-".into());
                row.push(cell);
            }
            rows.push(row);
        }
        table(&rows)
    }
}

fn fmt_time(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M").to_string()
}

pub fn format_elapsed(secs: u64) -> String {
    match secs {
        s if s < 60 => format!("{}s", s),
        s if s < 3600 => format!("{}m{:02}s", s / 60, s % 60),
        s => format!("{}h{:02}m", s / 3600, (s % 3600) / 60),
    }
}

/// Left-aligned columns separated by two spaces.
fn table(rows: &[Vec<String>]) -> String {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..cols)
        .map(|c| {
            rows.iter()
                .filter_map(|r| r.get(c))
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    for row in rows {
        let line = row
            .iter()
            .enumerate()
            .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
            .collect::<Vec<_>>()
            .join("  ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreman_core::{DataPoint, Observation};
    use std::collections::BTreeMap;
    use std::time::Duration;

    const ARN: &str = "arn:aws:forecast:us-east-1:123456789012:predictor/demand";

    fn report(status: &str) -> PollReport {
        PollReport {
            observation: Observation::new(status, json!({ "PredictorArn": ARN, "Status": status })),
            probes: 4,
            sleeps: 3,
            retries: 0,
            elapsed: Duration::from_secs(95),
        }
    }

    #[test]
    fn test_report_line_masks_account() {
        let line = Renderer::new(true).report(ARN, &report("ACTIVE"));
        assert_eq!(
            line,
            "arn:aws:forecast:us-east-1:XXXXXXXXXXXX:predictor/demand ACTIVE after 4 probes in 1m35s"
        );
    }

    #[test]
    fn test_report_line_unmasked() {
        let line = Renderer::new(false).report(ARN, &report("ACTIVE"));
        assert!(line.contains("123456789012"));
    }

    #[test]
    fn test_report_json_masks_payload() {
        let body = Renderer::new(true).report_json(ARN, &report("ACTIVE"));
        assert_eq!(body["probes"], 4);
        assert!(!body.to_string().contains("123456789012"));
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(7), "7s");
        assert_eq!(format_elapsed(125), "2m05s");
        assert_eq!(format_elapsed(7260), "2h01m");
    }

    #[test]
    fn test_evaluations_table() {
        let evaluations: Vec<MonitorEvaluation> = serde_json::from_value(json!([
            {
                "EvaluationTime": 1_700_000_000.0,
                "EvaluationState": "SUCCESS",
                "MonitorDataSource": { "PredictorArn": ARN },
                "MetricResults": [ { "MetricName": "WAPE", "MetricValue": 0.125 } ],
                "NumItemsEvaluated": 42
            },
            { "EvaluationState": "FAILURE" }
        ]))
        .unwrap();
        let out = Renderer::new(true).evaluations(&evaluations);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("EVALUATED"));
        assert!(lines[1].contains("2023-11-14 22:13"));
        assert!(lines[1].contains("WAPE=0.1250"));
        assert!(lines[1].contains("XXXXXXXXXXXX"));
        assert!(lines[2].contains("FAILURE"));
    }

    #[test]
    fn test_empty_evaluations() {
        assert_eq!(Renderer::new(true).evaluations(&[]), "No evaluations\n");
    }

    #[test]
    fn test_forecast_table_aligns_statistics() {
        let mut predictions = BTreeMap::new();
        predictions.insert(
            "p10".to_string(),
            vec![
                DataPoint { timestamp: "2026-01-01T00:00:00".into(), value: 1.0 },
                DataPoint { timestamp: "2026-01-02T00:00:00".into(), value: 2.0 },
            ],
        );
        predictions.insert(
            "p90".to_string(),
            vec![DataPoint { timestamp: "2026-01-01T00:00:00".into(), value: 9.5 }],
        );
        let out = Renderer::new(true).forecast(&ForecastQueryResult { predictions });
        assert_eq!(
            out,
            "TIMESTAMP            p10    p90\n\
             2026-01-01T00:00:00  1.000  9.500\n\
             2026-01-02T00:00:00  2.000  -\n"
        );
    }
}
