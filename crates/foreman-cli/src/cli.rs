//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use foreman_core::{ResourceHandle, ResourceKind};

#[derive(Debug, Parser)]
#[command(
    name = "foreman",
    about = "Create forecasting resources and wait for them to settle",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Config file
    #[arg(long, global = true, env = "FOREMAN_CONFIG", default_value = "foreman.json")]
    pub config: PathBuf,

    /// Service region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Service endpoint URL (default: derived from the region)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// Seconds between status probes
    #[arg(long, global = true, value_name = "SECS")]
    pub interval: Option<u64>,

    /// Give up after this many seconds, or `unbounded`
    #[arg(long, global = true, value_name = "SECS|unbounded")]
    pub max_wait: Option<String>,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Do not print progress dots
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Print account ids in ARNs instead of masking them
    #[arg(long, global = true)]
    pub show_accounts: bool,

    /// Output as JSON
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Submit a create request, optionally waiting for the resource
    Create {
        /// Resource kind (dataset-group, dataset, dataset-import-job, predictor, ...)
        kind: ResourceKind,
        /// Request parameters: inline JSON, or @path to a JSON file
        params: String,
        /// Wait until the resource reaches a terminal status
        #[arg(long)]
        wait: bool,
    },

    /// Wait for an existing resource to reach a terminal status
    Wait {
        kind: ResourceKind,
        arn: String,
    },

    /// Wait for several resources concurrently
    WaitAll {
        /// Targets as kind:arn
        #[arg(required = true, value_parser = parse_target)]
        targets: Vec<(ResourceKind, ResourceHandle)>,
    },

    /// Delete a resource
    Delete {
        kind: ResourceKind,
        arn: String,
        /// Wait until the resource is gone
        #[arg(long)]
        wait: bool,
    },

    /// List predictor monitor evaluations
    Evaluations {
        /// Monitor ARN
        monitor: String,
        #[arg(long)]
        max_results: Option<u32>,
    },

    /// Show backtest accuracy metrics of a predictor
    Metrics {
        /// Predictor ARN
        predictor: String,
    },

    /// Query forecast values for one series
    Query {
        /// Forecast ARN
        forecast: String,
        /// Filter as key=value, e.g. item_id=sku-1 (repeatable)
        #[arg(long = "filter", required = true, value_parser = parse_filter)]
        filters: Vec<(String, String)>,
    },
}

/// `kind:arn`. The kind never contains a colon, so split at the first one.
pub fn parse_target(raw: &str) -> Result<(ResourceKind, ResourceHandle), String> {
    let (kind, arn) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected kind:arn, got '{}'", raw))?;
    let kind: ResourceKind = kind.parse().map_err(|e| format!("{}", e))?;
    if arn.trim().is_empty() {
        return Err(format!("missing ARN in '{}'", raw));
    }
    Ok((kind, ResourceHandle::new(arn.trim())))
}

pub fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}
