//! Foreman — create forecasting resources and wait for them to settle.

use std::sync::Arc;

use clap::Parser;
use foreman_client::HttpForecastService;
use foreman_core::{config::parse_max_wait, ForemanConfig};
use foreman_runtime::{CancelToken, NullSink, Orchestrator, ProgressSink, StdoutSink};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod render;

use cli::Cli;
use commands::Context;
use render::Renderer;

/// File config, then `FOREMAN_*` env, then command-line flags.
fn load_config(cli: &Cli) -> anyhow::Result<ForemanConfig> {
    let mut config = ForemanConfig::load(&cli.config)?;
    if let Some(region) = &cli.region {
        config.region = region.clone();
    }
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(interval) = cli.interval {
        config.poll_interval_secs = interval;
    }
    if let Some(max_wait) = &cli.max_wait {
        config.max_wait_secs = parse_max_wait(max_wait)?;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries progress and results.
    let default_level = if cli.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    info!("Using endpoint {}", config.service_endpoint());

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping at the next poll boundary");
            on_signal.cancel();
        }
    });

    let sink: Arc<dyn ProgressSink> = if cli.no_progress || cli.json {
        Arc::new(NullSink)
    } else {
        Arc::new(StdoutSink)
    };
    let ctx = Context {
        service: Arc::new(HttpForecastService::from_config(&config)?),
        orchestrator: Orchestrator::from_config(&config)
            .with_sink(sink)
            .with_cancel_token(cancel),
        renderer: Renderer::new(!cli.show_accounts),
        json: cli.json,
    };

    commands::run(cli.command, &ctx).await
}
