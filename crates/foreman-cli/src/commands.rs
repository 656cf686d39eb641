//! Subcommand handlers.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _};
use foreman_core::{Error, ForecastService, ResourceHandle, ResourceKind};
use foreman_runtime::{NullSink, Orchestrator};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::cli::Commands;
use crate::render::Renderer;

/// Describes that may still report the pre-delete status before the
/// deletion becomes visible.
const DELETE_SETTLE_PROBES: u32 = 3;

/// Everything a subcommand needs.
pub struct Context {
    pub service: Arc<dyn ForecastService>,
    pub orchestrator: Orchestrator,
    pub renderer: Renderer,
    pub json: bool,
}

pub async fn run(command: Commands, ctx: &Context) -> anyhow::Result<()> {
    match command {
        Commands::Create { kind, params, wait } => create(ctx, kind, &params, wait).await,
        Commands::Wait { kind, arn } => wait(ctx, kind, ResourceHandle::new(arn)).await,
        Commands::WaitAll { targets } => wait_all(ctx, &targets).await,
        Commands::Delete { kind, arn, wait } => {
            delete(ctx, kind, ResourceHandle::new(arn), wait).await
        }
        Commands::Evaluations {
            monitor,
            max_results,
        } => {
            let evaluations = ctx
                .service
                .list_monitor_evaluations(&ResourceHandle::new(monitor), max_results)
                .await?;
            if ctx.json {
                println!("{}", ctx.renderer.json(&serde_json::to_value(&evaluations)?));
            } else {
                print!("{}", ctx.renderer.evaluations(&evaluations));
            }
            Ok(())
        }
        Commands::Metrics { predictor } => {
            let metrics = ctx
                .service
                .get_accuracy_metrics(&ResourceHandle::new(predictor))
                .await?;
            println!("{}", ctx.renderer.json(&metrics));
            Ok(())
        }
        Commands::Query { forecast, filters } => {
            let filters: BTreeMap<String, String> = filters.into_iter().collect();
            let result = ctx
                .service
                .query_forecast(&ResourceHandle::new(forecast), &filters)
                .await?;
            if ctx.json {
                println!("{}", ctx.renderer.json(&serde_json::to_value(&result)?));
            } else {
                print!("{}", ctx.renderer.forecast(&result));
            }
            Ok(())
        }
    }
}

/// Inline JSON, or `@path` naming a JSON file.
pub fn read_params(raw: &str) -> anyhow::Result<Value> {
    let text = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(Path::new(path))
            .with_context(|| format!("Failed to read parameters from {}", path))?,
        None => raw.to_string(),
    };
    let params: Value = serde_json::from_str(&text).context("Parameters are not valid JSON")?;
    if !params.is_object() {
        bail!("Parameters must be a JSON object");
    }
    Ok(params)
}

async fn create(ctx: &Context, kind: ResourceKind, params: &str, wait: bool) -> anyhow::Result<()> {
    let params = read_params(params)?;

    if !wait {
        let handle = ctx.service.submit(kind, params).await?;
        info!("Submitted {} {}", kind, handle);
        if ctx.json {
            println!("{}", json!({ "kind": kind, "arn": handle }));
        } else {
            // Unmasked: the ARN is what later commands take as input.
            println!("{}", handle);
        }
        return Ok(());
    }

    let (handle, report) = ctx
        .orchestrator
        .create_and_wait(ctx.service.as_ref(), kind, params)
        .await?;
    if ctx.json {
        println!("{}", ctx.renderer.json(&ctx.renderer.report_json(handle.as_str(), &report)));
    } else {
        println!("{}", handle);
        println!("{}", ctx.renderer.report(handle.as_str(), &report));
    }
    Ok(())
}

async fn wait(ctx: &Context, kind: ResourceKind, handle: ResourceHandle) -> anyhow::Result<()> {
    let report = ctx.orchestrator.track(ctx.service.as_ref(), kind, &handle).await?;
    if ctx.json {
        println!("{}", ctx.renderer.json(&ctx.renderer.report_json(handle.as_str(), &report)));
    } else {
        println!("{}", ctx.renderer.report(handle.as_str(), &report));
    }
    Ok(())
}

async fn wait_all(ctx: &Context, targets: &[(ResourceKind, ResourceHandle)]) -> anyhow::Result<()> {
    // Interleaved dots from concurrent waits are unreadable; report per target instead.
    let orchestrator = ctx.orchestrator.clone().with_sink(Arc::new(NullSink));
    let results = orchestrator.wait_all(ctx.service.as_ref(), targets).await;

    let mut failures = 0usize;
    let mut out = Vec::with_capacity(results.len());
    for ((kind, handle), result) in targets.iter().zip(results) {
        match result {
            Ok(report) => {
                if ctx.json {
                    out.push(ctx.renderer.report_json(handle.as_str(), &report));
                } else {
                    println!("{}", ctx.renderer.report(handle.as_str(), &report));
                }
            }
            Err(e) => {
                failures += 1;
                warn!("Wait for {} {} failed: {}", kind, handle, e);
                let message = ctx.renderer.text(&e.to_string());
                if ctx.json {
                    out.push(json!({ "resource": ctx.renderer.text(handle.as_str()), "error": message }));
                } else {
                    println!("{} ERROR {}", ctx.renderer.text(handle.as_str()), message);
                }
            }
        }
    }
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    }

    if failures > 0 {
        bail!("{} of {} waits did not succeed", failures, targets.len());
    }
    Ok(())
}

async fn delete(
    ctx: &Context,
    kind: ResourceKind,
    handle: ResourceHandle,
    wait: bool,
) -> anyhow::Result<()> {
    ctx.service.delete(kind, &handle).await?;
    info!("Delete requested for {} {}", kind, handle);
    if !wait {
        println!("{} DELETE_REQUESTED", ctx.renderer.text(handle.as_str()));
        return Ok(());
    }

    wait_until_gone(
        &ctx.orchestrator,
        ctx.service.as_ref(),
        kind,
        &handle,
        &ctx.renderer,
    )
    .await?;
    println!("{} DELETED", ctx.renderer.text(handle.as_str()));
    Ok(())
}

/// Track a deleted resource until describe stops finding it.
///
/// A settled status right after the delete call is re-probed a bounded
/// number of times before giving up.
pub(crate) async fn wait_until_gone<S>(
    orchestrator: &Orchestrator,
    service: &S,
    kind: ResourceKind,
    handle: &ResourceHandle,
    renderer: &Renderer,
) -> anyhow::Result<()>
where
    S: ForecastService + ?Sized,
{
    let mut stale = 0u32;
    loop {
        match orchestrator.track(service, kind, handle).await {
            Err(Error::NotFound(_)) => return Ok(()),
            Ok(report) => {
                stale += 1;
                if stale >= DELETE_SETTLE_PROBES {
                    bail!(
                        "{} is still present with status {}",
                        renderer.text(handle.as_str()),
                        report.status()
                    );
                }
                debug!(
                    "{} still reports {} after delete, probing again",
                    handle,
                    report.status()
                );
                tokio::time::sleep(orchestrator.options().interval).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
