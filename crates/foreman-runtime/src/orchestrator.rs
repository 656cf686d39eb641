//! Orchestrator — drives asynchronous service resources to a terminal status.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use foreman_core::{
    Error, ForecastService, ForecastVocabulary, ForemanConfig, Observation, ResourceHandle,
    ResourceKind, Result, StatusClass, StatusVocabulary,
};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelToken;
use crate::progress::{Indicator, ProgressSink, StdoutSink};
use crate::types::{PollOptions, PollReport};

/// Polls describe-style probes until the resource settles.
///
/// Cheap to clone; clones share the progress sink and cancel token.
#[derive(Clone)]
pub struct Orchestrator {
    options: PollOptions,
    vocabulary: Arc<dyn StatusVocabulary>,
    sink: Arc<dyn ProgressSink>,
    cancel: Option<CancelToken>,
}

impl Orchestrator {
    /// Create an orchestrator using the forecasting service's status
    /// vocabulary and printing progress to stdout.
    pub fn new(options: PollOptions) -> Self {
        Self {
            options,
            vocabulary: Arc::new(ForecastVocabulary),
            sink: Arc::new(StdoutSink),
            cancel: None,
        }
    }

    pub fn from_config(config: &ForemanConfig) -> Self {
        let options = PollOptions::from_config(config);
        info!(
            "Orchestrator initialized: interval={:?}, max_wait={:?}, probe_retries={}",
            options.interval, options.max_wait, options.retry.max_retries
        );
        if options.max_wait.is_none() {
            warn!("Wait guard disabled: polls may block indefinitely");
        }
        Self::new(options)
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_vocabulary(mut self, vocabulary: Arc<dyn StatusVocabulary>) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Probe until the status is terminal.
    ///
    /// `resource` only labels logs and errors; `probe` closes over whatever it
    /// needs to issue one describe call. Returns the final observation on
    /// success. A failed resource, an unknown status, an exhausted retry
    /// budget, an expired guard, or cancellation end the wait with an error
    /// and no further probes.
    pub async fn wait<F, Fut>(&self, resource: &ResourceHandle, mut probe: F) -> Result<PollReport>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Observation>>,
    {
        let started = Instant::now();
        // A guard too large to represent as an instant never expires.
        let deadline = self
            .options
            .max_wait
            .and_then(|max| started.checked_add(max));
        let mut indicator = Indicator::new(self.sink.as_ref());
        let mut probes = 0u32;
        let mut sleeps = 0u32;
        let mut retries = 0u32;
        let mut last_status: Option<String> = None;

        info!("Waiting for {}", resource);

        loop {
            self.check_cancelled(resource)?;

            let Some(observation) = self
                .probe_with_retry(resource, &mut probe, &mut retries, deadline)
                .await?
            else {
                return Err(self.timed_out(resource, started, last_status, &mut indicator));
            };
            probes += 1;

            let Some(class) = self.vocabulary.classify(&observation.status) else {
                indicator.finish(&observation.status);
                error!("Unexpected status '{}' for {}", observation.status, resource);
                return Err(Error::UnexpectedStatus {
                    resource: resource.to_string(),
                    status: observation.status,
                });
            };
            debug!(
                "Probe {} for {}: {} ({})",
                probes, resource, observation.status, class
            );

            match class {
                StatusClass::Succeeded => {
                    indicator.finish(&observation.status);
                    let elapsed = started.elapsed();
                    info!(
                        "{} reached {} after {} probes in {:?}",
                        resource, observation.status, probes, elapsed
                    );
                    return Ok(PollReport {
                        observation,
                        probes,
                        sleeps,
                        retries,
                        elapsed,
                    });
                }
                StatusClass::Failed => {
                    indicator.finish(&observation.status);
                    let reason = observation.reason().map(str::to_string);
                    warn!(
                        "{} reached {}: {}",
                        resource,
                        observation.status,
                        reason.as_deref().unwrap_or("no reason reported")
                    );
                    return Err(Error::ResourceFailed {
                        resource: resource.to_string(),
                        status: observation.status,
                        reason,
                        payload: observation.payload,
                    });
                }
                StatusClass::Pending | StatusClass::InProgress => {
                    indicator.tick(class);
                    last_status = Some(observation.status);
                }
            }

            let mut nap = self.options.interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return Err(self.timed_out(resource, started, last_status, &mut indicator));
                }
                nap = nap.min(deadline - now);
            }

            self.pause(resource, nap).await?;
            sleeps += 1;

            if deadline.is_some_and(|d| Instant::now() >= d) {
                return Err(self.timed_out(resource, started, last_status, &mut indicator));
            }
        }
    }

    /// Wait on a resource through the service's describe call.
    pub async fn track<S>(
        &self,
        service: &S,
        kind: ResourceKind,
        handle: &ResourceHandle,
    ) -> Result<PollReport>
    where
        S: ForecastService + ?Sized,
    {
        self.wait(handle, move || service.describe(kind, handle)).await
    }

    /// Submit a create call, then wait for the new resource.
    pub async fn create_and_wait<S>(
        &self,
        service: &S,
        kind: ResourceKind,
        params: serde_json::Value,
    ) -> Result<(ResourceHandle, PollReport)>
    where
        S: ForecastService + ?Sized,
    {
        let handle = service.submit(kind, params).await?;
        info!("Submitted {} {}", kind, handle);
        let report = self.track(service, kind, &handle).await?;
        Ok((handle, report))
    }

    /// Track several resources concurrently; results come back in `targets` order.
    pub async fn wait_all<S>(
        &self,
        service: &S,
        targets: &[(ResourceKind, ResourceHandle)],
    ) -> Vec<Result<PollReport>>
    where
        S: ForecastService + ?Sized,
    {
        let waits = targets
            .iter()
            .map(|(kind, handle)| self.track(service, *kind, handle));
        futures::future::join_all(waits).await
    }

    // ---------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------

    /// One probe, repeated after transient errors. `None` means the guard
    /// expired while backing off.
    async fn probe_with_retry<F, Fut>(
        &self,
        resource: &ResourceHandle,
        probe: &mut F,
        retries: &mut u32,
        deadline: Option<Instant>,
    ) -> Result<Option<Observation>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Observation>>,
    {
        let policy = self.options.retry;
        let mut failures = 0u32;

        loop {
            match probe().await {
                Ok(observation) => return Ok(Some(observation)),
                Err(e) if e.is_transient() => {
                    failures += 1;
                    if failures > policy.max_retries {
                        error!(
                            "Probe for {} unavailable after {} attempts: {}",
                            resource, failures, e
                        );
                        return Err(Error::ProbeUnavailable {
                            resource: resource.to_string(),
                            attempts: failures,
                            last_error: e.to_string(),
                        });
                    }
                    let mut delay = policy.delay_for(failures);
                    if let Some(deadline) = deadline {
                        let now = Instant::now();
                        if now >= deadline {
                            return Ok(None);
                        }
                        delay = delay.min(deadline - now);
                    }
                    warn!(
                        "Probe for {} failed ({}), retry {}/{} in {:?}",
                        resource, e, failures, policy.max_retries, delay
                    );
                    *retries += 1;
                    self.pause(resource, delay).await?;
                    self.check_cancelled(resource)?;
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return Ok(None);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Sleep, waking early with `Cancelled` if the token fires.
    async fn pause(&self, resource: &ResourceHandle, duration: Duration) -> Result<()> {
        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(self.cancelled(resource)),
                _ = tokio::time::sleep(duration) => Ok(()),
            },
            None => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
        }
    }

    fn check_cancelled(&self, resource: &ResourceHandle) -> Result<()> {
        match &self.cancel {
            Some(token) if token.is_cancelled() => Err(self.cancelled(resource)),
            _ => Ok(()),
        }
    }

    fn cancelled(&self, resource: &ResourceHandle) -> Error {
        info!("Wait for {} cancelled", resource);
        Error::Cancelled {
            resource: resource.to_string(),
        }
    }

    fn timed_out(
        &self,
        resource: &ResourceHandle,
        started: Instant,
        last_status: Option<String>,
        indicator: &mut Indicator<'_>,
    ) -> Error {
        let waited = started.elapsed();
        indicator.finish("TIMED_OUT");
        warn!("Gave up on {} after {:?}", resource, waited);
        Error::PollTimeout {
            resource: resource.to_string(),
            waited,
            last_status,
        }
    }
}
