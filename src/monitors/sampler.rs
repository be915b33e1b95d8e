//! SamplingLoop - periodic fetch, evaluate and alert
//!
//! ## Cycle
//!
//! ```text
//! Idle → Fetching → Evaluating → Alerting → Sleeping → Fetching → ...
//!             │
//!             └── fetch failed → Sleeping (cycle skipped)
//! ```
//!
//! Only one cycle is ever in flight. The stop signal is checked before every
//! fetch and also interrupts the sleep, so shutdown waits for at most one
//! fetch/evaluate/alert sequence.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::AlertEvent;
use crate::config::ThresholdConfig;
use crate::sinks::AlertSink;

use super::source::MetricSource;
use super::threshold;

/// Where the loop currently is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Idle,
    Fetching,
    Evaluating,
    Alerting,
    Sleeping,
}

/// Outcome of a single cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Number of endpoint metrics returned by the source
    pub fetched: usize,

    /// Number of metrics that breached a threshold
    pub breaches: usize,

    /// Number of alerts accepted by the sink
    pub emitted: usize,

    /// Number of alerts the sink rejected
    pub failed: usize,

    /// Whether the fetch itself failed (cycle skipped)
    pub fetch_failed: bool,
}

pub struct SamplingLoop {
    source: Arc<dyn MetricSource>,
    sink: Arc<dyn AlertSink>,
    thresholds: ThresholdConfig,
    interval: Duration,
    cancel: CancellationToken,
    phase: LoopPhase,
}

impl SamplingLoop {
    /// Default sampling cadence
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

    pub fn new(
        source: Arc<dyn MetricSource>,
        sink: Arc<dyn AlertSink>,
        thresholds: ThresholdConfig,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            sink,
            thresholds,
            interval,
            cancel,
            phase: LoopPhase::Idle,
        }
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    /// Run one fetch → evaluate → alert sequence.
    ///
    /// Never fails: source and sink errors are logged and counted.
    #[instrument(skip(self), fields(source = %self.source.source_id()))]
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();

        self.phase = LoopPhase::Fetching;
        let metrics = match self.source.fetch().await {
            Ok(metrics) => metrics,
            Err(e) => {
                error!("failed to fetch metrics: {e}");
                report.fetch_failed = true;
                return report;
            }
        };
        report.fetched = metrics.len();

        self.phase = LoopPhase::Evaluating;
        let source_id = self.source.source_id().to_string();
        let events: Vec<AlertEvent> = metrics
            .iter()
            .filter_map(|metric| {
                let event = AlertEvent::from_breach(&source_id, metric, &self.thresholds)?;
                let readings: Vec<_> = threshold::breached_readings(metric, &self.thresholds)
                    .iter()
                    .map(|reading| reading.name())
                    .collect();
                debug!("{} breached {readings:?}", metric.endpoint_id);
                Some(event)
            })
            .collect();
        report.breaches = events.len();

        self.phase = LoopPhase::Alerting;
        for event in &events {
            match self.sink.emit(event).await {
                Ok(()) => report.emitted += 1,
                Err(e) => {
                    error!("failed to emit alert for {}: {e}", event.metric.endpoint_id);
                    report.failed += 1;
                }
            }
        }

        trace!("cycle finished: {report:?}");
        report
    }

    /// Run until the cancellation token fires.
    #[instrument(skip(self), fields(source = %self.source.source_id()))]
    pub async fn run(mut self) {
        info!("starting sampling loop with interval {:?}", self.interval);

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.run_cycle().await;

            self.phase = LoopPhase::Sleeping;
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        debug!("sampling loop stopped");
    }
}

/// Handle for a sampling loop running as a tokio task
pub struct SamplerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    pub fn spawn(sampler: SamplingLoop) -> Self {
        let cancel = sampler.cancel.clone();
        let task = tokio::spawn(sampler.run());
        Self { cancel, task }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the loop to stop and wait for the in-flight cycle to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("sampling loop task failed: {e}");
        }
    }
}
