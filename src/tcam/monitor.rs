//! TcamMonitor - polls hardware table usage and records threshold crossings
//!
//! A row is recorded when a table is above the threshold and its counters
//! differ from the previous poll, so a table that stays full but unchanged
//! is stored once rather than on every cycle.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::storage::{UsageRow, UsageStore};

use super::{HardwareTableSource, TableKey, TableUsage};

/// Outcome of a single poll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TcamReport {
    pub tables: usize,
    pub status_changed: usize,
    pub recorded: usize,
    pub failed: usize,
    pub fetch_failed: bool,
}

pub struct TcamMonitor {
    source: Arc<dyn HardwareTableSource>,
    store: Arc<dyn UsageStore>,
    threshold: u64,
    interval: Duration,
    cancel: CancellationToken,

    /// Latest counters per table, rendered as status entries
    status: BTreeMap<String, String>,

    /// Counters seen on the previous poll
    last_seen: HashMap<TableKey, TableUsage>,
}

impl TcamMonitor {
    pub fn new(
        source: Arc<dyn HardwareTableSource>,
        store: Arc<dyn UsageStore>,
        threshold: u64,
        interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            store,
            threshold,
            interval,
            cancel,
            status: BTreeMap::new(),
            last_seen: HashMap::new(),
        }
    }

    pub fn status(&self) -> &BTreeMap<String, String> {
        &self.status
    }

    fn changed(&self, usage: &TableUsage) -> bool {
        self.last_seen.get(&usage.key) != Some(usage)
    }

    #[instrument(skip(self), fields(threshold = self.threshold))]
    pub async fn run_cycle(&mut self) -> TcamReport {
        let mut report = TcamReport::default();

        let tables = match self.source.fetch().await {
            Ok(tables) => tables,
            Err(e) => {
                error!("failed to fetch hardware table usage: {e}");
                report.fetch_failed = true;
                return report;
            }
        };
        report.tables = tables.len();

        for usage in tables {
            for (key, value) in usage.status_entries() {
                if self.status.get(&key) != Some(&value) {
                    info!("{key}: {value}");
                    report.status_changed += 1;
                    self.status.insert(key, value);
                }
            }

            if usage.exceeds(self.threshold) && self.changed(&usage) {
                debug!(
                    "{} above threshold: {} used + {} committed",
                    usage.key, usage.used_entries, usage.committed_entries
                );

                match self.store.record(UsageRow::from_usage(&usage, Utc::now())).await {
                    Ok(()) => report.recorded += 1,
                    Err(e) => {
                        error!("failed to record usage for {}: {e}", usage.key);
                        report.failed += 1;
                    }
                }
            }

            self.last_seen.insert(usage.key.clone(), usage);
        }

        trace!("poll finished: {report:?}");
        report
    }

    pub async fn run(mut self) {
        info!(
            "starting hardware table monitor (threshold {}, interval {:?})",
            self.threshold, self.interval
        );

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            self.run_cycle().await;

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        if let Err(e) = self.store.close().await {
            warn!("failed to close usage store: {e}");
        }
        debug!("hardware table monitor stopped");
    }
}

/// Handle for a TcamMonitor running as a tokio task
pub struct TcamHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl TcamHandle {
    pub fn spawn(monitor: TcamMonitor) -> Self {
        let cancel = monitor.cancel.clone();
        let task = tokio::spawn(monitor.run());
        Self { cancel, task }
    }

    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            warn!("hardware table monitor task failed: {e}");
        }
    }
}
