//! Hardware table (TCAM) usage monitoring
//!
//! The switch reports usage counters for every hardware lookup table through
//! `show hardware capacity`. [`monitor::TcamMonitor`] polls those counters,
//! keeps a status view of the latest values and records a row whenever a
//! table's used + committed entries cross the configured threshold.

pub mod monitor;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{instrument, trace};

use crate::eapi::{self, CommandRunner};
use crate::error::{MonitorError, MonitorResult};

pub use monitor::{TcamHandle, TcamMonitor, TcamReport};

/// Unique identifier of a hardware table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableKey {
    pub table_name: String,
    pub feature: String,
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.table_name, self.feature)
    }
}

/// Usage counters for one hardware table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableUsage {
    pub key: TableKey,
    pub free_entries: u64,
    pub used_entries: u64,
    pub committed_entries: u64,
    pub max_entries: u64,
}

impl TableUsage {
    /// Used plus committed entries strictly above `threshold`
    pub fn exceeds(&self, threshold: u64) -> bool {
        self.used_entries.saturating_add(self.committed_entries) > threshold
    }

    /// Human readable status entries, e.g. `LEM-IPv4: Used Entries` → `120`
    pub fn status_entries(&self) -> [(String, String); 4] {
        [
            (
                format!("{}: Free Entries", self.key),
                self.free_entries.to_string(),
            ),
            (
                format!("{}: Used Entries", self.key),
                self.used_entries.to_string(),
            ),
            (
                format!("{}: Committed Entries", self.key),
                self.committed_entries.to_string(),
            ),
            (
                format!("{}: Maximum Entries", self.key),
                self.max_entries.to_string(),
            ),
        ]
    }
}

/// Something that can report the current hardware table usage
#[async_trait]
pub trait HardwareTableSource: Send + Sync {
    async fn fetch(&self) -> MonitorResult<Vec<TableUsage>>;
}

#[derive(Debug, Deserialize)]
struct HardwareCapacity {
    #[serde(default)]
    tables: Vec<CapacityEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapacityEntry {
    table: String,
    #[serde(default)]
    feature: String,
    #[serde(default)]
    chip: String,
    used: u64,
    free: u64,
    #[serde(default)]
    committed: u64,
    max_limit: u64,
}

impl From<CapacityEntry> for TableUsage {
    fn from(entry: CapacityEntry) -> Self {
        // Per-chip rows share table and feature names with the summary row
        let table_name = if entry.chip.is_empty() {
            entry.table
        } else {
            format!("{}/{}", entry.table, entry.chip)
        };

        TableUsage {
            key: TableKey {
                table_name,
                feature: entry.feature,
            },
            free_entries: entry.free,
            used_entries: entry.used,
            committed_entries: entry.committed,
            max_entries: entry.max_limit,
        }
    }
}

/// Reads `show hardware capacity` through the Command API
pub struct EapiHardwareTableSource {
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
}

impl EapiHardwareTableSource {
    pub const CAPACITY_COMMAND: &'static str = "show hardware capacity";

    pub fn new(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        Self { runner, timeout }
    }
}

#[async_trait]
impl HardwareTableSource for EapiHardwareTableSource {
    #[instrument(skip(self))]
    async fn fetch(&self) -> MonitorResult<Vec<TableUsage>> {
        let capacity = tokio::time::timeout(
            self.timeout,
            eapi::run_one::<HardwareCapacity, _>(self.runner.as_ref(), Self::CAPACITY_COMMAND),
        )
        .await
        .map_err(|_| MonitorError::source_unavailable("hardware capacity request timed out"))??;

        trace!("received {} hardware tables", capacity.tables.len());

        Ok(capacity.tables.into_iter().map(TableUsage::from).collect())
    }
}
