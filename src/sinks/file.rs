use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::AlertEvent;
use crate::error::{MonitorError, MonitorResult};

use super::{AlertSink, SEVERITY};

/// Appends one line per alert to a local file.
///
/// Each line is flushed and synced before `emit` returns, so an accepted
/// alert survives a crash of the process.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Open (or create) the alert log for appending.
    pub async fn open(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| {
                MonitorError::config_invalid(format!("cannot open alert log {}: {e}", path.display()))
            })?;

        debug!("appending alerts to {}", path.display());

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `2024-05-01 12:00:00,123 WARNING leaf1 google-dns 8.8.8.8 150.000000 ...`
    pub fn format_line(event: &AlertEvent) -> String {
        format!("{} {SEVERITY} {}\n", timestamp(&event.timestamp), event.record())
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S,%3f").to_string()
}

#[async_trait]
impl AlertSink for FileSink {
    #[instrument(skip_all, fields(endpoint = %event.metric.endpoint_id))]
    async fn emit(&self, event: &AlertEvent) -> MonitorResult<()> {
        let line = Self::format_line(event);
        warn!("{}", line.trim_end());

        let unavailable = |e: std::io::Error| {
            MonitorError::sink_unavailable(format!("cannot write to {}: {e}", self.path.display()))
        };

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await.map_err(unavailable)?;
        file.flush().await.map_err(unavailable)?;
        file.sync_data().await.map_err(unavailable)
    }
}
