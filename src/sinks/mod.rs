//! Alert sinks
//!
//! - [`file::FileSink`]: durable local append, one line per alert
//! - [`udp::UdpSink`]: best-effort datagram forward to a log collector
//! - [`MultiSink`]: fans one alert out to several sinks

pub mod file;
pub mod udp;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::AlertEvent;
use crate::error::MonitorResult;

pub use file::FileSink;
pub use udp::UdpSink;

/// Severity written in front of every alert record
pub const SEVERITY: &str = "WARNING";

#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Record or forward one alert. Fails with
    /// [`MonitorError::SinkUnavailable`](crate::MonitorError::SinkUnavailable).
    async fn emit(&self, event: &AlertEvent) -> MonitorResult<()>;
}

/// Emits every alert to each inner sink in order.
///
/// A failing sink does not keep later sinks from receiving the alert; the
/// first error is returned once all sinks have been tried.
pub struct MultiSink {
    sinks: Vec<Arc<dyn AlertSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl AlertSink for MultiSink {
    async fn emit(&self, event: &AlertEvent) -> MonitorResult<()> {
        let mut first_error = None;

        for sink in &self.sinks {
            if let Err(e) = sink.emit(event).await {
                warn!("alert sink failed: {e}");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
