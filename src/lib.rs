pub mod acl;
pub mod config;
pub mod eapi;
pub mod error;
pub mod logging;
pub mod monitors;
pub mod sinks;
pub mod storage;
pub mod tcam;
pub mod util;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use config::ThresholdConfig;
pub use error::MonitorError;

/// One connectivity sample for a monitored host, captured in a single cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointMetric {
    pub endpoint_id: String,
    pub display_name: String,
    pub address: String,
    pub http_round_trip_ms: f64,
    pub jitter_ms: f64,
    pub latency_ms: f64,
    pub packet_loss_pct: f64,
}

/// A breach detected on one endpoint, ready to be handed to an alert sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// Hostname of the switch the sample was collected on
    pub source_id: String,
    pub metric: EndpointMetric,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    /// Build an event for `metric`, but only if it breaches `thresholds`.
    pub fn from_breach(
        source_id: &str,
        metric: &EndpointMetric,
        thresholds: &ThresholdConfig,
    ) -> Option<AlertEvent> {
        monitors::threshold::evaluate(metric, thresholds).then(|| AlertEvent {
            source_id: source_id.to_string(),
            metric: metric.clone(),
            timestamp: Utc::now(),
        })
    }

    /// Space separated record body shared by the file and network sinks.
    pub fn record(&self) -> String {
        let EndpointMetric {
            display_name,
            address,
            http_round_trip_ms,
            jitter_ms,
            latency_ms,
            packet_loss_pct,
            ..
        } = &self.metric;

        format!(
            "{} {display_name} {address} {http_round_trip_ms:.6} {jitter_ms:.6} {latency_ms:.6} {packet_loss_pct:.6}",
            self.source_id
        )
    }
}
