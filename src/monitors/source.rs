//! Metric sources for the sampling loop
//!
//! [`MetricSource`] is the seam between the loop and the switch. The eAPI
//! adapter reads the `monitor connectivity` statistics; tests inject
//! synthetic snapshots through the same trait.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument, trace};

use crate::EndpointMetric;
use crate::eapi::{self, CommandRunner};
use crate::error::{MonitorError, MonitorResult};

/// Something that can produce the current connectivity snapshot
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Identifier of the device the metrics are collected on
    fn source_id(&self) -> &str;

    /// Fetch one snapshot. Fails with [`MonitorError::SourceUnavailable`].
    async fn fetch(&self) -> MonitorResult<Vec<EndpointMetric>>;
}

#[derive(Debug, Deserialize)]
struct Hostname {
    hostname: String,
}

#[derive(Debug, Deserialize)]
struct MonitorConnectivity {
    #[serde(default)]
    hosts: BTreeMap<String, HostStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HostStatistics {
    host_name: String,
    ip_addr: String,
    http_response_time: f64,
    jitter: f64,
    latency: f64,
    packet_loss: f64,
}

impl HostStatistics {
    fn into_metric(self, endpoint_id: String) -> EndpointMetric {
        EndpointMetric {
            endpoint_id,
            display_name: self.host_name,
            address: self.ip_addr,
            http_round_trip_ms: self.http_response_time,
            jitter_ms: self.jitter,
            latency_ms: self.latency,
            packet_loss_pct: self.packet_loss,
        }
    }
}

/// Reads `show monitor connectivity` through the Command API
pub struct EapiMetricSource {
    runner: Arc<dyn CommandRunner>,
    hostname: String,
    timeout: Duration,
}

impl EapiMetricSource {
    pub const HOSTNAME_COMMAND: &'static str = "show hostname";
    pub const CONNECTIVITY_COMMAND: &'static str = "show monitor connectivity";

    /// Resolve the switch hostname, which tags every alert as its source.
    ///
    /// Failing here means the target is unreachable at startup.
    #[instrument(skip_all)]
    pub async fn connect(runner: Arc<dyn CommandRunner>, timeout: Duration) -> MonitorResult<Self> {
        let hostname = tokio::time::timeout(
            timeout,
            eapi::run_one::<Hostname, _>(runner.as_ref(), Self::HOSTNAME_COMMAND),
        )
        .await
        .map_err(|_| MonitorError::config_invalid("switch did not answer 'show hostname' in time"))?
        .map_err(|e| MonitorError::config_invalid(format!("cannot reach switch: {e}")))?
        .hostname;

        debug!("collecting connectivity metrics on {hostname}");

        Ok(Self {
            runner,
            hostname,
            timeout,
        })
    }
}

#[async_trait]
impl MetricSource for EapiMetricSource {
    fn source_id(&self) -> &str {
        &self.hostname
    }

    #[instrument(skip(self), fields(source = %self.hostname))]
    async fn fetch(&self) -> MonitorResult<Vec<EndpointMetric>> {
        let snapshot = tokio::time::timeout(
            self.timeout,
            eapi::run_one::<MonitorConnectivity, _>(self.runner.as_ref(), Self::CONNECTIVITY_COMMAND),
        )
        .await
        .map_err(|_| MonitorError::source_unavailable("connectivity request timed out"))??;

        let metrics: Vec<_> = snapshot
            .hosts
            .into_iter()
            .map(|(id, stats)| stats.into_metric(id))
            .collect();

        trace!("received {} endpoint metrics", metrics.len());

        Ok(metrics)
    }
}
