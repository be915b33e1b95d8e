//! End-to-end cycles: eAPI snapshot → evaluation → file and UDP alerts

use std::sync::Arc;
use std::time::Duration;

use eos_ops::{
    ThresholdConfig,
    config::ForwardConfig,
    eapi::EapiClient,
    monitors::{EapiMetricSource, MetricSource, SamplerHandle, SamplingLoop},
    sinks::{AlertSink, MultiSink, file::FileSink, udp::UdpSink},
};
use pretty_assertions::assert_eq;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

use crate::helpers::*;

async fn eapi_source(server: &MockServer) -> EapiMetricSource {
    let config = switch_config(server);
    let client = EapiClient::new(&config).unwrap();
    EapiMetricSource::connect(Arc::new(client), config.timeout())
        .await
        .unwrap()
}

async fn sampler(
    server: &MockServer,
    sink: Arc<dyn AlertSink>,
    thresholds: ThresholdConfig,
) -> SamplingLoop {
    SamplingLoop::new(
        Arc::new(eapi_source(server).await),
        sink,
        thresholds,
        Duration::from_millis(20),
        CancellationToken::new(),
    )
}

#[tokio::test]
async fn test_http_only_breach_writes_one_line() {
    let server = MockServer::start().await;
    mount_hostname(&server, "leaf1").await;
    mount_connectivity(
        &server,
        &[("google", "google-dns", "8.8.8.8", 150.0, 1.0, 10.0, 0.0)],
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("IPSLA_warn.log");
    let sink = Arc::new(FileSink::open(&log).await.unwrap());

    let mut sampler = sampler(&server, sink, thresholds(100.0, 5.0, 50.0, 1.0)).await;
    let report = sampler.run_cycle().await;

    assert_eq!(report.fetched, 1);
    assert_eq!(report.emitted, 1);

    let lines = alert_lines(&log);
    assert_eq!(lines.len(), 1);
    assert!(
        lines[0].ends_with(
            " WARNING leaf1 google-dns 8.8.8.8 150.000000 1.000000 10.000000 0.000000"
        ),
        "unexpected line: {}",
        lines[0]
    );
}

#[tokio::test]
async fn test_all_zero_readings_with_zero_thresholds_is_quiet() {
    let server = MockServer::start().await;
    mount_hostname(&server, "leaf1").await;
    mount_connectivity(&server, &[("idle", "idle", "192.0.2.9", 0.0, 0.0, 0.0, 0.0)]).await;

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("alerts.log");
    let sink = Arc::new(FileSink::open(&log).await.unwrap());

    let mut sampler = sampler(&server, sink, ThresholdConfig::default()).await;
    let report = sampler.run_cycle().await;

    assert_eq!(report.fetched, 1);
    assert_eq!(report.breaches, 0);
    assert!(alert_lines(&log).is_empty());
}

#[tokio::test]
async fn test_two_endpoints_one_breach_reaches_every_sink() {
    let server = MockServer::start().await;
    mount_hostname(&server, "spine2").await;
    mount_connectivity(
        &server,
        &[
            ("a-ok", "web-a", "198.51.100.1", 20.0, 1.0, 10.0, 0.0),
            ("b-lossy", "web-b", "198.51.100.2", 20.0, 1.0, 10.0, 5.0),
        ],
    )
    .await;

    let collector = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let forward = ForwardConfig {
        host: "127.0.0.1".to_string(),
        port: collector.local_addr().unwrap().port(),
    };

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("alerts.log");
    let sink = MultiSink::new(vec![
        Arc::new(FileSink::open(&log).await.unwrap()) as Arc<dyn AlertSink>,
        Arc::new(UdpSink::connect(&forward, Duration::from_secs(1)).await.unwrap())
            as Arc<dyn AlertSink>,
    ]);

    let mut sampler = sampler(&server, Arc::new(sink), thresholds(100.0, 5.0, 50.0, 1.0)).await;
    let report = sampler.run_cycle().await;

    assert_eq!(report.fetched, 2);
    assert_eq!(report.breaches, 1);
    assert_eq!(report.emitted, 1);

    let lines = alert_lines(&log);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains(" spine2 web-b 198.51.100.2 "));

    let mut buf = [0u8; 512];
    let (len, _) = tokio::time::timeout(Duration::from_secs(1), collector.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        std::str::from_utf8(&buf[..len]).unwrap(),
        "WARNING spine2 web-b 198.51.100.2 20.000000 1.000000 10.000000 5.000000"
    );
}

#[tokio::test]
async fn test_source_id_is_switch_hostname() {
    let server = MockServer::start().await;
    mount_hostname(&server, "edge-router-7").await;

    let source = eapi_source(&server).await;

    assert_eq!(source.source_id(), "edge-router-7");
}

#[tokio::test]
async fn test_running_loop_alerts_every_cycle_until_shutdown() {
    let server = MockServer::start().await;
    mount_hostname(&server, "leaf1").await;
    mount_connectivity(&server, &[("slow", "slow", "192.0.2.7", 500.0, 0.0, 0.0, 0.0)]).await;

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("alerts.log");
    let sink = Arc::new(FileSink::open(&log).await.unwrap());

    let handle = SamplerHandle::spawn(sampler(&server, sink, thresholds(100.0, 0.0, 0.0, 0.0)).await);
    tokio::time::sleep(Duration::from_millis(200)).await;
    handle.shutdown().await;

    // No deduplication: a persistent breach is reported on every cycle
    let lines = alert_lines(&log);
    assert!(lines.len() >= 2, "expected repeated alerts, got {}", lines.len());
    assert!(lines.iter().all(|line| line.contains(" WARNING leaf1 slow 192.0.2.7 ")));
}
