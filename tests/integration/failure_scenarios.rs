//! Failure handling: unreachable switch, rejected commands, broken sinks

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use eos_ops::{
    MonitorError,
    config::{ForwardConfig, SwitchConfig, Transport},
    eapi::EapiClient,
    monitors::{EapiMetricSource, MetricSource, SamplingLoop},
    sinks::{AlertSink, MultiSink, file::FileSink, udp::UdpSink},
};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

async fn connected_source(server: &MockServer) -> EapiMetricSource {
    mount_hostname(server, "leaf1").await;
    let config = switch_config(server);
    EapiMetricSource::connect(Arc::new(EapiClient::new(&config).unwrap()), config.timeout())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_unreachable_switch_at_startup_is_config_invalid() {
    let config = SwitchConfig {
        address: "127.0.0.1:9".to_string(),
        transport: Transport::Http,
        timeout: 1,
        ..SwitchConfig::default()
    };
    let client = EapiClient::new(&config).unwrap();

    let result = EapiMetricSource::connect(Arc::new(client), config.timeout()).await;

    assert_matches!(result.err(), Some(MonitorError::ConfigInvalid(_)));
}

#[tokio::test]
async fn test_failed_fetch_emits_nothing() {
    let server = MockServer::start().await;
    let source = connected_source(&server).await;

    Mock::given(method("POST"))
        .and(path("/command-api"))
        .and(body_partial_json(json!({ "params": { "cmds": ["show monitor connectivity"] } })))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("alerts.log");
    let sink = Arc::new(FileSink::open(&log).await.unwrap());

    let mut sampler = SamplingLoop::new(
        Arc::new(source),
        sink,
        thresholds(0.0, 0.0, 0.0, 0.0),
        Duration::from_millis(10),
        CancellationToken::new(),
    );
    let report = sampler.run_cycle().await;

    assert!(report.fetch_failed);
    assert_eq!(report.emitted, 0);
    assert!(alert_lines(&log).is_empty());
}

#[tokio::test]
async fn test_rejected_command_is_source_unavailable() {
    let server = MockServer::start().await;
    let source = connected_source(&server).await;

    Mock::given(method("POST"))
        .and(path("/command-api"))
        .and(body_partial_json(json!({ "params": { "cmds": ["show monitor connectivity"] } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": "eos-ops-2",
            "error": {
                "code": 1002,
                "message": "CLI command 1 of 1 'show monitor connectivity' failed: invalid command",
                "data": [{ "errors": ["Invalid input (at token 1: 'monitor')"] }]
            }
        })))
        .mount(&server)
        .await;

    let err = source.fetch().await.unwrap_err();

    assert_matches!(&err, MonitorError::SourceUnavailable(msg) if msg.contains("Invalid input"));
}

#[tokio::test]
async fn test_malformed_snapshot_is_source_unavailable() {
    let server = MockServer::start().await;
    let source = connected_source(&server).await;
    mount_commands(
        &server,
        &["show monitor connectivity"],
        vec![json!({ "hosts": { "probe": { "hostName": "probe" } } })],
    )
    .await;

    assert_matches!(source.fetch().await, Err(MonitorError::SourceUnavailable(_)));
}

#[tokio::test]
async fn test_slow_switch_times_out() {
    let server = MockServer::start().await;
    mount_hostname(&server, "leaf1").await;

    Mock::given(method("POST"))
        .and(path("/command-api"))
        .and(body_partial_json(json!({ "params": { "cmds": ["show monitor connectivity"] } })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "jsonrpc": "2.0", "id": "x", "result": [connectivity(&[])] }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = switch_config(&server);
    let source = EapiMetricSource::connect(
        Arc::new(EapiClient::new(&config).unwrap()),
        Duration::from_millis(200),
    )
    .await
    .unwrap();

    assert_matches!(source.fetch().await, Err(MonitorError::SourceUnavailable(_)));
}

#[tokio::test]
async fn test_alert_log_in_missing_directory_is_config_invalid() {
    let dir = tempfile::tempdir().unwrap();
    let result = FileSink::open(dir.path().join("missing").join("alerts.log")).await;

    assert_matches!(result.err(), Some(MonitorError::ConfigInvalid(_)));
}

#[tokio::test]
async fn test_collector_down_does_not_block_local_log() {
    let server = MockServer::start().await;
    let source = connected_source(&server).await;
    mount_connectivity(&server, &[("p", "p", "192.0.2.5", 0.0, 0.0, 0.0, 2.5)]).await;

    // Reserve a port, then close it so nothing is listening
    let port = {
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        socket.local_addr().unwrap().port()
    };
    let forward = ForwardConfig {
        host: "127.0.0.1".to_string(),
        port,
    };

    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("alerts.log");
    let sink = MultiSink::new(vec![
        Arc::new(UdpSink::connect(&forward, Duration::from_secs(1)).await.unwrap())
            as Arc<dyn AlertSink>,
        Arc::new(FileSink::open(&log).await.unwrap()) as Arc<dyn AlertSink>,
    ]);

    let mut sampler = SamplingLoop::new(
        Arc::new(source),
        Arc::new(sink),
        thresholds(0.0, 0.0, 0.0, 1.0),
        Duration::from_millis(10),
        CancellationToken::new(),
    );
    let report = sampler.run_cycle().await;

    assert_eq!(report.emitted, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(alert_lines(&log).len(), 1);
}
