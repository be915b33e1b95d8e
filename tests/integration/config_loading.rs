//! Loading configuration files from disk

use std::io::Write;
use std::time::Duration;

use assert_matches::assert_matches;
use eos_ops::{
    MonitorError,
    config::{StorageConfig, Transport, parse_config, read_config_file},
};
use pretty_assertions::assert_eq;

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_example_config_is_valid() {
    let config = parse_config(include_str!("../../config.example.json")).unwrap();
    config.validate().unwrap();

    assert_eq!(config.switch.transport, Transport::Https);
    assert!(!config.switch.insecure);
    assert_eq!(config.forward.as_ref().unwrap().port, 5514);
    assert_matches!(
        config.tcam.as_ref().unwrap().storage,
        StorageConfig::Sqlite { .. }
    );
    assert_eq!(config.acl.as_ref().unwrap().switches, vec!["127.0.0.1"]);
}

#[test]
fn test_minimal_file_uses_defaults() {
    let file = write_config(r#"{ "switch": { "address": "leaf1.lab" } }"#);

    let config = read_config_file(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.interval(), Duration::from_secs(60));
    assert_eq!(config.switch.timeout(), Duration::from_secs(5));
    assert!(config.thresholds.all_zero());
    assert!(config.forward.is_none());
}

#[test]
fn test_invalid_file_is_rejected_before_start() {
    let file = write_config(r#"{ "switch": { "address": "leaf1" }, "interval": 0 }"#);
    assert_matches!(
        read_config_file(file.path().to_str().unwrap()),
        Err(MonitorError::ConfigInvalid(_))
    );

    let file = write_config(r#"{ "switch": { "address": "leaf1" }, "thresholds": { "jitter_max": -1 } }"#);
    assert_matches!(
        read_config_file(file.path().to_str().unwrap()),
        Err(MonitorError::ConfigInvalid(_))
    );

    let file = write_config("switch: leaf1");
    assert_matches!(
        read_config_file(file.path().to_str().unwrap()),
        Err(MonitorError::ConfigInvalid(_))
    );
}
