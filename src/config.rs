use std::path::PathBuf;
use std::time::Duration;

use tracing::{trace, warn};

use crate::error::{MonitorError, MonitorResult};
use crate::util;

/// Storage backend configuration for the TCAM usage table
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Keep recorded rows in memory only
    #[serde(rename = "none")]
    None,

    /// SQLite database file
    Sqlite {
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./tcam.db")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Http,
    #[default]
    Https,
}

impl Transport {
    pub fn scheme(&self) -> &'static str {
        match self {
            Transport::Http => "http",
            Transport::Https => "https",
        }
    }
}

impl std::str::FromStr for Transport {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Transport::Http),
            "https" => Ok(Transport::Https),
            other => Err(MonitorError::config_invalid(format!(
                "unknown transport '{other}' (expected http or https)"
            ))),
        }
    }
}

/// Connection settings for the switch Command API
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SwitchConfig {
    /// Host or host:port of the switch, `127.0.0.1` when running on-box
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub transport: Transport,
    /// Skip TLS certificate verification. Never enabled implicitly.
    #[serde(default)]
    pub insecure: bool,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl SwitchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            address: String::new(),
            username: String::new(),
            password: String::new(),
            transport: Transport::default(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

/// Upper bounds for the four connectivity readings.
///
/// A reading alerts only when it is strictly greater than its bound, so a
/// bound of `0` alerts on any nonzero reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ThresholdConfig {
    #[serde(default)]
    pub http_round_trip_max: f64,
    #[serde(default)]
    pub jitter_max: f64,
    #[serde(default)]
    pub latency_max: f64,
    #[serde(default)]
    pub packet_loss_max: f64,
}

impl ThresholdConfig {
    fn fields(&self) -> [(&'static str, f64); 4] {
        [
            ("http_round_trip_max", self.http_round_trip_max),
            ("jitter_max", self.jitter_max),
            ("latency_max", self.latency_max),
            ("packet_loss_max", self.packet_loss_max),
        ]
    }

    pub fn validate(&self) -> MonitorResult<()> {
        for (name, value) in self.fields() {
            if !value.is_finite() || value < 0.0 {
                return Err(MonitorError::config_invalid(format!(
                    "threshold {name} must be a finite, non-negative number (got {value})"
                )));
            }
        }
        Ok(())
    }

    pub fn all_zero(&self) -> bool {
        self.fields().iter().all(|(_, value)| *value == 0.0)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct LogConfig {
    /// Append-only file receiving one line per alert
    #[serde(default = "default_alert_log")]
    pub alert_log: PathBuf,

    /// Optional file receiving the diagnostic log
    pub debug_log: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            alert_log: default_alert_log(),
            debug_log: None,
        }
    }
}

fn default_alert_log() -> PathBuf {
    PathBuf::from("/var/log/IPSLA_warn.log")
}

/// Datagram target for forwarded alerts (a logstash UDP input, typically)
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ForwardConfig {
    pub host: String,
    #[serde(default = "default_forward_port")]
    pub port: u16,
}

fn default_forward_port() -> u16 {
    5514
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct TcamConfig {
    /// Rows are recorded once used + committed entries exceed this value
    #[serde(default = "default_tcam_threshold")]
    pub threshold: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for TcamConfig {
    fn default() -> Self {
        Self {
            threshold: default_tcam_threshold(),
            interval: default_interval(),
            storage: StorageConfig::default(),
        }
    }
}

fn default_tcam_threshold() -> u64 {
    21000
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct AclConfig {
    /// Switches the editor may connect to. Empty means only `switch.address`.
    #[serde(default)]
    pub switches: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub switch: SwitchConfig,

    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Sampling interval in seconds
    #[serde(default = "default_interval")]
    pub interval: u64,

    #[serde(default)]
    pub logging: LogConfig,

    /// Network forwarding of alerts (optional - local log only when absent)
    pub forward: Option<ForwardConfig>,

    pub tcam: Option<TcamConfig>,

    pub acl: Option<AclConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            switch: SwitchConfig::default(),
            thresholds: ThresholdConfig::default(),
            interval: default_interval(),
            logging: LogConfig::default(),
            forward: None,
            tcam: None,
            acl: None,
        }
    }
}

fn default_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    5
}

impl Config {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// Apply `EOS_*` and `SAMPLING_INTERVAL` environment overrides.
    pub fn apply_env(&mut self) -> MonitorResult<()> {
        self.apply_overrides(util::env_var)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> MonitorResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup(util::EOS_ADDRESS) {
            self.switch.address = address;
        }
        if let Some(username) = lookup(util::EOS_USERNAME) {
            self.switch.username = username;
        }
        if let Some(password) = lookup(util::EOS_PASSWORD) {
            self.switch.password = password;
        }
        if let Some(transport) = lookup(util::EOS_TRANSPORT) {
            self.switch.transport = transport.parse()?;
        }
        if let Some(insecure) = lookup(util::EOS_INSECURE) {
            self.switch.insecure = util::parse_flag(&insecure);
        }
        if let Some(interval) = lookup(util::SAMPLING_INTERVAL) {
            self.interval = interval.parse().map_err(|_| {
                MonitorError::config_invalid(format!(
                    "{} must be a number of seconds (got '{interval}')",
                    util::SAMPLING_INTERVAL
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> MonitorResult<()> {
        if self.switch.address.trim().is_empty() {
            return Err(MonitorError::config_invalid("switch address is empty"));
        }
        if self.switch.timeout == 0 {
            return Err(MonitorError::config_invalid("switch timeout must be positive"));
        }
        if self.interval == 0 {
            return Err(MonitorError::config_invalid("sampling interval must be positive"));
        }
        self.thresholds.validate()?;

        if let Some(forward) = &self.forward {
            if forward.host.trim().is_empty() {
                return Err(MonitorError::config_invalid("forward host is empty"));
            }
            if forward.port == 0 {
                return Err(MonitorError::config_invalid("forward port must be positive"));
            }
        }

        if let Some(tcam) = &self.tcam
            && tcam.interval == 0
        {
            return Err(MonitorError::config_invalid("tcam interval must be positive"));
        }

        Ok(())
    }

    /// Log settings that are accepted but probably not intended.
    pub fn warn_risky_settings(&self) {
        if self.switch.insecure {
            warn!("TLS certificate verification is disabled for {}", self.switch.address);
        }
        if self.thresholds.all_zero() {
            warn!("all thresholds are 0, every nonzero reading will raise an alert");
        }
    }
}

pub fn parse_config(content: &str) -> MonitorResult<Config> {
    serde_json::from_str(content)
        .map_err(|e| MonitorError::config_invalid(format!("invalid configuration file: {e}")))
        .inspect(|config| trace!("loaded config: {config:?}"))
}

/// Read the JSON configuration file, apply environment overrides and validate.
pub fn read_config_file(path: &str) -> MonitorResult<Config> {
    let file_content = std::fs::read_to_string(path)
        .map_err(|e| MonitorError::config_invalid(format!("cannot read {path}: {e}")))?;
    let mut config = parse_config(&file_content)?;
    config.apply_env()?;
    config.validate()?;
    Ok(config)
}
