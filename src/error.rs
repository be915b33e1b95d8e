//! Error types for the sampling pipeline

use std::fmt;

use crate::eapi::EapiError;

/// Result type alias for pipeline operations
pub type MonitorResult<T> = Result<T, MonitorError>;

/// Errors raised by metric sources, alert sinks and configuration loading
#[derive(Debug)]
pub enum MonitorError {
    /// Upstream RPC/transport failure or malformed response.
    ///
    /// The current cycle is skipped, the loop keeps running.
    SourceUnavailable(String),

    /// An alert could not be written. Fatal for that alert only.
    SinkUnavailable(String),

    /// Malformed configuration or unreachable target at startup
    ConfigInvalid(String),
}

impl MonitorError {
    pub fn source_unavailable(msg: impl Into<String>) -> Self {
        MonitorError::SourceUnavailable(msg.into())
    }

    pub fn sink_unavailable(msg: impl Into<String>) -> Self {
        MonitorError::SinkUnavailable(msg.into())
    }

    pub fn config_invalid(msg: impl Into<String>) -> Self {
        MonitorError::ConfigInvalid(msg.into())
    }
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::SourceUnavailable(msg) => write!(f, "metric source unavailable: {}", msg),
            MonitorError::SinkUnavailable(msg) => write!(f, "alert sink unavailable: {}", msg),
            MonitorError::ConfigInvalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for MonitorError {}

impl From<EapiError> for MonitorError {
    fn from(err: EapiError) -> Self {
        MonitorError::SourceUnavailable(err.to_string())
    }
}
