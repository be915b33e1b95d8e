//! Command API (eAPI) client
//!
//! EOS exposes CLI commands over JSON-RPC 2.0 at `/command-api`. Every tool in
//! this crate talks to the switch through [`CommandRunner`], which
//! [`EapiClient`] implements over HTTP(S) with basic authentication.
//!
//! ```text
//! POST /command-api
//! {"jsonrpc":"2.0","method":"runCmds","params":{"version":1,"cmds":[...],"format":"json"},"id":"eos-ops-1"}
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, trace};

use crate::config::SwitchConfig;

/// Errors returned by the Command API client
#[derive(Debug)]
pub enum EapiError {
    /// Connection could not be established or was interrupted
    Transport(String),

    /// The request did not complete within the configured timeout
    Timeout,

    /// Non-success HTTP status without a JSON-RPC error body
    Http(u16),

    /// The switch rejected one of the commands
    Rpc {
        code: i64,
        message: String,
        detail: Option<String>,
    },

    /// The response body did not have the expected shape
    Decode(String),
}

impl fmt::Display for EapiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EapiError::Transport(msg) => write!(f, "eAPI transport error: {}", msg),
            EapiError::Timeout => write!(f, "eAPI request timed out"),
            EapiError::Http(status) => write!(f, "eAPI HTTP error: {}", status),
            EapiError::Rpc {
                code,
                message,
                detail: Some(detail),
            } => write!(f, "eAPI error {}: {} ({})", code, message, detail),
            EapiError::Rpc { code, message, .. } => write!(f, "eAPI error {}: {}", code, message),
            EapiError::Decode(msg) => write!(f, "unexpected eAPI response: {}", msg),
        }
    }
}

impl std::error::Error for EapiError {}

impl From<reqwest::Error> for EapiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EapiError::Timeout
        } else {
            EapiError::Transport(err.to_string())
        }
    }
}

/// Anything that can execute a batch of CLI commands on a switch.
///
/// Results are returned one JSON value per command, in order.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run_cmds(&self, cmds: &[String]) -> Result<Vec<Value>, EapiError>;
}

/// Convert one command result into a typed response.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, EapiError> {
    serde_json::from_value(value).map_err(|e| EapiError::Decode(e.to_string()))
}

/// Run a single command and decode its result.
pub async fn run_one<T, R>(runner: &R, cmd: &str) -> Result<T, EapiError>
where
    T: DeserializeOwned,
    R: CommandRunner + ?Sized,
{
    let mut results = runner.run_cmds(&[cmd.to_string()]).await?;
    let result = results
        .pop()
        .ok_or_else(|| EapiError::Decode(format!("no result for '{cmd}'")))?;
    decode(result)
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: RpcParams<'a>,
    id: String,
}

#[derive(Serialize)]
struct RpcParams<'a> {
    version: u32,
    cmds: &'a [String],
    format: &'static str,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Vec<Value>>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Vec<Value>,
}

impl RpcError {
    /// The last error string reported for the failing command
    fn detail(&self) -> Option<String> {
        self.data
            .iter()
            .rev()
            .filter_map(|entry| entry.get("errors")?.as_array()?.last()?.as_str())
            .map(str::to_string)
            .next()
    }
}

/// JSON-RPC client for a single switch
#[derive(Debug)]
pub struct EapiClient {
    client: reqwest::Client,
    url: String,
    username: String,
    password: String,
    next_id: AtomicU64,
}

impl EapiClient {
    pub fn new(config: &SwitchConfig) -> Result<Self, EapiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.insecure)
            .build()?;

        let url = format!("{}://{}/command-api", config.transport.scheme(), config.address);
        debug!("setting up connection to {url}");

        Ok(Self {
            client,
            url,
            username: config.username.clone(),
            password: config.password.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CommandRunner for EapiClient {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn run_cmds(&self, cmds: &[String]) -> Result<Vec<Value>, EapiError> {
        trace!("running commands: {cmds:?}");

        let request = RpcRequest {
            jsonrpc: "2.0",
            method: "runCmds",
            params: RpcParams {
                version: 1,
                cmds,
                format: "json",
            },
            id: format!("eos-ops-{}", self.next_id.fetch_add(1, Ordering::Relaxed)),
        };

        let response = self
            .client
            .post(&self.url)
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        let parsed = serde_json::from_str::<RpcResponse>(&body);

        match parsed {
            Ok(RpcResponse {
                error: Some(error), ..
            }) => {
                let detail = error.detail();
                debug!("failed to run {cmds:?}: {} {:?}", error.message, detail);
                Err(EapiError::Rpc {
                    code: error.code,
                    message: error.message,
                    detail,
                })
            }
            _ if !status.is_success() => Err(EapiError::Http(status.as_u16())),
            Ok(RpcResponse {
                result: Some(result),
                ..
            }) => {
                if result.len() != cmds.len() {
                    return Err(EapiError::Decode(format!(
                        "expected {} results, got {}",
                        cmds.len(),
                        result.len()
                    )));
                }
                Ok(result)
            }
            Ok(_) => Err(EapiError::Decode("response has neither result nor error".into())),
            Err(e) => Err(EapiError::Decode(e.to_string())),
        }
    }
}
