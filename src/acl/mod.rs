//! IP access-list editing over the Command API
//!
//! [`AclEditor`] builds the configuration command sequences for creating,
//! editing and removing access lists; [`menu`] drives it interactively.
//! Rule text is passed to the switch verbatim.

pub mod menu;

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::eapi::{self, CommandRunner, EapiError};

const ACL_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_.:/-]*$";

/// Errors raised by access-list operations
#[derive(Debug)]
pub enum AclError {
    InvalidName(String),
    InvalidSequence(String),
    InvalidRule(String),
    NotFound(String),
    Eapi(EapiError),
    Io(std::io::Error),
}

impl fmt::Display for AclError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclError::InvalidName(name) => write!(f, "invalid ACL name: '{}'", name),
            AclError::InvalidSequence(seq) => write!(f, "invalid rule sequence: '{}'", seq),
            AclError::InvalidRule(reason) => write!(f, "invalid rule: {}", reason),
            AclError::NotFound(name) => write!(f, "No such ACL exists: {}", name),
            AclError::Eapi(e) => write!(f, "{}", e),
            AclError::Io(e) => write!(f, "console error: {}", e),
        }
    }
}

impl std::error::Error for AclError {}

impl From<EapiError> for AclError {
    fn from(err: EapiError) -> Self {
        AclError::Eapi(err)
    }
}

impl From<std::io::Error> for AclError {
    fn from(err: std::io::Error) -> Self {
        AclError::Io(err)
    }
}

pub type AclResult<T> = Result<T, AclError>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AclRule {
    pub sequence_number: u32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Acl {
    pub name: String,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default, rename = "sequence")]
    pub rules: Vec<AclRule>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessLists {
    #[serde(default)]
    acl_list: Vec<Acl>,
}

/// Check an access-list name before it is spliced into a command.
pub fn validate_name(name: &str) -> AclResult<()> {
    let re = regex::Regex::new(ACL_NAME_PATTERN)
        .map_err(|e| AclError::InvalidName(format!("{name} ({e})")))?;

    if re.is_match(name) {
        Ok(())
    } else {
        Err(AclError::InvalidName(name.to_string()))
    }
}

/// Parse a rule sequence number as typed by the operator. Sequences start at 1.
pub fn parse_sequence(input: &str) -> AclResult<u32> {
    match input.trim().parse() {
        Ok(0) | Err(_) => Err(AclError::InvalidSequence(input.trim().to_string())),
        Ok(sequence) => Ok(sequence),
    }
}

/// Split a comma separated list of rules, dropping empty entries.
pub fn parse_rules(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|rule| !rule.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct AclEditor {
    runner: Arc<dyn CommandRunner>,
}

impl AclEditor {
    pub const SHOW_COMMAND: &'static str = "show ip access-lists";

    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// `enable`, `configure`, `ip access-list <name>` followed by `body`
    fn config_session(name: &str, body: impl IntoIterator<Item = String>) -> Vec<String> {
        let mut cmds = vec![
            "enable".to_string(),
            "configure".to_string(),
            format!("ip access-list {name}"),
        ];
        cmds.extend(body);
        cmds
    }

    async fn configure(&self, cmds: Vec<String>) -> AclResult<()> {
        debug!("running {} commands", cmds.len());
        self.runner.run_cmds(&cmds).await?;
        Ok(())
    }

    /// Every user-editable access list on the switch
    #[instrument(skip(self))]
    pub async fn list(&self) -> AclResult<Vec<Acl>> {
        let cmds = ["enable".to_string(), Self::SHOW_COMMAND.to_string()];
        let mut results = self.runner.run_cmds(&cmds).await?;

        let shown = results
            .pop()
            .ok_or_else(|| EapiError::Decode(format!("no result for '{}'", Self::SHOW_COMMAND)))?;
        let lists: AccessLists = eapi::decode(shown)?;

        Ok(lists
            .acl_list
            .into_iter()
            .filter(|acl| !acl.readonly)
            .collect())
    }

    pub async fn find(&self, name: &str) -> AclResult<Acl> {
        self.list()
            .await?
            .into_iter()
            .find(|acl| acl.name == name)
            .ok_or_else(|| AclError::NotFound(name.to_string()))
    }

    /// Create `name` (or extend it) with `rules`.
    #[instrument(skip(self, rules))]
    pub async fn add_rules(&self, name: &str, rules: &[String]) -> AclResult<()> {
        validate_name(name)?;
        self.configure(Self::config_session(name, rules.iter().cloned()))
            .await?;
        info!("added {} rules to ACL {}", rules.len(), name);
        Ok(())
    }

    /// Remove rule `sequence` from `name` and add `rule` in its place.
    #[instrument(skip(self, rule))]
    pub async fn replace_rule(&self, name: &str, sequence: u32, rule: &str) -> AclResult<()> {
        validate_name(name)?;

        // An empty replacement would leave only the `no <seq>`
        let rule = rule.trim();
        if rule.is_empty() {
            return Err(AclError::InvalidRule(format!(
                "replacement for rule {sequence} is empty"
            )));
        }

        self.configure(Self::config_session(
            name,
            [format!("no {sequence}"), rule.to_string()],
        ))
        .await?;
        info!("replaced rule {} of ACL {}", sequence, name);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_rule(&self, name: &str, sequence: u32) -> AclResult<()> {
        validate_name(name)?;
        self.configure(Self::config_session(name, [format!("no {sequence}")]))
            .await?;
        info!("deleted rule {} of ACL {}", sequence, name);
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_acl(&self, name: &str) -> AclResult<()> {
        validate_name(name)?;
        self.configure(vec![
            "enable".to_string(),
            "configure".to_string(),
            format!("no ip access-list {name}"),
        ])
        .await?;
        info!("removed ACL {}", name);
        Ok(())
    }
}
