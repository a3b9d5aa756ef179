//! Typed regions of the shared configuration document.
//!
//! Key names are the contract with the external stages, so they match what
//! those tools read. Unknown keys survive a load/save cycle through the
//! flattened `extra` maps.
use crate::roster::{Locale, SubjectRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

pub type Extra = BTreeMap<String, serde_yaml::Value>;

/// Where the external address is observed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Query the IP-echo endpoint from this machine.
    Local,
    /// Query it from the configured remote server over SSH.
    Remote,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Local => f.write_str("local"),
            ExecutionMode::Remote => f.write_str("remote"),
        }
    }
}

/// What the orchestrator does when a stage exits unsuccessfully.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum StageFailurePolicy {
    /// Log the failure and keep going with the next stage and record.
    #[default]
    Continue,
    /// Stop the pipeline at the first failed stage.
    Abort,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub execution: Execution,
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub security: Security,
    #[serde(default)]
    pub user_management: UserManagement,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub stages: StageCommands,
    #[serde(default, skip_serializing_if = "TunnelSettings::is_empty")]
    pub tunnel: TunnelSettings,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExecutionMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_stage_failure: Option<StageFailurePolicy>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub external_ip: String,
    #[serde(default)]
    pub remote_server: RemoteServer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_service_url: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteServer {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub host: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Secrets consumed by privileged steps and stages; never written by this crate.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Security {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sudo_pswd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_creds_path: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl fmt::Debug for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Security")
            .field("sudo_pswd", &self.sudo_pswd.as_ref().map(|_| "<redacted>"))
            .field("api_creds_path", &self.api_creds_path)
            .field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserManagement {
    #[serde(default)]
    pub state: SubjectState,
    /// Lowercase locale code to roster path.
    #[serde(default)]
    pub data_sources: BTreeMap<String, PathBuf>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// The subject currently handed to external stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_users: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SubjectState {
    /// Replace the subject fields with one record, dropping the previous subject.
    pub fn assign(&mut self, record: &SubjectRecord) {
        self.client_name = Some(record.name.clone());
        self.email_address = Some(record.email.clone());
        self.registration_date = Some(record.registered.clone());
    }

    /// Hand off only the subject name; the revoke stage needs nothing else.
    pub fn assign_name(&mut self, record: &SubjectRecord) {
        self.client_name = Some(record.name.clone());
        self.email_address = None;
        self.registration_date = None;
    }

    pub fn locale(&self) -> Option<Result<Locale, String>> {
        self.user_type.as_deref().map(str::parse)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences_output: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_output: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Command lines for the external stages, split with shell quoting rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCommands {
    #[serde(default = "default_generate")]
    pub generate: String,
    #[serde(default = "default_package")]
    pub package: String,
    #[serde(default = "default_notify")]
    pub notify: String,
    #[serde(default = "default_revoke")]
    pub revoke: String,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Default for StageCommands {
    fn default() -> Self {
        Self {
            generate: default_generate(),
            package: default_package(),
            notify: default_notify(),
            revoke: default_revoke(),
            extra: Extra::new(),
        }
    }
}

fn default_generate() -> String {
    "./make_cert.sh".to_string()
}

fn default_package() -> String {
    "./package.sh".to_string()
}

fn default_notify() -> String {
    "python3 email_sender.py".to_string()
}

fn default_revoke() -> String {
    "./revoke_cert.sh".to_string()
}

/// Overrides for the tunnel endpoint reconciler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_mode: Option<String>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl TunnelSettings {
    /// True when nothing, not even an unknown key, would be written back.
    fn is_empty(&self) -> bool {
        self.config_path.is_none()
            && self.interface.is_none()
            && self.owner.is_none()
            && self.file_mode.is_none()
            && self.extra.is_empty()
    }
}
