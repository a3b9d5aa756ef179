//! Typed failures surfaced at component boundaries.
//!
//! Command handlers wrap these in `anyhow` for context; `main` recovers the
//! variant from the chain to pick a process exit code.
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Exit code for configuration and roster problems.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for network identity resolution failures.
pub const EXIT_NETWORK: u8 = 3;
/// Exit code for privileged file or tunnel service failures.
pub const EXIT_TUNNEL: u8 = 4;
/// Exit code for everything else, including aborted stages.
pub const EXIT_OTHER: u8 = 1;

#[derive(Debug, Error)]
pub enum Error {
    #[error("config document not found at {}", .path.display())]
    ConfigMissing { path: PathBuf },

    #[error("config document {} is malformed: {reason}", .path.display())]
    ConfigMalformed { path: PathBuf, reason: String },

    #[error("write config document {}", .path.display())]
    ConfigWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("network unreachable via {url}: {reason}")]
    NetworkUnreachable { url: String, reason: String },

    #[error("remote command on {host} failed: {reason}")]
    RemoteCommandFailed { host: String, reason: String },

    #[error("privileged read of {} failed: {reason}", .path.display())]
    PrivilegedReadFailed { path: PathBuf, reason: String },

    #[error("privileged write of {} failed: {reason}", .path.display())]
    PrivilegedWriteFailed { path: PathBuf, reason: String },

    #[error("tunnel interface {interface} did not come up: {reason} (previous config restored: {rolled_back})")]
    ServiceRestartFailed {
        interface: String,
        reason: String,
        rolled_back: bool,
    },

    #[error("no roster for locale {locale}: {detail}")]
    DataSourceMissing { locale: String, detail: String },

    #[error("roster {} does not match the locale schema: {detail}", .path.display())]
    SchemaMismatch { path: PathBuf, detail: String },

    #[error("{value:?} is not a dotted-quad IPv4 address")]
    InvalidAddress { value: String },

    #[error("another run holds {} (remove it if no run is active)", .path.display())]
    RunLocked { path: PathBuf },

    #[error("stage {stage} failed for {subject} (exit code {code:?})")]
    StageFailed {
        stage: String,
        subject: String,
        code: Option<i32>,
    },
}

impl Error {
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::ConfigMissing { .. }
            | Error::ConfigMalformed { .. }
            | Error::ConfigWriteError { .. }
            | Error::DataSourceMissing { .. }
            | Error::SchemaMismatch { .. }
            | Error::InvalidAddress { .. }
            | Error::RunLocked { .. } => EXIT_CONFIG,
            Error::NetworkUnreachable { .. } | Error::RemoteCommandFailed { .. } => EXIT_NETWORK,
            Error::PrivilegedReadFailed { .. }
            | Error::PrivilegedWriteFailed { .. }
            | Error::ServiceRestartFailed { .. } => EXIT_TUNNEL,
            Error::StageFailed { .. } => EXIT_OTHER,
        }
    }
}

/// Pick the exit code for an `anyhow` chain, defaulting to [`EXIT_OTHER`].
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<Error>())
        .map(Error::exit_code)
        .unwrap_or(EXIT_OTHER)
}
