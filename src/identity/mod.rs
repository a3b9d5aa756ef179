//! External network address resolution.
//!
//! The address is observed either from this machine (HTTP GET to an IP-echo
//! endpoint) or from a remote server over SSH, which runs the same request
//! and prints the body. Both paths are bounded by timeouts and both return a
//! parsed [`Ipv4Addr`], so a malformed echo never reaches the document.
mod transport;

pub use transport::{RemoteOutput, RemoteRequest, SystemTransport, Transport};

use crate::config::{ConfigDocument, ExecutionMode};
use crate::error::{Error, Result};
use crate::util::truncate_string;
use std::net::Ipv4Addr;
use std::time::Duration;

pub const DEFAULT_IP_SERVICE_URL: &str = "https://api.ipify.org";
pub const LOCAL_TIMEOUT: Duration = Duration::from_secs(10);
pub const REMOTE_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const REMOTE_TIMEOUT: Duration = Duration::from_secs(15);

const MAX_REPORTED_OUTPUT_BYTES: usize = 256;

/// Inputs for one resolution, derived from the document.
#[derive(Clone)]
pub struct ResolveParams {
    pub ip_service_url: String,
    pub local_timeout: Duration,
    pub remote_user: String,
    pub remote_host: String,
    pub secret: Option<String>,
    pub connect_timeout: Duration,
    pub remote_timeout: Duration,
}

impl ResolveParams {
    pub fn from_document(doc: &ConfigDocument) -> Self {
        Self {
            ip_service_url: doc
                .network
                .ip_service_url
                .clone()
                .unwrap_or_else(|| DEFAULT_IP_SERVICE_URL.to_string()),
            local_timeout: LOCAL_TIMEOUT,
            remote_user: doc.network.remote_server.user.clone(),
            remote_host: doc.network.remote_server.host.clone(),
            secret: doc.security.sudo_pswd.clone(),
            connect_timeout: REMOTE_CONNECT_TIMEOUT,
            remote_timeout: REMOTE_TIMEOUT,
        }
    }
}

/// Resolve the current external IPv4 address in the given mode.
pub fn resolve(
    transport: &dyn Transport,
    mode: ExecutionMode,
    params: &ResolveParams,
) -> Result<Ipv4Addr> {
    let address = match mode {
        ExecutionMode::Local => resolve_local(transport, params)?,
        ExecutionMode::Remote => resolve_remote(transport, params)?,
    };
    tracing::info!(%mode, %address, "external address resolved");
    Ok(address)
}

fn resolve_local(transport: &dyn Transport, params: &ResolveParams) -> Result<Ipv4Addr> {
    let unreachable = |reason: String| Error::NetworkUnreachable {
        url: params.ip_service_url.clone(),
        reason,
    };
    tracing::debug!(url = %params.ip_service_url, "probing external address locally");
    let body = transport
        .http_get(&params.ip_service_url, params.local_timeout)
        .map_err(|err| unreachable(format!("{err:#}")))?;
    parse_address(&body).map_err(unreachable)
}

fn resolve_remote(transport: &dyn Transport, params: &ResolveParams) -> Result<Ipv4Addr> {
    let failed = |reason: String| Error::RemoteCommandFailed {
        host: params.remote_host.clone(),
        reason,
    };
    if params.remote_host.trim().is_empty() || params.remote_user.trim().is_empty() {
        return Err(failed(
            "network.remote_server.user and host must be set for remote mode".to_string(),
        ));
    }
    let command = format!(
        "curl -s --max-time {} {}",
        params.connect_timeout.as_secs(),
        params.ip_service_url
    );
    let request = RemoteRequest {
        user: &params.remote_user,
        host: &params.remote_host,
        command: &command,
        secret: params.secret.as_deref(),
        connect_timeout: params.connect_timeout,
        timeout: params.remote_timeout,
    };
    tracing::debug!(host = %params.remote_host, user = %params.remote_user, "probing external address remotely");
    let output = transport
        .remote_exec(&request)
        .map_err(|err| failed(format!("{err:#}")))?;

    let stdout = output.stdout.trim();
    if stdout.is_empty() {
        return Err(failed(format!(
            "empty response from remote host (exit code {:?}, stderr: {})",
            output.exit_code,
            truncate_string(output.stderr.trim(), MAX_REPORTED_OUTPUT_BYTES)
        )));
    }
    if output.timed_out {
        return Err(failed(format!(
            "timed out after {}s",
            params.remote_timeout.as_secs()
        )));
    }
    if output.exit_code != Some(0) {
        return Err(failed(format!(
            "exit code {:?}: {}",
            output.exit_code,
            truncate_string(output.stderr.trim(), MAX_REPORTED_OUTPUT_BYTES)
        )));
    }
    parse_address(stdout).map_err(failed)
}

/// Parse a trimmed echo body as a dotted-quad address.
pub fn parse_address(body: &str) -> std::result::Result<Ipv4Addr, String> {
    let trimmed = body.trim();
    trimmed.parse::<Ipv4Addr>().map_err(|_| {
        format!(
            "response {:?} is not a dotted-quad IPv4 address",
            truncate_string(trimmed, MAX_REPORTED_OUTPUT_BYTES)
        )
    })
}

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;
