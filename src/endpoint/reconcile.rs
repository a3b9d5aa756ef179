//! Read-modify-write-restart-verify for the live tunnel configuration.
//!
//! The privileged file is snapshotted before it is replaced. If the interface
//! refuses to come back up, the snapshot is reinstalled and brought up again
//! before the failure is reported.
use super::elevate::Elevator;
use super::rewrite::rewrite_endpoint;
use crate::config::ConfigDocument;
use crate::error::{Error, Result};
use serde::Serialize;
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

pub const DEFAULT_TUNNEL_CONFIG: &str = "/etc/wireguard/wg0-client.conf";
pub const DEFAULT_INTERFACE: &str = "wg0-client";
pub const DEFAULT_OWNER: &str = "root:root";
pub const DEFAULT_FILE_MODE: &str = "600";

/// The privileged file and the interface it drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelTarget {
    pub config_path: PathBuf,
    pub interface: String,
    pub owner: String,
    pub file_mode: String,
}

impl Default for TunnelTarget {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_TUNNEL_CONFIG),
            interface: DEFAULT_INTERFACE.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            file_mode: DEFAULT_FILE_MODE.to_string(),
        }
    }
}

impl TunnelTarget {
    /// Defaults overlaid with the document's `tunnel` region.
    pub fn from_document(doc: &ConfigDocument) -> Self {
        let defaults = Self::default();
        let tunnel = &doc.tunnel;
        Self {
            config_path: tunnel.config_path.clone().unwrap_or(defaults.config_path),
            interface: tunnel.interface.clone().unwrap_or(defaults.interface),
            owner: tunnel.owner.clone().unwrap_or(defaults.owner),
            file_mode: tunnel.file_mode.clone().unwrap_or(defaults.file_mode),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub address: Ipv4Addr,
    pub replacements: usize,
    pub content_changed: bool,
    /// Set when bringing the interface down failed; the run continued.
    pub down_warning: Option<String>,
    /// `wg show` output, when it could be queried.
    pub status: Option<String>,
}

/// Point the tunnel at `address` and restart the interface.
pub fn apply_endpoint(
    elevator: &dyn Elevator,
    target: &TunnelTarget,
    address: Ipv4Addr,
) -> Result<ReconcileReport> {
    let path = &target.config_path;
    let snapshot = elevator
        .read(path)
        .map_err(|err| Error::PrivilegedReadFailed {
            path: path.clone(),
            reason: format!("{err:#}"),
        })?;

    let rewrite = rewrite_endpoint(&snapshot, address);
    if rewrite.replacements == 0 {
        tracing::warn!(
            path = %path.display(),
            "no Endpoint line found; installing unchanged and restarting"
        );
    }
    let content_changed = rewrite.changed(&snapshot);

    install_text(elevator, target, &rewrite.text).map_err(|err| Error::PrivilegedWriteFailed {
        path: path.clone(),
        reason: format!("{err:#}"),
    })?;
    tracing::info!(path = %path.display(), %address, content_changed, "tunnel config installed");

    let iface = target.interface.as_str();
    let down_warning = match elevator.run(&["wg-quick", "down", iface]) {
        Ok(_) => None,
        Err(err) => {
            tracing::warn!(interface = iface, error = %format!("{err:#}"), "interface down failed; continuing");
            Some(format!("{err:#}"))
        }
    };

    if let Err(err) = elevator.run(&["wg-quick", "up", iface]) {
        let reason = format!("{err:#}");
        tracing::error!(interface = iface, error = %reason, "interface up failed; restoring snapshot");
        let rolled_back = roll_back(elevator, target, &snapshot);
        return Err(Error::ServiceRestartFailed {
            interface: target.interface.clone(),
            reason,
            rolled_back,
        });
    }

    let status = match elevator.run(&["wg", "show", iface]) {
        Ok(status) => {
            tracing::info!(interface = iface, status = %status.trim(), "tunnel status");
            Some(status)
        }
        Err(err) => {
            tracing::warn!(interface = iface, error = %format!("{err:#}"), "tunnel status query failed");
            None
        }
    };

    Ok(ReconcileReport {
        address,
        replacements: rewrite.replacements,
        content_changed,
        down_warning,
        status,
    })
}

fn roll_back(elevator: &dyn Elevator, target: &TunnelTarget, snapshot: &str) -> bool {
    let iface = target.interface.as_str();
    if let Err(err) = install_text(elevator, target, snapshot) {
        tracing::error!(error = %format!("{err:#}"), "snapshot reinstall failed");
        return false;
    }
    match elevator.run(&["wg-quick", "up", iface]) {
        Ok(_) => {
            tracing::warn!(interface = iface, "previous tunnel config restored and up");
            true
        }
        Err(err) => {
            tracing::error!(interface = iface, error = %format!("{err:#}"), "interface still down after rollback");
            false
        }
    }
}

/// Stage `text` in a temp file, move it over the target, then restrict it.
fn install_text(elevator: &dyn Elevator, target: &TunnelTarget, text: &str) -> anyhow::Result<()> {
    use anyhow::Context;
    let mut tmp = tempfile::Builder::new()
        .prefix(&staging_prefix(&target.config_path))
        .suffix(".temp")
        .tempfile()
        .context("create staging file")?;
    tmp.write_all(text.as_bytes())
        .context("write staging file")?;
    tmp.flush().context("flush staging file")?;
    let staged = tmp.into_temp_path();

    elevator.install(&staged, &target.config_path)?;
    elevator.chown(&target.config_path, &target.owner)?;
    elevator.chmod(&target.config_path, &target.file_mode)?;
    // Moved away by the install; nothing left to delete.
    let _ = staged.keep();
    Ok(())
}

fn staging_prefix(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "tunnel".to_string());
    format!("{name}.")
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
