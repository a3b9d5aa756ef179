//! Tunnel endpoint commands.
use super::print_json;
use crate::cli::{RewriteEndpointArgs, UpdateEndpointArgs};
use crate::config::{ConfigStore, DocumentStore, RunGuard};
use crate::endpoint::{apply_endpoint, rewrite_file, SudoElevator, TunnelTarget};
use crate::error::Error;
use anyhow::{Context, Result};
use std::net::Ipv4Addr;

pub fn run_update_endpoint(args: UpdateEndpointArgs) -> Result<()> {
    let store = ConfigStore::new(&args.document.config);
    let _guard = RunGuard::acquire(store.path())?;
    let doc = store.load().context("load config document")?;
    let address = parse_ipv4(&doc.network.external_ip)
        .context("network.external_ip (run `troster resolve-ip` first)")?;

    let mut target = TunnelTarget::from_document(&doc);
    if let Some(path) = args.tunnel_config {
        target.config_path = path;
    }
    if let Some(interface) = args.interface {
        target.interface = interface;
    }
    let secret = doc.security.sudo_pswd.clone().unwrap_or_else(|| {
        tracing::debug!("security.sudo_pswd not set; relying on passwordless sudo");
        String::new()
    });

    let report = apply_endpoint(&SudoElevator::new(secret), &target, address)
        .with_context(|| format!("update endpoint in {}", target.config_path.display()))?;
    if args.json {
        return print_json(&report);
    }
    println!(
        "{}: endpoint {} ({} line(s), changed: {})",
        target.interface, report.address, report.replacements, report.content_changed
    );
    if let Some(status) = &report.status {
        println!("{}", status.trim_end());
    }
    Ok(())
}

pub fn run_rewrite_endpoint(args: RewriteEndpointArgs) -> Result<()> {
    let address = parse_ipv4(&args.address)?;
    let rewrite = rewrite_file(&args.file, address)?;
    if rewrite.replacements == 0 {
        println!("{}: no Endpoint line; unchanged", args.file.display());
    } else {
        println!("{}: Endpoint set to {address}", args.file.display());
    }
    Ok(())
}

/// Parse a dotted-quad address or fail with [`Error::InvalidAddress`].
fn parse_ipv4(value: &str) -> Result<Ipv4Addr> {
    value
        .trim()
        .parse()
        .map_err(|_| {
            Error::InvalidAddress {
                value: value.to_string(),
            }
            .into()
        })
}
