//! Command handlers behind the CLI.
//!
//! Each handler builds the production seams (file-backed document, system
//! transport, sudo, external stage commands), holds the run guard where the
//! document is written, and prints a short summary or JSON.
mod batch;
mod document;
mod endpoint;

pub use batch::{run_provision, run_revoke};
pub use document::{run_resolve_ip, run_set_mode, run_write_prefs};
pub use endpoint::{run_rewrite_endpoint, run_update_endpoint};

use anyhow::{Context, Result};
use serde::Serialize;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("serialize report")?;
    println!("{json}");
    Ok(())
}
