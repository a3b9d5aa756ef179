//! Single-purpose edits of the config document.
use crate::cli::{ResolveIpArgs, SetModeArgs, WritePrefsArgs};
use crate::config::{ConfigStore, DocumentStore, Execution, RunGuard};
use crate::error::Error;
use crate::identity::{self, ResolveParams, SystemTransport};
use crate::prefs;
use anyhow::{Context, Result};

pub fn run_set_mode(args: SetModeArgs) -> Result<()> {
    let store = ConfigStore::new(&args.document.config);
    let _guard = RunGuard::acquire(store.path())?;
    let mut doc = store.load().context("load config document")?;
    if doc.execution == Execution::default() {
        tracing::warn!(path = %store.path().display(), "execution section missing; adding it");
    }
    doc.execution.mode = Some(args.mode);
    store.save(&doc).context("save execution mode")?;
    tracing::info!(mode = %args.mode, "execution mode stored");
    println!("execution mode: {}", args.mode);
    Ok(())
}

pub fn run_resolve_ip(args: ResolveIpArgs) -> Result<()> {
    let store = ConfigStore::new(&args.document.config);
    let _guard = RunGuard::acquire(store.path())?;
    let mut doc = store.load().context("load config document")?;
    let mode = args
        .mode
        .or(doc.execution.mode)
        .ok_or_else(|| Error::ConfigMalformed {
            path: store.path().to_path_buf(),
            reason: "no execution mode; pass --mode or run `troster set-mode`".to_string(),
        })?;

    let address = identity::resolve(&SystemTransport, mode, &ResolveParams::from_document(&doc))
        .context("resolve external address")?;
    doc.network.external_ip = address.to_string();
    store.save(&doc).context("save resolved address")?;
    println!("{address}");
    Ok(())
}

pub fn run_write_prefs(args: WritePrefsArgs) -> Result<()> {
    let store = ConfigStore::new(&args.document.config);
    let doc = store.load().context("load config document")?;
    let path = prefs::write_preferences(&doc)?;
    println!("wrote {}", path.display());
    Ok(())
}
