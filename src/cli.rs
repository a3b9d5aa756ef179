//! CLI argument parsing for the credential roster workflow.
//!
//! Flags stand in for interactive prompts. A flag left out falls back to the
//! value already stored in the config document.
use crate::config::{ExecutionMode, StageFailurePolicy, DEFAULT_CONFIG_PATH};
use crate::roster::Locale;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "troster",
    version,
    about = "Batch tunnel credential provisioning and revocation",
    after_help = "Examples:\n  troster set-mode remote\n  troster resolve-ip\n  troster update-endpoint\n  troster provision --locale EN --mode local\n  troster revoke --locale PL --on-stage-failure abort\n  troster rewrite-endpoint ./wg0-client.conf 203.0.113.5",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Provision(ProvisionArgs),
    Revoke(RevokeArgs),
    SetMode(SetModeArgs),
    ResolveIp(ResolveIpArgs),
    UpdateEndpoint(UpdateEndpointArgs),
    WritePrefs(WritePrefsArgs),
    RewriteEndpoint(RewriteEndpointArgs),
}

/// Location of the shared document, common to every document-backed command.
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// Shared YAML config document
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Options shared by both batch pipelines.
#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Roster locale (defaults to user_management.state.user_type)
    #[arg(long, value_enum)]
    pub locale: Option<Locale>,

    /// What to do when a stage exits unsuccessfully
    #[arg(long, value_enum, value_name = "POLICY")]
    pub on_stage_failure: Option<StageFailurePolicy>,

    /// Working directory for stage commands
    #[arg(long, value_name = "DIR")]
    pub stage_dir: Option<PathBuf>,

    /// Emit the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Resolve the external address and provision every roster subject")]
pub struct ProvisionArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Where to observe the external address from (defaults to execution.mode)
    #[arg(long, value_enum)]
    pub mode: Option<ExecutionMode>,
}

#[derive(Parser, Debug)]
#[command(about = "Revoke credentials for every roster subject")]
pub struct RevokeArgs {
    #[command(flatten)]
    pub batch: BatchArgs,
}

#[derive(Parser, Debug)]
#[command(about = "Persist the execution mode in the config document")]
pub struct SetModeArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    #[arg(value_enum)]
    pub mode: ExecutionMode,
}

#[derive(Parser, Debug)]
#[command(about = "Resolve the external address and store it in the config document")]
pub struct ResolveIpArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Override execution.mode for this lookup
    #[arg(long, value_enum)]
    pub mode: Option<ExecutionMode>,
}

#[derive(Parser, Debug)]
#[command(about = "Point the tunnel at the stored address and restart it")]
pub struct UpdateEndpointArgs {
    #[command(flatten)]
    pub document: DocumentArgs,

    /// Privileged tunnel config to rewrite (defaults to tunnel.config_path)
    #[arg(long, value_name = "PATH")]
    pub tunnel_config: Option<PathBuf>,

    /// Tunnel interface to restart (defaults to tunnel.interface)
    #[arg(long, value_name = "NAME")]
    pub interface: Option<String>,

    /// Emit the reconcile report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
#[command(about = "Write the client preference file for the stored address")]
pub struct WritePrefsArgs {
    #[command(flatten)]
    pub document: DocumentArgs,
}

/// Unprivileged endpoint substitution on a file the caller can write.
#[derive(Parser, Debug)]
#[command(about = "Replace the Endpoint address in a tunnel config file")]
pub struct RewriteEndpointArgs {
    /// Tunnel config file to edit in place
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// New dotted-quad IPv4 address
    #[arg(value_name = "IP")]
    pub address: String,
}
