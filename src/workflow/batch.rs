//! Provision and Revoke commands.
use super::print_json;
use crate::cli::{BatchArgs, ProvisionArgs, RevokeArgs};
use crate::config::{ConfigStore, DocumentStore, RunGuard, StageCommands};
use crate::identity::SystemTransport;
use crate::pipeline::{Orchestrator, PipelineOptions, ProvisionStages, RecordStatus, RunReport};
use crate::stage::{CommandStage, StageKind};
use anyhow::{Context, Result};

pub fn run_provision(args: ProvisionArgs) -> Result<()> {
    let store = batch_store(&args.batch)?;
    let _guard = RunGuard::acquire(store.path())?;
    let commands = stage_commands(&store)?;
    let mut stages = ProvisionStages {
        generate: Box::new(command_stage(&args.batch, StageKind::Generate, &commands.generate)?),
        package: Box::new(command_stage(&args.batch, StageKind::Package, &commands.package)?),
        notify: Box::new(command_stage(&args.batch, StageKind::Notify, &commands.notify)?),
    };
    let options = PipelineOptions {
        locale: args.batch.locale,
        mode: args.mode,
        on_stage_failure: args.batch.on_stage_failure,
    };

    let report = Orchestrator::new(&store, &SystemTransport)
        .provision(&options, &mut stages)
        .context("provision")?;
    finish(&report, args.batch.json)
}

pub fn run_revoke(args: RevokeArgs) -> Result<()> {
    let store = batch_store(&args.batch)?;
    let _guard = RunGuard::acquire(store.path())?;
    let commands = stage_commands(&store)?;
    let mut revoke = command_stage(&args.batch, StageKind::Revoke, &commands.revoke)?;
    let options = PipelineOptions {
        locale: args.batch.locale,
        mode: None,
        on_stage_failure: args.batch.on_stage_failure,
    };

    let report = Orchestrator::new(&store, &SystemTransport)
        .revoke(&options, &mut revoke)
        .context("revoke")?;
    finish(&report, args.batch.json)
}

/// Stages may run in another directory, so they get an absolute document path.
fn batch_store(args: &BatchArgs) -> Result<ConfigStore> {
    let config = &args.document.config;
    let absolute = std::path::absolute(config)
        .with_context(|| format!("resolve config path {}", config.display()))?;
    Ok(ConfigStore::new(absolute))
}

fn stage_commands(store: &ConfigStore) -> Result<StageCommands> {
    Ok(store.load().context("load config document")?.stages)
}

fn command_stage(args: &BatchArgs, kind: StageKind, command_line: &str) -> Result<CommandStage> {
    let stage = CommandStage::parse(kind, command_line)?;
    Ok(match &args.stage_dir {
        Some(dir) => stage.with_cwd(dir),
        None => stage,
    })
}

/// Show the report, then fail with the aborting stage if there was one.
fn finish(report: &RunReport, json: bool) -> Result<()> {
    emit(report, json)?;
    match report.abort_error() {
        Some(err) => Err(anyhow::Error::from(err).context(report.pipeline.as_str())),
        None => Ok(()),
    }
}

fn emit(report: &RunReport, json: bool) -> Result<()> {
    if json {
        return print_json(report);
    }
    for record in &report.records {
        let status = match record.status {
            RecordStatus::Completed => "ok",
            RecordStatus::CompletedWithFailures => "stage failures",
            RecordStatus::Aborted => "aborted",
            RecordStatus::Skipped => "skipped",
        };
        let position = format!("[{}/{}]", record.index, report.subject_count);
        match &record.reason {
            Some(reason) => println!("{position} {}: {status} ({reason})", record.name),
            None => println!("{position} {}: {status}", record.name),
        }
    }
    println!(
        "{}: {} subjects, {} skipped, {} failed stages",
        report.pipeline.as_str(),
        report.subject_count,
        report.skipped(),
        report.failed_stages()
    );
    Ok(())
}
