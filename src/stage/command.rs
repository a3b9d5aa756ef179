//! Stages backed by an external program.
use super::{Stage, StageKind, StageOutcome, SubjectContext};
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::process::Command;

pub const ENV_SUBJECT_NAME: &str = "TROSTER_SUBJECT_NAME";
pub const ENV_SUBJECT_EMAIL: &str = "TROSTER_SUBJECT_EMAIL";
pub const ENV_SUBJECT_REGISTERED: &str = "TROSTER_SUBJECT_REGISTERED";
pub const ENV_SUBJECT_INDEX: &str = "TROSTER_SUBJECT_INDEX";
pub const ENV_SUBJECT_COUNT: &str = "TROSTER_SUBJECT_COUNT";
pub const ENV_LOCALE: &str = "TROSTER_LOCALE";
pub const ENV_CONFIG: &str = "TROSTER_CONFIG";

/// Runs a command line (split with shell quoting rules, no shell involved)
/// with inherited stdio, so the tool can talk to the operator.
#[derive(Debug, Clone)]
pub struct CommandStage {
    kind: StageKind,
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandStage {
    pub fn parse(kind: StageKind, command_line: &str) -> Result<Self> {
        let mut words = shell_words::split(command_line)
            .with_context(|| format!("parse {} stage command: {command_line}", kind.as_str()))?;
        if words.is_empty() {
            return Err(anyhow!("{} stage command is empty", kind.as_str()));
        }
        let program = words.remove(0);
        Ok(Self {
            kind,
            program,
            args: words,
            cwd: None,
        })
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }
}

impl Stage for CommandStage {
    fn kind(&self) -> StageKind {
        self.kind
    }

    fn run(&mut self, subject: &SubjectContext<'_>) -> Result<StageOutcome> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env(ENV_SUBJECT_NAME, &subject.record.name)
            .env(ENV_SUBJECT_EMAIL, &subject.record.email)
            .env(ENV_SUBJECT_REGISTERED, &subject.record.registered)
            .env(ENV_SUBJECT_INDEX, subject.index.to_string())
            .env(ENV_SUBJECT_COUNT, subject.count.to_string())
            .env(ENV_LOCALE, subject.locale.code())
            .env(ENV_CONFIG, subject.config_path);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        let status = cmd
            .status()
            .with_context(|| format!("spawn {} stage: {}", self.kind.as_str(), self.program))?;
        if status.success() {
            Ok(StageOutcome::Succeeded)
        } else {
            Ok(StageOutcome::Failed {
                code: status.code(),
            })
        }
    }
}
