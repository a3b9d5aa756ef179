//! External units of work run once per subject.
//!
//! A stage receives the current subject and reports how it ended. The
//! orchestrator decides what a failed stage means; stages never see the
//! policy.
mod command;
mod runner;

pub use command::CommandStage;
pub use runner::{invoke, StageReport};

use crate::roster::{Locale, SubjectRecord};
use serde::Serialize;
use std::path::Path;

/// Which pipeline step a stage fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Generate,
    Package,
    Notify,
    Revoke,
}

impl StageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StageKind::Generate => "generate",
            StageKind::Package => "package",
            StageKind::Notify => "notify",
            StageKind::Revoke => "revoke",
        }
    }
}

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageOutcome {
    Succeeded,
    Failed { code: Option<i32> },
}

impl StageOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, StageOutcome::Succeeded)
    }
}

/// The minimal per-stage payload: one subject plus where it sits in the run.
#[derive(Debug, Clone, Copy)]
pub struct SubjectContext<'a> {
    pub record: &'a SubjectRecord,
    /// 1-based position in the roster.
    pub index: usize,
    pub count: usize,
    pub locale: Locale,
    /// Document the orchestrator saved this subject into.
    pub config_path: &'a Path,
}

pub trait Stage {
    fn kind(&self) -> StageKind;

    /// Block until the unit of work finishes. `Err` means it could not be
    /// started at all.
    fn run(&mut self, subject: &SubjectContext<'_>) -> anyhow::Result<StageOutcome>;
}
