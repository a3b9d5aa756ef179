//! Provision and Revoke pipelines.
//!
//! Both walk the same phases:
//! `SelectLocale -> SelectMode -> ResolveIdentity -> LoadRoster -> PerRecord* -> Done`,
//! with Revoke skipping the mode and identity phases. Everything before
//! `PerRecord` is fatal on error; inside `PerRecord` a failed document reload
//! skips that record only. A stage failure under the abort policy ends the
//! batch but still returns the report of every record reached.
mod orchestrator;
mod report;

pub use orchestrator::{Orchestrator, PipelineOptions, ProvisionStages};
pub use report::{AbortedStage, PipelineKind, RecordReport, RecordStatus, RunReport};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SelectLocale,
    SelectMode,
    ResolveIdentity,
    WritePreferences,
    LoadRoster,
    PerRecord,
    Done,
}
