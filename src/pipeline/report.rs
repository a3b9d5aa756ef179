use crate::config::ExecutionMode;
use crate::error::Error;
use crate::roster::Locale;
use crate::stage::{StageKind, StageReport};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineKind {
    Provision,
    Revoke,
}

impl PipelineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineKind::Provision => "provision",
            PipelineKind::Revoke => "revoke",
        }
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub pipeline: PipelineKind,
    pub locale: Locale,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<ExecutionMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferences_path: Option<String>,
    pub subject_count: usize,
    /// Every record reached, including the one that stopped an aborted run.
    pub records: Vec<RecordReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<AbortedStage>,
}

impl RunReport {
    pub fn skipped(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.status == RecordStatus::Skipped)
            .count()
    }

    pub fn failed_stages(&self) -> usize {
        self.records
            .iter()
            .flat_map(|record| &record.stages)
            .filter(|stage| !stage.outcome.is_success())
            .count()
    }

    /// The failure to report once the partial report has been shown.
    pub fn abort_error(&self) -> Option<Error> {
        self.aborted.as_ref().map(|aborted| Error::StageFailed {
            stage: aborted.stage.as_str().to_string(),
            subject: aborted.subject.clone(),
            code: aborted.code,
        })
    }
}

/// The stage that stopped a run under the abort policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbortedStage {
    pub stage: StageKind,
    pub subject: String,
    pub code: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Completed,
    CompletedWithFailures,
    Aborted,
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordReport {
    pub index: usize,
    pub name: String,
    pub status: RecordStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub stages: Vec<StageReport>,
}
