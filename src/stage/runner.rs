use super::{Stage, StageKind, StageOutcome, SubjectContext};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: StageKind,
    #[serde(flatten)]
    pub outcome: StageOutcome,
    pub elapsed_ms: u64,
}

/// Run one stage for the current subject and time it.
///
/// A stage that cannot be spawned is reported as failed with no exit code,
/// the same as one that ran and exited unsuccessfully.
pub fn invoke(stage: &mut dyn Stage, subject: &SubjectContext<'_>) -> StageReport {
    let kind = stage.kind();
    tracing::info!(
        stage = kind.as_str(),
        subject = %subject.record.name,
        index = subject.index,
        count = subject.count,
        "stage start"
    );
    let start = Instant::now();
    let outcome = match stage.run(subject) {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(stage = kind.as_str(), error = %format!("{err:#}"), "stage could not start");
            StageOutcome::Failed { code: None }
        }
    };
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    match outcome {
        StageOutcome::Succeeded => {
            tracing::info!(stage = kind.as_str(), elapsed_ms, "stage complete")
        }
        StageOutcome::Failed { code } => {
            tracing::warn!(stage = kind.as_str(), elapsed_ms, exit_code = ?code, "stage failed")
        }
    }
    StageReport {
        stage: kind,
        outcome,
        elapsed_ms,
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
