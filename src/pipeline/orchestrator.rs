use super::report::{AbortedStage, PipelineKind, RecordReport, RecordStatus, RunReport};
use super::Phase;
use crate::config::{
    ConfigDocument, DocumentStore, ExecutionMode, StageFailurePolicy, SubjectState,
};
use crate::error::Error;
use crate::identity::{self, ResolveParams, Transport};
use crate::prefs;
use crate::roster::{self, Locale, RosterColumns, SubjectRecord};
use crate::stage::{invoke, Stage, StageOutcome, SubjectContext};
use anyhow::{Context, Result};

/// Choices normally made at the start of a run. `None` falls back to the
/// value already stored in the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub locale: Option<Locale>,
    pub mode: Option<ExecutionMode>,
    pub on_stage_failure: Option<StageFailurePolicy>,
}

/// The three per-subject stages of the Provision pipeline, run in field order.
pub struct ProvisionStages {
    pub generate: Box<dyn Stage>,
    pub package: Box<dyn Stage>,
    pub notify: Box<dyn Stage>,
}

impl ProvisionStages {
    fn ordered(&mut self) -> [&mut dyn Stage; 3] {
        [
            self.generate.as_mut(),
            self.package.as_mut(),
            self.notify.as_mut(),
        ]
    }
}

pub struct Orchestrator<'a> {
    store: &'a dyn DocumentStore,
    transport: &'a dyn Transport,
}

struct Batch<'r> {
    pipeline: PipelineKind,
    locale: Locale,
    policy: StageFailurePolicy,
    records: &'r [SubjectRecord],
    hand_off: fn(&mut SubjectState, &SubjectRecord),
}

struct BatchOutcome {
    records: Vec<RecordReport>,
    aborted: Option<AbortedStage>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(store: &'a dyn DocumentStore, transport: &'a dyn Transport) -> Self {
        Self { store, transport }
    }

    /// Resolve the external address, then generate, package and deliver
    /// credentials for every roster subject.
    pub fn provision(
        &self,
        options: &PipelineOptions,
        stages: &mut ProvisionStages,
    ) -> Result<RunReport> {
        let pipeline = PipelineKind::Provision;
        let mut doc = self.store.load().context("load config document")?;

        enter(pipeline, Phase::SelectLocale);
        let locale = self.select_locale(options, &doc)?;
        doc.user_management.state.user_type = Some(locale.code().to_string());

        enter(pipeline, Phase::SelectMode);
        let mode = self.select_mode(options, &doc)?;
        doc.execution.mode = Some(mode);
        let policy = select_policy(options, &doc);

        enter(pipeline, Phase::ResolveIdentity);
        let address = identity::resolve(self.transport, mode, &ResolveParams::from_document(&doc))
            .context("resolve external address")?;
        doc.network.external_ip = address.to_string();
        self.store.save(&doc).context("save resolved address")?;

        enter(pipeline, Phase::WritePreferences);
        let preferences_path = if doc.paths.preferences_output.is_some() {
            let path = prefs::write_preferences(&doc).context("write client preference file")?;
            Some(path.display().to_string())
        } else {
            tracing::debug!("paths.preferences_output not set; skipping preference file");
            None
        };

        enter(pipeline, Phase::LoadRoster);
        let records = self.load_roster(&doc, locale, RosterColumns::Full)?;
        doc.user_management.state.number_users = Some(records.len());
        self.store.save(&doc).context("save subject count")?;

        enter(pipeline, Phase::PerRecord);
        let batch = Batch {
            pipeline,
            locale,
            policy,
            records: &records,
            hand_off: SubjectState::assign,
        };
        let outcome = self.run_batch(&batch, &mut stages.ordered());

        enter(pipeline, Phase::Done);
        Ok(RunReport {
            pipeline,
            locale,
            mode: Some(mode),
            external_ip: Some(address.to_string()),
            preferences_path,
            subject_count: records.len(),
            records: outcome.records,
            aborted: outcome.aborted,
        })
    }

    /// Hand every roster subject to the revoke stage, one at a time.
    pub fn revoke(&self, options: &PipelineOptions, revoke: &mut dyn Stage) -> Result<RunReport> {
        let pipeline = PipelineKind::Revoke;
        let mut doc = self.store.load().context("load config document")?;

        enter(pipeline, Phase::SelectLocale);
        let locale = self.select_locale(options, &doc)?;
        let policy = select_policy(options, &doc);
        if doc.user_management.state.user_type.as_deref() != Some(locale.code()) {
            doc.user_management.state.user_type = Some(locale.code().to_string());
            self.store.save(&doc).context("save selected locale")?;
        }

        enter(pipeline, Phase::LoadRoster);
        let records = self.load_roster(&doc, locale, RosterColumns::NameOnly)?;

        enter(pipeline, Phase::PerRecord);
        let batch = Batch {
            pipeline,
            locale,
            policy,
            records: &records,
            hand_off: SubjectState::assign_name,
        };
        let outcome = self.run_batch(&batch, &mut [revoke]);

        enter(pipeline, Phase::Done);
        Ok(RunReport {
            pipeline,
            locale,
            mode: None,
            external_ip: None,
            preferences_path: None,
            subject_count: records.len(),
            records: outcome.records,
            aborted: outcome.aborted,
        })
    }

    fn select_locale(&self, options: &PipelineOptions, doc: &ConfigDocument) -> Result<Locale> {
        if let Some(locale) = options.locale {
            return Ok(locale);
        }
        let reason = match doc.user_management.state.locale() {
            Some(Ok(locale)) => return Ok(locale),
            Some(Err(reason)) => format!("user_management.state.user_type: {reason}"),
            None => "no locale selected; pass --locale or set user_management.state.user_type"
                .to_string(),
        };
        Err(Error::ConfigMalformed {
            path: self.store.location().to_path_buf(),
            reason,
        }
        .into())
    }

    fn select_mode(&self, options: &PipelineOptions, doc: &ConfigDocument) -> Result<ExecutionMode> {
        options.mode.or(doc.execution.mode).ok_or_else(|| {
            Error::ConfigMalformed {
                path: self.store.location().to_path_buf(),
                reason: "no execution mode; pass --mode or set execution.mode".to_string(),
            }
            .into()
        })
    }

    fn load_roster(
        &self,
        doc: &ConfigDocument,
        locale: Locale,
        columns: RosterColumns,
    ) -> Result<Vec<SubjectRecord>> {
        let key = locale.data_source_key();
        let path = doc
            .user_management
            .data_sources
            .get(&key)
            .ok_or_else(|| Error::DataSourceMissing {
                locale: locale.code().to_string(),
                detail: format!("user_management.data_sources has no {key:?} entry"),
            })?;
        let records = roster::load(locale.schema(), path, columns)?;
        let names: Vec<&str> = records.iter().map(|record| record.name.as_str()).collect();
        tracing::info!(count = records.len(), subjects = ?names, "roster preview");
        Ok(records)
    }

    fn run_batch(
        &self,
        batch: &Batch<'_>,
        stages: &mut [&mut dyn Stage],
    ) -> BatchOutcome {
        let count = batch.records.len();
        let mut reports = Vec::with_capacity(count);
        for (offset, record) in batch.records.iter().enumerate() {
            let index = offset + 1;
            let skip = |reason: String| {
                tracing::warn!(
                    pipeline = batch.pipeline.as_str(),
                    subject = %record.name,
                    index,
                    reason = %reason,
                    "record skipped"
                );
                RecordReport {
                    index,
                    name: record.name.clone(),
                    status: RecordStatus::Skipped,
                    reason: Some(reason),
                    stages: Vec::new(),
                }
            };

            let mut doc = match self.store.load() {
                Ok(doc) => doc,
                Err(err) => {
                    reports.push(skip(format!("reload config document: {err}")));
                    continue;
                }
            };
            (batch.hand_off)(&mut doc.user_management.state, record);
            if let Err(err) = self.store.save(&doc) {
                reports.push(skip(format!("save subject: {err}")));
                continue;
            }
            tracing::info!(
                pipeline = batch.pipeline.as_str(),
                subject = %record.name,
                index,
                count,
                "subject handed off"
            );

            let context = SubjectContext {
                record,
                index,
                count,
                locale: batch.locale,
                config_path: self.store.location(),
            };
            let mut stage_reports = Vec::with_capacity(stages.len());
            let mut aborted = None;
            for stage in stages.iter_mut() {
                let report = invoke(&mut **stage, &context);
                let outcome = report.outcome;
                stage_reports.push(report);
                if let (StageOutcome::Failed { code }, StageFailurePolicy::Abort) =
                    (outcome, batch.policy)
                {
                    aborted = Some(AbortedStage {
                        stage: stage.kind(),
                        subject: record.name.clone(),
                        code,
                    });
                    break;
                }
            }
            let status = if aborted.is_some() {
                RecordStatus::Aborted
            } else if stage_reports.iter().all(|r| r.outcome.is_success()) {
                RecordStatus::Completed
            } else {
                RecordStatus::CompletedWithFailures
            };
            reports.push(RecordReport {
                index,
                name: record.name.clone(),
                status,
                reason: None,
                stages: stage_reports,
            });
            if let Some(aborted) = aborted {
                let completed = reports
                    .iter()
                    .filter(|r| r.status == RecordStatus::Completed)
                    .map(|r| r.name.as_str())
                    .collect::<Vec<_>>();
                tracing::warn!(
                    pipeline = batch.pipeline.as_str(),
                    stage = aborted.stage.as_str(),
                    subject = %aborted.subject,
                    completed = ?completed,
                    "batch aborted after failed stage"
                );
                return BatchOutcome {
                    records: reports,
                    aborted: Some(aborted),
                };
            }
        }
        BatchOutcome {
            records: reports,
            aborted: None,
        }
    }
}

fn select_policy(options: &PipelineOptions, doc: &ConfigDocument) -> StageFailurePolicy {
    options
        .on_stage_failure
        .or(doc.execution.on_stage_failure)
        .unwrap_or_default()
}

fn enter(pipeline: PipelineKind, phase: Phase) {
    tracing::info!(pipeline = pipeline.as_str(), phase = ?phase, "pipeline phase");
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
