//! The session lifecycle orchestrator.
//!
//! Sequences `upload → validate → compute → plot/report` over the store,
//! validator, and dispatcher. Stages advance only on success; failures set
//! the session's status without touching its stage or records, so a retry
//! resumes exactly where the workflow stopped.

use chrono::Duration as ChronoDuration;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::sync::Semaphore;

use crate::error::{EngineError, EngineResult};
use crate::report;
use mp_core::{
    AnalysisParameters, AnalysisResult, Config, FileCategory, PoolingModel, Session, SessionStage,
    SessionStatus,
};
use mp_exec::{BackendKind, DispatchOutcome, Dispatcher, ExecError, Operation};
use mp_store::{ListFilter, SessionStore};
use mp_validate::{decode, validate_rows, UploadFormat, ValidationLevel};

/// File name of the generated report artifact
pub const REPORT_FILE: &str = "report.md";

/// Overrides applied to a single compute call
#[derive(Debug, Clone, Default)]
pub struct ComputeOptions {
    /// Override the session's pooling model
    pub model: Option<PoolingModel>,
    /// Override the session's confidence level
    pub confidence_level: Option<f64>,
}

/// Outcome of a successful upload call
#[derive(Debug)]
pub struct UploadOutcome {
    /// The session after the upload
    pub session: Session,
    /// How many records the batch contributed
    pub accepted: usize,
    /// Batch warnings (plausibility flags, skipped rows)
    pub warnings: Vec<String>,
}

/// Outcome of a successful compute call
#[derive(Debug)]
pub struct ComputeOutcome {
    /// The session after the computation
    pub session: Session,
    /// Parsed result, when the runtime honored the output contract
    pub result: Option<AnalysisResult>,
    /// Raw runtime output, when `results.json` was absent
    pub raw_output: Option<String>,
    /// Dispatch warnings (zero-event exclusions)
    pub warnings: Vec<String>,
    /// Backend that ran the job
    pub backend: BackendKind,
}

/// Which plot to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotKind {
    /// Forest plot of per-record effects and the pooled estimate
    Forest,
    /// Funnel plot for publication-bias inspection
    Funnel,
}

impl PlotKind {
    fn operation(&self) -> Operation {
        match self {
            PlotKind::Forest => Operation::ForestPlot,
            PlotKind::Funnel => Operation::FunnelPlot,
        }
    }

    /// Artifact file name the plot produces
    pub fn artifact(&self) -> &'static str {
        match self {
            PlotKind::Forest => "forest.png",
            PlotKind::Funnel => "funnel.png",
        }
    }
}

impl std::fmt::Display for PlotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlotKind::Forest => write!(f, "forest"),
            PlotKind::Funnel => write!(f, "funnel"),
        }
    }
}

impl FromStr for PlotKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "forest" => Ok(PlotKind::Forest),
            "funnel" => Ok(PlotKind::Funnel),
            other => Err(format!("unknown plot kind '{}'", other)),
        }
    }
}

/// Outcome of a successful plot call
#[derive(Debug)]
pub struct PlotOutcome {
    /// The session after the plot
    pub session: Session,
    /// Absolute path of the rendered artifact
    pub artifact: PathBuf,
    /// Dispatch warnings
    pub warnings: Vec<String>,
    /// Backend that ran the job
    pub backend: BackendKind,
}

/// Outcome of a successful report call
#[derive(Debug)]
pub struct ReportOutcome {
    /// The session after the report
    pub session: Session,
    /// Absolute path of the generated report
    pub path: PathBuf,
}

/// The analysis engine: session store + validator + dispatcher behind one
/// caller-facing surface
pub struct Engine {
    store: SessionStore,
    dispatcher: Dispatcher,
    jobs: Semaphore,
    retention: ChronoDuration,
    vars: std::collections::HashMap<String, serde_yaml::Value>,
}

impl Engine {
    /// Build an engine from configuration, rooted at a project directory
    pub fn new(config: &Config, project_root: &Path) -> EngineResult<Self> {
        config.validate()?;
        let store = SessionStore::new(config.data_dir_absolute(project_root))?;
        Ok(Self {
            store,
            dispatcher: Dispatcher::from_config(&config.runtime),
            jobs: Semaphore::new(config.runtime.max_concurrent_jobs),
            retention: ChronoDuration::days(config.retention_days),
            vars: config.vars.clone(),
        })
    }

    /// The underlying session store
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Create a new session
    pub async fn create_session(
        &self,
        name: &str,
        parameters: AnalysisParameters,
    ) -> EngineResult<Session> {
        parameters.validate()?;
        let session = self.store.create(name, parameters)?;
        Ok(session)
    }

    /// Upload raw records into a session: decode, validate, persist.
    ///
    /// A format error leaves the session untouched. A validation failure
    /// records the raw upload in the audit trail and marks the session
    /// failed, but never advances the stage, so a corrected re-upload
    /// resumes from the same place.
    pub async fn upload_records(
        &self,
        session_id: &str,
        raw: &str,
        format: UploadFormat,
        level: ValidationLevel,
    ) -> EngineResult<UploadOutcome> {
        let mut session = self.store.get(session_id)?;

        let rows = decode(raw, format)?;

        // The upload itself parsed; it enters the audit trail whatever
        // validation decides
        session.advance_stage(SessionStage::DataUpload);
        let upload_name = format!(
            "upload-{}.{}",
            session.files.uploaded.len() + 1,
            format.extension()
        );
        self.store
            .save_file(&mut session, &upload_name, raw.as_bytes(), FileCategory::Input)?;

        match validate_rows(&rows, session.parameters.effect_measure, level) {
            Ok(batch) => {
                let accepted = batch.records.len();
                session.append_records(batch.records);
                session.advance_stage(SessionStage::Validation);
                session.status = SessionStatus::Active;
                self.store.update(&mut session)?;
                log::info!(
                    "session {}: accepted {} records ({} warnings)",
                    session.id,
                    accepted,
                    batch.warnings.len()
                );
                Ok(UploadOutcome {
                    session,
                    accepted,
                    warnings: batch.warnings,
                })
            }
            Err(e) => {
                session.status = SessionStatus::Failed;
                self.store.update(&mut session)?;
                log::warn!(
                    "session {} (stage {}, upload): validation failed: {}",
                    session.id,
                    session.stage,
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Run the pooled-effect computation for a session.
    ///
    /// Requires at least one validated record. A successful run stores the
    /// result, advances the stage to `analysis`, and marks the session
    /// completed. Failures mark the session failed (no runtime, timeout)
    /// or errored (the job itself broke) and leave records intact.
    pub async fn compute(
        &self,
        session_id: &str,
        options: &ComputeOptions,
    ) -> EngineResult<ComputeOutcome> {
        let mut session = self.store.get(session_id)?;
        if session.records.is_empty() {
            return Err(EngineError::InsufficientRecords {
                id: session.id.clone(),
            });
        }

        let mut params = session.parameters.clone();
        if let Some(model) = options.model {
            params.model = model;
        }
        if let Some(level) = options.confidence_level {
            params.confidence_level = level;
        }
        params.validate()?;

        session.status = SessionStatus::Analysis;
        self.store.update(&mut session)?;

        let dirs = self.store.dirs(&session.id);
        // Bound outstanding external jobs across all sessions
        let _permit = self.jobs.acquire().await.expect("job semaphore closed");

        match self
            .dispatcher
            .dispatch(&dirs, &session.records, &params, Operation::Compute)
            .await
        {
            Ok(dispatched) => {
                let backend = dispatched.backend;
                let (result, raw_output) = match dispatched.outcome {
                    DispatchOutcome::Parsed(result) => {
                        session.set_results(result.clone());
                        session.advance_stage(SessionStage::Analysis);
                        session.status = SessionStatus::Completed;
                        (Some(result), None)
                    }
                    DispatchOutcome::RawOutput(raw) => {
                        // Exit zero without the output contract: surfaced
                        // to the caller, but the session keeps its
                        // in-flight status and gains no results
                        session.advance_stage(SessionStage::Analysis);
                        (None, Some(raw))
                    }
                };
                self.store.update(&mut session)?;
                Ok(ComputeOutcome {
                    session,
                    result,
                    raw_output,
                    warnings: dispatched.warnings,
                    backend,
                })
            }
            Err(e) => {
                session.status = failure_status(&e);
                self.store.update(&mut session)?;
                log::warn!(
                    "session {} (stage {}, compute): {}",
                    session.id,
                    session.stage,
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Render a forest or funnel plot into the session's output area
    pub async fn plot(&self, session_id: &str, kind: PlotKind) -> EngineResult<PlotOutcome> {
        let mut session = self.store.get(session_id)?;
        if session.records.is_empty() {
            return Err(EngineError::InsufficientRecords {
                id: session.id.clone(),
            });
        }

        let dirs = self.store.dirs(&session.id);
        let _permit = self.jobs.acquire().await.expect("job semaphore closed");

        match self
            .dispatcher
            .dispatch(&dirs, &session.records, &session.parameters, kind.operation())
            .await
        {
            Ok(dispatched) => {
                let artifact_path = dirs.output().join(kind.artifact());
                if !artifact_path.is_file() {
                    let e = ExecError::OutputParse {
                        message: format!(
                            "runtime exited 0 but produced no {}",
                            kind.artifact()
                        ),
                    };
                    session.status = SessionStatus::Error;
                    self.store.update(&mut session)?;
                    log::warn!(
                        "session {} (stage {}, {} plot): {}",
                        session.id,
                        session.stage,
                        kind,
                        e
                    );
                    return Err(e.into());
                }

                let artifact =
                    self.store
                        .add_file(&mut session, kind.artifact(), FileCategory::Output)?;
                log::info!("session {}: rendered {} plot", session.id, kind);
                Ok(PlotOutcome {
                    session,
                    artifact,
                    warnings: dispatched.warnings,
                    backend: dispatched.backend,
                })
            }
            Err(e) => {
                session.status = failure_status(&e);
                self.store.update(&mut session)?;
                log::warn!(
                    "session {} (stage {}, {} plot): {}",
                    session.id,
                    session.stage,
                    kind,
                    e
                );
                Err(e.into())
            }
        }
    }

    /// Generate the Markdown summary report for a computed session
    pub async fn report(&self, session_id: &str) -> EngineResult<ReportOutcome> {
        let mut session = self.store.get(session_id)?;
        if session.results.is_none() {
            return Err(EngineError::NoResults {
                id: session.id.clone(),
            });
        }

        let markdown = report::render_report(&session, &self.vars)?;
        let path = self.store.save_file(
            &mut session,
            REPORT_FILE,
            markdown.as_bytes(),
            FileCategory::Output,
        )?;
        session.advance_stage(SessionStage::Reporting);
        session.status = SessionStatus::Completed;
        self.store.update(&mut session)?;
        log::info!("session {}: report generated", session.id);
        Ok(ReportOutcome { session, path })
    }

    /// Fetch one session
    pub fn get_session(&self, session_id: &str) -> EngineResult<Session> {
        Ok(self.store.get(session_id)?)
    }

    /// List sessions matching a filter
    pub fn list_sessions(&self, filter: &ListFilter) -> EngineResult<Vec<Session>> {
        Ok(self.store.list(filter)?)
    }

    /// Sweep sessions inactive beyond the retention threshold (or an
    /// explicit override) and not `active`
    pub fn cleanup(
        &self,
        retention_override: Option<ChronoDuration>,
        dry_run: bool,
    ) -> EngineResult<Vec<String>> {
        let retention = retention_override.unwrap_or(self.retention);
        Ok(self.store.cleanup(retention, dry_run)?)
    }
}

/// Timeouts and missing runtimes are environment problems (`failed`,
/// retry when the environment is fixed); everything else errored inside
/// the job itself
fn failure_status(e: &ExecError) -> SessionStatus {
    match e {
        ExecError::RuntimeUnavailable | ExecError::Timeout { .. } => SessionStatus::Failed,
        _ => SessionStatus::Error,
    }
}
