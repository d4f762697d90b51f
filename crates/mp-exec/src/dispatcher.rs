//! The script dispatcher.
//!
//! One call = one batch job: serialize the session's records and resolved
//! parameters into the working area, materialize the operation's script,
//! execute it on whichever backend answers its probe, and recover the
//! declared output contract. Exit zero with no `results.json` falls back
//! to the raw captured stdout rather than silently succeeding with no
//! data; non-zero exit fails with the captured stderr attached verbatim.

use chrono::Utc;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::time::{Duration, Instant};

use crate::backend::{BackendKind, BackendSelector};
use crate::error::{ExecError, ExecResult};
use crate::input::{prepare_input, RuntimeInput};
use crate::templates::{render_script, INPUT_FILE, RESULTS_FILE};
use mp_core::layout::PROCESSING_DIR;
use mp_core::{
    AnalysisParameters, AnalysisResult, BiasAssessment, Heterogeneity, ModelInfo, OverallEffect,
    RecordContribution, RuntimeConfig, SessionDirs, StudyRecord,
};

/// Log file capturing runtime stderr across dispatches
pub const RUNTIME_LOG_FILE: &str = "runtime.log";

/// Operations the runtime knows how to execute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Pooled-effect computation
    Compute,
    /// Forest plot rendering
    ForestPlot,
    /// Funnel plot rendering
    FunnelPlot,
}

impl Operation {
    /// Script file name materialized into `processing/`
    pub fn script_name(&self) -> &'static str {
        match self {
            Operation::Compute => "compute.R",
            Operation::ForestPlot => "forest_plot.R",
            Operation::FunnelPlot => "funnel_plot.R",
        }
    }

    /// Artifact the operation is expected to leave in `output/`
    pub fn artifact(&self) -> Option<&'static str> {
        match self {
            Operation::Compute => None,
            Operation::ForestPlot => Some("forest.png"),
            Operation::FunnelPlot => Some("funnel.png"),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Compute => write!(f, "compute"),
            Operation::ForestPlot => write!(f, "forest_plot"),
            Operation::FunnelPlot => write!(f, "funnel_plot"),
        }
    }
}

/// What a successful dispatch recovered
#[derive(Debug)]
pub enum DispatchOutcome {
    /// `results.json` was present and parsed
    Parsed(AnalysisResult),
    /// Exit zero but no output file; raw captured stdout instead
    RawOutput(String),
}

/// Result of one dispatch
#[derive(Debug)]
pub struct Dispatched {
    /// Recovered outcome
    pub outcome: DispatchOutcome,
    /// Pre-dispatch policy warnings (zero-event exclusions)
    pub warnings: Vec<String>,
    /// Which backend ran the job
    pub backend: BackendKind,
}

/// Dispatches templated batch scripts into the selected backend
pub struct Dispatcher {
    selector: BackendSelector,
    job_timeout: Duration,
}

impl Dispatcher {
    /// Build from the runtime config
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            selector: BackendSelector::from_config(config),
            job_timeout: Duration::from_secs(config.job_timeout_secs),
        }
    }

    /// Run one operation inside a session's directory.
    ///
    /// The session directory is exclusively owned by this call for its
    /// duration; callers must not dispatch concurrently for the same id.
    pub async fn dispatch(
        &self,
        dirs: &SessionDirs,
        records: &[StudyRecord],
        params: &AnalysisParameters,
        operation: Operation,
    ) -> ExecResult<Dispatched> {
        let (input, warnings) = prepare_input(records, params)?;

        dirs.create_all()?;
        let input_path = dirs.processing().join(INPUT_FILE);
        fs::write(&input_path, serde_json::to_string_pretty(&input)?)?;

        // Stale output from an earlier dispatch must never be mistaken for
        // this run's result
        let results_path = dirs.processing().join(RESULTS_FILE);
        if results_path.exists() {
            fs::remove_file(&results_path)?;
        }
        if let Some(artifact) = operation.artifact() {
            let artifact_path = dirs.output().join(artifact);
            if artifact_path.exists() {
                fs::remove_file(&artifact_path)?;
            }
        }

        let script_rel = format!("{}/{}", PROCESSING_DIR, operation.script_name());
        fs::write(dirs.root().join(&script_rel), render_script(operation)?)?;

        let backend = self.selector.select().await?;
        log::info!(
            "dispatching {} on {} backend ({} records, model {})",
            operation,
            backend.kind(),
            input.records.len(),
            input.model
        );

        let started = Instant::now();
        let output = backend.run(dirs.root(), &script_rel, self.job_timeout).await?;
        append_runtime_log(dirs, operation, &output)?;
        log::debug!(
            "{} finished in {:.1}s (exit {})",
            operation,
            started.elapsed().as_secs_f64(),
            output.exit_code
        );

        if !output.success() {
            return Err(ExecError::ScriptFailed {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        let outcome = match read_results(&results_path)? {
            Some(results) => {
                let mut result = results.into_analysis_result(&input);
                if input.effect_measure.is_ratio() {
                    // Runtime reports ratio measures on the log scale
                    result.exponentiate();
                }
                DispatchOutcome::Parsed(result)
            }
            None => {
                log::warn!(
                    "{} exited 0 but wrote no {}; returning raw output",
                    operation,
                    RESULTS_FILE
                );
                DispatchOutcome::RawOutput(output.stdout)
            }
        };

        Ok(Dispatched {
            outcome,
            warnings,
            backend: backend.kind(),
        })
    }
}

/// The shape the runtime writes; model metadata and the timestamp are
/// filled in on this side, from what was actually dispatched
#[derive(Debug, Deserialize)]
pub(crate) struct RuntimeResults {
    overall: OverallEffect,
    #[serde(default)]
    heterogeneity: Option<Heterogeneity>,
    #[serde(default)]
    contributions: Vec<RecordContribution>,
    #[serde(default)]
    bias: Option<BiasAssessment>,
}

impl RuntimeResults {
    pub(crate) fn into_analysis_result(self, input: &RuntimeInput) -> AnalysisResult {
        AnalysisResult {
            overall: self.overall,
            heterogeneity: self.heterogeneity,
            model: ModelInfo {
                kind: input.model,
                hartung_knapp: input.hartung_knapp,
                record_count: input.records.len(),
            },
            contributions: self.contributions,
            bias: self.bias,
            computed_at: Utc::now(),
        }
    }
}

fn read_results(path: &std::path::Path) -> ExecResult<Option<RuntimeResults>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let results = serde_json::from_str(&content).map_err(|e| ExecError::OutputParse {
        message: format!("{}: {}", RESULTS_FILE, e),
    })?;
    Ok(Some(results))
}

/// Append the run's stderr to the session log so failures can be
/// reconstructed without the runtime's own logs
fn append_runtime_log(
    dirs: &SessionDirs,
    operation: Operation,
    output: &crate::backend::ScriptOutput,
) -> ExecResult<()> {
    fs::create_dir_all(dirs.logs())?;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dirs.logs().join(RUNTIME_LOG_FILE))?;
    writeln!(
        file,
        "=== {} {} (exit {}) ===",
        Utc::now().to_rfc3339(),
        operation,
        output.exit_code
    )?;
    if !output.stderr.is_empty() {
        writeln!(file, "{}", output.stderr.trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod tests;
