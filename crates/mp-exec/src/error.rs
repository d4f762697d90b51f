//! Error types for mp-exec
//!
//! "Neither runtime is installed" ([X001]), "the job failed" ([X002]), and
//! "the job was killed on timeout" ([X003]) are deliberately distinct
//! variants; conflating them would leave callers unable to tell a broken
//! environment from a broken computation.

use thiserror::Error;

/// Execution layer errors
#[derive(Error, Debug)]
pub enum ExecError {
    /// X001: No backend passed its availability probe
    #[error(
        "[X001] No statistical runtime available: the container image was not found \
         and no local interpreter answered the version probe"
    )]
    RuntimeUnavailable,

    /// X002: The runtime ran and exited non-zero
    #[error("[X002] Statistical runtime exited with status {exit_code}:\n{stderr}")]
    ScriptFailed { exit_code: i32, stderr: String },

    /// X003: The runtime exceeded the job timeout and was terminated
    #[error("[X003] Statistical runtime timed out after {secs}s and was terminated")]
    Timeout { secs: u64 },

    /// X004: Every record was excluded before dispatch
    #[error("[X004] No dispatchable records: {reason}")]
    NoUsableRecords { reason: String },

    /// X005: Script template rendering failed
    #[error("[X005] Script template error: {message}")]
    Template { message: String },

    /// X006: The runtime declared success but its output is unusable
    #[error("[X006] Runtime output could not be parsed: {message}")]
    OutputParse { message: String },

    /// X007: IO error
    #[error("[X007] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<minijinja::Error> for ExecError {
    fn from(err: minijinja::Error) -> Self {
        ExecError::Template {
            message: err.to_string(),
        }
    }
}

/// Result type alias for ExecError
pub type ExecResult<T> = Result<T, ExecError>;
