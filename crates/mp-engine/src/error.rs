//! The caller-facing error taxonomy.
//!
//! Format and validation errors are recoverable (fix the input, resubmit)
//! and never advance a session's stage. Runtime errors mark the session
//! failed but leave validated records intact so computation can be retried
//! without re-uploading. Not-found errors are terminal for the request
//! only.

use thiserror::Error;

use mp_core::CoreError;
use mp_exec::ExecError;
use mp_store::StoreError;
use mp_validate::ValidateError;

/// Engine errors, grouped by the taxonomy callers dispatch on
#[derive(Error, Debug)]
pub enum EngineError {
    /// Raw upload could not be parsed as its declared format
    #[error("{0}")]
    Format(ValidateError),

    /// Parsed but failed structural/logical validation
    #[error("{0}")]
    Validation(ValidateError),

    /// The external computation failed or declined to run
    #[error("{0}")]
    Runtime(#[from] ExecError),

    /// Referenced session does not exist
    #[error("[G001] Session not found: {id}")]
    NotFound { id: String },

    /// Computation requested before any records were validated
    #[error("[G002] Session '{id}' has no validated records; upload data before computing")]
    InsufficientRecords { id: String },

    /// Report requested before a successful computation
    #[error("[G003] Session '{id}' has no computed results; run compute before reporting")]
    NoResults { id: String },

    /// Persistence failure
    #[error("{0}")]
    Store(StoreError),

    /// Invalid parameters or configuration
    #[error("{0}")]
    Invalid(#[from] CoreError),

    /// Report template rendering failed
    #[error("[G004] Report rendering failed: {message}")]
    Report { message: String },
}

impl EngineError {
    /// Stable kind name for structured (JSON) error output
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Format(_) => "format",
            EngineError::Validation(_) => "validation",
            EngineError::Runtime(_) => "runtime",
            EngineError::NotFound { .. } => "not_found",
            EngineError::InsufficientRecords { .. } => "insufficient_records",
            EngineError::NoResults { .. } => "no_results",
            EngineError::Store(_) => "store",
            EngineError::Invalid(_) => "invalid",
            EngineError::Report { .. } => "report",
        }
    }
}

impl From<ValidateError> for EngineError {
    fn from(err: ValidateError) -> Self {
        if err.is_format() {
            EngineError::Format(err)
        } else {
            EngineError::Validation(err)
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => EngineError::NotFound { id },
            other => EngineError::Store(other),
        }
    }
}

/// Result type alias for EngineError
pub type EngineResult<T> = Result<T, EngineError>;
