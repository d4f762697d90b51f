//! Error types for mp-validate
//!
//! Format failures (the upload is not parseable as its declared format) and
//! validation failures (parsed rows violate the schema) are distinct
//! variants so callers can tell "your file is not CSV" from "your CSV has
//! invalid numbers".

use thiserror::Error;

/// A problem with one uploaded row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    /// 1-indexed row number in the upload
    pub row: usize,
    /// The offending field, when one can be named
    pub field: Option<String>,
    /// What went wrong
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.field {
            Some(field) => write!(f, "row {} ({}): {}", self.row, field, self.message),
            None => write!(f, "row {}: {}", self.row, self.message),
        }
    }
}

/// Validation errors
#[derive(Error, Debug)]
pub enum ValidateError {
    /// V001: Raw upload could not be parsed as the declared format
    #[error("[V001] Failed to parse upload as {format}: {message}")]
    Format { format: String, message: String },

    /// V002: Upload decoded to zero rows
    #[error("[V002] Upload contains no records")]
    EmptyUpload,

    /// V003: More than half of the rows failed structural/logical checks
    #[error(
        "[V003] Validation rejected {failed} of {total} rows; first errors: {}",
        join_errors(.errors)
    )]
    BatchRejected {
        failed: usize,
        total: usize,
        errors: Vec<RowError>,
    },
}

impl ValidateError {
    /// Row-level problems attached to this error, if any
    pub fn row_errors(&self) -> &[RowError] {
        match self {
            ValidateError::BatchRejected { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Whether this is a format (pre-schema) failure
    pub fn is_format(&self) -> bool {
        matches!(self, ValidateError::Format { .. })
    }
}

fn join_errors(errors: &[RowError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for ValidateError
pub type ValidateResult<T> = Result<T, ValidateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_rejected_display_lists_rows() {
        let err = ValidateError::BatchRejected {
            failed: 2,
            total: 3,
            errors: vec![
                RowError {
                    row: 1,
                    field: Some("n_treatment".to_string()),
                    message: "missing".to_string(),
                },
                RowError {
                    row: 2,
                    field: None,
                    message: "not numeric".to_string(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("[V003]"));
        assert!(text.contains("row 1 (n_treatment): missing"));
        assert!(text.contains("row 2: not numeric"));
    }

    #[test]
    fn test_format_is_distinct() {
        let err = ValidateError::Format {
            format: "csv".to_string(),
            message: "unterminated quote".to_string(),
        };
        assert!(err.is_format());
        assert!(err.row_errors().is_empty());
    }
}
