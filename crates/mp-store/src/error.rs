//! Error types for mp-store

use thiserror::Error;

/// Session store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// S001: Referenced session does not exist
    #[error("[S001] Session not found: {id}")]
    NotFound { id: String },

    /// S002: Update target vanished from disk
    #[error("[S002] Cannot update session '{id}': its directory no longer exists on disk")]
    UpdateMissing { id: String },

    /// S003: Session metadata exists but cannot be read back
    #[error("[S003] Session '{id}' metadata is unreadable: {message}")]
    Corrupt { id: String, message: String },

    /// S004: File name would escape the session directory
    #[error("[S004] Invalid session file name: {name}")]
    InvalidFileName { name: String },

    /// S005: IO error
    #[error("[S005] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// S006: IO error with file path context
    #[error("[S006] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for StoreError
pub type StoreResult<T> = Result<T, StoreError>;
