//! Error types for mp-core

use thiserror::Error;

/// Core error type for Metapool
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Failed to parse configuration file
    #[error("[E002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// E003: Invalid configuration value
    #[error("[E003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E004: Invalid analysis parameters
    #[error("[E004] Invalid analysis parameters: {message}")]
    InvalidParameters { message: String },

    /// E005: IO error
    #[error("[E005] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// E006: IO error with file path context
    #[error("[E006] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// E007: YAML parse error
    #[error("[E007] YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
