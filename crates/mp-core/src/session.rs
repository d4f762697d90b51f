//! The session aggregate: the unit of workflow isolation and recovery.
//!
//! A session moves through a fixed stage machine
//! (`initialization → data_upload → validation → analysis → reporting`),
//! advanced only by successful steps. The store persists the whole record
//! after every mutation, so the on-disk and in-memory representations are
//! always reconcilable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::layout::FileCategory;
use crate::params::AnalysisParameters;
use crate::record::StudyRecord;
use crate::result::AnalysisResult;

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Accepting uploads and mutations
    Active,
    /// An external computation is in flight
    Analysis,
    /// Last computation succeeded
    Completed,
    /// Last step failed in a retryable way (timeout, no runtime)
    Failed,
    /// Last step failed inside the external runtime
    Error,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Analysis => write!(f, "analysis"),
            SessionStatus::Completed => write!(f, "completed"),
            SessionStatus::Failed => write!(f, "failed"),
            SessionStatus::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(SessionStatus::Active),
            "analysis" => Ok(SessionStatus::Analysis),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            "error" => Ok(SessionStatus::Error),
            other => Err(format!("unknown session status '{}'", other)),
        }
    }
}

/// Workflow stage. Variant order is workflow order; the derived `Ord` is
/// what makes stage advancement monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    Initialization,
    DataUpload,
    Validation,
    Analysis,
    Reporting,
}

impl std::fmt::Display for SessionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStage::Initialization => write!(f, "initialization"),
            SessionStage::DataUpload => write!(f, "data_upload"),
            SessionStage::Validation => write!(f, "validation"),
            SessionStage::Analysis => write!(f, "analysis"),
            SessionStage::Reporting => write!(f, "reporting"),
        }
    }
}

/// One entry in the session's file audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// File name relative to its category subdirectory
    pub name: String,

    /// Category (determines the subdirectory)
    pub category: FileCategory,

    /// SHA256 of the file contents, when computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,

    /// When the entry was recorded
    pub added_at: DateTime<Utc>,
}

/// Append-only lists of the session's files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SessionFiles {
    /// Raw uploaded inputs
    #[serde(default)]
    pub uploaded: Vec<FileEntry>,

    /// Derived artifacts (plots, reports)
    #[serde(default)]
    pub generated: Vec<FileEntry>,
}

/// The root aggregate: one isolated, persisted unit of workflow state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque unique identifier, immutable after creation
    pub id: String,

    /// Caller-supplied session name
    pub name: String,

    /// Current status
    pub status: SessionStatus,

    /// Current workflow stage
    pub stage: SessionStage,

    /// Parameters the session was created with
    pub parameters: AnalysisParameters,

    /// Validated records, append-only
    #[serde(default)]
    pub records: Vec<StudyRecord>,

    /// File audit trail
    #[serde(default)]
    pub files: SessionFiles,

    /// Output of the last successful computation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<AnalysisResult>,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// Refreshed on every mutation
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session in its initial state
    pub fn new(name: &str, parameters: AnalysisParameters) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string()[..8].to_string(),
            name: name.to_string(),
            status: SessionStatus::Active,
            stage: SessionStage::Initialization,
            parameters,
            records: Vec::new(),
            files: SessionFiles::default(),
            results: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Refresh the mutation timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Advance the workflow stage. Moves forward only; a retry of an
    /// already-passed step leaves the stage where it is.
    pub fn advance_stage(&mut self, next: SessionStage) {
        if next > self.stage {
            self.stage = next;
            self.touch();
        }
    }

    /// Append a batch of validated records
    pub fn append_records(&mut self, records: Vec<StudyRecord>) {
        self.records.extend(records);
        self.touch();
    }

    /// Record an uploaded raw input in the audit trail
    pub fn record_uploaded(&mut self, entry: FileEntry) {
        self.files.uploaded.push(entry);
        self.touch();
    }

    /// Record a generated artifact in the audit trail
    pub fn record_generated(&mut self, entry: FileEntry) {
        self.files.generated.push(entry);
        self.touch();
    }

    /// Store the output of a successful computation
    pub fn set_results(&mut self, results: AnalysisResult) {
        self.results = Some(results);
        self.touch();
    }
}
