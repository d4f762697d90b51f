//! Per-session directory layout.
//!
//! Every session owns an isolated directory under the engine's data dir with
//! four fixed subareas (raw input, intermediate working state, output
//! artifacts, diagnostic logs) plus one metadata file. The dispatcher treats
//! the session root as its sandbox; scripts only ever see paths relative to
//! it, so the same layout works bind-mounted into a container or used as a
//! local working directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata file holding the serialized session record
pub const METADATA_FILE: &str = "session.json";

/// Subdirectory for raw uploads
pub const INPUT_DIR: &str = "input";

/// Subdirectory for intermediate script/data files
pub const PROCESSING_DIR: &str = "processing";

/// Subdirectory for generated artifacts
pub const OUTPUT_DIR: &str = "output";

/// Subdirectory for diagnostic logs
pub const LOGS_DIR: &str = "logs";

/// Category a session file belongs to, determining its subdirectory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    /// Raw uploaded inputs
    Input,
    /// Intermediate working files (scripts, runtime input/output)
    Processing,
    /// Generated artifacts (plots, reports)
    Output,
    /// Diagnostic logs
    Logs,
}

impl FileCategory {
    /// Subdirectory name for this category
    pub fn subdir(&self) -> &'static str {
        match self {
            FileCategory::Input => INPUT_DIR,
            FileCategory::Processing => PROCESSING_DIR,
            FileCategory::Output => OUTPUT_DIR,
            FileCategory::Logs => LOGS_DIR,
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.subdir())
    }
}

/// Resolved paths for one session's directory
#[derive(Debug, Clone)]
pub struct SessionDirs {
    root: PathBuf,
}

impl SessionDirs {
    /// Locate a session's directory under the data dir
    pub fn new(data_dir: &Path, id: &str) -> Self {
        Self {
            root: data_dir.join(id),
        }
    }

    /// Session root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the session metadata file
    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(METADATA_FILE)
    }

    /// Path to a category's subdirectory
    pub fn subdir(&self, category: FileCategory) -> PathBuf {
        self.root.join(category.subdir())
    }

    /// Raw upload directory
    pub fn input(&self) -> PathBuf {
        self.root.join(INPUT_DIR)
    }

    /// Intermediate working directory
    pub fn processing(&self) -> PathBuf {
        self.root.join(PROCESSING_DIR)
    }

    /// Generated artifact directory
    pub fn output(&self) -> PathBuf {
        self.root.join(OUTPUT_DIR)
    }

    /// Diagnostic log directory
    pub fn logs(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Create the root and all four subdirectories
    pub fn create_all(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.input())?;
        std::fs::create_dir_all(self.processing())?;
        std::fs::create_dir_all(self.output())?;
        std::fs::create_dir_all(self.logs())?;
        Ok(())
    }

    /// Whether the session's metadata file exists on disk
    pub fn exists(&self) -> bool {
        self.metadata_path().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let dirs = SessionDirs::new(Path::new("/data"), "ab12cd34");
        assert_eq!(dirs.root(), Path::new("/data/ab12cd34"));
        assert_eq!(dirs.metadata_path(), Path::new("/data/ab12cd34/session.json"));
        assert_eq!(dirs.input(), Path::new("/data/ab12cd34/input"));
        assert_eq!(dirs.processing(), Path::new("/data/ab12cd34/processing"));
        assert_eq!(dirs.output(), Path::new("/data/ab12cd34/output"));
        assert_eq!(dirs.logs(), Path::new("/data/ab12cd34/logs"));
    }

    #[test]
    fn test_category_subdirs() {
        assert_eq!(FileCategory::Input.subdir(), "input");
        assert_eq!(FileCategory::Processing.subdir(), "processing");
        assert_eq!(FileCategory::Output.subdir(), "output");
        assert_eq!(FileCategory::Logs.subdir(), "logs");
    }

    #[test]
    fn test_create_all() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = SessionDirs::new(tmp.path(), "s1");
        dirs.create_all().unwrap();
        assert!(dirs.input().is_dir());
        assert!(dirs.logs().is_dir());
        assert!(!dirs.exists()); // no metadata written yet
    }
}
