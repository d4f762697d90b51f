//! Configuration types and parsing for metapool.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default config file name looked up in the project directory
pub const CONFIG_FILE: &str = "metapool.yml";

/// Main engine configuration from metapool.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    #[serde(default = "default_name")]
    pub name: String,

    /// Directory holding per-session state
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Sessions inactive longer than this are eligible for the cleanup sweep
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// External statistical runtime configuration
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Free-form variables available to report templates
    #[serde(default)]
    pub vars: HashMap<String, serde_yaml::Value>,
}

/// External runtime (container / local interpreter) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Containerized runtime settings
    #[serde(default)]
    pub container: ContainerConfig,

    /// Local interpreter settings
    #[serde(default)]
    pub local: LocalConfig,

    /// Upper bound on each availability probe, in seconds
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Upper bound on a single external computation, in seconds
    #[serde(default = "default_job_timeout_secs")]
    pub job_timeout_secs: u64,

    /// Maximum number of external jobs in flight across all sessions
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,
}

/// Containerized runtime settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerConfig {
    /// Container engine binary
    #[serde(default = "default_container_binary")]
    pub binary: String,

    /// Image expected to carry the statistics runtime
    #[serde(default = "default_container_image")]
    pub image: String,
}

/// Local interpreter settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalConfig {
    /// Interpreter binary expected on PATH
    #[serde(default = "default_local_binary")]
    pub binary: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            retention_days: default_retention_days(),
            runtime: RuntimeConfig::default(),
            vars: HashMap::new(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            container: ContainerConfig::default(),
            local: LocalConfig::default(),
            probe_timeout_secs: default_probe_timeout_secs(),
            job_timeout_secs: default_job_timeout_secs(),
            max_concurrent_jobs: default_max_concurrent_jobs(),
        }
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            binary: default_container_binary(),
            image: default_container_image(),
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            binary: default_local_binary(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;

        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load `metapool.yml` from a project directory, falling back to defaults
    /// when the file does not exist
    pub fn load_or_default(dir: &Path) -> CoreResult<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the data directory against a project root
    pub fn data_dir_absolute(&self, root: &Path) -> PathBuf {
        let dir = PathBuf::from(&self.data_dir);
        if dir.is_absolute() {
            dir
        } else {
            root.join(dir)
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> CoreResult<()> {
        if self.retention_days < 0 {
            return Err(CoreError::ConfigInvalid {
                message: format!("retention_days must be >= 0, got {}", self.retention_days),
            });
        }
        if self.runtime.max_concurrent_jobs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "runtime.max_concurrent_jobs must be at least 1".to_string(),
            });
        }
        if self.runtime.job_timeout_secs == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "runtime.job_timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn default_name() -> String {
    "metapool".to_string()
}

fn default_data_dir() -> String {
    "sessions".to_string()
}

fn default_retention_days() -> i64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_job_timeout_secs() -> u64 {
    300
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_container_binary() -> String {
    "docker".to_string()
}

fn default_container_image() -> String {
    "metapool-r".to_string()
}

fn default_local_binary() -> String {
    "Rscript".to_string()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
