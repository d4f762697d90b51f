//! mp-core - Core library for Metapool
//!
//! This crate provides the shared types used across all Metapool components:
//! the session aggregate, study records, analysis parameters and results,
//! engine configuration, and the per-session directory layout.

pub mod checksum;
pub mod config;
pub mod error;
pub mod layout;
pub mod params;
pub mod record;
pub mod result;
pub(crate) mod serde_helpers;
pub mod session;

pub use checksum::{checksum_bytes, checksum_str};
pub use config::{Config, ContainerConfig, LocalConfig, RuntimeConfig};
pub use error::{CoreError, CoreResult};
pub use layout::{FileCategory, SessionDirs};
pub use params::{AnalysisParameters, EffectMeasure, OutcomeFamily, PoolingModel, ResolvedModel};
pub use record::{OutcomeData, StudyRecord, ZeroEventArms};
pub use result::{
    AnalysisResult, BiasAssessment, Heterogeneity, ModelInfo, OverallEffect, RecordContribution,
};
pub use session::{FileEntry, Session, SessionFiles, SessionStage, SessionStatus};
