//! mp-engine - The analysis engine for Metapool
//!
//! The thin orchestration layer over the store, validator, and dispatcher:
//! a state machine over session stages, advanced only by successful steps,
//! with a global concurrency bound on outstanding external-runtime jobs.
//! Everything callers see, regardless of transport, goes through
//! [`Engine`] and returns either a payload or one [`EngineError`] kind.

pub mod engine;
pub mod error;
pub mod report;

pub use engine::{
    ComputeOptions, ComputeOutcome, Engine, PlotKind, PlotOutcome, ReportOutcome, UploadOutcome,
};
pub use error::{EngineError, EngineResult};
