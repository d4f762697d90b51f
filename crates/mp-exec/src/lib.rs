//! mp-exec - External computation dispatch for Metapool
//!
//! This crate owns the boundary to the external statistics runtime: probing
//! which backend is reachable (container image vs. local interpreter),
//! materializing the per-operation script from a template into the
//! session's working area, executing it with a bounded timeout, and
//! recovering the declared output contract (`results.json`).

pub mod backend;
pub mod dispatcher;
pub mod error;
pub mod input;
pub mod templates;

pub use backend::{BackendKind, BackendSelector, ContainerBackend, LocalBackend, RuntimeBackend, ScriptOutput};
pub use dispatcher::{DispatchOutcome, Dispatched, Dispatcher, Operation};
pub use error::{ExecError, ExecResult};
pub use input::{prepare_input, RuntimeInput, RuntimeRecord};
