//! mp-validate - Study record validation for Metapool
//!
//! This crate turns raw uploaded content into validated study records:
//! format decoding (CSV / JSON), declarative column-alias normalization,
//! and the four-stage validation pipeline with its batch-level decision.
//! The whole crate is a pure transformation; nothing here touches disk.

pub mod aliases;
pub mod decode;
pub mod error;
pub mod validator;

pub use aliases::{canonical_field, normalize_row};
pub use decode::{decode, RawRow, UploadFormat};
pub use error::{RowError, ValidateError, ValidateResult};
pub use validator::{validate_rows, ValidatedBatch, ValidationLevel};
