//! Data-quality diagnostics.
//!
//! The [`Validator`] reads a dataset snapshot and reports what it finds;
//! it never changes the data. Checks whose input columns are absent are
//! skipped rather than failing.

pub mod report;
pub mod validator;

pub use report::{BasicStats, QualityReport, TemporalConsistency};
pub use validator::Validator;
