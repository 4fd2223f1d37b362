//! Core types for reservoir storage and weather observations.
//!
//! Everything downstream (cleaning, validation, analysis) consumes the
//! [`dataset::Dataset`] snapshot defined here. Snapshots are never mutated
//! in place; each processing step builds a new one.

pub mod config;
pub mod dataset;
pub mod date_range;
pub mod error;
pub mod field;
pub mod observation;
pub mod reservoir;
pub mod season;
pub mod variable;

pub use config::{CorrelationMethod, EngineConfig, MissingStrategy, TrendMethod};
pub use dataset::{Column, Dataset};
pub use error::EngineError;
pub use field::{Field, FieldFamily, FieldSpec, FIELD_COUNT};
pub use observation::{Derived, RawRecord, Readings, Record};
pub use reservoir::Reservoir;
pub use season::Season;
pub use variable::{DerivedField, Variable};
