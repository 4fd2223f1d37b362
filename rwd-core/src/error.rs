//! Hard failures surfaced to callers.
//!
//! Data problems found while cleaning or validating (out-of-range values,
//! inverted triads, outliers) are diagnostics, not errors. Only a request
//! the engine cannot answer ends up here.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A column the requested operation cannot work without.
    #[error("missing required column `{0}`")]
    MissingInput(String),

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("unknown method `{0}`")]
    UnknownMethod(String),

    /// Neither a station code nor a reservoir name of the dataset.
    #[error("unknown reservoir `{0}`")]
    UnknownReservoir(String),

    #[error("not enough observations of `{variable}`: need {needed}, found {found}")]
    InsufficientData {
        variable: String,
        needed: usize,
        found: usize,
    },

    /// Every observation of the variable falls on the same date.
    #[error("cannot regress `{0}`: all observations share one date")]
    ConstantRegressor(String),

    #[error("percentile {0} is outside [0, 100]")]
    InvalidPercentile(f64),
}

pub type Result<T> = std::result::Result<T, EngineError>;
