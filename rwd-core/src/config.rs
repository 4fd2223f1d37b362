//! Engine configuration, passed explicitly into the cleaner, validator and
//! analyzer when they are constructed.
//!
//! # Example TOML
//!
//! ```toml
//! missing_strategy = "forward_fill"
//! outlier_multiplier = 3.0
//! extreme_percentile = 99.0
//! correlation_method = "spearman"
//! jump_threshold = 15.0
//! ```

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How the cleaner treats missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingStrategy {
    /// Time-weighted linear interpolation inside each reservoir's series.
    #[default]
    Interpolate,
    /// Carry the last observed value forward inside each reservoir's series.
    ForwardFill,
    /// Drop every row with a missing numeric value.
    Drop,
}

/// Pairwise correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMethod {
    /// Linear (Pearson) correlation.
    #[default]
    Pearson,
    /// Rank (Spearman) correlation.
    Spearman,
    /// Concordance-based (Kendall tau-b) correlation.
    Kendall,
}

/// Long-term trend estimator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendMethod {
    /// Ordinary least squares against elapsed days.
    #[default]
    Linear,
    /// Mann-Kendall rank test.
    MannKendall,
}

impl FromStr for MissingStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "interpolate" => Ok(MissingStrategy::Interpolate),
            "forward_fill" | "forward-fill" | "ffill" => Ok(MissingStrategy::ForwardFill),
            "drop" => Ok(MissingStrategy::Drop),
            _ => Err(EngineError::UnknownMethod(s.to_string())),
        }
    }
}

impl FromStr for CorrelationMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pearson" | "linear" => Ok(CorrelationMethod::Pearson),
            "spearman" | "rank" => Ok(CorrelationMethod::Spearman),
            "kendall" | "concordance" => Ok(CorrelationMethod::Kendall),
            _ => Err(EngineError::UnknownMethod(s.to_string())),
        }
    }
}

impl FromStr for TrendMethod {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(TrendMethod::Linear),
            "mann_kendall" | "mann-kendall" | "rank" => Ok(TrendMethod::MannKendall),
            _ => Err(EngineError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for MissingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MissingStrategy::Interpolate => "interpolate",
            MissingStrategy::ForwardFill => "forward_fill",
            MissingStrategy::Drop => "drop",
        })
    }
}

impl fmt::Display for CorrelationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CorrelationMethod::Pearson => "pearson",
            CorrelationMethod::Spearman => "spearman",
            CorrelationMethod::Kendall => "kendall",
        })
    }
}

impl fmt::Display for TrendMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TrendMethod::Linear => "linear",
            TrendMethod::MannKendall => "mann_kendall",
        })
    }
}

/// Default IQR multiplier for outlier bounds.
pub const DEFAULT_OUTLIER_MULTIPLIER: f64 = 1.5;

/// Default percentile for extreme-event thresholds.
pub const DEFAULT_EXTREME_PERCENTILE: f64 = 95.0;

/// Day-over-day storage change (percentage points) above which a row is flagged.
pub const DEFAULT_JUMP_THRESHOLD: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub missing_strategy: MissingStrategy,
    pub outlier_multiplier: f64,
    pub extreme_percentile: f64,
    pub correlation_method: CorrelationMethod,
    pub jump_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            missing_strategy: MissingStrategy::default(),
            outlier_multiplier: DEFAULT_OUTLIER_MULTIPLIER,
            extreme_percentile: DEFAULT_EXTREME_PERCENTILE,
            correlation_method: CorrelationMethod::default(),
            jump_threshold: DEFAULT_JUMP_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Parse a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }
}
