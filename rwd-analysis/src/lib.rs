//! Statistical analysis of a cleaned dataset.
//!
//! [`Analyzer`] borrows a snapshot and answers one question per call:
//! seasonal aggregates, long-term trend, reservoir comparison, extreme
//! events, correlation, temporal patterns and a text summary. The
//! numerical kernels live in [`trend`] and [`correlation`].

pub mod analyzer;
pub mod correlation;
pub mod trend;

pub use analyzer::{
    Analyzer, ExtremeEvents, GroupStats, ReservoirStats, SeasonalAnalysis, TemporalPatterns,
};
pub use correlation::CorrelationMatrix;
pub use trend::{LinearTrend, MannKendallTrend, TrendDirection, TrendResult};
