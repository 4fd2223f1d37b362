//! `analyze` subcommand: every analysis of one variable, as one JSON document.

use crate::pipeline::prepare;
use crate::DataArgs;
use rwd_analysis::{
    Analyzer, CorrelationMatrix, ExtremeEvents, ReservoirStats, SeasonalAnalysis,
    TemporalPatterns, TrendResult,
};
use rwd_core::{CorrelationMethod, TrendMethod, Variable};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub variable: String,
    pub method: String,
    pub reservoir: Option<String>,
    pub percentile: Option<f64>,
    pub correlation: Option<String>,
    pub by_reservoir: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalysisOutput {
    pub variable: Variable,
    pub seasonal: SeasonalAnalysis,
    pub trend: TrendResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_by_reservoir: Option<BTreeMap<String, TrendResult>>,
    pub comparison: Vec<ReservoirStats>,
    pub extreme_events: ExtremeEvents,
    pub temporal_patterns: TemporalPatterns,
    pub correlation: CorrelationMatrix,
}

/// Run all analyses of `options.variable`. Fails on the first request the
/// data cannot answer (unknown names, absent variable, too few points).
pub fn analyze(analyzer: &Analyzer, options: &AnalyzeOptions) -> anyhow::Result<AnalysisOutput> {
    let variable: Variable = options.variable.parse()?;
    let method: TrendMethod = options.method.parse()?;
    let correlation = options
        .correlation
        .as_deref()
        .map(str::parse::<CorrelationMethod>)
        .transpose()?;

    let trend_by_reservoir = if options.by_reservoir {
        Some(analyzer.trend_by_reservoir(variable, method)?)
    } else {
        None
    };
    Ok(AnalysisOutput {
        variable,
        seasonal: analyzer.seasonal_analysis(variable, options.reservoir.as_deref())?,
        trend: analyzer.trend_analysis(variable, method)?,
        trend_by_reservoir,
        comparison: analyzer.reservoir_comparison(&[variable]),
        extreme_events: analyzer.extreme_events_analysis(variable, options.percentile)?,
        temporal_patterns: analyzer.temporal_patterns(variable)?,
        correlation: analyzer.correlation_analysis(None, correlation)?,
    })
}

pub fn run_analyze(args: &DataArgs, options: &AnalyzeOptions) -> anyhow::Result<()> {
    let prepared = prepare(args)?;
    let analyzer = Analyzer::new(&prepared.dataset, &prepared.config);
    let output = analyze(&analyzer, options)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
