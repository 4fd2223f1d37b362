//! `quality` subcommand.

use crate::pipeline::prepare;
use crate::DataArgs;
use rwd_data::CleanSummary;
use rwd_quality::{QualityReport, Validator};
use serde::Serialize;

#[derive(Serialize)]
struct QualityOutput<'a> {
    cleaning: &'a CleanSummary,
    report: &'a QualityReport,
}

pub fn run_quality(args: &DataArgs, json: bool) -> anyhow::Result<()> {
    let prepared = prepare(args)?;
    let report = Validator::new(&prepared.config).generate_quality_report(&prepared.dataset);

    if json {
        let output = QualityOutput {
            cleaning: &prepared.summary,
            report: &report,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let s = &prepared.summary;
    println!("=== CLEANING ===");
    println!("Input rows: {}", s.input_rows);
    println!("Output rows: {}", s.output_rows);
    println!("Duplicates removed: {}", s.duplicates_removed);
    println!(
        "Missing values ({}): {} filled, {} rows dropped",
        prepared.config.missing_strategy, s.values_filled, s.rows_dropped
    );
    println!("Unparseable values: {}", s.unparseable_values);
    for v in &s.range_violations {
        println!("  {} values in {} outside [{}, {}]", v.count, v.field, v.min, v.max);
    }
    println!();
    print!("{}", report);
    Ok(())
}
