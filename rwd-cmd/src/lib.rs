//! Command implementations for the reservoir weather CLI.
//!
//! Every subcommand loads a directory of per-reservoir CSV files, cleans
//! it, and prints a report: data quality, per-variable analysis, an
//! exploratory summary, or the reservoir inventory.

use clap::{Args, Subcommand};
use rwd_analysis::Analyzer;
use std::path::PathBuf;

pub mod analyze;
pub mod inventory;
pub mod loader;
pub mod pipeline;
pub mod quality;

/// Where the data lives and how to clean it.
#[derive(Args, Debug, Clone)]
pub struct DataArgs {
    /// Directory of per-reservoir CSV files
    #[arg(short = 'd', long, default_value = "data/reservoir-weather")]
    pub data_dir: PathBuf,

    /// TOML file with engine settings
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Missing-value strategy (interpolate, forward_fill, drop); overrides the config file
    #[arg(short = 's', long)]
    pub strategy: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Clean the data and print the data-quality report
    Quality {
        #[command(flatten)]
        data: DataArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Seasonal, trend, extreme-event, pattern and correlation analysis of one variable (JSON)
    Analyze {
        #[command(flatten)]
        data: DataArgs,

        /// Variable to analyse (canonical or legacy column name)
        #[arg(short = 'v', long, default_value = "storage_percent")]
        variable: String,

        /// Trend method: linear or mann_kendall
        #[arg(short = 'm', long, default_value = "linear")]
        method: String,

        /// Restrict the seasonal analysis to one reservoir (code or name)
        #[arg(short = 'r', long)]
        reservoir: Option<String>,

        /// Extreme-event percentile; overrides the config file
        #[arg(short = 'p', long)]
        percentile: Option<f64>,

        /// Correlation method: pearson, spearman or kendall; overrides the config file
        #[arg(long)]
        correlation: Option<String>,

        /// Also run the trend separately for every reservoir
        #[arg(long)]
        by_reservoir: bool,
    },

    /// Print the exploratory summary of the cleaned data
    Summary {
        #[command(flatten)]
        data: DataArgs,
    },

    /// List reservoirs with date coverage and mean storage (CSV on stdout)
    Reservoirs {
        #[command(flatten)]
        data: DataArgs,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Quality { data, json } => quality::run_quality(&data, json),
        Command::Analyze {
            data,
            variable,
            method,
            reservoir,
            percentile,
            correlation,
            by_reservoir,
        } => analyze::run_analyze(
            &data,
            &analyze::AnalyzeOptions {
                variable,
                method,
                reservoir,
                percentile,
                correlation,
                by_reservoir,
            },
        ),
        Command::Summary { data } => {
            let prepared = pipeline::prepare(&data)?;
            let analyzer = Analyzer::new(&prepared.dataset, &prepared.config);
            print!("{}", analyzer.generate_summary_report());
            Ok(())
        }
        Command::Reservoirs { data } => inventory::run_inventory(&data),
    }
}
