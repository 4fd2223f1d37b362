use crate::report::{BasicStats, QualityReport, TemporalConsistency};
use log::{debug, info};
use rwd_core::date_range::DateRange;
use rwd_core::{Dataset, EngineConfig, Field, Record};
use rwd_utils::dates::days_between;
use rwd_utils::numeric::{median, quantile_sorted};
use std::collections::{BTreeMap, BTreeSet};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Runs the diagnostics. Holds only thresholds, so one validator can be
/// reused across snapshots.
#[derive(Debug, Clone)]
pub struct Validator {
    outlier_multiplier: f64,
    jump_threshold: f64,
}

impl Default for Validator {
    fn default() -> Self {
        Validator::new(&EngineConfig::default())
    }
}

impl Validator {
    pub fn new(config: &EngineConfig) -> Self {
        Validator {
            outlier_multiplier: config.outlier_multiplier,
            jump_threshold: config.jump_threshold,
        }
    }

    /// Percentage of non-missing values per column. Empty for an empty dataset.
    pub fn check_completeness(&self, dataset: &Dataset) -> BTreeMap<String, f64> {
        if dataset.is_empty() {
            return BTreeMap::new();
        }
        let total = dataset.len() as f64;
        dataset
            .columns()
            .into_iter()
            .map(|column| {
                let present = dataset
                    .records()
                    .iter()
                    .filter(|r| dataset.is_present(r, column))
                    .count();
                (column.name().to_string(), present as f64 / total * 100.0)
            })
            .collect()
    }

    /// Date coverage over all rows. `None` for an empty dataset.
    pub fn check_temporal_consistency(&self, dataset: &Dataset) -> Option<TemporalConsistency> {
        let (start, end) = dataset.date_span()?;
        let mut dates: Vec<_> = dataset.records().iter().map(|r| r.date).collect();
        dates.sort();
        let unique: BTreeSet<_> = dates.iter().copied().collect();

        let gaps: Vec<i64> = dates.windows(2).map(|w| days_between(&w[0], &w[1])).collect();
        let span = DateRange(start, end);
        let missing_days = span.filter(|d| !unique.contains(d)).count();

        Some(TemporalConsistency {
            start,
            end,
            total_days: span.num_days(),
            unique_dates: unique.len(),
            duplicate_dates: dates.len() - unique.len(),
            missing_days,
            median_gap_days: median(&gaps.iter().map(|g| *g as f64).collect::<Vec<_>>()),
            max_gap_days: gaps.iter().copied().max(),
        })
    }

    /// Order rules between related weather fields. A rule is only evaluated
    /// when all of its fields are columns of the dataset, and a comparison
    /// involving a missing value never flags a row.
    pub fn validate_weather_consistency(&self, dataset: &Dataset) -> BTreeMap<String, Vec<usize>> {
        let mut inconsistencies = BTreeMap::new();
        let triads = [
            ("temperature_order", Field::TempMin, Field::TempMean, Field::TempMax),
            ("humidity_order", Field::HumidityMin, Field::HumidityMean, Field::HumidityMax),
        ];
        for (rule, min, mean, max) in triads {
            if dataset.has_fields(&[min, mean, max]) {
                let rows = violating_rows(dataset, |r| {
                    exceeds(r, min, mean) || exceeds(r, mean, max)
                });
                inconsistencies.insert(rule.to_string(), rows);
            }
        }
        if dataset.has_fields(&[Field::WindSpeed, Field::WindSpeedMax]) {
            let rows = violating_rows(dataset, |r| exceeds(r, Field::WindSpeed, Field::WindSpeedMax));
            inconsistencies.insert("wind_speed_order".to_string(), rows);
        }
        inconsistencies
    }

    /// Storage percentage rules: values outside [0, 100], and day-over-day
    /// changes larger than the jump threshold within one reservoir. Empty when
    /// the dataset carries no storage percentage.
    pub fn check_reservoir_consistency(&self, dataset: &Dataset) -> BTreeMap<String, Vec<usize>> {
        let mut inconsistencies = BTreeMap::new();
        if !dataset.has_field(Field::StoragePercent) {
            return inconsistencies;
        }
        let level = |r: &Record| r.readings.get(Field::StoragePercent);

        let out_of_bounds = violating_rows(dataset, |r| {
            level(r).is_some_and(|v| !(0.0..=100.0).contains(&v))
        });
        inconsistencies.insert("percentage_out_of_bounds".to_string(), out_of_bounds);

        let records = dataset.records();
        let mut jumps = Vec::new();
        for indices in dataset.partition_by_reservoir().values() {
            for pair in indices.windows(2) {
                let (previous, current) = (&records[pair[0]], &records[pair[1]]);
                if let (Some(a), Some(b)) = (level(previous), level(current)) {
                    if (b - a).abs() > self.jump_threshold {
                        jumps.push(current.row_id);
                    }
                }
            }
        }
        inconsistencies.insert("extreme_percentage_changes".to_string(), jumps);
        inconsistencies
    }

    /// IQR rule over every numeric column: values outside
    /// `[Q1 - k*IQR, Q3 + k*IQR]` are counted, nothing is removed.
    pub fn detect_outliers(&self, dataset: &Dataset, multiplier: f64) -> BTreeMap<String, usize> {
        dataset
            .variables()
            .into_iter()
            .map(|variable| {
                let mut values = dataset.values(variable);
                values.sort_by(|a, b| a.total_cmp(b));
                let count = match (quantile_sorted(&values, 0.25), quantile_sorted(&values, 0.75)) {
                    (Some(q1), Some(q3)) => {
                        let iqr = q3 - q1;
                        let (lower, upper) = (q1 - multiplier * iqr, q3 + multiplier * iqr);
                        values.iter().filter(|v| **v < lower || **v > upper).count()
                    }
                    _ => 0,
                };
                (variable.name().to_string(), count)
            })
            .collect()
    }

    pub fn generate_quality_report(&self, dataset: &Dataset) -> QualityReport {
        let basic_stats = BasicStats {
            total_records: dataset.len(),
            total_columns: dataset.columns().len(),
            memory_usage_mb: dataset.approximate_memory_bytes() as f64 / BYTES_PER_MB,
        };
        let report = QualityReport {
            basic_stats,
            completeness: self.check_completeness(dataset),
            temporal_consistency: self.check_temporal_consistency(dataset),
            weather_inconsistencies: self.validate_weather_consistency(dataset),
            reservoir_inconsistencies: self.check_reservoir_consistency(dataset),
            outliers: self.detect_outliers(dataset, self.outlier_multiplier),
        };
        info!(
            "Quality report: {} records, {} inconsistencies",
            report.basic_stats.total_records,
            report.total_inconsistencies()
        );
        debug!("{:?}", report.outliers);
        report
    }
}

fn exceeds(record: &Record, lower: Field, upper: Field) -> bool {
    match (record.readings.get(lower), record.readings.get(upper)) {
        (Some(a), Some(b)) => a > b,
        _ => false,
    }
}

fn violating_rows<F>(dataset: &Dataset, violates: F) -> Vec<usize>
where
    F: Fn(&Record) -> bool,
{
    dataset
        .records()
        .iter()
        .filter(|r| violates(r))
        .map(|r| r.row_id)
        .collect()
}
