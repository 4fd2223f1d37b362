//! Cleaning pipeline for reservoir weather observations.
//!
//! [`Cleaner::clean`] runs every step in a fixed order:
//!
//! 1. round each field to its family precision
//! 2. drop repeated `(station_id, date)` keys, keeping the first in input order
//! 3. sort by reservoir, then date
//! 4. apply the configured [`MissingStrategy`] inside each reservoir
//! 5. count values outside their physical range (values are kept)
//! 6. compute derived features
//!
//! Each step also exists as its own function returning a new snapshot.
//! Running the pipeline on its own output changes nothing.

use crate::interpolation::{fill_interior, forward_fill};
use log::{debug, info, warn};
use rwd_core::{
    Dataset, Derived, EngineConfig, Field, MissingStrategy, RawRecord, Readings, Record, Reservoir,
};
use rwd_utils::numeric::round_to;
use serde::Serialize;
use std::collections::HashSet;

/// Values of one field outside its declared physical range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeViolation {
    pub field: Field,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// What a cleaning run did to its input.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CleanSummary {
    pub input_rows: usize,
    pub output_rows: usize,
    /// Non-blank cells that could not be read as numbers.
    pub unparseable_values: usize,
    pub duplicates_removed: usize,
    pub values_filled: usize,
    pub rows_dropped: usize,
    pub range_violations: Vec<RangeViolation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CleanOutcome {
    pub dataset: Dataset,
    pub summary: CleanSummary,
}

/// Read a cell as a number. Blank, unparseable and non-finite cells are missing.
pub fn parse_numeric(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Round a value to the precision of its field family.
pub fn round_field(field: Field, value: f64) -> f64 {
    round_to(value, field.precision())
}

#[derive(Debug, Clone, Default)]
pub struct Cleaner {
    strategy: MissingStrategy,
}

impl Cleaner {
    pub fn new(config: &EngineConfig) -> Self {
        Cleaner {
            strategy: config.missing_strategy,
        }
    }

    pub fn with_strategy(strategy: MissingStrategy) -> Self {
        Cleaner { strategy }
    }

    /// Coerce ingested rows into a typed dataset. Returns the dataset and the
    /// number of non-blank cells that were not numeric.
    pub fn coerce(
        reservoirs: Vec<Reservoir>,
        fields: Vec<Field>,
        rows: &[RawRecord],
    ) -> (Dataset, usize) {
        let mut unparseable = 0usize;
        let records = rows
            .iter()
            .map(|raw| {
                let mut readings = Readings::default();
                for field in Field::ALL {
                    let Some(text) = raw.cell(field) else {
                        continue;
                    };
                    let value = parse_numeric(text);
                    if value.is_none() && !is_missing_marker(text) {
                        unparseable += 1;
                    }
                    readings.set(field, value);
                }
                Record::new(raw.row_id, &raw.station_id, raw.date, readings)
            })
            .collect();
        if unparseable > 0 {
            warn!("{} non-numeric values coerced to missing", unparseable);
        }
        (Dataset::new(reservoirs, fields, records), unparseable)
    }

    /// Coerce ingested rows, then run [`Cleaner::clean`].
    pub fn clean_raw(
        &self,
        reservoirs: Vec<Reservoir>,
        fields: Vec<Field>,
        rows: &[RawRecord],
    ) -> CleanOutcome {
        let (dataset, unparseable) = Cleaner::coerce(reservoirs, fields, rows);
        let mut outcome = self.clean(&dataset);
        outcome.summary.unparseable_values = unparseable;
        outcome
    }

    /// Run the full pipeline on a snapshot. The input is left untouched.
    pub fn clean(&self, dataset: &Dataset) -> CleanOutcome {
        let input_rows = dataset.len();
        let rounded = Cleaner::round_numeric(dataset);
        let (deduplicated, duplicates_removed) = Cleaner::remove_duplicates(&rounded);
        let sorted = Cleaner::sort_by_reservoir_and_date(&deduplicated);
        let (filled, values_filled, rows_dropped) = self.handle_missing_values(&sorted);
        let range_violations = Cleaner::validate_ranges(&filled);
        let enhanced = Cleaner::add_derived_features(&filled);
        let summary = CleanSummary {
            input_rows,
            output_rows: enhanced.len(),
            unparseable_values: 0,
            duplicates_removed,
            values_filled,
            rows_dropped,
            range_violations,
        };
        debug!("clean summary: {:?}", summary);
        CleanOutcome {
            dataset: enhanced,
            summary,
        }
    }

    /// Round every present field to its family precision.
    pub fn round_numeric(dataset: &Dataset) -> Dataset {
        let fields = dataset.fields().to_vec();
        let records = dataset
            .records()
            .iter()
            .map(|record| {
                let mut record = record.clone();
                for field in &fields {
                    let rounded = record.readings.get(*field).map(|v| round_field(*field, v));
                    record.readings.set(*field, rounded);
                }
                record
            })
            .collect();
        dataset.with_records(records)
    }

    /// Count values outside each field's physical range. Nothing is removed
    /// or clamped.
    pub fn validate_ranges(dataset: &Dataset) -> Vec<RangeViolation> {
        let mut violations = Vec::new();
        for field in dataset.fields() {
            let Some((min, max)) = field.range() else {
                continue;
            };
            let count = dataset
                .records()
                .iter()
                .filter_map(|r| r.readings.get(*field))
                .filter(|v| *v < min || *v > max)
                .count();
            if count > 0 {
                warn!(
                    "{} values in {} outside range [{}, {}]",
                    count, field, min, max
                );
                violations.push(RangeViolation {
                    field: *field,
                    min,
                    max,
                    count,
                });
            }
        }
        violations
    }

    /// Keep the first record of every `(station_id, date)` key, in record order.
    /// Returns the new snapshot and the number of rows removed.
    pub fn remove_duplicates(dataset: &Dataset) -> (Dataset, usize) {
        let mut seen: HashSet<(&str, chrono::NaiveDate)> = HashSet::new();
        let records: Vec<Record> = dataset
            .records()
            .iter()
            .filter(|r| seen.insert(r.key()))
            .cloned()
            .collect();
        let removed = dataset.len() - records.len();
        if removed > 0 {
            info!("Removed {} duplicate records", removed);
        }
        (dataset.with_records(records), removed)
    }

    pub fn sort_by_reservoir_and_date(dataset: &Dataset) -> Dataset {
        let mut records = dataset.records().to_vec();
        records.sort_by(|a, b| a.station_id.cmp(&b.station_id).then(a.date.cmp(&b.date)));
        dataset.with_records(records)
    }

    /// Apply the configured strategy. Filling works inside each reservoir's
    /// chronological series and never crosses reservoirs; filled values are
    /// rounded like input values.
    ///
    /// Returns the snapshot, the number of values filled and the number of
    /// rows dropped.
    pub fn handle_missing_values(&self, dataset: &Dataset) -> (Dataset, usize, usize) {
        let fields = dataset.fields().to_vec();
        match self.strategy {
            MissingStrategy::Drop => {
                let records: Vec<Record> = dataset
                    .records()
                    .iter()
                    .filter(|r| !r.readings.has_missing(&fields))
                    .cloned()
                    .collect();
                let dropped = dataset.len() - records.len();
                if dropped > 0 {
                    info!("Dropped {} rows with missing values", dropped);
                }
                (dataset.with_records(records), 0, dropped)
            }
            MissingStrategy::Interpolate | MissingStrategy::ForwardFill => {
                let mut records = dataset.records().to_vec();
                let mut filled = 0usize;
                for indices in dataset.partition_by_reservoir().values() {
                    for field in &fields {
                        let series: Vec<(chrono::NaiveDate, Option<f64>)> = indices
                            .iter()
                            .map(|&i| (records[i].date, records[i].readings.get(*field)))
                            .collect();
                        let values = match self.strategy {
                            MissingStrategy::Interpolate => fill_interior(&series),
                            _ => {
                                let raw: Vec<Option<f64>> = series.iter().map(|(_, v)| *v).collect();
                                forward_fill(&raw)
                            }
                        };
                        for (&i, (before, after)) in indices.iter().zip(series.iter().zip(values)) {
                            if before.1.is_none() {
                                if let Some(v) = after {
                                    records[i].readings.set(*field, Some(round_field(*field, v)));
                                    filled += 1;
                                }
                            }
                        }
                    }
                }
                if filled > 0 {
                    info!("Filled {} missing values ({})", filled, self.strategy);
                }
                (dataset.with_records(records), filled, 0)
            }
        }
    }

    /// Compute calendar parts, weather ranges, the heat-stress proxy and
    /// per-reservoir storage differences. Any previously derived values are
    /// recomputed from scratch. Output is sorted by reservoir, then date.
    pub fn add_derived_features(dataset: &Dataset) -> Dataset {
        let sorted = Cleaner::sort_by_reservoir_and_date(dataset);
        let has_temp_range = sorted.has_fields(&[Field::TempMax, Field::TempMin]);
        let has_humidity_range = sorted.has_fields(&[Field::HumidityMax, Field::HumidityMin]);
        let has_heat_stress = sorted.has_fields(&[Field::TempMean, Field::HumidityMean]);
        let has_storage = sorted.has_field(Field::StoragePercent);

        let mut records: Vec<Record> = sorted
            .records()
            .iter()
            .map(|record| {
                let mut record = record.clone();
                let r = &record.readings;
                let mut derived = Derived::calendar(record.date);
                if has_temp_range {
                    derived.temp_range = difference(r.get(Field::TempMax), r.get(Field::TempMin));
                }
                if has_humidity_range {
                    derived.humidity_range =
                        difference(r.get(Field::HumidityMax), r.get(Field::HumidityMin));
                }
                if has_heat_stress {
                    derived.heat_stress_index = r
                        .get(Field::TempMean)
                        .zip(r.get(Field::HumidityMean))
                        .map(|(t, h)| t + h / 10.0);
                }
                record.derived = Some(derived);
                record
            })
            .collect();

        if has_storage {
            for indices in sorted.partition_by_reservoir().values() {
                let levels: Vec<Option<f64>> = indices
                    .iter()
                    .map(|&i| records[i].readings.get(Field::StoragePercent))
                    .collect();
                for (k, &i) in indices.iter().enumerate() {
                    if let Some(derived) = records[i].derived.as_mut() {
                        derived.storage_change =
                            k.checked_sub(1).and_then(|p| difference(levels[k], levels[p]));
                        derived.storage_change_7d =
                            k.checked_sub(7).and_then(|p| difference(levels[k], levels[p]));
                    }
                }
            }
        }

        sorted.with_derived_records(records)
    }
}

fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    a.zip(b).map(|(a, b)| a - b)
}

fn is_missing_marker(text: &str) -> bool {
    matches!(
        text.trim().to_lowercase().as_str(),
        "" | "nan" | "na" | "n/a" | "null" | "none" | "-" | "---"
    )
}
