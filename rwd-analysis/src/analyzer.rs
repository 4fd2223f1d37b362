use crate::correlation::CorrelationMatrix;
use crate::trend::{linear_fit, mann_kendall, TrendResult};
use chrono::{Datelike, NaiveDate};
use log::{debug, info};
use rwd_core::error::{EngineError, Result};
use rwd_core::{
    CorrelationMethod, Dataset, EngineConfig, Field, Record, Season, TrendMethod, Variable,
};
use rwd_utils::dates::{day_of_week, days_between, format_date};
use rwd_utils::numeric::{max, mean, min, quantile, sample_std, Describe};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Headline variables described in the summary report when present.
const KEY_VARIABLES: [Field; 3] = [Field::StoragePercent, Field::TempMean, Field::Precipitation];

/// mean / std / min / max / count of one group. Statistics are `None` when
/// the group holds no values (std needs two).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

impl GroupStats {
    pub fn from_values(values: &[f64]) -> Self {
        GroupStats {
            mean: mean(values),
            std: sample_std(values),
            min: min(values),
            max: max(values),
            count: values.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonalAnalysis {
    pub variable: Variable,
    pub reservoir: Option<String>,
    pub monthly: BTreeMap<u32, GroupStats>,
    pub seasonal: BTreeMap<Season, GroupStats>,
    /// Year x season table of means. A year lists the seasons it has rows for.
    pub yearly_seasonal: BTreeMap<i32, BTreeMap<Season, Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservoirStats {
    pub station_id: String,
    pub name: String,
    pub stats: BTreeMap<Variable, GroupStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtremeEvents {
    pub variable: Variable,
    pub percentile: f64,
    pub threshold: f64,
    pub num_extreme_events: usize,
    /// Share of all rows, not only rows with a value.
    pub extreme_percentage: f64,
    pub event_rows: Vec<usize>,
    pub monthly_counts: BTreeMap<u32, usize>,
    pub yearly_counts: BTreeMap<i32, usize>,
    pub extreme_mean: Option<f64>,
    pub extreme_max: Option<f64>,
    pub extreme_std: Option<f64>,
}

/// Means of a variable by calendar unit. `day_of_week` runs Monday = 0 to
/// Sunday = 6.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalPatterns {
    pub variable: Variable,
    pub day_of_week: BTreeMap<u32, Option<f64>>,
    pub monthly: BTreeMap<u32, Option<f64>>,
    pub yearly: BTreeMap<i32, Option<f64>>,
    pub day_of_year: BTreeMap<u32, Option<f64>>,
}

/// Read-only analysis over one dataset snapshot. Every call recomputes from
/// the snapshot; nothing is cached between calls.
pub struct Analyzer<'a> {
    dataset: &'a Dataset,
    extreme_percentile: f64,
    correlation_method: CorrelationMethod,
}

impl<'a> Analyzer<'a> {
    pub fn new(dataset: &'a Dataset, config: &EngineConfig) -> Self {
        Analyzer {
            dataset,
            extreme_percentile: config.extreme_percentile,
            correlation_method: config.correlation_method,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        self.dataset
    }

    fn require(&self, variable: Variable) -> Result<()> {
        if self.dataset.has_variable(variable) {
            Ok(())
        } else {
            Err(EngineError::MissingInput(variable.name().to_string()))
        }
    }

    /// Rows of the whole dataset, or of the reservoirs matching `reservoir`
    /// by code or by name.
    fn rows(&self, reservoir: Option<&str>) -> Result<Vec<&'a Record>> {
        let dataset: &'a Dataset = self.dataset;
        let Some(key) = reservoir else {
            return Ok(dataset.records().iter().collect());
        };
        let key = key.trim();
        let stations: BTreeSet<&str> = dataset
            .reservoirs()
            .values()
            .filter(|r| r.station_id == key || r.name == key)
            .map(|r| r.station_id.as_str())
            .chain(
                dataset
                    .records()
                    .iter()
                    .filter(|r| r.station_id == key)
                    .map(|r| r.station_id.as_str()),
            )
            .collect();
        if stations.is_empty() {
            return Err(EngineError::UnknownReservoir(key.to_string()));
        }
        Ok(dataset
            .records()
            .iter()
            .filter(|r| stations.contains(r.station_id.as_str()))
            .collect())
    }

    fn reservoir_name(&self, station_id: &str) -> String {
        self.dataset
            .reservoir(station_id)
            .map(|r| r.display_name().to_string())
            .unwrap_or_else(|| station_id.to_string())
    }

    /// Aggregates of `variable` by month, by season, and by (year, season).
    pub fn seasonal_analysis(
        &self,
        variable: Variable,
        reservoir: Option<&str>,
    ) -> Result<SeasonalAnalysis> {
        self.require(variable)?;
        let rows = self.rows(reservoir)?;

        let monthly = group_values(&rows, variable, |r| r.month());
        let seasonal = group_values(&rows, variable, |r| r.season());
        let mut yearly_seasonal: BTreeMap<i32, BTreeMap<Season, Option<f64>>> = BTreeMap::new();
        for ((year, season), values) in group_values(&rows, variable, |r| (r.year(), r.season())) {
            yearly_seasonal
                .entry(year)
                .or_default()
                .insert(season, mean(&values));
        }

        Ok(SeasonalAnalysis {
            variable,
            reservoir: reservoir.map(str::to_string),
            monthly: stats_by_group(monthly),
            seasonal: stats_by_group(seasonal),
            yearly_seasonal,
        })
    }

    /// Long-term trend over the whole dataset. The linear method regresses on
    /// days elapsed since the dataset's earliest date.
    pub fn trend_analysis(&self, variable: Variable, method: TrendMethod) -> Result<TrendResult> {
        self.require(variable)?;
        let rows: Vec<&Record> = self.dataset.records().iter().collect();
        trend_of(variable, method, rows)
    }

    /// The same trend run independently on each reservoir's own series.
    /// Reservoirs without enough observations are left out.
    pub fn trend_by_reservoir(
        &self,
        variable: Variable,
        method: TrendMethod,
    ) -> Result<BTreeMap<String, TrendResult>> {
        self.require(variable)?;
        let records = self.dataset.records();
        let mut trends = BTreeMap::new();
        for (station, indices) in self.dataset.partition_by_reservoir() {
            let rows: Vec<&Record> = indices.iter().map(|&i| &records[i]).collect();
            match trend_of(variable, method, rows) {
                Ok(trend) => {
                    trends.insert(station.to_string(), trend);
                }
                Err(e) => debug!("No {} trend for {}: {}", method, station, e),
            }
        }
        Ok(trends)
    }

    /// Per-reservoir statistics for each requested variable that is a column
    /// of the dataset; absent variables are skipped.
    pub fn reservoir_comparison(&self, variables: &[Variable]) -> Vec<ReservoirStats> {
        let present: Vec<Variable> = variables
            .iter()
            .copied()
            .filter(|v| {
                let has = self.dataset.has_variable(*v);
                if !has {
                    debug!("{} not in dataset, left out of comparison", v);
                }
                has
            })
            .collect();
        let records = self.dataset.records();
        self.dataset
            .partition_by_reservoir()
            .into_iter()
            .map(|(station, indices)| {
                let stats = present
                    .iter()
                    .map(|v| {
                        let values: Vec<f64> =
                            indices.iter().filter_map(|&i| records[i].value(*v)).collect();
                        (*v, GroupStats::from_values(&values))
                    })
                    .collect();
                ReservoirStats {
                    station_id: station.to_string(),
                    name: self.reservoir_name(station),
                    stats,
                }
            })
            .collect()
    }

    /// Rows strictly above the given percentile (configured default when
    /// `None`) of the variable's distribution.
    pub fn extreme_events_analysis(
        &self,
        variable: Variable,
        percentile: Option<f64>,
    ) -> Result<ExtremeEvents> {
        let percentile = percentile.unwrap_or(self.extreme_percentile);
        if !(0.0..=100.0).contains(&percentile) {
            return Err(EngineError::InvalidPercentile(percentile));
        }
        self.require(variable)?;
        let values = self.dataset.values(variable);
        let threshold =
            quantile(&values, percentile / 100.0).ok_or_else(|| EngineError::InsufficientData {
                variable: variable.name().to_string(),
                needed: 1,
                found: 0,
            })?;

        let events: Vec<(&Record, f64)> = self
            .dataset
            .records()
            .iter()
            .filter_map(|r| r.value(variable).filter(|v| *v > threshold).map(|v| (r, v)))
            .collect();
        let event_values: Vec<f64> = events.iter().map(|(_, v)| *v).collect();
        let mut monthly_counts = BTreeMap::new();
        let mut yearly_counts = BTreeMap::new();
        for (record, _) in &events {
            *monthly_counts.entry(record.month()).or_insert(0) += 1;
            *yearly_counts.entry(record.year()).or_insert(0) += 1;
        }
        info!(
            "{} extreme {} events above {:.3} (p{})",
            events.len(),
            variable,
            threshold,
            percentile
        );

        Ok(ExtremeEvents {
            variable,
            percentile,
            threshold,
            num_extreme_events: events.len(),
            extreme_percentage: events.len() as f64 / self.dataset.len() as f64 * 100.0,
            event_rows: events.iter().map(|(r, _)| r.row_id).collect(),
            monthly_counts,
            yearly_counts,
            extreme_mean: mean(&event_values),
            extreme_max: max(&event_values),
            extreme_std: sample_std(&event_values),
        })
    }

    /// Correlation matrix over `variables` (every numeric column when `None`)
    /// with `method` (configured default when `None`).
    pub fn correlation_analysis(
        &self,
        variables: Option<&[Variable]>,
        method: Option<CorrelationMethod>,
    ) -> Result<CorrelationMatrix> {
        let variables = match variables {
            Some(vs) => {
                for v in vs {
                    self.require(*v)?;
                }
                vs.to_vec()
            }
            None => self.dataset.variables(),
        };
        let columns: Vec<Vec<Option<f64>>> = variables
            .iter()
            .map(|v| self.dataset.records().iter().map(|r| r.value(*v)).collect())
            .collect();
        Ok(CorrelationMatrix::compute(
            method.unwrap_or(self.correlation_method),
            variables,
            &columns,
        ))
    }

    pub fn temporal_patterns(&self, variable: Variable) -> Result<TemporalPatterns> {
        self.require(variable)?;
        let rows: Vec<&Record> = self.dataset.records().iter().collect();
        Ok(TemporalPatterns {
            variable,
            day_of_week: means_by_group(&rows, variable, |r| day_of_week(&r.date)),
            monthly: means_by_group(&rows, variable, |r| r.month()),
            yearly: means_by_group(&rows, variable, |r| r.year()),
            day_of_year: means_by_group(&rows, variable, |r| r.date.ordinal()),
        })
    }

    /// Plain-text overview: shape, date span, reservoirs, numeric columns,
    /// missing data and headline statistics.
    pub fn generate_summary_report(&self) -> String {
        let ds = self.dataset;
        let mut report = String::new();
        let _ = writeln!(report, "=== EXPLORATORY DATA ANALYSIS SUMMARY ===\n");

        let columns = ds.columns();
        let _ = writeln!(report, "Dataset Shape: ({}, {})", ds.len(), columns.len());
        match ds.date_span() {
            Some((start, end)) => {
                let _ = writeln!(
                    report,
                    "Date Range: {} to {}",
                    format_date(&start),
                    format_date(&end)
                );
            }
            None => {
                let _ = writeln!(report, "Date Range: none");
            }
        }
        let names: Vec<String> = ds
            .partition_by_reservoir()
            .keys()
            .map(|station| self.reservoir_name(station))
            .collect();
        let _ = writeln!(report, "Number of Reservoirs: {}", names.len());
        let _ = writeln!(report, "Reservoirs: {}\n", names.join(", "));

        let variables = ds.variables();
        let _ = writeln!(report, "Numeric Variables ({}):", variables.len());
        for v in &variables {
            let _ = writeln!(report, "  - {}", v);
        }
        let _ = writeln!(report);

        let missing: Vec<(&str, usize)> = columns
            .iter()
            .map(|c| {
                let absent = ds.records().iter().filter(|r| !ds.is_present(r, *c)).count();
                (c.name(), absent)
            })
            .filter(|(_, n)| *n > 0)
            .collect();
        if missing.is_empty() {
            let _ = writeln!(report, "No missing data detected.");
        } else {
            let _ = writeln!(report, "Missing Data:");
            for (name, count) in missing {
                let pct = count as f64 / ds.len() as f64 * 100.0;
                let _ = writeln!(report, "  - {}: {} ({:.1}%)", name, count, pct);
            }
        }
        let _ = writeln!(report);

        let key: Vec<Field> = KEY_VARIABLES
            .into_iter()
            .filter(|f| ds.has_field(*f))
            .collect();
        if !key.is_empty() {
            let _ = writeln!(report, "Key Variable Statistics:");
            report.push_str(&describe_table(ds, &key));
        }
        report
    }
}

fn group_values<K, F>(rows: &[&Record], variable: Variable, key: F) -> BTreeMap<K, Vec<f64>>
where
    K: Ord,
    F: Fn(&Record) -> K,
{
    let mut groups: BTreeMap<K, Vec<f64>> = BTreeMap::new();
    for &record in rows {
        let values = groups.entry(key(record)).or_default();
        if let Some(v) = record.value(variable) {
            values.push(v);
        }
    }
    groups
}

fn stats_by_group<K: Ord>(groups: BTreeMap<K, Vec<f64>>) -> BTreeMap<K, GroupStats> {
    groups
        .into_iter()
        .map(|(k, values)| (k, GroupStats::from_values(&values)))
        .collect()
}

fn means_by_group<K, F>(rows: &[&Record], variable: Variable, key: F) -> BTreeMap<K, Option<f64>>
where
    K: Ord,
    F: Fn(&Record) -> K,
{
    group_values(rows, variable, key)
        .into_iter()
        .map(|(k, values)| (k, mean(&values)))
        .collect()
}

/// Trend over `rows` in date order, elapsed days counted from the first row.
fn trend_of(variable: Variable, method: TrendMethod, mut rows: Vec<&Record>) -> Result<TrendResult> {
    rows.sort_by_key(|r| r.date);
    let name = variable.name();
    let origin: Option<NaiveDate> = rows.first().map(|r| r.date);
    let series: Vec<(f64, f64)> = rows
        .iter()
        .filter_map(|r| {
            let elapsed = days_between(&origin?, &r.date) as f64;
            r.value(variable).map(|v| (elapsed, v))
        })
        .collect();
    match method {
        TrendMethod::Linear => linear_fit(name, &series).map(TrendResult::Linear),
        TrendMethod::MannKendall => {
            let values: Vec<f64> = series.iter().map(|(_, v)| *v).collect();
            mann_kendall(name, &values).map(TrendResult::MannKendall)
        }
    }
}

fn describe_table(dataset: &Dataset, fields: &[Field]) -> String {
    let described: Vec<Describe> = fields
        .iter()
        .map(|f| Describe::from_values(&dataset.values((*f).into())))
        .collect();
    let cell = |v: Option<f64>| v.map_or_else(|| "NaN".to_string(), |v| format!("{:.3}", v));

    let mut table = format!("{:<8}", "");
    for f in fields {
        table.push_str(&format!("{:>18}", f.name()));
    }
    table.push('\n');
    let rows: [(&str, fn(&Describe) -> Option<f64>); 8] = [
        ("count", |d| Some(d.count as f64)),
        ("mean", |d| d.mean),
        ("std", |d| d.std),
        ("min", |d| d.min),
        ("25%", |d| d.q25),
        ("50%", |d| d.median),
        ("75%", |d| d.q75),
        ("max", |d| d.max),
    ];
    for (label, get) in rows {
        table.push_str(&format!("{:<8}", label));
        for d in &described {
            table.push_str(&format!("{:>18}", cell(get(d))));
        }
        table.push('\n');
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend::TrendDirection;
    use rwd_core::{DerivedField, Readings, Reservoir};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reservoirs() -> Vec<Reservoir> {
        vec![
            Reservoir::new("S19", "CASASOLA", "MALAGA"),
            Reservoir::new("S20", "CONDE", "MALAGA"),
        ]
    }

    fn record(row_id: usize, station: &str, d: NaiveDate, field: Field, value: Option<f64>) -> Record {
        let mut readings = Readings::default();
        readings.set(field, value);
        Record::new(row_id, station, d, readings)
    }

    fn single_field(values: &[(&str, NaiveDate, Option<f64>)], field: Field) -> Dataset {
        let records = values
            .iter()
            .enumerate()
            .map(|(i, (s, d, v))| record(i, s, *d, field, *v))
            .collect();
        Dataset::new(reservoirs(), vec![field], records)
    }

    fn uniform() -> Dataset {
        let start = date(2020, 1, 1);
        let values: Vec<(&str, NaiveDate, Option<f64>)> = (0..100)
            .map(|i| ("S19", start + chrono::TimeDelta::days(i), Some((i + 1) as f64)))
            .collect();
        single_field(&values, Field::Precipitation)
    }

    #[test]
    fn test_seasonal_analysis() {
        let ds = single_field(
            &[
                ("S19", date(2020, 1, 15), Some(10.0)),
                ("S19", date(2020, 2, 15), Some(20.0)),
                ("S19", date(2020, 7, 1), Some(30.0)),
                ("S20", date(2021, 1, 10), None),
            ],
            Field::TempMean,
        );
        let analyzer = Analyzer::new(&ds, &EngineConfig::default());
        let result = analyzer.seasonal_analysis(Field::TempMean.into(), None).unwrap();

        assert_eq!(result.monthly[&1].count, 1);
        assert_eq!(result.monthly[&1].mean, Some(10.0));
        let winter = &result.seasonal[&Season::Winter];
        assert_eq!(winter.count, 2);
        assert_eq!(winter.mean, Some(15.0));
        assert!((winter.std.unwrap() - 50f64.sqrt()).abs() < 1e-12);
        assert_eq!(result.seasonal[&Season::Summer].std, None);
        assert!(!result.seasonal.contains_key(&Season::Spring));
        assert_eq!(result.yearly_seasonal[&2020][&Season::Winter], Some(15.0));
        assert_eq!(result.yearly_seasonal[&2020][&Season::Summer], Some(30.0));
        assert_eq!(result.yearly_seasonal[&2021][&Season::Winter], None);
    }

    #[test]
    fn test_seasonal_analysis_for_one_reservoir() {
        let ds = single_field(
            &[
                ("S19", date(2020, 1, 15), Some(10.0)),
                ("S20", date(2020, 1, 15), Some(50.0)),
                ("S20", date(2020, 4, 15), Some(70.0)),
            ],
            Field::StoragePercent,
        );
        let analyzer = Analyzer::new(&ds, &EngineConfig::default());
        let variable = Field::StoragePercent.into();
        let by_name = analyzer.seasonal_analysis(variable, Some("CONDE")).unwrap();
        let by_code = analyzer.seasonal_analysis(variable, Some("S20")).unwrap();
        assert_eq!(by_name.seasonal, by_code.seasonal);
        assert_eq!(by_name.monthly[&1].mean, Some(50.0));
        assert_eq!(by_name.seasonal[&Season::Spring].mean, Some(70.0));
        assert_eq!(
            analyzer.seasonal_analysis(variable, Some("NOWHERE")),
            Err(EngineError::UnknownReservoir("NOWHERE".to_string()))
        );
    }

    #[test]
    fn test_absent_variable_is_missing_input() {
        let ds = uniform();
        let analyzer = Analyzer::new(&ds, &EngineConfig::default());
        assert_eq!(
            analyzer.trend_analysis(Field::TempMax.into(), TrendMethod::Linear),
            Err(EngineError::MissingInput("temp_max".to_string()))
        );
        assert_eq!(
            analyzer.temporal_patterns(DerivedField::StorageChange.into()),
            Err(EngineError::MissingInput("storage_change".to_string()))
        );
    }

    #[test]
    fn test_linear_trend_on_elapsed_days() {
        // every other day, rising half a point per day
        let values: Vec<(&str, NaiveDate, Option<f64>)> = (0..10)
            .map(|i| {
                let d = date(2020, 3, 1) + chrono::TimeDelta::days(2 * i);
                ("S19", d, Some(50.0 + i as f64))
            })
            .collect();
        let ds = single_field(&values, Field::StoragePercent);
        let analyzer = Analyzer::new(&ds, &EngineConfig::default());
        let TrendResult::Linear(trend) = analyzer
            .trend_analysis(Field::StoragePercent.into(), TrendMethod::Linear)
            .unwrap()
        else {
            panic!("expected a linear trend");
        };
        assert!((trend.slope - 0.5).abs() < 1e-12);
        assert!((trend.intercept - 50.0).abs() < 1e-9);
        assert!((trend.annual_change - 182.625).abs() < 1e-9);
        assert_eq!(trend.n, 10);
    }

    #[test]
    fn test_trend_by_reservoir() {
        let mut values = Vec::new();
        for i in 0..5 {
            let d = date(2020, 1, 1) + chrono::TimeDelta::days(i);
            values.push(("S19", d, Some(i as f64)));
            values.push(("S20", d, Some(10.0 - i as f64)));
        }
        values.push(("S21", date(2020, 1, 1), Some(1.0)));
        let ds = single_field(&values, Field::StoragePercent);
        let analyzer = Analyzer::new(&ds, &EngineConfig::default());
        let trends = analyzer
            .trend_by_reservoir(Field::StoragePercent.into(), TrendMethod::MannKendall)
            .unwrap();
        assert_eq!(trends.len(), 2);
        let direction = |station: &str| match &trends[station] {
            TrendResult::MannKendall(mk) => mk.trend,
            TrendResult::Linear(_) => panic!("expected mann-kendall"),
        };
        assert_eq!(direction("S19"), TrendDirection::Increasing);
        assert_eq!(direction("S20"), TrendDirection::Decreasing);
    }

    #[test]
    fn test_reservoir_comparison() {
        let ds = single_field(
            &[
                ("S19", date(2020, 1, 1), Some(10.0)),
                ("S19", date(2020, 1, 2), Some(20.0)),
                ("S20", date(2020, 1, 1), Some(60.0)),
                ("S20", date(2020, 1, 2), None),
            ],
            Field::StoragePercent,
        );
        let analyzer = Analyzer::new(&ds, &EngineConfig::default());
        let storage: Variable = Field::StoragePercent.into();
        let rows = analyzer.reservoir_comparison(&[storage, Field::TempMax.into()]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "CASASOLA");
        assert_eq!(rows[0].stats.len(), 1);
        assert_eq!(rows[0].stats[&storage].mean, Some(15.0));
        assert_eq!(rows[1].stats[&storage].count, 1);
        assert_eq!(rows[1].stats[&storage].max, Some(60.0));
    }

    #[test]
    fn test_extreme_events_uniform_sample() {
        let ds = uniform();
        let analyzer = Analyzer::new(&ds, &EngineConfig::default());
        let events = analyzer
            .extreme_events_analysis(Field::Precipitation.into(), None)
            .unwrap();
        assert!((events.threshold - 95.05).abs() < 1e-9);
        assert_eq!(events.num_extreme_events, 5);
        assert!((events.extreme_percentage - 5.0).abs() < 1e-12);
        assert_eq!(events.event_rows, vec![95, 96, 97, 98, 99]);
        assert_eq!(events.monthly_counts, BTreeMap::from([(4, 5)]));
        assert_eq!(events.yearly_counts, BTreeMap::from([(2020, 5)]));
        assert_eq!(events.extreme_mean, Some(98.0));
        assert_eq!(events.extreme_max, Some(100.0));
        assert!((events.extreme_std.unwrap() - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_extreme_events_monotone_in_percentile() {
        let ds = uniform();
        let analyzer = Analyzer::new(&ds, &EngineConfig::default());
        let mut previous = usize::MAX;
        for p in [0.0, 25.0, 50.0, 75.0, 90.0, 95.0, 99.0, 100.0] {
            let count = analyzer
                .extreme_events_analysis(Field::Precipitation.into(), Some(p))
                .unwrap()
                .num_extreme_events;
            assert!(count <= previous, "p{p}");
            previous = count;
        }
        assert_eq!(previous, 0);
        assert_eq!(
            analyzer.extreme_events_analysis(Field::Precipitation.into(), Some(101.0)),
            Err(EngineError::InvalidPercentile(101.0))
        );
    }

    #[test]
    fn test_correlation_analysis() {
        let records = (0..6)
            .map(|i| {
                let readings = Readings::default()
                    .with(Field::TempMax, 20.0 + i as f64)
                    .with(Field::TempMin, 10.0 + 2.0 * i as f64)
                    .with(Field::Precipitation, if i % 2 == 0 { 1.0 } else { 0.0 });
                Record::new(i, "S19", date(2020, 5, 1 + i as u32), readings)
            })
            .collect();
        let ds = Dataset::new(
            reservoirs(),
            vec![Field::TempMax, Field::TempMin, Field::Precipitation],
            records,
        );
        let analyzer = Analyzer::new(&ds, &EngineConfig::default());
        let all = analyzer.correlation_analysis(None, None).unwrap();
        assert_eq!(all.method, CorrelationMethod::Pearson);
        assert_eq!(all.columns.len(), 3);
        let (tmax, tmin): (Variable, Variable) = (Field::TempMax.into(), Field::TempMin.into());
        assert!((all.get(tmax, tmin).unwrap() - 1.0).abs() < 1e-12);

        let kendall = analyzer
            .correlation_analysis(Some(&[tmax, tmin][..]), Some(CorrelationMethod::Kendall))
            .unwrap();
        assert_eq!(kendall.columns, vec![tmax, tmin]);
        assert!((kendall.get(tmin, tmax).unwrap() - 1.0).abs() < 1e-12);

        let radiation: Variable = Field::Radiation.into();
        assert_eq!(
            analyzer.correlation_analysis(Some(&[radiation][..]), None),
            Err(EngineError::MissingInput("radiation".to_string()))
        );
    }

    #[test]
    fn test_temporal_patterns() {
        let ds = single_field(
            &[
                ("S19", date(2020, 1, 6), Some(1.0)),
                ("S19", date(2020, 1, 7), Some(3.0)),
                ("S19", date(2020, 1, 13), Some(5.0)),
                ("S19", date(2020, 1, 14), None),
            ],
            Field::Radiation,
        );
        let analyzer = Analyzer::new(&ds, &EngineConfig::default());
        let patterns = analyzer.temporal_patterns(Field::Radiation.into()).unwrap();
        assert_eq!(patterns.day_of_week, BTreeMap::from([(0, Some(3.0)), (1, Some(3.0))]));
        assert_eq!(patterns.monthly, BTreeMap::from([(1, Some(3.0))]));
        assert_eq!(patterns.yearly, BTreeMap::from([(2020, Some(3.0))]));
        assert_eq!(patterns.day_of_year[&13], Some(5.0));
        assert_eq!(patterns.day_of_year[&14], None);
    }

    #[test]
    fn test_summary_report() {
        let ds = single_field(
            &[
                ("S19", date(2020, 1, 1), Some(10.0)),
                ("S20", date(2020, 12, 31), None),
            ],
            Field::StoragePercent,
        );
        let report = Analyzer::new(&ds, &EngineConfig::default()).generate_summary_report();
        assert!(report.starts_with("=== EXPLORATORY DATA ANALYSIS SUMMARY ==="));
        assert!(report.contains("Dataset Shape: (2, 5)"));
        assert!(report.contains("Date Range: 2020-01-01 to 2020-12-31"));
        assert!(report.contains("Reservoirs: CASASOLA, CONDE"));
        assert!(report.contains("  - storage_percent\n"));
        assert!(report.contains("  - storage_percent: 1 (50.0%)"));
        assert!(report.contains("Key Variable Statistics:"));
        assert!(report.contains("10.000"));
    }
}
