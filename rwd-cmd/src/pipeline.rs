//! Shared front half of every subcommand: configuration, loading, cleaning.

use crate::loader::{load_dir, LoadedData};
use crate::DataArgs;
use anyhow::Context;
use log::info;
use rwd_core::{Dataset, EngineConfig, MissingStrategy};
use rwd_data::{CleanSummary, Cleaner};
use std::fs;
use std::path::Path;

/// A cleaned dataset together with the settings that produced it.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub config: EngineConfig,
    pub dataset: Dataset,
    pub summary: CleanSummary,
}

/// Parse TOML settings (defaults when `toml` is `None`) and apply the
/// command-line strategy override.
pub fn parse_config(toml: Option<&str>, strategy: Option<&str>) -> anyhow::Result<EngineConfig> {
    let mut config = match toml {
        Some(text) => EngineConfig::from_toml_str(text).context("invalid engine config")?,
        None => EngineConfig::default(),
    };
    if let Some(name) = strategy {
        config.missing_strategy = name.parse::<MissingStrategy>()?;
    }
    Ok(config)
}

pub fn load_config(path: Option<&Path>, strategy: Option<&str>) -> anyhow::Result<EngineConfig> {
    let text = match path {
        Some(p) => Some(
            fs::read_to_string(p).with_context(|| format!("cannot read {}", p.display()))?,
        ),
        None => None,
    };
    parse_config(text.as_deref(), strategy)
}

pub fn clean_loaded(loaded: LoadedData, config: &EngineConfig) -> (Dataset, CleanSummary) {
    let outcome = Cleaner::new(config).clean_raw(loaded.reservoirs, loaded.fields, &loaded.rows);
    let s = &outcome.summary;
    info!(
        "Cleaned {} -> {} rows ({} duplicates, {} filled, {} dropped, {} unparseable)",
        s.input_rows,
        s.output_rows,
        s.duplicates_removed,
        s.values_filled,
        s.rows_dropped,
        s.unparseable_values
    );
    (outcome.dataset, outcome.summary)
}

pub fn prepare(args: &DataArgs) -> anyhow::Result<Prepared> {
    let config = load_config(args.config.as_deref(), args.strategy.as_deref())?;
    let loaded = load_dir(&args.data_dir)?;
    let (dataset, summary) = clean_loaded(loaded, &config);
    Ok(Prepared {
        config,
        dataset,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_csv_str;
    use chrono::{NaiveDate, TimeDelta};
    use rwd_core::{EngineError, Field};
    use rwd_quality::Validator;

    const HEADER: &str = "date,embalse_codigo,embalse_nombre,embalse_provincia,embalse_reserva,\
embalse_porcentaje,meteo_temp_max,meteo_temp_min,meteo_temp_media,meteo_humedad_max,\
meteo_humedad_min,meteo_humedad_media,meteo_precipitacion";

    const DAYS: usize = 366;

    fn line(code: &str, name: &str, day: usize, pct: f64, temps: (f64, f64, f64)) -> String {
        let date = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + TimeDelta::days(day as i64);
        let (tmin, tmean, tmax) = temps;
        format!(
            "{},{},{},MALAGA,{:.3},{:.1},{:.2},{:.2},{:.2},80.0,40.0,60.0,{:.2}",
            date,
            code,
            name,
            pct * 0.4,
            pct,
            tmax,
            tmin,
            tmean,
            (day % 7) as f64 * 0.5
        )
    }

    /// One year of plausible daily rows.
    fn year_of_rows(code: &str, name: &str, offset: f64) -> Vec<String> {
        (0..DAYS)
            .map(|day| {
                let phase = day as f64 / 58.0;
                let pct = 50.0 + offset + 10.0 * phase.sin();
                let tmin = 8.0 + 10.0 * phase.cos();
                line(code, name, day, pct, (tmin, tmin + 5.0, tmin + 10.0))
            })
            .collect()
    }

    fn document(lines: &[String]) -> String {
        format!("{}\n{}\n", HEADER, lines.join("\n"))
    }

    #[test]
    fn test_parse_config_override() {
        let config = parse_config(
            Some("missing_strategy = \"forward_fill\"\nextreme_percentile = 99.0"),
            Some("drop"),
        )
        .unwrap();
        assert_eq!(config.missing_strategy, MissingStrategy::Drop);
        assert_eq!(config.extreme_percentile, 99.0);
        assert_eq!(parse_config(None, None).unwrap(), EngineConfig::default());

        let err = parse_config(None, Some("guess")).unwrap_err();
        assert_eq!(
            err.downcast_ref::<EngineError>(),
            Some(&EngineError::UnknownMethod("guess".to_string()))
        );
        assert!(parse_config(Some("outlier_multiplier = \"wide\""), None).is_err());
    }

    #[test]
    fn test_end_to_end_quality_scenario() {
        let mut casasola = year_of_rows("S19", "CASASOLA", 0.0);
        casasola[100] = line("S19", "CASASOLA", 100, 120.0, (10.0, 15.0, 20.0));
        casasola.push(line("S19", "CASASOLA", 5, 33.3, (10.0, 15.0, 20.0)));

        let mut conde = year_of_rows("S20", "CONDE", 10.0);
        conde[200] = line("S20", "CONDE", 200, 60.0, (30.0, 20.0, 35.0));

        let mut guadalteba = year_of_rows("S21", "GUADALTEBA", 20.0);
        let first_day_10 = guadalteba[10].clone();
        guadalteba.push(line("S21", "GUADALTEBA", 10, 99.0, (10.0, 15.0, 20.0)));
        guadalteba.push(line("S21", "GUADALTEBA", 11, 99.0, (10.0, 15.0, 20.0)));

        let mut loaded = LoadedData::default();
        for (name, lines) in [
            ("CASASOLA", &casasola),
            ("CONDE", &conde),
            ("GUADALTEBA", &guadalteba),
        ] {
            let file = load_csv_str(name, &document(lines), loaded.rows.len()).unwrap();
            loaded.merge(file);
        }
        assert_eq!(loaded.rows.len(), 3 * DAYS + 3);

        let config = EngineConfig::default();
        let (dataset, summary) = clean_loaded(loaded, &config);
        assert_eq!(summary.duplicates_removed, 3);
        assert_eq!(summary.unparseable_values, 0);
        assert_eq!(summary.values_filled, 0);
        assert_eq!(dataset.len(), 3 * DAYS);
        assert_eq!(Cleaner::remove_duplicates(&dataset).1, 0);
        assert_eq!(summary.range_violations.len(), 1);
        assert_eq!(summary.range_violations[0].field, Field::StoragePercent);
        assert_eq!(summary.range_violations[0].count, 1);

        // the first S21 row for day 10 survives, not the injected copy
        let kept = dataset
            .records()
            .iter()
            .find(|r| r.station_id == "S21" && r.date == NaiveDate::from_ymd_opt(2020, 1, 11).unwrap())
            .unwrap();
        let expected: f64 = first_day_10.split(',').nth(5).unwrap().parse().unwrap();
        assert_eq!(kept.readings.get(Field::StoragePercent), Some(expected));

        let report = Validator::new(&config).generate_quality_report(&dataset);
        assert_eq!(report.reservoir_inconsistencies["percentage_out_of_bounds"].len(), 1);
        assert_eq!(report.weather_inconsistencies["temperature_order"].len(), 1);
        assert!(report.weather_inconsistencies["humidity_order"].is_empty());
        assert!(!report.weather_inconsistencies.contains_key("wind_speed_order"));
        assert_eq!(report.completeness["storage_percent"], 100.0);

        let temporal = report.temporal_consistency.unwrap();
        assert_eq!(temporal.total_days, DAYS as i64);
        assert_eq!(temporal.unique_dates, DAYS);
        assert_eq!(temporal.duplicate_dates, 2 * DAYS);
        assert_eq!(temporal.missing_days, 0);

        // the out-of-range value is still in the cleaned data
        assert!(dataset.values(Field::StoragePercent.into()).contains(&120.0));
    }
}
