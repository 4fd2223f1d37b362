//! Ingestion of per-reservoir CSV files.
//!
//! A data directory holds one `<NAME>.csv` per reservoir (`test.csv` is
//! ignored). Headers may use the canonical field names (`storage_percent`,
//! `temp_max`, ...) or the legacy ones (`embalse_porcentaje`,
//! `meteo_temp_max`, ...). Numeric cells are kept as text; the cleaner
//! decides what parses.

use anyhow::Context;
use csv::StringRecord;
use log::{info, warn};
use rwd_core::{EngineError, Field, RawRecord, Reservoir};
use rwd_utils::dates::parse_iso_date;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const DATE_COLUMNS: [&str; 2] = ["date", "fecha"];
const STATION_COLUMNS: [&str; 2] = ["station_id", "embalse_codigo"];
const NAME_COLUMNS: [&str; 2] = ["name", "embalse_nombre"];
const REGION_COLUMNS: [&str; 2] = ["region", "embalse_provincia"];

/// File stem excluded from directory loads.
const EXCLUDED_STEM: &str = "test";

/// Everything read from one or more files, ready for
/// [`rwd_data::Cleaner::clean_raw`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedData {
    pub reservoirs: Vec<Reservoir>,
    /// Numeric fields present as a column in at least one file.
    pub fields: Vec<Field>,
    pub rows: Vec<RawRecord>,
}

impl LoadedData {
    /// Append `other`. The first name and region seen for a station win.
    pub fn merge(&mut self, other: LoadedData) {
        for reservoir in other.reservoirs {
            if !self.reservoirs.iter().any(|r| r.station_id == reservoir.station_id) {
                self.reservoirs.push(reservoir);
            }
        }
        for field in other.fields {
            if !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self.rows.extend(other.rows);
    }
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

/// Parse one CSV document. `source` names the file in log lines and stands in
/// for the reservoir name when there is no name column. Row identifiers start
/// at `first_row_id`.
pub fn load_csv_str(source: &str, data: &str, first_row_id: usize) -> anyhow::Result<LoadedData> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());
    let headers = reader.headers()?.clone();

    let date_col = find_column(&headers, &DATE_COLUMNS)
        .ok_or_else(|| EngineError::MissingInput("date".to_string()))?;
    let station_col = find_column(&headers, &STATION_COLUMNS)
        .ok_or_else(|| EngineError::MissingInput("station_id".to_string()))?;
    let name_col = find_column(&headers, &NAME_COLUMNS);
    let region_col = find_column(&headers, &REGION_COLUMNS);
    let field_cols: Vec<(Field, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| Field::from_column(h).map(|f| (f, i)))
        .collect();

    let mut loaded = LoadedData {
        fields: field_cols.iter().map(|(f, _)| *f).collect(),
        ..Default::default()
    };
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut skipped = 0usize;

    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("{}: malformed CSV at row {}", source, line + 1))?;
        let cell = |i: usize| record.get(i).unwrap_or("");
        let date = match parse_iso_date(cell(date_col)) {
            Ok(d) => d,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };
        let station_id = cell(station_col).to_string();
        if !seen.contains(&station_id) {
            let name = name_col.map(cell).filter(|n| !n.is_empty()).unwrap_or(source);
            let region = region_col.map(cell).unwrap_or("");
            loaded.reservoirs.push(Reservoir::new(&station_id, name, region));
            seen.insert(station_id.clone());
        }

        let mut raw = RawRecord::new(first_row_id + loaded.rows.len(), &station_id, date);
        for (field, i) in &field_cols {
            let text = cell(*i);
            if !text.is_empty() {
                raw.set_cell(*field, text);
            }
        }
        loaded.rows.push(raw);
    }

    if skipped > 0 {
        warn!("{}: skipped {} rows with an unreadable date", source, skipped);
    }
    info!("{}: loaded {} rows", source, loaded.rows.len());
    Ok(loaded)
}

/// Reservoir file names (stems) available in `dir`, sorted.
pub fn available_reservoirs(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut stems = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("cannot read {}", dir.display()))? {
        let path = entry?.path();
        let is_csv = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            if stem != EXCLUDED_STEM {
                stems.push(stem.to_string());
            }
        }
    }
    stems.sort();
    Ok(stems)
}

/// Load every reservoir file of `dir` in name order. Row identifiers run on
/// across files in that order.
pub fn load_dir(dir: &Path) -> anyhow::Result<LoadedData> {
    let stems = available_reservoirs(dir)?;
    if stems.is_empty() {
        anyhow::bail!("no reservoir CSV files in {}", dir.display());
    }
    let mut loaded = LoadedData::default();
    for stem in &stems {
        let path = dir.join(format!("{}.csv", stem));
        let data = fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let file = load_csv_str(stem, &data, loaded.rows.len())
            .with_context(|| format!("cannot load {}", path.display()))?;
        loaded.merge(file);
    }
    info!(
        "Loaded {} rows for {} reservoirs from {}",
        loaded.rows.len(),
        loaded.reservoirs.len(),
        dir.display()
    );
    Ok(loaded)
}
