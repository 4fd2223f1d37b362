use crate::field::{Field, FIELD_COUNT};
use crate::season::Season;
use crate::variable::{DerivedField, Variable};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Numeric readings of one observation, indexed by [`Field`].
/// `None` marks a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Readings([Option<f64>; FIELD_COUNT]);

impl Readings {
    pub fn get(&self, field: Field) -> Option<f64> {
        self.0[field.index()]
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        self.0[field.index()] = value;
    }

    /// Builder-style setter, handy for fixtures.
    pub fn with(mut self, field: Field, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }

    /// True if any of `fields` is missing.
    pub fn has_missing(&self, fields: &[Field]) -> bool {
        fields.iter().any(|f| self.get(*f).is_none())
    }
}

/// Features computed by the cleaner. Calendar parts are always present,
/// numeric features are `None` when an input is missing or absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Derived {
    pub year: i32,
    pub month: u32,
    pub day_of_year: u32,
    pub season: Season,
    pub temp_range: Option<f64>,
    pub humidity_range: Option<f64>,
    pub heat_stress_index: Option<f64>,
    pub storage_change: Option<f64>,
    pub storage_change_7d: Option<f64>,
}

impl Derived {
    /// Calendar parts of `date` with every numeric feature unset.
    pub fn calendar(date: NaiveDate) -> Self {
        Derived {
            year: date.year(),
            month: date.month(),
            day_of_year: date.ordinal(),
            season: Season::from_month(date.month()),
            temp_range: None,
            humidity_range: None,
            heat_stress_index: None,
            storage_change: None,
            storage_change_7d: None,
        }
    }

    pub fn get(&self, field: DerivedField) -> Option<f64> {
        match field {
            DerivedField::TempRange => self.temp_range,
            DerivedField::HumidityRange => self.humidity_range,
            DerivedField::HeatStressIndex => self.heat_stress_index,
            DerivedField::StorageChange => self.storage_change,
            DerivedField::StorageChange7d => self.storage_change_7d,
        }
    }
}

/// One reservoir, one calendar date. `(station_id, date)` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Position of the row in the ingested input; stable across cleaning.
    pub row_id: usize,
    pub station_id: String,
    pub date: NaiveDate,
    pub readings: Readings,
    pub derived: Option<Derived>,
}

impl Record {
    pub fn new(row_id: usize, station_id: &str, date: NaiveDate, readings: Readings) -> Self {
        Record {
            row_id,
            station_id: station_id.to_string(),
            date,
            readings,
            derived: None,
        }
    }

    pub fn value(&self, variable: Variable) -> Option<f64> {
        match variable {
            Variable::Field(field) => self.readings.get(field),
            Variable::Derived(derived) => self.derived.and_then(|d| d.get(derived)),
        }
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn season(&self) -> Season {
        Season::from_month(self.date.month())
    }

    pub fn key(&self) -> (&str, NaiveDate) {
        (self.station_id.as_str(), self.date)
    }
}

/// A row as handed over by ingestion: numeric cells still as text.
/// A cell is `None` when the column is absent or the cell is blank.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub row_id: usize,
    pub station_id: String,
    pub date: NaiveDate,
    pub cells: [Option<String>; FIELD_COUNT],
}

impl RawRecord {
    pub fn new(row_id: usize, station_id: &str, date: NaiveDate) -> Self {
        RawRecord {
            row_id,
            station_id: station_id.to_string(),
            date,
            cells: Default::default(),
        }
    }

    pub fn cell(&self, field: Field) -> Option<&str> {
        self.cells[field.index()].as_deref()
    }

    pub fn set_cell(&mut self, field: Field, text: &str) {
        self.cells[field.index()] = Some(text.to_string());
    }
}
