//! Catalog of the numeric fields carried by every observation.
//!
//! Each field has one entry in [`CATALOG`] holding its column names, its
//! rounding precision and, where one is known, its physical range. Rules
//! are looked up by exact key, never by matching fragments of a column name.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of numeric fields per observation.
pub const FIELD_COUNT: usize = 13;

/// A numeric field of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    StorageVolume,
    StoragePercent,
    TempMax,
    TempMin,
    TempMean,
    HumidityMax,
    HumidityMin,
    HumidityMean,
    WindSpeed,
    WindSpeedMax,
    WindDirection,
    Radiation,
    Precipitation,
}

/// Grouping of fields that share a rounding rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFamily {
    StorageVolume,
    StoragePercent,
    Temperature,
    Humidity,
    Wind,
    Radiation,
    Precipitation,
}

impl FieldFamily {
    /// Decimal places kept after cleaning.
    pub const fn precision(self) -> u32 {
        match self {
            FieldFamily::StorageVolume => 3,
            FieldFamily::StoragePercent => 1,
            FieldFamily::Temperature => 2,
            FieldFamily::Humidity => 1,
            FieldFamily::Wind => 2,
            FieldFamily::Radiation => 2,
            FieldFamily::Precipitation => 2,
        }
    }
}

/// Static description of one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub field: Field,
    /// Canonical column name.
    pub name: &'static str,
    /// Column name used by the legacy per-reservoir CSV exports.
    pub legacy_name: &'static str,
    pub family: FieldFamily,
    /// Inclusive physical range, `None` when no bound is declared.
    pub range: Option<(f64, f64)>,
}

const fn spec(
    field: Field,
    name: &'static str,
    legacy_name: &'static str,
    family: FieldFamily,
    range: Option<(f64, f64)>,
) -> FieldSpec {
    FieldSpec {
        field,
        name,
        legacy_name,
        family,
        range,
    }
}

/// One entry per field, in [`Field`] declaration order.
pub static CATALOG: [FieldSpec; FIELD_COUNT] = [
    spec(Field::StorageVolume, "storage_volume", "embalse_reserva", FieldFamily::StorageVolume, None),
    spec(Field::StoragePercent, "storage_percent", "embalse_porcentaje", FieldFamily::StoragePercent, Some((0.0, 100.0))),
    spec(Field::TempMax, "temp_max", "meteo_temp_max", FieldFamily::Temperature, Some((-10.0, 50.0))),
    spec(Field::TempMin, "temp_min", "meteo_temp_min", FieldFamily::Temperature, Some((-15.0, 45.0))),
    spec(Field::TempMean, "temp_mean", "meteo_temp_media", FieldFamily::Temperature, Some((-12.0, 47.0))),
    spec(Field::HumidityMax, "humidity_max", "meteo_humedad_max", FieldFamily::Humidity, Some((0.0, 100.0))),
    spec(Field::HumidityMin, "humidity_min", "meteo_humedad_min", FieldFamily::Humidity, Some((0.0, 100.0))),
    spec(Field::HumidityMean, "humidity_mean", "meteo_humedad_media", FieldFamily::Humidity, Some((0.0, 100.0))),
    spec(Field::WindSpeed, "wind_speed", "meteo_vel_viento", FieldFamily::Wind, Some((0.0, 50.0))),
    spec(Field::WindSpeedMax, "wind_speed_max", "meteo_vel_viento_max", FieldFamily::Wind, Some((0.0, 100.0))),
    spec(Field::WindDirection, "wind_direction", "meteo_dir_viento", FieldFamily::Wind, Some((0.0, 360.0))),
    spec(Field::Radiation, "radiation", "meteo_radiacion", FieldFamily::Radiation, Some((0.0, 40.0))),
    spec(Field::Precipitation, "precipitation", "meteo_precipitacion", FieldFamily::Precipitation, Some((0.0, 200.0))),
];

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::StorageVolume,
        Field::StoragePercent,
        Field::TempMax,
        Field::TempMin,
        Field::TempMean,
        Field::HumidityMax,
        Field::HumidityMin,
        Field::HumidityMean,
        Field::WindSpeed,
        Field::WindSpeedMax,
        Field::WindDirection,
        Field::Radiation,
        Field::Precipitation,
    ];

    /// Position of this field in [`CATALOG`] and in record storage.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn spec(self) -> &'static FieldSpec {
        &CATALOG[self.index()]
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn family(self) -> FieldFamily {
        self.spec().family
    }

    pub fn precision(self) -> u32 {
        self.family().precision()
    }

    pub fn range(self) -> Option<(f64, f64)> {
        self.spec().range
    }

    /// Resolve a column header, canonical or legacy, by exact match.
    pub fn from_column(column: &str) -> Option<Field> {
        let column = column.trim();
        CATALOG
            .iter()
            .find(|spec| spec.name == column || spec.legacy_name == column)
            .map(|spec| spec.field)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::from_column(s).ok_or_else(|| EngineError::UnknownVariable(s.to_string()))
    }
}
