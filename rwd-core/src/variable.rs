//! Analysable numeric columns: input fields plus derived features.

use crate::error::EngineError;
use crate::field::Field;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A numeric column computed by the cleaner rather than read from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedField {
    /// temp_max - temp_min
    TempRange,
    /// humidity_max - humidity_min
    HumidityRange,
    /// temp_mean + humidity_mean / 10
    HeatStressIndex,
    /// Day-over-day difference of storage_percent within one reservoir.
    StorageChange,
    /// Difference to the 7th preceding record of the same reservoir.
    StorageChange7d,
}

impl DerivedField {
    pub const ALL: [DerivedField; 5] = [
        DerivedField::TempRange,
        DerivedField::HumidityRange,
        DerivedField::HeatStressIndex,
        DerivedField::StorageChange,
        DerivedField::StorageChange7d,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DerivedField::TempRange => "temp_range",
            DerivedField::HumidityRange => "humidity_range",
            DerivedField::HeatStressIndex => "heat_stress_index",
            DerivedField::StorageChange => "storage_change",
            DerivedField::StorageChange7d => "storage_change_7d",
        }
    }

    fn legacy_name(self) -> &'static str {
        match self {
            DerivedField::TempRange => "meteo_temp_range",
            DerivedField::HumidityRange => "meteo_humedad_range",
            DerivedField::HeatStressIndex => "heat_stress_index",
            DerivedField::StorageChange => "reservoir_change",
            DerivedField::StorageChange7d => "reservoir_change_7d",
        }
    }

    /// Input fields that must be present for this feature to be computed.
    pub fn inputs(self) -> &'static [Field] {
        match self {
            DerivedField::TempRange => &[Field::TempMax, Field::TempMin],
            DerivedField::HumidityRange => &[Field::HumidityMax, Field::HumidityMin],
            DerivedField::HeatStressIndex => &[Field::TempMean, Field::HumidityMean],
            DerivedField::StorageChange | DerivedField::StorageChange7d => &[Field::StoragePercent],
        }
    }

    pub fn from_column(column: &str) -> Option<DerivedField> {
        let column = column.trim();
        DerivedField::ALL
            .into_iter()
            .find(|d| d.name() == column || d.legacy_name() == column)
    }
}

/// Any numeric column an analysis can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variable {
    Field(Field),
    Derived(DerivedField),
}

impl Variable {
    pub fn name(self) -> &'static str {
        match self {
            Variable::Field(f) => f.name(),
            Variable::Derived(d) => d.name(),
        }
    }
}

impl From<Field> for Variable {
    fn from(value: Field) -> Self {
        Variable::Field(value)
    }
}

impl From<DerivedField> for Variable {
    fn from(value: DerivedField) -> Self {
        Variable::Derived(value)
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variable {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(field) = Field::from_column(s) {
            return Ok(Variable::Field(field));
        }
        DerivedField::from_column(s)
            .map(Variable::Derived)
            .ok_or_else(|| EngineError::UnknownVariable(s.to_string()))
    }
}

impl Serialize for Variable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variables() {
        assert_eq!(
            "storage_percent".parse::<Variable>().unwrap(),
            Variable::Field(Field::StoragePercent)
        );
        assert_eq!(
            "reservoir_change".parse::<Variable>().unwrap(),
            Variable::Derived(DerivedField::StorageChange)
        );
        assert_eq!(
            "heat_stress_index".parse::<Variable>().unwrap(),
            Variable::Derived(DerivedField::HeatStressIndex)
        );
        assert!(matches!(
            "nope".parse::<Variable>(),
            Err(EngineError::UnknownVariable(_))
        ));
    }

    #[test]
    fn test_derived_inputs() {
        assert_eq!(
            DerivedField::TempRange.inputs(),
            &[Field::TempMax, Field::TempMin]
        );
        assert_eq!(DerivedField::StorageChange7d.inputs(), &[Field::StoragePercent]);
    }
}
