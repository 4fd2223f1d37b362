//! The dataset snapshot shared by every processing stage.
//!
//! A [`Dataset`] pairs the records with their schema: the reservoirs they
//! reference, the input fields that were actually present as columns, and
//! whether derived features have been computed. Transformations return a
//! new snapshot through [`Dataset::with_records`]; nothing is edited in place.

use crate::field::Field;
use crate::observation::Record;
use crate::reservoir::Reservoir;
use crate::variable::{DerivedField, Variable};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::mem::size_of;

/// A column of the tabular view of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Column {
    StationId,
    StationName,
    Region,
    Date,
    Value(Variable),
    Year,
    Month,
    DayOfYear,
    Season,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::StationId => "station_id",
            Column::StationName => "name",
            Column::Region => "region",
            Column::Date => "date",
            Column::Value(variable) => variable.name(),
            Column::Year => "year",
            Column::Month => "month",
            Column::DayOfYear => "day_of_year",
            Column::Season => "season",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    reservoirs: BTreeMap<String, Reservoir>,
    fields: Vec<Field>,
    records: Vec<Record>,
    derived: bool,
}

impl Dataset {
    /// Build a snapshot. `fields` lists the input columns that were present;
    /// it is normalised to catalog order without repeats.
    pub fn new(reservoirs: Vec<Reservoir>, fields: Vec<Field>, records: Vec<Record>) -> Self {
        let mut fields = fields;
        fields.sort();
        fields.dedup();
        Dataset {
            reservoirs: reservoirs
                .into_iter()
                .map(|r| (r.station_id.clone(), r))
                .collect(),
            fields,
            records,
            derived: false,
        }
    }

    /// A new snapshot with the same schema and different records.
    pub fn with_records(&self, records: Vec<Record>) -> Dataset {
        Dataset {
            reservoirs: self.reservoirs.clone(),
            fields: self.fields.clone(),
            records,
            derived: self.derived,
        }
    }

    /// A new snapshot whose records carry derived features.
    pub fn with_derived_records(&self, records: Vec<Record>) -> Dataset {
        Dataset {
            derived: true,
            ..self.with_records(records)
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn reservoirs(&self) -> &BTreeMap<String, Reservoir> {
        &self.reservoirs
    }

    pub fn reservoir(&self, station_id: &str) -> Option<&Reservoir> {
        self.reservoirs.get(station_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_field(&self, field: Field) -> bool {
        self.fields.binary_search(&field).is_ok()
    }

    pub fn has_fields(&self, fields: &[Field]) -> bool {
        fields.iter().all(|f| self.has_field(*f))
    }

    pub fn has_derived(&self) -> bool {
        self.derived
    }

    /// True if `variable` is a column of this dataset.
    pub fn has_variable(&self, variable: Variable) -> bool {
        match variable {
            Variable::Field(field) => self.has_field(field),
            Variable::Derived(derived) => self.derived && self.has_fields(derived.inputs()),
        }
    }

    /// Numeric column inventory: present input fields, then derived features.
    pub fn variables(&self) -> Vec<Variable> {
        let mut variables: Vec<Variable> = self.fields.iter().map(|f| Variable::Field(*f)).collect();
        variables.extend(
            DerivedField::ALL
                .into_iter()
                .map(Variable::Derived)
                .filter(|v| self.has_variable(*v)),
        );
        variables
    }

    /// Every column of the tabular view, identity columns first.
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = vec![
            Column::StationId,
            Column::StationName,
            Column::Region,
            Column::Date,
        ];
        columns.extend(self.variables().into_iter().map(Column::Value));
        if self.derived {
            columns.extend([Column::Year, Column::Month, Column::DayOfYear, Column::Season]);
        }
        columns
    }

    /// Whether `record` holds a value in `column`.
    pub fn is_present(&self, record: &Record, column: Column) -> bool {
        match column {
            Column::StationId => !record.station_id.is_empty(),
            Column::StationName => self
                .reservoir(&record.station_id)
                .is_some_and(|r| !r.name.is_empty()),
            Column::Region => self
                .reservoir(&record.station_id)
                .is_some_and(|r| !r.region.is_empty()),
            Column::Date => true,
            Column::Value(variable) => record.value(variable).is_some(),
            Column::Year | Column::Month | Column::DayOfYear | Column::Season => {
                record.derived.is_some()
            }
        }
    }

    /// Non-missing values of `variable`, in record order.
    pub fn values(&self, variable: Variable) -> Vec<f64> {
        self.records
            .iter()
            .filter_map(|r| r.value(variable))
            .collect()
    }

    /// Earliest and latest date, `None` for an empty dataset.
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.date).min()?;
        let last = self.records.iter().map(|r| r.date).max()?;
        Some((first, last))
    }

    /// Index-only view: for each reservoir, the positions of its records in
    /// chronological order. Ties on date keep record order.
    pub fn partition_by_reservoir(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, record) in self.records.iter().enumerate() {
            groups.entry(record.station_id.as_str()).or_default().push(i);
        }
        for indices in groups.values_mut() {
            indices.sort_by_key(|&i| self.records[i].date);
        }
        groups
    }

    /// Rough in-memory footprint of the snapshot in bytes.
    pub fn approximate_memory_bytes(&self) -> usize {
        let records: usize = self
            .records
            .iter()
            .map(|r| size_of::<Record>() + r.station_id.capacity())
            .sum();
        let reservoirs: usize = self
            .reservoirs
            .iter()
            .map(|(k, r)| {
                size_of::<Reservoir>()
                    + k.capacity()
                    + r.station_id.capacity()
                    + r.name.capacity()
                    + r.region.capacity()
            })
            .sum();
        size_of::<Dataset>() + records + reservoirs + self.fields.capacity() * size_of::<Field>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::Readings;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Dataset {
        let records = vec![
            Record::new(0, "B", date(2020, 1, 3), Readings::default().with(Field::StoragePercent, 50.0)),
            Record::new(1, "A", date(2020, 1, 2), Readings::default()),
            Record::new(2, "B", date(2020, 1, 1), Readings::default().with(Field::StoragePercent, 40.0)),
            Record::new(3, "A", date(2020, 1, 1), Readings::default().with(Field::StoragePercent, 10.0)),
        ];
        Dataset::new(
            vec![Reservoir::new("A", "Alpha", "North"), Reservoir::new("B", "", "South")],
            vec![Field::TempMax, Field::StoragePercent, Field::TempMax],
            records,
        )
    }

    #[test]
    fn test_fields_normalised() {
        let ds = sample();
        assert_eq!(ds.fields(), &[Field::StoragePercent, Field::TempMax]);
        assert!(ds.has_field(Field::TempMax));
        assert!(!ds.has_field(Field::TempMin));
    }

    #[test]
    fn test_partition_sorted_per_reservoir() {
        let ds = sample();
        let groups = ds.partition_by_reservoir();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["A"], vec![3, 1]);
        assert_eq!(groups["B"], vec![2, 0]);
    }

    #[test]
    fn test_variables_depend_on_derived_flag() {
        let ds = sample();
        assert_eq!(
            ds.variables(),
            vec![Variable::Field(Field::StoragePercent), Variable::Field(Field::TempMax)]
        );
        let derived = ds.with_derived_records(ds.records().to_vec());
        let variables = derived.variables();
        assert!(variables.contains(&Variable::Derived(DerivedField::StorageChange)));
        // temp_min absent, so no temperature range
        assert!(!variables.contains(&Variable::Derived(DerivedField::TempRange)));
    }

    #[test]
    fn test_presence_and_span() {
        let ds = sample();
        let name_present = ds
            .records()
            .iter()
            .filter(|r| ds.is_present(r, Column::StationName))
            .count();
        assert_eq!(name_present, 2);
        assert_eq!(ds.values(Field::StoragePercent.into()), vec![50.0, 40.0, 10.0]);
        assert_eq!(ds.date_span(), Some((date(2020, 1, 1), date(2020, 1, 3))));
        assert_eq!(Dataset::default().date_span(), None);
    }
}
