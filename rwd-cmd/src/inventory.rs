//! `reservoirs` subcommand: which reservoirs the data covers, and how well.

use crate::pipeline::prepare;
use crate::DataArgs;
use chrono::NaiveDate;
use rwd_core::{Dataset, Field};
use rwd_utils::numeric::mean;
use serde::Serialize;
use std::io;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReservoirInfo {
    pub station_id: String,
    pub name: String,
    pub region: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_records: usize,
    pub avg_storage_percent: Option<f64>,
}

/// One entry per reservoir that has records, in code order.
pub fn reservoir_info(dataset: &Dataset) -> Vec<ReservoirInfo> {
    let records = dataset.records();
    dataset
        .partition_by_reservoir()
        .into_iter()
        .filter_map(|(station, indices)| {
            let first = records[*indices.first()?].date;
            let last = records[*indices.last()?].date;
            let levels: Vec<f64> = indices
                .iter()
                .filter_map(|&i| records[i].readings.get(Field::StoragePercent))
                .collect();
            let (name, region) = match dataset.reservoir(station) {
                Some(r) => (r.display_name().to_string(), r.region.clone()),
                None => (station.to_string(), String::new()),
            };
            Some(ReservoirInfo {
                station_id: station.to_string(),
                name,
                region,
                start_date: first,
                end_date: last,
                total_records: indices.len(),
                avg_storage_percent: mean(&levels),
            })
        })
        .collect()
}

pub fn run_inventory(args: &DataArgs) -> anyhow::Result<()> {
    let prepared = prepare(args)?;
    let mut writer = csv::Writer::from_writer(io::stdout());
    for info in reservoir_info(&prepared.dataset) {
        writer.serialize(info)?;
    }
    writer.flush()?;
    Ok(())
}
