//! Data processing for reservoir weather observations.
//!
//! This crate turns ingested rows into a vetted working copy: numeric
//! coercion and rounding, range diagnostics, gap filling, de-duplication
//! and derived features. See [`cleaner::Cleaner`].

pub mod cleaner;

pub use cleaner::{CleanOutcome, CleanSummary, Cleaner, RangeViolation};

/// Gap filling along one reservoir's chronologically sorted series.
pub mod interpolation {
    use chrono::NaiveDate;

    /// A single known data point
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct DataPoint {
        pub date: NaiveDate,
        pub value: f64,
    }

    /// Value on `date` on the straight line between `start` and `end`,
    /// weighted by elapsed calendar days.
    ///
    /// If start and end fall on the same day, the start value is returned.
    pub fn interpolate_at(start: &DataPoint, end: &DataPoint, date: NaiveDate) -> f64 {
        let span = (end.date - start.date).num_days();
        if span <= 0 {
            return start.value;
        }
        let elapsed = (date - start.date).num_days();
        let slope = (end.value - start.value) / span as f64;
        start.value + slope * elapsed as f64
    }

    /// Fill interior gaps of a date-sorted series by time-weighted linear
    /// interpolation. Leading and trailing gaps have no bracketing points
    /// and stay `None`.
    pub fn fill_interior(series: &[(NaiveDate, Option<f64>)]) -> Vec<Option<f64>> {
        let mut result: Vec<Option<f64>> = series.iter().map(|(_, v)| *v).collect();
        let mut previous: Option<DataPoint> = None;
        let mut pending: Vec<usize> = Vec::new();

        for (i, (date, value)) in series.iter().enumerate() {
            match value {
                Some(v) => {
                    let point = DataPoint {
                        date: *date,
                        value: *v,
                    };
                    if let Some(start) = previous {
                        for &gap in &pending {
                            result[gap] = Some(interpolate_at(&start, &point, series[gap].0));
                        }
                    }
                    pending.clear();
                    previous = Some(point);
                }
                None => {
                    if previous.is_some() {
                        pending.push(i);
                    }
                }
            }
        }

        result
    }

    /// Propagate the last observed value forward. Values before the first
    /// observation stay `None`.
    pub fn forward_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
        let mut last = None;
        values
            .iter()
            .map(|v| {
                if v.is_some() {
                    last = *v;
                }
                last
            })
            .collect()
    }

}
