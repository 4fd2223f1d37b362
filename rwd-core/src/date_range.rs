use chrono::{NaiveDate, TimeDelta};
use std::mem::replace;

/// Calendar days from the start date through the end date, both inclusive.
/// Iterating yields each date in order.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct DateRange(pub NaiveDate, pub NaiveDate);

impl DateRange {
    /// Number of calendar days covered, 0 when the range is inverted.
    pub fn num_days(&self) -> i64 {
        ((self.1 - self.0).num_days() + 1).max(0)
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let next = self.0 + TimeDelta::days(1);
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}
