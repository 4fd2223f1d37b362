//! Shared utility functions for RWD crates.

/// Date utility functions
pub mod dates {
    use chrono::{Datelike, NaiveDate};

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y-%m-%d")?)
    }

    /// Parse an ISO-style date, tolerating a trailing time component
    /// ("2020-01-01 00:00:00", "2020-01-01T00:00:00") and the compact
    /// "YYYYMMDD" form.
    pub fn parse_iso_date(s: &str) -> anyhow::Result<NaiveDate> {
        let trimmed = s.trim();
        let day_part = trimmed
            .split(|c: char| c == ' ' || c == 'T')
            .next()
            .unwrap_or(trimmed);
        if day_part.len() == 8 && day_part.chars().all(|c| c.is_ascii_digit()) {
            return parse_date_compact(day_part);
        }
        parse_date(day_part)
    }

    /// Parse a date string in "YYYYMMDD" format
    pub fn parse_date_compact(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s, "%Y%m%d")?)
    }

    /// Day of the week with Monday = 0 and Sunday = 6.
    pub fn day_of_week(date: &NaiveDate) -> u32 {
        date.weekday().num_days_from_monday()
    }

    /// Number of calendar days from `start` to `end` (negative if `end` precedes `start`).
    pub fn days_between(start: &NaiveDate, end: &NaiveDate) -> i64 {
        (*end - *start).num_days()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
        }

        #[test]
        fn test_parse_iso_date_variants() {
            let expected = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
            assert_eq!(parse_iso_date("2020-01-31").unwrap(), expected);
            assert_eq!(parse_iso_date("2020-01-31 00:00:00").unwrap(), expected);
            assert_eq!(parse_iso_date("2020-01-31T12:00:00").unwrap(), expected);
            assert_eq!(parse_iso_date("20200131").unwrap(), expected);
            assert!(parse_iso_date("31/01/2020").is_err());
        }

        #[test]
        fn test_day_of_week() {
            // 2024-01-01 was a Monday
            let monday = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
            assert_eq!(day_of_week(&monday), 0);
            assert_eq!(day_of_week(&sunday), 6);
        }

        #[test]
        fn test_days_between() {
            let a = NaiveDate::from_ymd_opt(2020, 2, 27).unwrap();
            let b = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
            assert_eq!(days_between(&a, &b), 3);
            assert_eq!(days_between(&b, &a), -3);
        }
    }
}

/// Numeric helpers shared by the cleaner, validator and analyzer.
///
/// Every function here works on already-filtered values: callers drop
/// missing entries before handing a slice over.
pub mod numeric {
    use serde::Serialize;

    /// Round `value` to `decimals` places, ties to even.
    ///
    /// The value is scaled by 10^decimals, rounded with `round_ties_even`
    /// and scaled back, so re-rounding an already rounded value is a no-op.
    pub fn round_to(value: f64, decimals: u32) -> f64 {
        let scale = 10f64.powi(decimals as i32);
        (value * scale).round_ties_even() / scale
    }

    /// Arithmetic mean, `None` for an empty slice.
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Sample standard deviation (n - 1 denominator), `None` below two values.
    pub fn sample_std(values: &[f64]) -> Option<f64> {
        if values.len() < 2 {
            return None;
        }
        let m = mean(values)?;
        let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
        Some((sum_sq / (values.len() - 1) as f64).sqrt())
    }

    pub fn min(values: &[f64]) -> Option<f64> {
        values.iter().copied().min_by(|a, b| a.total_cmp(b))
    }

    pub fn max(values: &[f64]) -> Option<f64> {
        values.iter().copied().max_by(|a, b| a.total_cmp(b))
    }

    /// Median of an unsorted slice.
    pub fn median(values: &[f64]) -> Option<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        quantile_sorted(&sorted, 0.5)
    }

    /// Quantile `q` (0..=1) of an ascending slice, linear interpolation
    /// between the two nearest order statistics.
    pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
        if sorted.is_empty() || !q.is_finite() {
            return None;
        }
        let q = q.clamp(0.0, 1.0);
        if sorted.len() == 1 {
            return Some(sorted[0]);
        }
        let pos = q * (sorted.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        let frac = pos - lo as f64;
        Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
    }

    /// Quantile `q` of an unsorted slice.
    pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        quantile_sorted(&sorted, q)
    }

    /// Descriptive statistics of one variable.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Describe {
        pub count: usize,
        pub mean: Option<f64>,
        pub std: Option<f64>,
        pub min: Option<f64>,
        pub q25: Option<f64>,
        pub median: Option<f64>,
        pub q75: Option<f64>,
        pub max: Option<f64>,
    }

    impl Describe {
        pub fn from_values(values: &[f64]) -> Self {
            let mut sorted = values.to_vec();
            sorted.sort_by(|a, b| a.total_cmp(b));
            Describe {
                count: sorted.len(),
                mean: mean(&sorted),
                std: sample_std(&sorted),
                min: sorted.first().copied(),
                q25: quantile_sorted(&sorted, 0.25),
                median: quantile_sorted(&sorted, 0.5),
                q75: quantile_sorted(&sorted, 0.75),
                max: sorted.last().copied(),
            }
        }
    }

}
