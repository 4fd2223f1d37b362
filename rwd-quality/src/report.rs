use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicStats {
    pub total_records: usize,
    pub total_columns: usize,
    pub memory_usage_mb: f64,
}

/// Date coverage of a dataset, over all reservoirs together.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalConsistency {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Calendar days from start to end, both inclusive.
    pub total_days: i64,
    pub unique_dates: usize,
    /// Rows minus unique dates.
    pub duplicate_dates: usize,
    /// Calendar days in the span with no record at all.
    pub missing_days: usize,
    /// Gaps between consecutive rows after sorting by date; `None` below
    /// two rows.
    pub median_gap_days: Option<f64>,
    pub max_gap_days: Option<i64>,
}

/// Every diagnostic for one dataset snapshot. Built fresh by
/// [`crate::Validator::generate_quality_report`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub basic_stats: BasicStats,
    pub completeness: BTreeMap<String, f64>,
    pub temporal_consistency: Option<TemporalConsistency>,
    pub weather_inconsistencies: BTreeMap<String, Vec<usize>>,
    pub reservoir_inconsistencies: BTreeMap<String, Vec<usize>>,
    pub outliers: BTreeMap<String, usize>,
}

impl QualityReport {
    /// Sum of violating rows over every consistency rule. A row breaking two
    /// rules counts twice.
    pub fn total_inconsistencies(&self) -> usize {
        self.weather_inconsistencies
            .values()
            .chain(self.reservoir_inconsistencies.values())
            .map(Vec::len)
            .sum()
    }
}

fn with_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

impl fmt::Display for QualityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== DATA QUALITY REPORT ===")?;
        writeln!(f)?;
        writeln!(f, "Total Records: {}", with_thousands(self.basic_stats.total_records))?;
        writeln!(f, "Total Columns: {}", self.basic_stats.total_columns)?;
        writeln!(f, "Memory Usage: {:.2} MB", self.basic_stats.memory_usage_mb)?;
        writeln!(f)?;

        if let Some(t) = &self.temporal_consistency {
            writeln!(f, "=== TEMPORAL COVERAGE ===")?;
            writeln!(f, "Date Range: {} to {} ({} days)", t.start, t.end, t.total_days)?;
            writeln!(f, "Unique Dates: {}", t.unique_dates)?;
            writeln!(f, "Days Without Records: {}", t.missing_days)?;
            if let (Some(median), Some(max)) = (t.median_gap_days, t.max_gap_days) {
                writeln!(f, "Gap (days): median {:.1}, max {}", median, max)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "=== DATA COMPLETENESS ===")?;
        for (column, pct) in &self.completeness {
            if *pct < 100.0 {
                writeln!(f, "{}: {:.1}%", column, pct)?;
            }
        }
        writeln!(f)?;

        writeln!(f, "=== INCONSISTENCIES ===")?;
        let total = self.total_inconsistencies();
        if total > 0 {
            writeln!(f, "Total inconsistent records: {}", total)?;
            for (rule, rows) in self
                .weather_inconsistencies
                .iter()
                .chain(self.reservoir_inconsistencies.iter())
            {
                if !rows.is_empty() {
                    writeln!(f, "  {}: {} records", rule, rows.len())?;
                }
            }
        } else {
            writeln!(f, "No major inconsistencies detected")?;
        }
        writeln!(f)?;

        writeln!(f, "=== OUTLIERS ===")?;
        for (column, count) in &self.outliers {
            if *count > 0 {
                writeln!(f, "{}: {} outliers", column, count)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> QualityReport {
        QualityReport {
            basic_stats: BasicStats {
                total_records: 1096,
                total_columns: 9,
                memory_usage_mb: 0.25,
            },
            completeness: BTreeMap::from([
                ("storage_percent".to_string(), 100.0),
                ("temp_max".to_string(), 97.5),
            ]),
            temporal_consistency: None,
            weather_inconsistencies: BTreeMap::from([("temperature_order".to_string(), vec![4])]),
            reservoir_inconsistencies: BTreeMap::from([
                ("percentage_out_of_bounds".to_string(), vec![7]),
                ("extreme_percentage_changes".to_string(), vec![7, 8]),
            ]),
            outliers: BTreeMap::from([("precipitation".to_string(), 3), ("temp_max".to_string(), 0)]),
        }
    }

    #[test]
    fn test_with_thousands() {
        assert_eq!(with_thousands(0), "0");
        assert_eq!(with_thousands(999), "999");
        assert_eq!(with_thousands(1096), "1,096");
        assert_eq!(with_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_total_inconsistencies() {
        assert_eq!(report().total_inconsistencies(), 4);
    }

    #[test]
    fn test_display_lists_only_findings() {
        let text = report().to_string();
        assert!(text.contains("Total Records: 1,096"));
        assert!(text.contains("Memory Usage: 0.25 MB"));
        assert!(text.contains("temp_max: 97.5%"));
        assert!(!text.contains("storage_percent: 100.0%"));
        assert!(text.contains("Total inconsistent records: 4"));
        assert!(text.contains("  extreme_percentage_changes: 2 records"));
        assert!(text.contains("precipitation: 3 outliers"));
        assert!(!text.contains("temp_max: 0 outliers"));
    }

    #[test]
    fn test_display_clean_report() {
        let mut clean = report();
        clean.weather_inconsistencies.clear();
        clean.reservoir_inconsistencies.clear();
        assert!(clean.to_string().contains("No major inconsistencies detected"));
    }
}
