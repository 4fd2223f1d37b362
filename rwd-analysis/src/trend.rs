//! Trend estimators over `(elapsed days, value)` series.

use rwd_core::error::{EngineError, Result};
use serde::{Serialize, Serializer};
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use std::fmt;

/// Days per year used to annualise a daily slope.
pub const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearTrend {
    pub n: usize,
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub std_error: f64,
    /// `slope * 365.25`
    pub annual_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    NoTrend,
}

impl TrendDirection {
    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
            TrendDirection::NoTrend => "no trend",
        }
    }
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TrendDirection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MannKendallTrend {
    pub n: usize,
    pub s_statistic: i64,
    pub variance: f64,
    pub z_statistic: f64,
    pub p_value: f64,
    pub trend: TrendDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum TrendResult {
    Linear(LinearTrend),
    MannKendall(MannKendallTrend),
}

impl fmt::Display for TrendResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendResult::Linear(t) => write!(
                f,
                "linear: slope {:.6}/day ({:+.3}/year), R² {:.4}, p {:.4}, n {}",
                t.slope, t.annual_change, t.r_squared, t.p_value, t.n
            ),
            TrendResult::MannKendall(t) => write!(
                f,
                "mann-kendall: {} (S {}, Z {:.4}, p {:.4}, n {})",
                t.trend, t.s_statistic, t.z_statistic, t.p_value, t.n
            ),
        }
    }
}

fn standard_normal_cdf(x: f64) -> f64 {
    match Normal::new(0.0, 1.0) {
        Ok(normal) => normal.cdf(x),
        Err(_) => f64::NAN,
    }
}

fn students_t_cdf(x: f64, freedom: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, freedom) {
        Ok(t) => t.cdf(x),
        Err(_) => f64::NAN,
    }
}

/// Ordinary least squares of `y` on `x`.
///
/// Needs at least three points. The p-value tests a zero slope with
/// Student's t on `n - 2` degrees of freedom.
pub fn linear_fit(variable: &str, points: &[(f64, f64)]) -> Result<LinearTrend> {
    let n = points.len();
    if n < 3 {
        return Err(EngineError::InsufficientData {
            variable: variable.to_string(),
            needed: 3,
            found: n,
        });
    }
    let nf = n as f64;
    let mean_x = points.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = points.iter().map(|p| p.1).sum::<f64>() / nf;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in points {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 {
        return Err(EngineError::ConstantRegressor(variable.to_string()));
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r = if syy == 0.0 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };
    let df = nf - 2.0;
    let (p_value, std_error) = if r.abs() == 1.0 {
        (0.0, 0.0)
    } else {
        let t = r * (df / ((1.0 - r) * (1.0 + r))).sqrt();
        let p = 2.0 * (1.0 - students_t_cdf(t.abs(), df));
        let se = ((1.0 - r * r) * syy / sxx / df).sqrt();
        (p, se)
    };

    Ok(LinearTrend {
        n,
        slope,
        intercept,
        r_squared: r * r,
        p_value,
        std_error,
        annual_change: slope * DAYS_PER_YEAR,
    })
}

/// Mann-Kendall test over a chronologically ordered series.
///
/// The variance `n(n-1)(2n+5)/18` carries no correction for tied values,
/// so significance is overstated for series with many repeats.
pub fn mann_kendall(variable: &str, values: &[f64]) -> Result<MannKendallTrend> {
    let n = values.len();
    if n < 2 {
        return Err(EngineError::InsufficientData {
            variable: variable.to_string(),
            needed: 2,
            found: n,
        });
    }
    let mut s: i64 = 0;
    for i in 0..n - 1 {
        for j in i + 1..n {
            s += sign(values[j] - values[i]);
        }
    }
    let nf = n as f64;
    let variance = nf * (nf - 1.0) * (2.0 * nf + 5.0) / 18.0;
    let z = match s {
        0 => 0.0,
        s if s > 0 => (s - 1) as f64 / variance.sqrt(),
        s => (s + 1) as f64 / variance.sqrt(),
    };
    let trend = match s {
        0 => TrendDirection::NoTrend,
        s if s > 0 => TrendDirection::Increasing,
        _ => TrendDirection::Decreasing,
    };
    Ok(MannKendallTrend {
        n,
        s_statistic: s,
        variance,
        z_statistic: z,
        p_value: 2.0 * (1.0 - standard_normal_cdf(z.abs())),
        trend,
    })
}

fn sign(d: f64) -> i64 {
    if d > 0.0 {
        1
    } else if d < 0.0 {
        -1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(ys: &[f64]) -> Vec<(f64, f64)> {
        ys.iter().enumerate().map(|(i, y)| (i as f64, *y)).collect()
    }

    #[test]
    fn test_linear_fit_exact_line() {
        let points: Vec<(f64, f64)> = (0..10).map(|x| (x as f64, 2.0 * x as f64 + 1.0)).collect();
        let fit = linear_fit("storage_percent", &points).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert!((fit.r_squared - 1.0).abs() < 1e-12);
        assert_eq!(fit.p_value, 0.0);
        assert!((fit.annual_change - 730.5).abs() < 1e-9);
    }

    #[test]
    fn test_linear_fit_noisy() {
        let fit = linear_fit("storage_percent", &line(&[1.0, 3.0, 2.0, 5.0, 4.0])).unwrap();
        assert!((fit.slope - 0.8).abs() < 1e-12);
        assert!((fit.intercept - 1.4).abs() < 1e-12);
        assert!((fit.r_squared - 0.64).abs() < 1e-12);
        assert!((fit.std_error - 0.12f64.sqrt()).abs() < 1e-12);
        assert!((fit.p_value - 0.1041).abs() < 1e-3);
    }

    #[test]
    fn test_linear_fit_flat_series() {
        let fit = linear_fit("temp_max", &line(&[5.0, 5.0, 5.0, 5.0])).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r_squared, 0.0);
        assert!((fit.p_value - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linear_fit_errors() {
        assert_eq!(
            linear_fit("temp_max", &line(&[1.0, 2.0])),
            Err(EngineError::InsufficientData {
                variable: "temp_max".to_string(),
                needed: 3,
                found: 2,
            })
        );
        let same_day = vec![(4.0, 1.0), (4.0, 2.0), (4.0, 3.0)];
        assert_eq!(
            linear_fit("temp_max", &same_day),
            Err(EngineError::ConstantRegressor("temp_max".to_string()))
        );
    }

    #[test]
    fn test_mann_kendall_increasing() {
        let mk = mann_kendall("x", &[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(mk.s_statistic, 10);
        assert!((mk.variance - 5.0 * 4.0 * 15.0 / 18.0).abs() < 1e-12);
        assert!((mk.z_statistic - 9.0 / (50.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((mk.z_statistic - 2.2045).abs() < 1e-4);
        assert!((mk.p_value - 0.0275).abs() < 1e-3);
        assert_eq!(mk.trend, TrendDirection::Increasing);
        assert_eq!(mk.trend.label(), "increasing");
    }

    #[test]
    fn test_mann_kendall_decreasing_and_flat() {
        let down = mann_kendall("x", &[5.0, 4.0, 3.0, 2.0, 1.0]).unwrap();
        assert_eq!(down.s_statistic, -10);
        assert!((down.z_statistic + 2.2045).abs() < 1e-4);
        assert_eq!(down.trend, TrendDirection::Decreasing);

        let flat = mann_kendall("x", &[3.0, 3.0, 3.0]).unwrap();
        assert_eq!(flat.s_statistic, 0);
        assert_eq!(flat.z_statistic, 0.0);
        assert!((flat.p_value - 1.0).abs() < 1e-12);
        assert_eq!(flat.trend.label(), "no trend");
    }

    #[test]
    fn test_mann_kendall_needs_two_points() {
        assert!(matches!(
            mann_kendall("x", &[1.0]),
            Err(EngineError::InsufficientData { needed: 2, found: 1, .. })
        ));
    }
}
