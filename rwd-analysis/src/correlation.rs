//! Pairwise correlation coefficients.
//!
//! Every coefficient is computed on the pairwise-complete observations of
//! its two columns: a row counts only when both values are present. The
//! method never changes that rule.

use rwd_core::{CorrelationMethod, Variable};
use rwd_utils::numeric::mean;
use serde::Serialize;

/// Pearson correlation. `None` below two pairs or for a constant column.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (xs, ys) = (&xs[..n], &ys[..n]);
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// 1-based ranks, tied values share the average of their ranks.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0.0; values.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && values[order[j + 1]] == values[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &k in &order[i..=j] {
            ranks[k] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Spearman rank correlation: Pearson over average ranks.
pub fn spearman(xs: &[f64], ys: &[f64]) -> Option<f64> {
    pearson(&average_ranks(xs), &average_ranks(ys))
}

/// Kendall tau-b, which adjusts for ties in either column.
pub fn kendall(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let (mut concordant, mut discordant) = (0i64, 0i64);
    let (mut ties_x, mut ties_y) = (0i64, 0i64);
    for i in 0..n - 1 {
        for j in i + 1..n {
            let dx = xs[j] - xs[i];
            let dy = ys[j] - ys[i];
            if dx == 0.0 {
                ties_x += 1;
            }
            if dy == 0.0 {
                ties_y += 1;
            }
            let product = dx * dy;
            if product > 0.0 {
                concordant += 1;
            } else if product < 0.0 {
                discordant += 1;
            }
        }
    }
    let pairs = (n * (n - 1) / 2) as i64;
    let denominator = tau_b_denominator(pairs, ties_x, ties_y);
    if denominator == 0.0 {
        return None;
    }
    Some(((concordant - discordant) as f64 / denominator).clamp(-1.0, 1.0))
}

/// `sqrt((n0 - n1)(n0 - n2))`, taken in floating point: the integer product
/// leaves `i64` at around 78k pairwise-complete rows.
fn tau_b_denominator(pairs: i64, ties_x: i64, ties_y: i64) -> f64 {
    ((pairs - ties_x) as f64 * (pairs - ties_y) as f64).sqrt()
}

/// Coefficient of two columns given as optional values, row-aligned.
pub fn pairwise(method: CorrelationMethod, a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| x.zip(*y))
        .unzip();
    match method {
        CorrelationMethod::Pearson => pearson(&xs, &ys),
        CorrelationMethod::Spearman => spearman(&xs, &ys),
        CorrelationMethod::Kendall => kendall(&xs, &ys),
    }
}

/// Symmetric correlation matrix; `None` where a coefficient is undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub method: CorrelationMethod,
    pub columns: Vec<Variable>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    /// `columns[i]` holds the row-aligned values of `variables[i]`.
    pub fn compute(
        method: CorrelationMethod,
        variables: Vec<Variable>,
        columns: &[Vec<Option<f64>>],
    ) -> Self {
        let k = variables.len();
        let mut values = vec![vec![None; k]; k];
        for i in 0..k {
            for j in i..k {
                let r = pairwise(method, &columns[i], &columns[j]);
                // a defined self-correlation is exactly one
                let r = if i == j { r.map(|_| 1.0) } else { r };
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        CorrelationMatrix {
            method,
            columns: variables,
            values,
        }
    }

    pub fn get(&self, a: Variable, b: Variable) -> Option<f64> {
        let i = self.columns.iter().position(|v| *v == a)?;
        let j = self.columns.iter().position(|v| *v == b)?;
        self.values[i][j]
    }
}
