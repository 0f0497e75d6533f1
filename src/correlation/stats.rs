//! Pearson and Spearman correlation with two-sided p-values.

use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::error::CorrelationError;

/// A correlation coefficient and its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub coefficient: f64,
    pub p_value: f64,
}

/// Computes the arithmetic mean of a slice of values. Returns 0.0 for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// True when every value equals the first one.
pub fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[0] == w[1])
}

/// Ranks starting at 1, ties receive the average of the ranks they span.
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
        // positions i..=j share the mean of ranks (i+1)..=(j+1)
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = rank;
        }
        i = j + 1;
    }
    ranks
}

/// Divides by the largest magnitude so every value lies in [-1, 1].
fn unit_scaled(values: &[f64]) -> Vec<f64> {
    let max = values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if max == 0.0 {
        return values.to_vec();
    }
    values.iter().map(|v| v / max).collect()
}

/// Pearson product-moment correlation.
///
/// Both sides are rescaled into [-1, 1] first (r is invariant under positive
/// scaling), so sums of squares stay finite and non-zero for any finite,
/// non-constant input.
pub fn pearson(x: &[f64], y: &[f64]) -> Result<Correlation, CorrelationError> {
    check_inputs(x, y)?;

    let (x, y) = (unit_scaled(x), unit_scaled(y));
    let mx = mean(&x);
    let my = mean(&y);

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(&y) {
        let dx = a - mx;
        let dy = b - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = (sxx * syy).sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return Err(CorrelationError::ZeroVariance);
    }

    let r = (sxy / denom).clamp(-1.0, 1.0);
    Ok(Correlation {
        coefficient: r,
        p_value: two_sided_p(r, x.len())?,
    })
}

/// Spearman rank correlation: Pearson over average-tie ranks.
pub fn spearman(x: &[f64], y: &[f64]) -> Result<Correlation, CorrelationError> {
    check_inputs(x, y)?;
    pearson(&average_ranks(x), &average_ranks(y))
}

fn check_inputs(x: &[f64], y: &[f64]) -> Result<(), CorrelationError> {
    if x.len() != y.len() {
        return Err(CorrelationError::LengthMismatch {
            left: x.len(),
            right: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(CorrelationError::TooFewPairs(x.len()));
    }
    Ok(())
}

/// Two-sided p-value of `r` under H0: rho = 0, via Student's t with n-2 df.
fn two_sided_p(r: f64, n: usize) -> Result<f64, CorrelationError> {
    if n <= 2 {
        return Ok(1.0);
    }
    if r.abs() >= 1.0 {
        return Ok(0.0);
    }

    let df = (n - 2) as f64;
    let t = r * (df / (1.0 - r * r)).sqrt();
    let dist =
        StudentsT::new(0.0, 1.0, df).map_err(|e| CorrelationError::Distribution(e.to_string()))?;

    Ok((2.0 * dist.sf(t.abs())).clamp(0.0, 1.0))
}
