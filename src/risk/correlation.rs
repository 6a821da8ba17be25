//! Cross-strategy return correlation
//!
//! Callers compute these from their own return series and feed the result to
//! [`PortfolioRiskManager::update_correlation`](super::PortfolioRiskManager::update_correlation).

use rust_decimal::{Decimal, MathematicalOps};
use std::collections::BTreeMap;

/// Pairwise correlations keyed by `(a, b)` with `a < b`
pub type CorrelationMatrix = BTreeMap<(String, String), Decimal>;

/// Pearson correlation of two equal-length series
///
/// Returns zero for mismatched lengths, fewer than two samples, or a flat series.
pub fn correlation(x: &[Decimal], y: &[Decimal]) -> Decimal {
    if x.len() != y.len() || x.len() < 2 {
        return Decimal::ZERO;
    }

    let n = Decimal::from(x.len());
    let mean_x = x.iter().copied().sum::<Decimal>() / n;
    let mean_y = y.iter().copied().sum::<Decimal>() / n;

    let mut covariance = Decimal::ZERO;
    let mut var_x = Decimal::ZERO;
    let mut var_y = Decimal::ZERO;
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        covariance += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x.is_zero() || var_y.is_zero() {
        return Decimal::ZERO;
    }

    match (var_x * var_y).sqrt() {
        Some(denominator) if !denominator.is_zero() => {
            (covariance / denominator).clamp(Decimal::NEGATIVE_ONE, Decimal::ONE)
        }
        _ => Decimal::ZERO,
    }
}

/// Correlation for every pair of return series
pub fn correlation_matrix(returns: &BTreeMap<String, Vec<Decimal>>) -> CorrelationMatrix {
    let mut matrix = CorrelationMatrix::new();
    for (i, (a, xs)) in returns.iter().enumerate() {
        for (b, ys) in returns.iter().skip(i + 1) {
            matrix.insert((a.clone(), b.clone()), correlation(xs, ys));
        }
    }
    matrix
}

/// Largest absolute pairwise correlation, `None` with fewer than two series
pub fn max_pairwise_correlation(matrix: &CorrelationMatrix) -> Option<Decimal> {
    matrix.values().map(|c| c.abs()).max()
}
