use serde::{Deserialize, Serialize};

use crate::stats::round_to;

pub const MIN_EFFECTIVE_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PearsonResult {
    pub r: f64,
    pub n: usize,
    pub n_effective: usize,
    pub degenerate: bool,
    pub variance_x: f64,
    pub variance_y: f64,
    #[serde(skip)]
    pub zero_variance_x: bool,
    #[serde(skip)]
    pub zero_variance_y: bool,
}

impl PearsonResult {
    fn degenerate(n: usize, n_effective: usize, variance_x: f64, variance_y: f64) -> Self {
        Self {
            r: 0.0,
            n,
            n_effective,
            degenerate: true,
            variance_x,
            variance_y,
            zero_variance_x: false,
            zero_variance_y: false,
        }
    }
}

/// Degenerate (`r = 0`) below three finite pairs or when either side is constant.
pub fn pearson_with_diagnostics(pairs: &[(f64, f64)]) -> PearsonResult {
    let n = pairs.len();
    let finite = pairs
        .iter()
        .copied()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect::<Vec<_>>();
    let n_effective = finite.len();
    if n_effective < MIN_EFFECTIVE_SAMPLES {
        return PearsonResult::degenerate(n, n_effective, 0.0, 0.0);
    }

    let count = n_effective as f64;
    let mean_x = finite.iter().map(|(x, _)| x).sum::<f64>() / count;
    let mean_y = finite.iter().map(|(_, y)| y).sum::<f64>() / count;

    let mut sxx = 0.0;
    let mut syy = 0.0;
    let mut sxy = 0.0;
    for (x, y) in &finite {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    let variance_x = sxx / (count - 1.0);
    let variance_y = syy / (count - 1.0);
    let zero_x = sxx == 0.0 || is_constant(finite.iter().map(|(x, _)| *x));
    let zero_y = syy == 0.0 || is_constant(finite.iter().map(|(_, y)| *y));
    if zero_x || zero_y {
        let mut result = PearsonResult::degenerate(
            n,
            n_effective,
            round_to(variance_x, 4),
            round_to(variance_y, 4),
        );
        result.zero_variance_x = zero_x;
        result.zero_variance_y = zero_y;
        return result;
    }

    let r = (sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0);
    PearsonResult {
        r: round_to(r, 4),
        n,
        n_effective,
        degenerate: false,
        variance_x: round_to(variance_x, 4),
        variance_y: round_to(variance_y, 4),
        zero_variance_x: false,
        zero_variance_y: false,
    }
}

fn is_constant(mut values: impl Iterator<Item = f64>) -> bool {
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::pearson_with_diagnostics;

    fn zip(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
        x.iter().copied().zip(y.iter().copied()).collect()
    }

    #[test]
    fn perfect_linear_relation_is_one() {
        let x = (1..=10).map(f64::from).collect::<Vec<_>>();
        let y = x.iter().map(|v| 2.0 * v + 1.0).collect::<Vec<_>>();
        let result = pearson_with_diagnostics(&zip(&x, &y));
        assert!(!result.degenerate);
        assert_eq!(result.r, 1.0);
        assert_eq!(result.n_effective, 10);
    }

    #[test]
    fn inverse_relation_is_minus_one() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [10.0, 8.0, 6.0, 4.0, 2.0];
        assert_eq!(pearson_with_diagnostics(&zip(&x, &y)).r, -1.0);
    }

    #[test]
    fn constant_side_is_degenerate() {
        let x = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0];
        let y = [0.0; 7];
        let result = pearson_with_diagnostics(&zip(&x, &y));
        assert!(result.degenerate);
        assert_eq!(result.r, 0.0);
        assert_eq!(result.variance_y, 0.0);
        assert!(result.variance_x > 0.0);
        assert!(result.zero_variance_y);
        assert!(!result.zero_variance_x);
    }

    #[test]
    fn small_scale_variation_is_not_degenerate() {
        let x = [1e-7, 2e-7, 3e-7];
        let y = [1.0, 2.0, 3.0];
        let result = pearson_with_diagnostics(&zip(&x, &y));
        assert!(!result.degenerate);
        assert!(!result.zero_variance_x);
        assert_eq!(result.r, 1.0);
    }

    #[test]
    fn repeated_inexact_value_is_still_constant() {
        let x = [0.1, 0.1, 0.1, 0.1];
        let y = [1.0, 5.0, 2.0, 8.0];
        let result = pearson_with_diagnostics(&zip(&x, &y));
        assert!(result.degenerate);
        assert!(result.zero_variance_x);
        assert_eq!(result.r, 0.0);
    }

    #[test]
    fn non_finite_pairs_are_dropped_before_counting() {
        let pairs = vec![
            (1.0, 2.0),
            (f64::NAN, 3.0),
            (2.0, f64::INFINITY),
            (3.0, 4.0),
        ];
        let result = pearson_with_diagnostics(&pairs);
        assert_eq!(result.n, 4);
        assert_eq!(result.n_effective, 2);
        assert!(result.degenerate);
        assert_eq!(result.r, 0.0);
    }

    #[test]
    fn r_stays_in_range_for_noisy_input() {
        let x = [3.1, -2.0, 7.7, 0.4, 5.5, -6.2, 1.1];
        let y = [0.3, 9.9, -4.1, 2.2, 2.2, 8.0, -1.0];
        let result = pearson_with_diagnostics(&zip(&x, &y));
        assert!((-1.0..=1.0).contains(&result.r));
        assert!(!result.degenerate);
    }
}
