pub mod bootstrap;
pub mod lag;
pub mod pearson;

pub use bootstrap::{block_bootstrap, RandomSource, Robustness, Stability};
pub use lag::{lag_sweep, LagEntry};
pub use pearson::{pearson_with_diagnostics, PearsonResult};

/// Linear-interpolated quantile over an already sorted slice. Empty input is 0.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let position = (len - 1) as f64 * q.clamp(0.0, 1.0);
            let lower = position.floor() as usize;
            let upper = position.ceil() as usize;
            let weight = position - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .collect::<Vec<_>>();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // normalise -0.0 so serialized output is stable
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
