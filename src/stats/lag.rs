use serde::{Deserialize, Serialize};

use crate::stats::pearson::pearson_with_diagnostics;

pub const MAX_LAG_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LagEntry {
    pub lag_days: i32,
    pub r: f64,
    pub n: usize,
    pub n_pairs: usize,
    pub n_effective: usize,
    pub degenerate: bool,
}

pub fn default_max_lag(window_days: u32) -> u32 {
    window_days.clamp(3, MAX_LAG_DAYS)
}

pub fn resolve_max_lag(requested: Option<u32>, window_days: u32) -> u32 {
    requested
        .map(|lag| lag.min(MAX_LAG_DAYS))
        .unwrap_or_else(|| default_max_lag(window_days))
}

/// Positive lags mean X leads Y: `x[i]` is paired with `y[i + lag]`.
pub fn lag_sweep(x: &[f64], y: &[f64], max_lag: u32) -> Vec<LagEntry> {
    let n = x.len().min(y.len());
    let radius = max_lag as i32;
    (-radius..=radius)
        .map(|lag| {
            let pairs = shifted_pairs(&x[..n], &y[..n], lag);
            let result = pearson_with_diagnostics(&pairs);
            LagEntry {
                lag_days: lag,
                r: if result.degenerate { 0.0 } else { result.r },
                n,
                n_pairs: pairs.len(),
                n_effective: result.n_effective,
                degenerate: result.degenerate,
            }
        })
        .collect()
}

fn shifted_pairs(x: &[f64], y: &[f64], lag: i32) -> Vec<(f64, f64)> {
    let n = x.len() as i64;
    let lag = i64::from(lag);
    (0..n)
        .filter_map(|i| {
            let j = i + lag;
            (0..n)
                .contains(&j)
                .then(|| (x[i as usize], y[j as usize]))
        })
        .collect()
}
