use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::stats::pearson::{pearson_with_diagnostics, MIN_EFFECTIVE_SAMPLES};
use crate::stats::{quantile, round_to, sorted_finite};

pub const BLOCK_SIZE: usize = 2;
pub const MIN_SUBSAMPLES: u32 = 20;
pub const MAX_SUBSAMPLES: u32 = 500;
pub const MIN_INFORMATIVE_SAMPLES: usize = 20;
pub const MAX_DEGENERATE_RATE: f64 = 0.5;

pub trait RandomSource {
    fn next_index(&mut self, upper: usize) -> usize;
}

impl RandomSource for StdRng {
    fn next_index(&mut self, upper: usize) -> usize {
        self.gen_range(0..upper.max(1))
    }
}

pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub fn clamp_subsamples(requested: u32) -> u32 {
    requested.clamp(MIN_SUBSAMPLES, MAX_SUBSAMPLES)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    Low,
    Medium,
    High,
}

impl Stability {
    pub fn classify(median_r: f64, iqr_r: f64) -> Self {
        if median_r.abs() >= 0.5 && iqr_r <= 0.2 {
            Self::High
        } else if median_r.abs() >= 0.3 && iqr_r <= 0.35 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Robustness {
    pub method: String,
    pub block_size: usize,
    pub subsamples: u32,
    pub samples_used: usize,
    pub degenerate_count: usize,
    pub degenerate_rate: f64,
    pub is_informative: bool,
    pub median_r: f64,
    pub iqr_r: f64,
    pub stability: Stability,
}

impl Robustness {
    pub fn uninformative(subsamples: u32, degenerate_count: usize, samples_used: usize) -> Self {
        let degenerate_rate = if subsamples == 0 {
            0.0
        } else {
            degenerate_count as f64 / f64::from(subsamples)
        };
        Self {
            method: "block_bootstrap".to_string(),
            block_size: BLOCK_SIZE,
            subsamples,
            samples_used,
            degenerate_count,
            degenerate_rate: round_to(degenerate_rate, 4),
            is_informative: false,
            median_r: 0.0,
            iqr_r: 0.0,
            stability: Stability::Low,
        }
    }
}

pub fn block_bootstrap(
    pairs: &[(f64, f64)],
    subsamples: u32,
    rng: &mut dyn RandomSource,
) -> Robustness {
    let subsamples = clamp_subsamples(subsamples);
    let n = pairs.len();
    let block_len = BLOCK_SIZE.min(n);
    let block_count = (n / BLOCK_SIZE).max(1);
    let start_range = n.saturating_sub(block_len) + 1;

    let mut valid_r = Vec::with_capacity(subsamples as usize);
    let mut degenerate_count = 0usize;
    let mut sample = Vec::with_capacity(block_count * BLOCK_SIZE);
    for _ in 0..subsamples {
        sample.clear();
        if n > 0 {
            for _ in 0..block_count {
                let start = rng.next_index(start_range);
                sample.extend_from_slice(&pairs[start..start + block_len]);
            }
        }
        let result = pearson_with_diagnostics(&sample);
        if result.degenerate || result.n_effective < MIN_EFFECTIVE_SAMPLES {
            degenerate_count += 1;
        } else {
            valid_r.push(result.r);
        }
    }

    let samples_used = valid_r.len();
    let degenerate_rate = degenerate_count as f64 / f64::from(subsamples);
    if samples_used < MIN_INFORMATIVE_SAMPLES || degenerate_rate > MAX_DEGENERATE_RATE {
        return Robustness::uninformative(subsamples, degenerate_count, samples_used);
    }

    let sorted = sorted_finite(&valid_r);
    let median_r = round_to(quantile(&sorted, 0.5), 4);
    let iqr_r = round_to(quantile(&sorted, 0.75) - quantile(&sorted, 0.25), 4);
    Robustness {
        method: "block_bootstrap".to_string(),
        block_size: BLOCK_SIZE,
        subsamples,
        samples_used,
        degenerate_count,
        degenerate_rate: round_to(degenerate_rate, 4),
        is_informative: true,
        median_r,
        iqr_r,
        stability: Stability::classify(median_r, iqr_r),
    }
}
