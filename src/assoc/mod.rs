pub mod diagnostics;
pub mod joint;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::series::{DailyDriftBucket, DailyRiskBucket, Window};
use crate::stats::bootstrap::clamp_subsamples;
use crate::stats::lag::resolve_max_lag;
use crate::stats::{
    block_bootstrap, lag_sweep, pearson_with_diagnostics, LagEntry, PearsonResult, RandomSource,
    Robustness,
};
use crate::types::{Bucket, SignalPolicy, ASSOCIATION_BUNDLE_KIND, ASSOCIATION_BUNDLE_VERSION};

pub use diagnostics::{diagnose, Diagnostics, NOTE_ENGINE_FALLBACK};
pub use joint::{AlignmentError, DailyValue, JointPoint, JointSeries};

pub const DEFAULT_SUBSAMPLES: u32 = 200;

#[derive(Debug, Error)]
#[error("unknown metric: {0}")]
pub struct MetricParseError(pub String);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DriftMetric {
    #[default]
    Density,
    Events,
    UniqueModules,
}

impl DriftMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Density => "density",
            Self::Events => "events",
            Self::UniqueModules => "unique_modules",
        }
    }

    pub fn daily_values(self, series: &[DailyDriftBucket]) -> Vec<DailyValue> {
        series
            .iter()
            .map(|bucket| DailyValue {
                day: bucket.day,
                value: match self {
                    // density over a single day is the day's event count
                    Self::Density | Self::Events => bucket.event_count as f64,
                    Self::UniqueModules => bucket.unique_module_count as f64,
                },
            })
            .collect()
    }
}

impl Display for DriftMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DriftMetric {
    type Err = MetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "density" => Ok(Self::Density),
            "events" => Ok(Self::Events),
            "unique_modules" | "unique-modules" => Ok(Self::UniqueModules),
            _ => Err(MetricParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskMetric {
    #[default]
    RiskScoreAvg,
    RiskScoreP95,
    RiskEvents,
}

impl RiskMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RiskScoreAvg => "risk_score_avg",
            Self::RiskScoreP95 => "risk_score_p95",
            Self::RiskEvents => "risk_events",
        }
    }

    pub fn daily_values(self, series: &[DailyRiskBucket]) -> Vec<DailyValue> {
        series
            .iter()
            .map(|bucket| DailyValue {
                day: bucket.day,
                value: match self {
                    Self::RiskScoreAvg => bucket.score_avg,
                    Self::RiskScoreP95 => bucket.score_p95,
                    Self::RiskEvents => bucket.sample_count as f64,
                },
            })
            .collect()
    }
}

impl Display for RiskMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskMetric {
    type Err = MetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "risk_score_avg" | "risk-score-avg" => Ok(Self::RiskScoreAvg),
            "risk_score_p95" | "risk-score-p95" => Ok(Self::RiskScoreP95),
            "risk_events" | "risk-events" => Ok(Self::RiskEvents),
            _ => Err(MetricParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssociationRequest {
    pub window: Window,
    pub metric_x: DriftMetric,
    pub metric_y: RiskMetric,
    pub max_lag: Option<u32>,
    pub subsamples: u32,
}

impl Default for AssociationRequest {
    fn default() -> Self {
        Self {
            window: Window::default(),
            metric_x: DriftMetric::default(),
            metric_y: RiskMetric::default(),
            max_lag: None,
            subsamples: DEFAULT_SUBSAMPLES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LagSweep {
    pub max_lag: u32,
    pub entries: Vec<LagEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssociationResults {
    pub pearson: PearsonResult,
    pub lags: LagSweep,
    pub robustness: Robustness,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssociationBundle {
    pub kind: String,
    pub v: u32,
    pub generated_at: DateTime<Utc>,
    pub window: Window,
    pub bucket: Bucket,
    pub metric_x: DriftMetric,
    pub metric_y: RiskMetric,
    pub series: Vec<JointPoint>,
    pub diagnostics: Diagnostics,
    pub results: AssociationResults,
    pub policy: SignalPolicy,
}

impl AssociationBundle {
    pub fn empty(request: &AssociationRequest, now: DateTime<Utc>, reason: &str) -> Self {
        let max_lag = resolve_max_lag(request.max_lag, request.window.days());
        let subsamples = clamp_subsamples(request.subsamples);
        Self {
            kind: ASSOCIATION_BUNDLE_KIND.to_string(),
            v: ASSOCIATION_BUNDLE_VERSION,
            generated_at: now,
            window: request.window,
            bucket: Bucket::Day,
            metric_x: request.metric_x,
            metric_y: request.metric_y,
            series: Vec::new(),
            diagnostics: Diagnostics {
                notes: vec![NOTE_ENGINE_FALLBACK.to_string(), reason.to_string()],
                ..Diagnostics::default()
            },
            results: AssociationResults {
                pearson: pearson_with_diagnostics(&[]),
                lags: LagSweep {
                    max_lag,
                    entries: lag_sweep(&[], &[], max_lag),
                },
                robustness: Robustness::uninformative(subsamples, 0, 0),
            },
            policy: SignalPolicy::ADVISORY,
        }
    }
}

pub fn correlate(
    drift: &[DailyDriftBucket],
    risk: &[DailyRiskBucket],
    request: &AssociationRequest,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> Result<AssociationBundle, AlignmentError> {
    let joint = JointSeries::align(
        &request.metric_x.daily_values(drift),
        &request.metric_y.daily_values(risk),
    )?;
    let pairs = joint.pairs();
    let pearson = pearson_with_diagnostics(&pairs);
    let max_lag = resolve_max_lag(request.max_lag, request.window.days());
    let entries = lag_sweep(&joint.xs(), &joint.ys(), max_lag);
    let robustness = block_bootstrap(&pairs, request.subsamples, rng);
    let diagnostics = diagnose(&joint, &pearson);

    Ok(AssociationBundle {
        kind: ASSOCIATION_BUNDLE_KIND.to_string(),
        v: ASSOCIATION_BUNDLE_VERSION,
        generated_at: now,
        window: request.window,
        bucket: Bucket::Day,
        metric_x: request.metric_x,
        metric_y: request.metric_y,
        series: joint.points,
        diagnostics,
        results: AssociationResults {
            pearson,
            lags: LagSweep { max_lag, entries },
            robustness,
        },
        policy: SignalPolicy::ADVISORY,
    })
}

/// Engine boundary: never fails, substituting [`AssociationBundle::empty`].
pub fn correlate_or_empty(
    drift: &[DailyDriftBucket],
    risk: &[DailyRiskBucket],
    request: &AssociationRequest,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> AssociationBundle {
    correlate(drift, risk, request, now, rng).unwrap_or_else(|err| {
        warn!("association fell back to empty bundle: {err}");
        AssociationBundle::empty(request, now, &err.to_string())
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{
        correlate, correlate_or_empty, AssociationRequest, DriftMetric, RiskMetric,
    };
    use crate::series::{DailyDriftBucket, DailyRiskBucket, Window};
    use crate::stats::Stability;

    fn drift_series(start: NaiveDate, counts: &[u64]) -> Vec<DailyDriftBucket> {
        start
            .iter_days()
            .zip(counts)
            .map(|(day, count)| DailyDriftBucket {
                day,
                event_count: *count,
                unique_module_count: (*count).min(3) as usize,
            })
            .collect()
    }

    fn risk_series(start: NaiveDate, scores: &[f64]) -> Vec<DailyRiskBucket> {
        start
            .iter_days()
            .zip(scores)
            .map(|(day, score)| DailyRiskBucket {
                day,
                sample_count: usize::from(*score != 0.0),
                score_avg: *score,
                score_p95: *score,
            })
            .collect()
    }

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date")
    }

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 7, 12, 0, 0).unwrap()
    }

    #[test]
    fn metric_names_parse() {
        assert_eq!("density".parse::<DriftMetric>().ok(), Some(DriftMetric::Density));
        assert_eq!(
            "unique_modules".parse::<DriftMetric>().ok(),
            Some(DriftMetric::UniqueModules)
        );
        assert_eq!(
            "risk_score_p95".parse::<RiskMetric>().ok(),
            Some(RiskMetric::RiskScoreP95)
        );
        assert!("entropy".parse::<RiskMetric>().is_err());
    }

    #[test]
    fn drift_spike_against_flat_risk_is_degenerate() {
        let drift = drift_series(start(), &[0, 0, 0, 0, 0, 0, 10]);
        let risk = risk_series(start(), &[0.0; 7]);
        let request = AssociationRequest::default();
        let bundle = correlate(&drift, &risk, &request, now(), &mut StdRng::seed_from_u64(3))
            .expect("aligned");
        let pearson = &bundle.results.pearson;
        assert!(pearson.degenerate);
        assert_eq!(pearson.r, 0.0);
        assert_eq!(pearson.variance_y, 0.0);
        assert!(bundle
            .diagnostics
            .notes
            .iter()
            .any(|note| note == "degenerate_y"));
        assert!(!bundle.results.robustness.is_informative);
        assert_eq!(bundle.results.robustness.median_r, 0.0);
    }

    #[test]
    fn linear_relation_peaks_at_lag_zero() {
        let counts = (1..=10).collect::<Vec<u64>>();
        let scores = counts.iter().map(|c| 2.0 * *c as f64 + 1.0).collect::<Vec<_>>();
        let request = AssociationRequest {
            window: Window::Days14,
            metric_x: DriftMetric::Events,
            metric_y: RiskMetric::RiskScoreAvg,
            max_lag: Some(4),
            subsamples: 120,
        };
        let bundle = correlate(
            &drift_series(start(), &counts),
            &risk_series(start(), &scores),
            &request,
            now(),
            &mut StdRng::seed_from_u64(11),
        )
        .expect("aligned");

        assert_eq!(bundle.kind, "association_bundle");
        assert_eq!(bundle.v, 2);
        assert_eq!(bundle.results.pearson.r, 1.0);
        let entries = &bundle.results.lags.entries;
        assert_eq!(entries.len(), 9);
        let zero = entries.iter().find(|e| e.lag_days == 0).expect("lag 0");
        assert!(entries.iter().all(|e| e.r.abs() <= zero.r.abs()));

        let robustness = &bundle.results.robustness;
        assert!(robustness.is_informative);
        assert_eq!(robustness.median_r, 1.0);
        assert_eq!(robustness.stability, Stability::High);
        assert!(bundle.diagnostics.notes.is_empty());
        assert!(!bundle.policy.affects_exit);
    }

    #[test]
    fn default_max_lag_follows_window() {
        let drift = drift_series(start(), &[1, 3, 2, 5, 4, 6, 8]);
        let risk = risk_series(start(), &[2.0, 1.0, 4.0, 3.0, 6.0, 5.0, 7.0]);
        let request = AssociationRequest::default();
        let bundle = correlate(&drift, &risk, &request, now(), &mut StdRng::seed_from_u64(5))
            .expect("aligned");
        assert_eq!(bundle.results.lags.max_lag, 7);
        assert_eq!(bundle.results.lags.entries.len(), 15);
    }

    #[test]
    fn misaligned_series_fall_back_to_empty_bundle() {
        let drift = drift_series(start(), &[1, 2, 3, 4, 5, 6, 7]);
        let risk = risk_series(start() + Duration::days(1), &[1.0; 7]);
        let request = AssociationRequest::default();
        assert!(correlate(&drift, &risk, &request, now(), &mut StdRng::seed_from_u64(1)).is_err());

        let bundle = correlate_or_empty(&drift, &risk, &request, now(), &mut StdRng::seed_from_u64(1));
        assert!(bundle.series.is_empty());
        assert_eq!(bundle.diagnostics.notes[0], "engine_fallback");
        assert!(bundle.results.pearson.degenerate);
        assert_eq!(bundle.results.lags.entries.len(), 15);
        assert!(!bundle.results.robustness.is_informative);
        assert_eq!(bundle.results.robustness.iqr_r, 0.0);
    }

    #[test]
    fn deterministic_parts_repeat_exactly() {
        let drift = drift_series(start(), &[1, 3, 2, 5, 4, 6, 8]);
        let risk = risk_series(start(), &[2.0, 1.0, 4.0, 3.0, 6.0, 5.0, 7.0]);
        let request = AssociationRequest::default();
        let first = correlate(&drift, &risk, &request, now(), &mut StdRng::seed_from_u64(1))
            .expect("aligned");
        let second = correlate(&drift, &risk, &request, now(), &mut StdRng::seed_from_u64(2))
            .expect("aligned");
        assert_eq!(first.series, second.series);
        assert_eq!(first.results.pearson, second.results.pearson);
        assert_eq!(first.results.lags, second.results.lags);
    }
}
