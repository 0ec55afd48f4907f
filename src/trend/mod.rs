pub mod compare;
pub mod dominance;
pub mod timeline;

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::DriftEvent;
use crate::series::{build_drift_daily_series, DailyDriftBucket, DayRange, Window};
use crate::stats::round_to;
use crate::types::{
    SignalPolicy, TrendLabel, DRIFT_SIGNAL_BUNDLE_KIND, DRIFT_SIGNAL_BUNDLE_VERSION,
};

pub use compare::{build_compare, DriftCompare, WindowDelta, WindowSnapshot};
pub use dominance::{
    rank_contributions, summarize_dominance, DominanceSummary, ModuleContribution,
    DEFAULT_TOP_N,
};
pub use timeline::{build_timeline, DriftTimeline, TimelineBucket};

pub const TREND_EPSILON: f64 = 0.5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendSummary {
    pub events: usize,
    pub events_prev: usize,
    pub density: f64,
    pub density_prev: f64,
    pub slope: f64,
    pub trend: TrendLabel,
    pub unique_modules: usize,
    pub unique_modules_prev: usize,
    pub expansion: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftSignalBundle {
    pub kind: String,
    pub v: u32,
    pub generated_at: DateTime<Utc>,
    pub window: Window,
    pub days: u32,
    pub trend: TrendSummary,
    pub dominance: DominanceSummary,
    pub series: Vec<DailyDriftBucket>,
    pub policy: SignalPolicy,
}

#[derive(Debug, Clone)]
pub struct WindowSplit<'a> {
    pub current: Vec<&'a DriftEvent>,
    pub previous: Vec<&'a DriftEvent>,
}

impl<'a> WindowSplit<'a> {
    pub fn new(events: &'a [DriftEvent], now: DateTime<Utc>, days: u32) -> Self {
        let current_range = DayRange::ending_at(now, days);
        let previous_range = current_range.preceding(days);
        let mut split = Self {
            current: Vec::new(),
            previous: Vec::new(),
        };
        for event in events {
            let day = event.ts.date_naive();
            if current_range.contains(day) {
                split.current.push(event);
            } else if previous_range.contains(day) {
                split.previous.push(event);
            }
        }
        split
    }
}

pub fn unique_modules(events: &[&DriftEvent]) -> usize {
    events
        .iter()
        .filter_map(|e| e.module_name())
        .collect::<BTreeSet<_>>()
        .len()
}

pub fn classify_trend(slope: f64) -> TrendLabel {
    if slope > TREND_EPSILON {
        TrendLabel::Accelerating
    } else if slope < -TREND_EPSILON {
        TrendLabel::Cooling
    } else {
        TrendLabel::Stable
    }
}

pub fn summarize_trend(split: &WindowSplit<'_>, days: u32) -> TrendSummary {
    let span = f64::from(days.max(1));
    let density = split.current.len() as f64 / span;
    let density_prev = split.previous.len() as f64 / span;
    let slope = density - density_prev;
    let unique_current = unique_modules(&split.current);
    let unique_previous = unique_modules(&split.previous);
    TrendSummary {
        events: split.current.len(),
        events_prev: split.previous.len(),
        density: round_to(density, 2),
        density_prev: round_to(density_prev, 2),
        slope: round_to(slope, 2),
        trend: classify_trend(slope),
        unique_modules: unique_current,
        unique_modules_prev: unique_previous,
        expansion: unique_current.saturating_sub(unique_previous),
    }
}

pub fn analyze_drift(
    events: &[DriftEvent],
    now: DateTime<Utc>,
    window: Window,
    top_n: usize,
) -> DriftSignalBundle {
    let days = window.days();
    let split = WindowSplit::new(events, now, days);
    DriftSignalBundle {
        kind: DRIFT_SIGNAL_BUNDLE_KIND.to_string(),
        v: DRIFT_SIGNAL_BUNDLE_VERSION,
        generated_at: now,
        window,
        days,
        trend: summarize_trend(&split, days),
        dominance: summarize_dominance(&split.current, top_n),
        series: build_drift_daily_series(events, now, days),
        policy: SignalPolicy::ADVISORY,
    }
}
