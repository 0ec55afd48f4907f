use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::DriftEvent;
use crate::series::Window;
use crate::stats::round_to;
use crate::trend::{summarize_trend, WindowSplit};
use crate::types::{SignalPolicy, DRIFT_COMPARE_KIND, DRIFT_COMPARE_VERSION};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowSnapshot {
    pub events: usize,
    pub unique_modules: usize,
    pub density: f64,
    pub expansion: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowDelta {
    pub events: i64,
    pub unique_modules: i64,
    pub density: f64,
    pub expansion: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftCompare {
    pub kind: String,
    pub v: u32,
    pub generated_at: DateTime<Utc>,
    pub window: Window,
    pub days: u32,
    pub a: WindowSnapshot,
    pub b: WindowSnapshot,
    pub delta: WindowDelta,
    pub policy: SignalPolicy,
}

/// `a` is the previous window, `b` the current one, `delta = b - a`.
pub fn build_compare(events: &[DriftEvent], now: DateTime<Utc>, window: Window) -> DriftCompare {
    let days = window.days();
    let split = WindowSplit::new(events, now, days);
    let trend = summarize_trend(&split, days);

    let a = WindowSnapshot {
        events: trend.events_prev,
        unique_modules: trend.unique_modules_prev,
        density: trend.density_prev,
        expansion: 0,
    };
    let b = WindowSnapshot {
        events: trend.events,
        unique_modules: trend.unique_modules,
        density: trend.density,
        expansion: trend.expansion,
    };
    let delta = WindowDelta {
        events: signed(b.events) - signed(a.events),
        unique_modules: signed(b.unique_modules) - signed(a.unique_modules),
        density: round_to(b.density - a.density, 2),
        expansion: signed(b.expansion) - signed(a.expansion),
    };

    DriftCompare {
        kind: DRIFT_COMPARE_KIND.to_string(),
        v: DRIFT_COMPARE_VERSION,
        generated_at: now,
        window,
        days,
        a,
        b,
        delta,
        policy: SignalPolicy::ADVISORY,
    }
}

fn signed(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
