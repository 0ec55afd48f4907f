use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::assoc::{correlate_or_empty, AssociationBundle, AssociationRequest};
use crate::ingest::{read_audit_records, read_drift_events};
use crate::series::{build_drift_daily_series, build_risk_daily_series, Window};
use crate::stats::bootstrap::rng_from_seed;
use crate::stats::RandomSource;
use crate::trend::{
    analyze_drift, build_compare, build_timeline, DriftCompare, DriftSignalBundle, DriftTimeline,
};
use crate::types::Bucket;

pub fn drift_status(
    events_path: &Path,
    now: DateTime<Utc>,
    window: Window,
    top_n: usize,
) -> DriftSignalBundle {
    let events = read_drift_events(events_path);
    let bundle = analyze_drift(&events, now, window, top_n);
    info!(
        "drift status {}: {} events, trend {}",
        window,
        bundle.trend.events,
        bundle.trend.trend.as_str()
    );
    bundle
}

pub fn drift_timeline(
    events_path: &Path,
    now: DateTime<Utc>,
    window: Window,
    bucket: Bucket,
) -> DriftTimeline {
    let events = read_drift_events(events_path);
    build_timeline(&events, now, window, bucket)
}

pub fn drift_compare(events_path: &Path, now: DateTime<Utc>, window: Window) -> DriftCompare {
    let events = read_drift_events(events_path);
    build_compare(&events, now, window)
}

pub fn association(
    events_path: &Path,
    audit_path: &Path,
    request: &AssociationRequest,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
) -> AssociationBundle {
    let days = request.window.days();
    let events = read_drift_events(events_path);
    let records = read_audit_records(audit_path);
    let drift = build_drift_daily_series(&events, now, days);
    let risk = build_risk_daily_series(&records, now, days);
    let bundle = correlate_or_empty(&drift, &risk, request, now, rng);
    info!(
        "association {} vs {} over {}: r={} stability={:?}",
        request.metric_x,
        request.metric_y,
        request.window,
        bundle.results.pearson.r,
        bundle.results.robustness.stability
    );
    bundle
}

pub fn association_seeded(
    events_path: &Path,
    audit_path: &Path,
    request: &AssociationRequest,
    now: DateTime<Utc>,
    seed: Option<u64>,
) -> AssociationBundle {
    let mut rng = rng_from_seed(seed);
    association(events_path, audit_path, request, now, &mut rng)
}
