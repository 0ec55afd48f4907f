use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::DriftEvent;
use crate::series::{DayRange, Window};
use crate::types::{Bucket, SignalPolicy, DRIFT_TIMELINE_KIND, DRIFT_TIMELINE_VERSION};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineBucket {
    pub bucket_start: DateTime<Utc>,
    pub event_count: u64,
    pub unique_module_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftTimeline {
    pub kind: String,
    pub v: u32,
    pub generated_at: DateTime<Utc>,
    pub window: Window,
    pub bucket: Bucket,
    pub since: DateTime<Utc>,
    pub series: Vec<TimelineBucket>,
    pub policy: SignalPolicy,
}

pub fn bucket_start(ts: DateTime<Utc>, bucket: Bucket) -> DateTime<Utc> {
    let time = match bucket {
        Bucket::Hour => NaiveTime::from_hms_opt(ts.hour(), 0, 0).unwrap_or(NaiveTime::MIN),
        Bucket::Day => NaiveTime::MIN,
    };
    Utc.from_utc_datetime(&ts.date_naive().and_time(time))
}

pub fn build_timeline(
    events: &[DriftEvent],
    now: DateTime<Utc>,
    window: Window,
    bucket: Bucket,
) -> DriftTimeline {
    let since = DayRange::ending_at(now, window.days()).start_instant();
    let mut buckets: BTreeMap<DateTime<Utc>, (u64, BTreeSet<&str>)> = BTreeMap::new();
    for event in events.iter().filter(|e| e.ts >= since) {
        let (count, modules) = buckets.entry(bucket_start(event.ts, bucket)).or_default();
        *count += 1;
        if let Some(module) = event.module_name() {
            modules.insert(module);
        }
    }

    DriftTimeline {
        kind: DRIFT_TIMELINE_KIND.to_string(),
        v: DRIFT_TIMELINE_VERSION,
        generated_at: now,
        window,
        bucket,
        since,
        series: buckets
            .into_iter()
            .map(|(bucket_start, (event_count, modules))| TimelineBucket {
                bucket_start,
                event_count,
                unique_module_count: modules.len(),
            })
            .collect(),
        policy: SignalPolicy::ADVISORY,
    }
}
