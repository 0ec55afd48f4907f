use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::DriftEvent;
use crate::series::DayRange;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyDriftBucket {
    pub day: NaiveDate,
    pub event_count: u64,
    pub unique_module_count: usize,
}

pub fn build_drift_daily_series(
    events: &[DriftEvent],
    now: DateTime<Utc>,
    days: u32,
) -> Vec<DailyDriftBucket> {
    let range = DayRange::ending_at(now, days);
    let mut buckets: BTreeMap<NaiveDate, (u64, BTreeSet<&str>)> = range
        .days()
        .into_iter()
        .map(|day| (day, (0, BTreeSet::new())))
        .collect();

    for event in events {
        let Some((count, modules)) = buckets.get_mut(&event.ts.date_naive()) else {
            continue;
        };
        *count += 1;
        if let Some(module) = event.module_name() {
            modules.insert(module);
        }
    }

    buckets
        .into_iter()
        .map(|(day, (event_count, modules))| DailyDriftBucket {
            day,
            event_count,
            unique_module_count: modules.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::build_drift_daily_series;
    use crate::ingest::DriftEvent;
    use crate::series::Window;

    #[test]
    fn every_window_has_exact_ascending_days() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 0, 0).unwrap();
        for window in Window::ALL {
            let series = build_drift_daily_series(&[], now, window.days());
            assert_eq!(series.len(), window.days() as usize);
            assert!(series.windows(2).all(|w| w[0].day < w[1].day));
            assert!(series.iter().all(|b| b.event_count == 0));
            assert_eq!(series.last().map(|b| b.day), Some(now.date_naive()));
        }
    }

    #[test]
    fn counts_events_and_distinct_modules_per_utc_day() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let today = Utc.with_ymd_and_hms(2026, 3, 7, 0, 5, 0).unwrap();
        let events = vec![
            DriftEvent::new(today, "alpha"),
            DriftEvent::new(today + Duration::hours(1), "alpha"),
            DriftEvent::new(today + Duration::hours(2), "beta"),
            DriftEvent::new(today + Duration::hours(3), "  "),
            DriftEvent::new(today - Duration::days(2), "gamma"),
            // outside the window on both ends
            DriftEvent::new(today - Duration::days(9), "old"),
            DriftEvent::new(today + Duration::days(1), "future"),
        ];
        let series = build_drift_daily_series(&events, now, 7);
        let last = series.last().expect("today bucket");
        assert_eq!(last.event_count, 4);
        assert_eq!(last.unique_module_count, 2);
        assert_eq!(series[4].event_count, 1);
        assert_eq!(series[4].unique_module_count, 1);
        assert_eq!(series.iter().map(|b| b.event_count).sum::<u64>(), 5);
    }

    #[test]
    fn identical_inputs_give_identical_series() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        let events = vec![DriftEvent::new(now, "alpha")];
        assert_eq!(
            build_drift_daily_series(&events, now, 14),
            build_drift_daily_series(&events, now, 14)
        );
    }
}
