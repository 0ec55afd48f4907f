use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ingest::RawAuditRecord;
use crate::series::DayRange;
use crate::stats::{mean, quantile, round_to, sorted_finite};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyRiskBucket {
    pub day: NaiveDate,
    pub sample_count: usize,
    pub score_avg: f64,
    pub score_p95: f64,
}

pub fn build_risk_daily_series(
    records: &[RawAuditRecord],
    now: DateTime<Utc>,
    days: u32,
) -> Vec<DailyRiskBucket> {
    let range = DayRange::ending_at(now, days);
    let mut scores: BTreeMap<NaiveDate, Vec<f64>> = range
        .days()
        .into_iter()
        .map(|day| (day, Vec::new()))
        .collect();

    for record in records {
        let Some(ts) = record.timestamp() else {
            continue;
        };
        let Some(day_scores) = scores.get_mut(&ts.date_naive()) else {
            continue;
        };
        if let Some(score) = record.risk_score() {
            day_scores.push(score);
        }
    }

    scores
        .into_iter()
        .map(|(day, values)| {
            let sorted = sorted_finite(&values);
            DailyRiskBucket {
                day,
                sample_count: sorted.len(),
                score_avg: round_to(mean(&sorted), 2),
                score_p95: round_to(quantile(&sorted, 0.95), 2),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::build_risk_daily_series;
    use crate::ingest::RawAuditRecord;

    fn record(value: serde_json::Value) -> RawAuditRecord {
        RawAuditRecord::try_from(value).expect("object fixture")
    }

    #[test]
    fn aggregates_scores_per_day() {
        let now = Utc.with_ymd_and_hms(2026, 4, 10, 18, 0, 0).unwrap();
        let records = vec![
            record(json!({ "ts": "2026-04-10T01:00:00Z", "risk_score": 10 })),
            record(json!({ "time": "2026-04-10T02:00:00Z", "risk": { "score": 20 } })),
            record(json!({ "snapshot": { "ts": "2026-04-10T03:00:00Z", "risk_score": 30 } })),
            record(json!({ "receipt": { "ts": "2026-04-10T04:00:00Z" }, "snapshot": { "risk": { "score": 41 } } })),
            record(json!({ "ts": "2026-04-09T23:59:59Z", "risk_score": 5 })),
            // no timestamp, dropped
            record(json!({ "risk_score": 1000 })),
            // timestamp but no score
            record(json!({ "ts": "2026-04-08T00:00:00Z" })),
        ];

        let series = build_risk_daily_series(&records, now, 7);
        assert_eq!(series.len(), 7);

        let today = &series[6];
        assert_eq!(today.sample_count, 4);
        assert_eq!(today.score_avg, 25.25);
        // sorted [10, 20, 30, 41], position 2.85 -> 30 + 0.85 * 11
        assert_eq!(today.score_p95, 39.35);

        let yesterday = &series[5];
        assert_eq!(yesterday.sample_count, 1);
        assert_eq!(yesterday.score_avg, 5.0);
        assert_eq!(yesterday.score_p95, 5.0);

        assert_eq!(series[4].sample_count, 0);
        assert_eq!(series[4].score_avg, 0.0);
        assert_eq!(series[4].score_p95, 0.0);
    }

    #[test]
    fn empty_records_still_fill_window() {
        let now = Utc.with_ymd_and_hms(2026, 4, 10, 0, 0, 0).unwrap();
        let series = build_risk_daily_series(&[], now, 30);
        assert_eq!(series.len(), 30);
        assert!(series.windows(2).all(|w| w[0].day < w[1].day));
    }
}
