use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

// values at or above this are milliseconds
pub const EPOCH_MILLIS_THRESHOLD: f64 = 1e12;

#[derive(Debug, Clone, Copy)]
pub struct Extractor<T: 'static> {
    pub path: &'static str,
    pub parse: fn(&Value) -> Option<T>,
}

impl<T: 'static> Extractor<T> {
    pub fn extract(&self, object: &Map<String, Value>) -> Option<T> {
        object_path_value(object, self.path).and_then(self.parse)
    }
}

pub const TIMESTAMP_EXTRACTORS: &[Extractor<DateTime<Utc>>] = &[
    Extractor { path: "ts", parse: parse_timestamp },
    Extractor { path: "time", parse: parse_timestamp },
    Extractor { path: "timestamp", parse: parse_timestamp },
    Extractor { path: "created_at", parse: parse_timestamp },
    Extractor { path: "ts_ms", parse: parse_epoch },
    Extractor { path: "epoch", parse: parse_epoch },
    Extractor { path: "snapshot.ts", parse: parse_timestamp },
    Extractor { path: "snapshot.time", parse: parse_timestamp },
    Extractor { path: "snapshot.timestamp", parse: parse_timestamp },
    Extractor { path: "receipt.ts", parse: parse_timestamp },
    Extractor { path: "receipt.time", parse: parse_timestamp },
    Extractor { path: "receipt.timestamp", parse: parse_timestamp },
];

pub const SCORE_EXTRACTORS: &[Extractor<f64>] = &[
    Extractor { path: "risk_score", parse: parse_score },
    Extractor { path: "snapshot.risk_score", parse: parse_score },
    Extractor { path: "snapshot.risk.score", parse: parse_score },
    Extractor { path: "risk.score", parse: parse_score },
];

pub fn first_match<T: 'static>(
    object: &Map<String, Value>,
    extractors: &[Extractor<T>],
) -> Option<T> {
    extractors.iter().find_map(|extractor| extractor.extract(object))
}

pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            DateTime::parse_from_rfc3339(trimmed)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(epoch_to_utc))
        }
        Value::Number(_) => parse_epoch(value),
        _ => None,
    }
}

pub fn parse_epoch(value: &Value) -> Option<DateTime<Utc>> {
    to_f64(value).and_then(epoch_to_utc)
}

pub fn parse_score(value: &Value) -> Option<f64> {
    to_f64(value)
}

fn epoch_to_utc(raw: f64) -> Option<DateTime<Utc>> {
    if !raw.is_finite() || raw <= 0.0 {
        return None;
    }
    let millis = if raw >= EPOCH_MILLIS_THRESHOLD {
        raw
    } else {
        raw * 1000.0
    };
    Utc.timestamp_millis_opt(millis.round() as i64).single()
}

fn to_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn object_path_value<'a>(object: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = object.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}
