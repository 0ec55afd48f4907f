pub mod audit;
pub mod events;
pub mod extract;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub use audit::read_audit_records;
pub use events::read_drift_events;

pub const DRIFT_EVENT_KIND: &str = "drift_event";
pub const DRIFT_EVENT_VERSION: u64 = 2;

// only `ts` is required; mistyped fields read as absent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriftEvent {
    pub ts: DateTime<Utc>,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub surface_id: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub module: String,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub boundary: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_score",
        skip_serializing_if = "Option::is_none"
    )]
    pub risk_score: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub severity: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub verdict: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub exit_code: Option<i64>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub receipt_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub snapshot_id: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(extract::parse_score(&value))
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        _ => Ok(String::new()),
    }
}

impl DriftEvent {
    pub fn new(ts: DateTime<Utc>, module: impl Into<String>) -> Self {
        Self {
            ts,
            surface_id: String::new(),
            module: module.into(),
            boundary: None,
            risk_score: None,
            severity: None,
            verdict: None,
            exit_code: None,
            receipt_id: None,
            snapshot_id: None,
        }
    }

    pub fn with_boundary(mut self, boundary: impl Into<String>) -> Self {
        self.boundary = Some(boundary.into());
        self
    }

    pub fn module_name(&self) -> Option<&str> {
        let trimmed = self.module.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn boundary_name(&self) -> Option<&str> {
        self.boundary
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawAuditRecord {
    pub fields: Map<String, Value>,
}

impl RawAuditRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        extract::first_match(&self.fields, extract::TIMESTAMP_EXTRACTORS)
    }

    pub fn risk_score(&self) -> Option<f64> {
        extract::first_match(&self.fields, extract::SCORE_EXTRACTORS)
    }
}

impl TryFrom<Value> for RawAuditRecord {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(Self::new(fields)),
            other => Err(other),
        }
    }
}
