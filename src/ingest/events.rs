use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::ingest::{DriftEvent, DRIFT_EVENT_KIND, DRIFT_EVENT_VERSION};

pub fn read_drift_events(path: &Path) -> Vec<DriftEvent> {
    let Some(data) = read_log(path) else {
        return Vec::new();
    };
    let (events, skipped) = parse_drift_events(&data);
    debug!(
        "loaded {} drift events from {} ({skipped} lines skipped)",
        events.len(),
        path.display()
    );
    events
}

pub fn parse_drift_events(data: &[u8]) -> (Vec<DriftEvent>, usize) {
    let mut events = Vec::new();
    let mut skipped = 0usize;
    for line in log_lines(data) {
        match line.and_then(parse_drift_line) {
            Some(event) => events.push(event),
            None => skipped += 1,
        }
    }
    (events, skipped)
}

fn parse_drift_line(line: &str) -> Option<DriftEvent> {
    let value: Value = serde_json::from_str(line).ok()?;
    let object = value.as_object()?;
    if object.get("kind").and_then(Value::as_str) != Some(DRIFT_EVENT_KIND) {
        return None;
    }
    if object.get("v").and_then(Value::as_u64) != Some(DRIFT_EVENT_VERSION) {
        return None;
    }
    serde_json::from_value(value).ok()
}

// invalid UTF-8 lines come back as None
pub(crate) fn log_lines(data: &[u8]) -> impl Iterator<Item = Option<&str>> {
    data.split(|byte| *byte == b'\n')
        .map(|raw| std::str::from_utf8(raw).ok().map(str::trim))
        .filter(|line| line != &Some(""))
}

pub(crate) fn read_log(path: &Path) -> Option<Vec<u8>> {
    match fs::read(path) {
        Ok(data) => Some(data),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("log not found, treating as empty: {}", path.display());
            None
        }
        Err(err) => {
            warn!("failed reading log {}: {err}", path.display());
            None
        }
    }
}
