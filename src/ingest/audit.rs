use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::ingest::events::{log_lines, read_log};
use crate::ingest::RawAuditRecord;

pub fn read_audit_records(path: &Path) -> Vec<RawAuditRecord> {
    let Some(data) = read_log(path) else {
        return Vec::new();
    };
    let (records, skipped) = parse_audit_records(&data);
    debug!(
        "loaded {} audit records from {} ({skipped} lines skipped)",
        records.len(),
        path.display()
    );
    records
}

pub fn parse_audit_records(data: &[u8]) -> (Vec<RawAuditRecord>, usize) {
    let mut records = Vec::new();
    let mut skipped = 0usize;
    for line in log_lines(data) {
        let parsed = line
            .and_then(|line| serde_json::from_str::<Value>(line).ok())
            .and_then(|value| RawAuditRecord::try_from(value).ok());
        match parsed {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }
    (records, skipped)
}
