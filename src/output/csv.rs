use anyhow::Result;

use crate::trend::DriftTimeline;

pub fn timeline_to_csv(timeline: &DriftTimeline) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["bucket_start", "event_count", "unique_module_count"])?;
    for bucket in &timeline.series {
        writer.write_record([
            bucket.bucket_start.to_rfc3339(),
            bucket.event_count.to_string(),
            bucket.unique_module_count.to_string(),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}
