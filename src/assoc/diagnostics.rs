use serde::{Deserialize, Serialize};

use crate::assoc::joint::JointSeries;
use crate::stats::PearsonResult;

pub const MIN_NONZERO_DAYS: usize = 3;

pub const NOTE_SPARSE_X: &str = "sparse_x";
pub const NOTE_SPARSE_Y: &str = "sparse_y";
pub const NOTE_LOW_OVERLAP: &str = "low_overlap";
pub const NOTE_DEGENERATE_X: &str = "degenerate_x";
pub const NOTE_DEGENERATE_Y: &str = "degenerate_y";
pub const NOTE_ENGINE_FALLBACK: &str = "engine_fallback";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Diagnostics {
    pub n: usize,
    pub nonzero_x_days: usize,
    pub nonzero_y_days: usize,
    pub nonzero_overlap_days: usize,
    pub notes: Vec<String>,
}

pub fn diagnose(joint: &JointSeries, pearson: &PearsonResult) -> Diagnostics {
    let nonzero = |v: f64| v.is_finite() && v != 0.0;
    let nonzero_x_days = joint.points.iter().filter(|p| nonzero(p.x)).count();
    let nonzero_y_days = joint.points.iter().filter(|p| nonzero(p.y)).count();
    let nonzero_overlap_days = joint
        .points
        .iter()
        .filter(|p| nonzero(p.x) && nonzero(p.y))
        .count();

    let mut notes = Vec::new();
    if nonzero_x_days < MIN_NONZERO_DAYS {
        notes.push(NOTE_SPARSE_X.to_string());
    }
    if nonzero_y_days < MIN_NONZERO_DAYS {
        notes.push(NOTE_SPARSE_Y.to_string());
    }
    if nonzero_overlap_days < MIN_NONZERO_DAYS {
        notes.push(NOTE_LOW_OVERLAP.to_string());
    }
    if pearson.zero_variance_x {
        notes.push(NOTE_DEGENERATE_X.to_string());
    }
    if pearson.zero_variance_y {
        notes.push(NOTE_DEGENERATE_Y.to_string());
    }

    Diagnostics {
        n: joint.len(),
        nonzero_x_days,
        nonzero_y_days,
        nonzero_overlap_days,
        notes,
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::diagnose;
    use crate::assoc::joint::{JointPoint, JointSeries};
    use crate::stats::pearson_with_diagnostics;

    fn joint(x: &[f64], y: &[f64]) -> JointSeries {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date");
        JointSeries {
            points: start
                .iter_days()
                .zip(x.iter().zip(y))
                .map(|(day, (x, y))| JointPoint { day, x: *x, y: *y })
                .collect(),
        }
    }

    #[test]
    fn spike_against_flat_risk_flags_everything() {
        let series = joint(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 10.0], &[0.0; 7]);
        let pearson = pearson_with_diagnostics(&series.pairs());
        let diagnostics = diagnose(&series, &pearson);
        assert_eq!(diagnostics.n, 7);
        assert_eq!(diagnostics.nonzero_x_days, 1);
        assert_eq!(diagnostics.nonzero_y_days, 0);
        assert_eq!(
            diagnostics.notes,
            vec!["sparse_x", "sparse_y", "low_overlap", "degenerate_y"]
        );
    }

    #[test]
    fn dense_series_have_no_notes() {
        let series = joint(&[1.0, 2.0, 3.0, 4.0], &[2.0, 1.0, 4.0, 3.0]);
        let pearson = pearson_with_diagnostics(&series.pairs());
        let diagnostics = diagnose(&series, &pearson);
        assert_eq!(diagnostics.nonzero_overlap_days, 4);
        assert!(diagnostics.notes.is_empty());
    }
}
