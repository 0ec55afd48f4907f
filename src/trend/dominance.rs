use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ingest::DriftEvent;

pub const DEFAULT_TOP_N: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleContribution {
    pub module: String,
    pub contribution: u64,
    pub share: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundaryContribution {
    pub boundary: String,
    pub contribution: u64,
    pub share: f64,
    pub rank: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CrossBoundary {
    pub boundary_count: usize,
    pub is_cross_boundary: bool,
    pub boundaries: Vec<BoundaryContribution>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DominanceSummary {
    pub metric: String,
    pub top_n: usize,
    pub total_contribution: u64,
    pub module_count: usize,
    pub top_modules: Vec<ModuleContribution>,
    pub dominance_ratio: f64,
    pub top3_share: f64,
    pub cross_boundary: CrossBoundary,
}

impl DominanceSummary {
    pub fn empty(top_n: usize) -> Self {
        summarize_dominance(&[], top_n)
    }
}

// contribution desc, then key asc
pub fn contribution_order(a: (&str, u64), b: (&str, u64)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

pub fn rank_contributions(counts: &BTreeMap<String, u64>) -> Vec<ModuleContribution> {
    let total: u64 = counts.values().sum();
    let mut entries = counts
        .iter()
        .map(|(module, count)| (module.as_str(), *count))
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| contribution_order(*a, *b));
    entries
        .into_iter()
        .enumerate()
        .map(|(idx, (module, contribution))| ModuleContribution {
            module: module.to_string(),
            contribution,
            share: share_of(contribution, total),
            rank: idx + 1,
        })
        .collect()
}

pub fn summarize_dominance(events: &[&DriftEvent], top_n: usize) -> DominanceSummary {
    let mut by_module: BTreeMap<String, u64> = BTreeMap::new();
    let mut by_boundary: BTreeMap<String, u64> = BTreeMap::new();
    for event in events {
        if let Some(module) = event.module_name() {
            *by_module.entry(module.to_string()).or_default() += 1;
        }
        if let Some(boundary) = event.boundary_name() {
            *by_boundary.entry(boundary.to_string()).or_default() += 1;
        }
    }

    let ranked = rank_contributions(&by_module);
    let total_contribution: u64 = by_module.values().sum();
    let dominance_ratio = ranked.first().map(|m| m.share).unwrap_or(0.0);
    let top3_share: f64 = ranked.iter().take(3).map(|m| m.share).sum();
    let module_count = ranked.len();

    let boundaries = rank_contributions(&by_boundary)
        .into_iter()
        .map(|entry| BoundaryContribution {
            boundary: entry.module,
            contribution: entry.contribution,
            share: entry.share,
            rank: entry.rank,
        })
        .collect::<Vec<_>>();

    DominanceSummary {
        metric: "event_count".to_string(),
        top_n,
        total_contribution,
        module_count,
        top_modules: ranked.into_iter().take(top_n).collect(),
        dominance_ratio,
        top3_share,
        cross_boundary: CrossBoundary {
            boundary_count: boundaries.len(),
            is_cross_boundary: boundaries.len() > 1,
            boundaries,
        },
    }
}

fn share_of(contribution: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        contribution as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{TimeZone, Utc};

    use super::{rank_contributions, summarize_dominance};
    use crate::ingest::DriftEvent;

    fn counts(items: &[(&str, u64)]) -> BTreeMap<String, u64> {
        items.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn ties_break_by_module_name() {
        let ranked = rank_contributions(&counts(&[("zeta", 3), ("beta", 3), ("alpha", 1)]));
        let names = ranked.iter().map(|m| m.module.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["beta", "zeta", "alpha"]);
        assert_eq!(
            ranked.iter().map(|m| m.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn shares_sum_to_one() {
        let ranked = rank_contributions(&counts(&[("a", 1), ("b", 2), ("c", 7), ("d", 3)]));
        let total: f64 = ranked.iter().map(|m| m.share).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_total_gives_zero_shares() {
        let ranked = rank_contributions(&counts(&[("a", 0), ("b", 0)]));
        assert!(ranked.iter().all(|m| m.share == 0.0));
        assert!(rank_contributions(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn single_module_dominates_fully() {
        let ts = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let events = (0..10)
            .map(|_| DriftEvent::new(ts, "alpha"))
            .collect::<Vec<_>>();
        let refs = events.iter().collect::<Vec<_>>();
        let summary = summarize_dominance(&refs, 5);
        assert_eq!(summary.top_modules.len(), 1);
        assert_eq!(summary.top_modules[0].module, "alpha");
        assert_eq!(summary.top_modules[0].rank, 1);
        assert_eq!(summary.top_modules[0].share, 1.0);
        assert_eq!(summary.dominance_ratio, 1.0);
        assert_eq!(summary.top3_share, 1.0);
        assert!(!summary.cross_boundary.is_cross_boundary);
    }

    #[test]
    fn top_n_truncates_but_top3_uses_full_ranking() {
        let ts = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let mut events = Vec::new();
        let layout = [
            ("a", 4, "core"),
            ("b", 3, "core"),
            ("c", 2, "edge"),
            ("d", 1, "edge"),
        ];
        for (module, n, boundary) in layout {
            for _ in 0..n {
                events.push(DriftEvent::new(ts, module).with_boundary(boundary));
            }
        }
        let refs = events.iter().collect::<Vec<_>>();
        let summary = summarize_dominance(&refs, 1);
        assert_eq!(summary.top_modules.len(), 1);
        assert_eq!(summary.module_count, 4);
        assert_eq!(summary.total_contribution, 10);
        assert!((summary.dominance_ratio - 0.4).abs() < 1e-12);
        assert!((summary.top3_share - 0.9).abs() < 1e-12);
        assert!(summary.cross_boundary.is_cross_boundary);
        assert_eq!(summary.cross_boundary.boundary_count, 2);
        assert_eq!(summary.cross_boundary.boundaries[0].boundary, "core");
        assert_eq!(summary.cross_boundary.boundaries[0].contribution, 7);
    }

    #[test]
    fn empty_input_is_neutral() {
        let summary = summarize_dominance(&[], 5);
        assert_eq!(summary.dominance_ratio, 0.0);
        assert_eq!(summary.top3_share, 0.0);
        assert!(summary.top_modules.is_empty());
        assert_eq!(summary.cross_boundary.boundary_count, 0);
    }
}
