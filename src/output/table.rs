use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::assoc::AssociationBundle;
use crate::stats::Stability;
use crate::trend::{DriftCompare, DriftSignalBundle, DriftTimeline};
use crate::types::TrendLabel;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn render_status_table(bundle: &DriftSignalBundle) -> String {
    let trend = &bundle.trend;
    let mut summary = new_table();
    summary.set_header(vec![
        "Window",
        "Events",
        "Density/day",
        "Prev density",
        "Slope",
        "Trend",
        "Modules",
        "Expansion",
    ]);
    let trend_cell = match trend.trend {
        TrendLabel::Accelerating => Cell::new(trend.trend.as_str()).fg(Color::Red),
        TrendLabel::Cooling => Cell::new(trend.trend.as_str()).fg(Color::Green),
        TrendLabel::Stable => Cell::new(trend.trend.as_str()),
    };
    summary.add_row(Row::from(vec![
        Cell::new(bundle.window.to_string()),
        Cell::new(trend.events),
        Cell::new(format!("{:.2}", trend.density)),
        Cell::new(format!("{:.2}", trend.density_prev)),
        Cell::new(format!("{:+.2}", trend.slope)),
        trend_cell,
        Cell::new(trend.unique_modules),
        Cell::new(format!("+{}", trend.expansion)),
    ]));

    let dominance = &bundle.dominance;
    let mut modules = new_table();
    modules.set_header(vec!["Rank", "Module", "Events", "Share"]);
    for module in &dominance.top_modules {
        modules.add_row(vec![
            module.rank.to_string(),
            module.module.clone(),
            module.contribution.to_string(),
            format!("{:.1}%", module.share * 100.0),
        ]);
    }

    let mut out = summary.to_string();
    out.push_str(&format!(
        "\nDominance ratio: {:.2}  Top-3 share: {:.2}  Boundaries: {}{}\n",
        dominance.dominance_ratio,
        dominance.top3_share,
        dominance.cross_boundary.boundary_count,
        if dominance.cross_boundary.is_cross_boundary {
            " (cross-boundary)"
        } else {
            ""
        }
    ));
    if dominance.top_modules.is_empty() {
        out.push_str("No drift events in window.");
    } else {
        out.push_str(&modules.to_string());
    }
    out.push_str("\nSignal only: does not affect exit code.");
    out
}

pub fn render_timeline_table(timeline: &DriftTimeline) -> String {
    let mut table = new_table();
    table.set_header(vec!["Bucket start (UTC)", "Events", "Modules"]);
    for bucket in &timeline.series {
        table.add_row(vec![
            bucket.bucket_start.to_rfc3339(),
            bucket.event_count.to_string(),
            bucket.unique_module_count.to_string(),
        ]);
    }
    format!(
        "{} timeline since {} ({} buckets)\n{}",
        timeline.bucket.as_str(),
        timeline.since.to_rfc3339(),
        timeline.series.len(),
        table
    )
}

pub fn render_compare_table(compare: &DriftCompare) -> String {
    let mut table = new_table();
    table.set_header(vec!["", "Previous (a)", "Current (b)", "Delta"]);
    table.add_row(vec![
        "Events".to_string(),
        compare.a.events.to_string(),
        compare.b.events.to_string(),
        format!("{:+}", compare.delta.events),
    ]);
    table.add_row(vec![
        "Unique modules".to_string(),
        compare.a.unique_modules.to_string(),
        compare.b.unique_modules.to_string(),
        format!("{:+}", compare.delta.unique_modules),
    ]);
    table.add_row(vec![
        "Density/day".to_string(),
        format!("{:.2}", compare.a.density),
        format!("{:.2}", compare.b.density),
        format!("{:+.2}", compare.delta.density),
    ]);
    table.add_row(vec![
        "Expansion".to_string(),
        compare.a.expansion.to_string(),
        compare.b.expansion.to_string(),
        format!("{:+}", compare.delta.expansion),
    ]);
    format!("Window {} vs previous {} days\n{table}", compare.window, compare.days)
}

pub fn render_association_table(bundle: &AssociationBundle) -> String {
    let pearson = &bundle.results.pearson;
    let robustness = &bundle.results.robustness;

    let mut summary = new_table();
    summary.set_header(vec!["X", "Y", "r", "n_eff", "Degenerate", "Median r", "IQR", "Stability"]);
    let stability_cell = match robustness.stability {
        Stability::High => Cell::new("high").fg(Color::Green),
        Stability::Medium => Cell::new("medium").fg(Color::Yellow),
        Stability::Low => Cell::new("low"),
    };
    summary.add_row(Row::from(vec![
        Cell::new(bundle.metric_x.as_str()),
        Cell::new(bundle.metric_y.as_str()),
        Cell::new(format!("{:.4}", pearson.r)),
        Cell::new(pearson.n_effective),
        Cell::new(pearson.degenerate),
        Cell::new(format!("{:.4}", robustness.median_r)),
        Cell::new(format!("{:.4}", robustness.iqr_r)),
        stability_cell,
    ]));

    let mut lags = new_table();
    lags.set_header(vec!["Lag (days)", "r", "Pairs", "Degenerate"]);
    for entry in &bundle.results.lags.entries {
        lags.add_row(vec![
            format!("{:+}", entry.lag_days),
            format!("{:.4}", entry.r),
            entry.n_pairs.to_string(),
            entry.degenerate.to_string(),
        ]);
    }

    let notes = if bundle.diagnostics.notes.is_empty() {
        "-".to_string()
    } else {
        bundle.diagnostics.notes.join(", ")
    };
    format!(
        "{summary}\nBootstrap: {} of {} samples usable, informative: {}\nNotes: {notes}\n{lags}",
        robustness.samples_used, robustness.subsamples, robustness.is_informative
    )
}
