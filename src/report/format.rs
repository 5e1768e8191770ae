//! Formatted terminal output: chart overview, summary text, statistics table.
//!
//! Formatting lives in one place so:
//! - the engine stays free of presentation concerns
//! - output changes are localized (important for snapshot tests)

use crate::domain::{ChartDataset, Dataset, EntityStats, Exclusion, FilterSpec, NarrativeSource, SummaryReport};
use crate::engine::format_number;
use crate::plot::glyph_for;

/// Header, year axis, plotted series and exclusions.
pub fn format_chart_overview(chart: &ChartDataset, dataset: Dataset, spec: &FilterSpec) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== ct - {} ({}) ===\n",
        dataset.display_name(),
        dataset.unit_label()
    ));
    out.push_str(&format!(
        "Period: {} - {} ({} years)\n",
        spec.start_year(),
        spec.end_year(),
        chart.years.len()
    ));

    out.push_str("\nSeries:\n");
    for (pos, series) in chart.series.iter().enumerate() {
        out.push_str(&format!(
            "  {} {:<24} {}  {}/{} values\n",
            glyph_for(pos),
            truncate(&series.entity, 24),
            series.color.hex(),
            series.defined_points(),
            chart.years.len()
        ));
    }

    if !chart.excluded.is_empty() {
        out.push_str("\nNot plotted:\n");
        out.push_str(&format_exclusions(&chart.excluded));
    }

    out
}

/// The narrative plus where it came from.
pub fn format_summary(report: &SummaryReport) -> String {
    let source = match report.source {
        NarrativeSource::Remote => "remote",
        NarrativeSource::Local => "computed locally",
        NarrativeSource::Unavailable => "unavailable",
    };

    let mut out = format!("Summary ({source}):\n{}\n", report.text);
    if !report.skipped.is_empty() {
        out.push_str("\nSkipped:\n");
        out.push_str(&format_exclusions(&report.skipped));
    }
    out
}

/// Per-entity statistics as an aligned table.
pub fn format_stats_table(stats: &[EntityStats], unit: &str) -> String {
    let mut out = String::new();
    out.push_str(&format!("Statistics ({unit}):\n"));
    out.push_str(
        format!(
            "{:<24} {:>6} {:>11} {:>14} {:>14} {:>9} {:>14} {:>14} {:>14}\n",
            "entity", "points", "period", "first", "last", "growth%", "min", "max", "mean"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<24} {:-<6} {:-<11} {:-<14} {:-<14} {:-<9} {:-<14} {:-<14} {:-<14}\n",
            "", "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for s in stats {
        out.push_str(
            format!(
                "{:<24} {:>6} {:>11} {:>14} {:>14} {:>9.1} {:>14} {:>14} {:>14}\n",
                truncate(&s.entity, 24),
                s.points,
                format!("{}-{}", s.earliest_year, s.latest_year),
                format_number(s.earliest_value),
                format_number(s.latest_value),
                s.growth_percent,
                format_number(s.min_value),
                format_number(s.max_value),
                format_number(s.mean_value),
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// A titled bullet list (entity or city options).
pub fn format_options(title: &str, items: &[String]) -> String {
    let mut out = format!("{title} ({}):\n", items.len());
    for item in items {
        out.push_str(&format!("  {item}\n"));
    }
    out
}

fn format_exclusions(excluded: &[Exclusion]) -> String {
    excluded
        .iter()
        .map(|e| format!("  - {}: {}\n", e.entity, e.reason))
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
