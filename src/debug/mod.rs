//! Debug bundle writer for inspecting one chart + summary run.
//!
//! The bundle is a Markdown file under `debug/` with the resolved filter,
//! admission decisions, the aligned series (gaps shown as `-`), per-entity
//! statistics and the summary text with its source.

use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Local;

use crate::domain::{ChartDataset, FilterSpec, RunConfig, SummaryReport};
use crate::error::AppError;

pub fn write_debug_bundle(
    dir: &Path,
    config: &RunConfig,
    spec: &FilterSpec,
    chart: &ChartDataset,
    summary: &SummaryReport,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!(
        "ct_debug_{}_{}-{}_{ts}.md",
        config.dataset.api_name(),
        spec.start_year(),
        spec.end_year()
    ));

    let mut file = File::create(&path).map_err(|e| AppError::new(4, format!("Failed to create debug file: {e}")))?;
    render_bundle(&mut file, config, spec, chart, summary)
        .map_err(|e| AppError::new(4, format!("Failed to write debug bundle: {e}")))?;

    Ok(path)
}

fn render_bundle<W: Write>(
    out: &mut W,
    config: &RunConfig,
    spec: &FilterSpec,
    chart: &ChartDataset,
    summary: &SummaryReport,
) -> std::io::Result<()> {
    writeln!(out, "# ct debug bundle")?;
    writeln!(out, "- generated: {}", Local::now().to_rfc3339())?;
    writeln!(out, "- dataset: {} ({})", config.dataset.api_name(), config.dataset.unit_label())?;
    writeln!(out, "- source: {:?}", config.source)?;
    if let Some(csv) = &config.csv_path {
        writeln!(out, "- csv: {}", csv.display())?;
    }
    if let Some(url) = &config.api_url {
        writeln!(out, "- api_url: {url}")?;
    }
    writeln!(out, "- duplicate_policy: {:?}", config.duplicate_policy)?;

    writeln!(out, "\n## Filter")?;
    writeln!(out, "- entities: {}", spec.entities().join(", "))?;
    writeln!(out, "- years: {}..={} ({} years)", spec.start_year(), spec.end_year(), spec.year_count())?;

    writeln!(out, "\n## Admission")?;
    writeln!(out, "| entity | plotted | defined values | color / reason |")?;
    writeln!(out, "| - | - | - | - |")?;
    for s in &chart.series {
        writeln!(out, "| {} | yes | {} | {} |", s.entity, s.defined_points(), s.color.hex())?;
    }
    for e in &chart.excluded {
        writeln!(out, "| {} | no | - | {} |", e.entity, e.reason)?;
    }

    writeln!(out, "\n## Aligned series")?;
    let names: Vec<&str> = chart.series.iter().map(|s| s.entity.as_str()).collect();
    writeln!(out, "| year | {} |", names.join(" | "))?;
    writeln!(out, "|{}", " - |".repeat(names.len() + 1))?;
    for (idx, year) in chart.years.iter().enumerate() {
        let cells: Vec<String> = chart
            .series
            .iter()
            .map(|s| fmt_opt(s.points.get(idx).copied().flatten()))
            .collect();
        writeln!(out, "| {year} | {} |", cells.join(" | "))?;
    }

    writeln!(out, "\n## Statistics")?;
    writeln!(
        out,
        "| entity | points | earliest | latest | growth% | min | max | mean | trend/yr |"
    )?;
    writeln!(out, "| - | - | - | - | - | - | - | - | - |")?;
    for s in &summary.stats {
        writeln!(
            out,
            "| {} | {} | {} @ {} | {} @ {} | {:.1} | {} @ {} | {} @ {} | {:.4} | {} |",
            s.entity,
            s.points,
            fmt_opt(Some(s.earliest_value)),
            s.earliest_year,
            fmt_opt(Some(s.latest_value)),
            s.latest_year,
            s.growth_percent,
            fmt_opt(Some(s.min_value)),
            s.min_year,
            fmt_opt(Some(s.max_value)),
            s.max_year,
            s.mean_value,
            fmt_opt(s.trend_per_year),
        )?;
    }
    for e in &summary.skipped {
        writeln!(out, "- skipped {}: {}", e.entity, e.reason)?;
    }

    writeln!(out, "\n## Summary ({:?})", summary.source)?;
    writeln!(out, "{}", summary.text)?;

    Ok(())
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.3}"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Color, Dataset, DuplicatePolicy, Exclusion, ExclusionReason, NarrativeSource, Series, SourceKind,
    };

    fn config() -> RunConfig {
        RunConfig {
            dataset: Dataset::Temperature,
            entities: vec!["A".to_string(), "B".to_string()],
            start_year: 2000,
            end_year: 2002,
            source: SourceKind::Csv,
            csv_path: None,
            api_url: None,
            duplicate_policy: DuplicatePolicy::LastWriteWins,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_dataset: None,
            export_stats: None,
            debug_bundle: true,
        }
    }

    #[test]
    fn bundle_shows_gaps_and_exclusions() {
        let config = config();
        let spec = config.filter_spec().unwrap();
        let chart = ChartDataset {
            years: vec![2000, 2001, 2002],
            series: vec![Series {
                entity: "A".to_string(),
                color: Color::rgb(59, 130, 246),
                points: vec![Some(1.0), None, Some(2.5)],
            }],
            excluded: vec![Exclusion {
                entity: "B".to_string(),
                reason: ExclusionReason::NotInData,
            }],
        };
        let summary = SummaryReport {
            stats: vec![],
            skipped: vec![],
            text: "Summary for 2000 to 2002:".to_string(),
            source: NarrativeSource::Local,
        };

        let mut buf = Vec::new();
        render_bundle(&mut buf, &config, &spec, &chart, &summary).unwrap();
        let md = String::from_utf8(buf).unwrap();

        assert!(md.starts_with("# ct debug bundle\n"));
        assert!(md.contains("| A | yes | 2 | #3b82f6 |"));
        assert!(md.contains("| B | no | - | no data returned |"));
        assert!(md.contains("| year | A |\n| - | - |\n"));
        assert!(md.contains("| 2001 | - |"));
        assert!(md.contains("| 2002 | 2.500 |"));
        assert!(md.contains("## Summary (Local)\nSummary for 2000 to 2002:"));
    }
}
