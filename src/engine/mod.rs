//! Aggregation and fallback-summary engine.
//!
//! The presentation layer calls exactly two functions:
//!
//! - [`aggregate`]: raw records -> gap-aware, colored chart dataset
//! - [`summarize`]: raw records (+ optional remote text) -> summary report
//!
//! Both are synchronous and operate only on the records they are given.

pub mod align;
pub mod filter;
pub mod index;
pub mod narrative;
pub mod palette;
pub mod stats;

use tracing::debug;

use crate::domain::{
    ChartDataset, DuplicatePolicy, FilterSpec, NarrativeSource, RawRecord, Series, SummaryReport,
};
use crate::error::EngineError;

pub use filter::{Admission, MIN_POINTS_TO_PLOT};
pub use index::EntityYearIndex;
pub use narrative::{format_number, render_narrative};
pub use stats::{StatsOutcome, compute_stats, growth_percent};

/// Build the chart dataset with the default (last-write-wins) duplicate policy.
pub fn aggregate(records: &[RawRecord], spec: &FilterSpec) -> Result<ChartDataset, EngineError> {
    aggregate_with_policy(records, spec, DuplicatePolicy::LastWriteWins)
}

/// Build the chart dataset: index, admit, align, color.
pub fn aggregate_with_policy(
    records: &[RawRecord],
    spec: &FilterSpec,
    policy: DuplicatePolicy,
) -> Result<ChartDataset, EngineError> {
    let index = EntityYearIndex::build_with_policy(records, policy)?;
    let Admission { admitted, excluded } = filter::admit(&index, spec)?;

    let (years, aligned) = align::align_all(&index, &admitted, spec.start_year(), spec.end_year());
    let colors = palette::assign_colors(&admitted);

    let series: Vec<Series> = admitted
        .into_iter()
        .zip(aligned)
        .zip(colors)
        .map(|((entity, points), color)| Series {
            entity,
            color,
            points,
        })
        .collect();

    debug!(
        series = series.len(),
        excluded = excluded.len(),
        years = years.len(),
        "chart dataset built"
    );

    Ok(ChartDataset {
        years,
        series,
        excluded,
    })
}

/// Build the summary report.
///
/// A non-blank `remote` narrative is used verbatim; otherwise the narrative
/// is rendered locally from the same records. When no requested entity has
/// any in-range value the report says so explicitly (`Unavailable`).
pub fn summarize(
    records: &[RawRecord],
    spec: &FilterSpec,
    remote: Option<&str>,
    unit: Option<&str>,
) -> SummaryReport {
    let StatsOutcome { stats, skipped } = compute_stats(records, spec);

    if let Some(text) = remote.map(str::trim).filter(|t| !t.is_empty()) {
        return SummaryReport {
            stats,
            skipped,
            text: text.to_string(),
            source: NarrativeSource::Remote,
        };
    }

    if stats.is_empty() {
        return SummaryReport {
            stats,
            skipped,
            text: unavailable_text(spec),
            source: NarrativeSource::Unavailable,
        };
    }

    let text = render_narrative(&stats, spec, unit);
    SummaryReport {
        stats,
        skipped,
        text,
        source: NarrativeSource::Local,
    }
}

/// Text shown when neither the remote nor the local summary produced anything.
pub fn unavailable_text(spec: &FilterSpec) -> String {
    format!(
        "Summary unavailable: none of the selected entities have data between {} and {}.",
        spec.start_year(),
        spec.end_year()
    )
}
