//! Common year axis and gap-filled series.
//!
//! Every series produced here has exactly one slot per year in the window.
//! Missing years become `None` so the renderer can span the gap instead of
//! dropping the line to zero or shortening the series.

use crate::engine::index::EntityYearIndex;

/// `[start, start + 1, ..., end]`.
pub fn year_axis(start_year: i32, end_year: i32) -> Vec<i32> {
    (start_year..=end_year).collect()
}

/// Values for `entity` at each year of `years`, `None` where unknown.
pub fn align_series(index: &EntityYearIndex, entity: &str, years: &[i32]) -> Vec<Option<f64>> {
    years.iter().map(|&y| index.value(entity, y)).collect()
}

/// Aligned series for each admitted entity, in admission order.
pub fn align_all(
    index: &EntityYearIndex,
    admitted: &[String],
    start_year: i32,
    end_year: i32,
) -> (Vec<i32>, Vec<Vec<Option<f64>>>) {
    let years = year_axis(start_year, end_year);
    let series = admitted
        .iter()
        .map(|entity| align_series(index, entity, &years))
        .collect();
    (years, series)
}
