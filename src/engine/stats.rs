//! Per-entity descriptive statistics over the requested window.
//!
//! This works on the full raw record set, independently of chart admission:
//! an entity with a single in-range value is dropped from the chart but still
//! gets statistics here.
//!
//! Conventions:
//! - min/max ties keep the first occurrence in input order
//! - endpoints (earliest/latest) and the mean use one value per year, the
//!   last record for that year in input order; an absent last record leaves
//!   the year out, as the chart does
//! - growth is `0.0` when the earliest value is zero

use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{EntityStats, Exclusion, ExclusionReason, FilterSpec, RawRecord};
use crate::error::EngineError;
use crate::math::fit_line;

/// Statistics for every entity that had data, plus entities that had to be skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsOutcome {
    pub stats: Vec<EntityStats>,
    pub skipped: Vec<Exclusion>,
}

/// Compute statistics for each requested entity, in request order.
///
/// Entities with no in-range values are omitted silently. Entities whose
/// records are malformed are reported in `skipped` and do not affect others.
pub fn compute_stats(records: &[RawRecord], spec: &FilterSpec) -> StatsOutcome {
    // Each entity is independent; collect() keeps request order.
    let results: Vec<(&String, Result<Option<EntityStats>, EngineError>)> = spec
        .entities()
        .par_iter()
        .map(|entity| (entity, entity_stats(records, entity, spec)))
        .collect();

    let mut out = StatsOutcome::default();
    for (entity, result) in results {
        match result {
            Ok(Some(stats)) => out.stats.push(stats),
            Ok(None) => debug!(entity = %entity, "no values in range; omitted from summary"),
            Err(err) => {
                warn!(entity = %entity, error = %err, "skipping entity statistics");
                out.skipped.push(Exclusion {
                    entity: entity.clone(),
                    reason: ExclusionReason::Malformed {
                        message: err.to_string(),
                    },
                });
            }
        }
    }
    out
}

/// Statistics for one entity, or `None` if it has no in-range values.
pub fn entity_stats(
    records: &[RawRecord],
    entity: &str,
    spec: &FilterSpec,
) -> Result<Option<EntityStats>, EngineError> {
    let mut min: Option<(f64, i32)> = None;
    let mut max: Option<(f64, i32)> = None;
    let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();

    let in_range = records
        .iter()
        .filter(|r| r.entity == entity && spec.contains_year(r.year));

    for r in in_range {
        let Some(value) = r.value else {
            by_year.remove(&r.year);
            continue;
        };
        if !value.is_finite() {
            return Err(EngineError::computation(
                entity,
                format!("non-finite value {value} in {}", r.year),
            ));
        }

        if min.is_none_or(|(m, _)| value < m) {
            min = Some((value, r.year));
        }
        if max.is_none_or(|(m, _)| value > m) {
            max = Some((value, r.year));
        }
        by_year.insert(r.year, value);
    }

    let (Some((min_value, min_year)), Some((max_value, max_year))) = (min, max) else {
        return Ok(None);
    };
    let (Some((&earliest_year, &earliest_value)), Some((&latest_year, &latest_value))) =
        (by_year.first_key_value(), by_year.last_key_value())
    else {
        return Ok(None);
    };

    let points = by_year.len();
    let mean_value = by_year.values().sum::<f64>() / points as f64;
    let line: Vec<(f64, f64)> = by_year.iter().map(|(&y, &v)| (y as f64, v)).collect();
    let trend_per_year = fit_line(&line).map(|fit| fit.slope);

    Ok(Some(EntityStats {
        entity: entity.to_string(),
        min_value,
        min_year,
        max_value,
        max_year,
        earliest_year,
        earliest_value,
        latest_year,
        latest_value,
        growth_percent: growth_percent(earliest_value, latest_value),
        mean_value,
        points,
        trend_per_year,
    }))
}

/// `(latest - earliest) / earliest * 100`, rounded to one decimal.
///
/// Defined as `0.0` when `earliest` is zero, so the result is always finite.
pub fn growth_percent(earliest: f64, latest: f64) -> f64 {
    if earliest == 0.0 {
        return 0.0;
    }
    let rounded = ((latest - earliest) / earliest * 100.0 * 10.0).round() / 10.0;
    // Avoid reporting "-0.0%".
    if rounded == 0.0 { 0.0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(entities: &[&str], start: i32, end: i32) -> FilterSpec {
        FilterSpec::new(entities.iter().copied(), start, end).unwrap()
    }

    #[test]
    fn basic_statistics() {
        let records = vec![
            RawRecord::new("A", 2000, Some(10.0)),
            RawRecord::new("A", 2001, Some(8.0)),
            RawRecord::new("A", 2002, Some(15.0)),
            RawRecord::new("A", 2003, Some(12.5)),
            RawRecord::new("A", 1999, Some(100.0)),
        ];
        let s = entity_stats(&records, "A", &spec(&["A"], 2000, 2003))
            .unwrap()
            .unwrap();

        assert_eq!((s.min_value, s.min_year), (8.0, 2001));
        assert_eq!((s.max_value, s.max_year), (15.0, 2002));
        assert_eq!((s.earliest_year, s.earliest_value), (2000, 10.0));
        assert_eq!((s.latest_year, s.latest_value), (2003, 12.5));
        assert_eq!(s.growth_percent, 25.0);
        assert_eq!(s.points, 4);
        assert!((s.mean_value - 11.375).abs() < 1e-12);
        assert!(s.trend_per_year.unwrap() > 0.0);
    }

    #[test]
    fn absent_later_record_clears_the_year() {
        let records = vec![
            RawRecord::new("A", 2000, Some(1.0)),
            RawRecord::new("A", 2001, Some(3.0)),
            RawRecord::new("A", 2002, Some(5.0)),
            RawRecord::new("A", 2000, None),
        ];
        let s = entity_stats(&records, "A", &spec(&["A"], 2000, 2002))
            .unwrap()
            .unwrap();
        assert_eq!((s.earliest_year, s.earliest_value), (2001, 3.0));
        assert_eq!(s.points, 2);
        assert_eq!(s.mean_value, 4.0);

        let chart = crate::engine::aggregate(&records, &spec(&["A"], 2000, 2002)).unwrap();
        assert_eq!(chart.series[0].points, vec![None, Some(3.0), Some(5.0)]);
    }

    #[test]
    fn ties_keep_first_occurrence_in_input_order() {
        let records = vec![
            RawRecord::new("A", 2003, Some(5.0)),
            RawRecord::new("A", 2001, Some(5.0)),
            RawRecord::new("A", 2002, Some(1.0)),
            RawRecord::new("A", 2000, Some(1.0)),
        ];
        let s = entity_stats(&records, "A", &spec(&["A"], 2000, 2003))
            .unwrap()
            .unwrap();
        assert_eq!(s.max_year, 2003);
        assert_eq!(s.min_year, 2002);
    }

    #[test]
    fn zero_earliest_value_gives_zero_growth() {
        let records = vec![
            RawRecord::new("A", 2000, Some(0.0)),
            RawRecord::new("A", 2001, Some(50.0)),
        ];
        let s = entity_stats(&records, "A", &spec(&["A"], 2000, 2001))
            .unwrap()
            .unwrap();
        assert_eq!(s.growth_percent, 0.0);
        assert!(s.growth_percent.is_finite());
    }

    #[test]
    fn growth_rounds_to_one_decimal() {
        assert_eq!(growth_percent(3.0, 4.0), 33.3);
        assert_eq!(growth_percent(3.0, 2.0), -33.3);
        assert_eq!(growth_percent(1000.0, 1000.1), 0.0);
        assert!(growth_percent(1000.0, 999.9).is_sign_positive());
    }

    #[test]
    fn single_point_still_gets_stats() {
        let records = vec![RawRecord::new("B", 2000, Some(5.0))];
        let s = entity_stats(&records, "B", &spec(&["B"], 2000, 2001))
            .unwrap()
            .unwrap();
        assert_eq!(s.points, 1);
        assert_eq!(s.growth_percent, 0.0);
        assert_eq!(s.trend_per_year, None);
    }

    #[test]
    fn entities_without_in_range_values_are_omitted() {
        let records = vec![
            RawRecord::new("A", 2000, Some(1.0)),
            RawRecord::new("B", 1990, Some(1.0)),
            RawRecord::new("C", 2000, None),
        ];
        let out = compute_stats(&records, &spec(&["A", "B", "C", "D"], 2000, 2001));
        assert_eq!(out.stats.len(), 1);
        assert_eq!(out.stats[0].entity, "A");
        assert!(out.skipped.is_empty());
    }

    #[test]
    fn malformed_entity_is_skipped_without_affecting_others() {
        let records = vec![
            RawRecord::new("A", 2000, Some(f64::NAN)),
            RawRecord::new("B", 2000, Some(1.0)),
            RawRecord::new("B", 2001, Some(2.0)),
        ];
        let out = compute_stats(&records, &spec(&["A", "B"], 2000, 2001));
        assert_eq!(out.stats.len(), 1);
        assert_eq!(out.stats[0].entity, "B");
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].entity, "A");
    }

    #[test]
    fn results_follow_request_order() {
        let records = vec![
            RawRecord::new("A", 2000, Some(1.0)),
            RawRecord::new("B", 2000, Some(1.0)),
            RawRecord::new("C", 2000, Some(1.0)),
        ];
        let out = compute_stats(&records, &spec(&["C", "A", "B"], 2000, 2001));
        let order: Vec<&str> = out.stats.iter().map(|s| s.entity.as_str()).collect();
        assert_eq!(order, vec!["C", "A", "B"]);
    }
}
