//! Admission of requested entities based on in-range data coverage.

use tracing::debug;

use crate::domain::{Exclusion, ExclusionReason, FilterSpec};
use crate::engine::index::EntityYearIndex;
use crate::error::EngineError;

/// A single point cannot show a trend.
pub const MIN_POINTS_TO_PLOT: usize = 2;

/// Admitted entities in request order, plus the ones that were left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Admission {
    pub admitted: Vec<String>,
    pub excluded: Vec<Exclusion>,
}

/// Split the requested entities into admitted and excluded.
///
/// Fails with `InsufficientData` when nothing is admitted.
pub fn admit(index: &EntityYearIndex, spec: &FilterSpec) -> Result<Admission, EngineError> {
    let mut admitted = Vec::new();
    let mut excluded = Vec::new();

    for entity in spec.entities() {
        let reason = if !index.contains_entity(entity) {
            Some(ExclusionReason::NotInData)
        } else {
            let points = index.defined_in_range(entity, spec.start_year(), spec.end_year());
            (points < MIN_POINTS_TO_PLOT).then_some(ExclusionReason::TooFewPoints { points })
        };

        match reason {
            None => admitted.push(entity.clone()),
            Some(reason) => {
                debug!(entity = %entity, reason = %reason, "excluding entity from chart");
                excluded.push(Exclusion {
                    entity: entity.clone(),
                    reason,
                });
            }
        }
    }

    if admitted.is_empty() {
        return Err(EngineError::InsufficientData {
            start_year: spec.start_year(),
            end_year: spec.end_year(),
            excluded,
        });
    }

    Ok(Admission { admitted, excluded })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RawRecord;
    use crate::error::ErrorKind;

    fn index(records: &[RawRecord]) -> EntityYearIndex {
        EntityYearIndex::build(records)
    }

    #[test]
    fn admits_entities_with_two_points_in_request_order() {
        let idx = index(&[
            RawRecord::new("A", 2000, Some(10.0)),
            RawRecord::new("A", 2001, Some(12.0)),
            RawRecord::new("B", 2000, Some(5.0)),
            RawRecord::new("C", 2000, Some(1.0)),
            RawRecord::new("C", 2001, Some(2.0)),
        ]);
        let spec = FilterSpec::new(["C", "B", "A"], 2000, 2001).unwrap();
        let admission = admit(&idx, &spec).unwrap();

        assert_eq!(admission.admitted, vec!["C".to_string(), "A".to_string()]);
        assert_eq!(
            admission.excluded,
            vec![Exclusion {
                entity: "B".to_string(),
                reason: ExclusionReason::TooFewPoints { points: 1 },
            }]
        );
    }

    #[test]
    fn absent_values_do_not_count_toward_threshold() {
        let idx = index(&[
            RawRecord::new("A", 2000, Some(10.0)),
            RawRecord::new("A", 2001, None),
            RawRecord::new("B", 2000, Some(1.0)),
            RawRecord::new("B", 2001, Some(1.0)),
        ]);
        let spec = FilterSpec::new(["A", "B"], 2000, 2001).unwrap();
        let admission = admit(&idx, &spec).unwrap();
        assert_eq!(admission.admitted, vec!["B".to_string()]);
    }

    #[test]
    fn unknown_entity_is_reported_as_not_in_data() {
        let idx = index(&[
            RawRecord::new("A", 2000, Some(1.0)),
            RawRecord::new("A", 2001, Some(2.0)),
        ]);
        let spec = FilterSpec::new(["A", "Atlantis"], 2000, 2001).unwrap();
        let admission = admit(&idx, &spec).unwrap();
        assert_eq!(admission.excluded[0].entity, "Atlantis");
        assert_eq!(admission.excluded[0].reason, ExclusionReason::NotInData);
    }

    #[test]
    fn nothing_admitted_is_insufficient_data() {
        let idx = index(&[]);
        let spec = FilterSpec::new(["X"], 2000, 2001).unwrap();
        let err = admit(&idx, &spec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
        match err {
            EngineError::InsufficientData { excluded, .. } => assert_eq!(excluded.len(), 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
