//! Per-entity, per-year lookup built from raw records.

use std::collections::{BTreeMap, HashMap};

use crate::domain::{DuplicatePolicy, RawRecord};
use crate::error::EngineError;

/// `entity -> year -> value`, owned by a single aggregation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityYearIndex {
    entries: HashMap<String, BTreeMap<i32, Option<f64>>>,
}

impl EntityYearIndex {
    /// Index records with last-write-wins semantics.
    pub fn build(records: &[RawRecord]) -> Self {
        let mut entries: HashMap<String, BTreeMap<i32, Option<f64>>> = HashMap::new();
        for r in records {
            entries
                .entry(r.entity.clone())
                .or_default()
                .insert(r.year, r.value);
        }
        Self { entries }
    }

    /// Index records under an explicit duplicate policy.
    pub fn build_with_policy(records: &[RawRecord], policy: DuplicatePolicy) -> Result<Self, EngineError> {
        match policy {
            DuplicatePolicy::LastWriteWins => Ok(Self::build(records)),
            DuplicatePolicy::Reject => {
                let mut entries: HashMap<String, BTreeMap<i32, Option<f64>>> = HashMap::new();
                for r in records {
                    let years = entries.entry(r.entity.clone()).or_default();
                    if years.insert(r.year, r.value).is_some() {
                        return Err(EngineError::computation(
                            &r.entity,
                            format!("duplicate record for year {}", r.year),
                        ));
                    }
                }
                Ok(Self { entries })
            }
        }
    }

    pub fn contains_entity(&self, entity: &str) -> bool {
        self.entries.contains_key(entity)
    }

    /// The defined value for `(entity, year)`, if any.
    pub fn value(&self, entity: &str, year: i32) -> Option<f64> {
        self.entries.get(entity)?.get(&year).copied().flatten()
    }

    /// Number of years in `[start, end]` with a defined value.
    pub fn defined_in_range(&self, entity: &str, start: i32, end: i32) -> usize {
        self.entries
            .get(entity)
            .map(|years| years.range(start..=end).filter(|(_, v)| v.is_some()).count())
            .unwrap_or(0)
    }

    pub fn entity_count(&self) -> usize {
        self.entries.len()
    }
}
