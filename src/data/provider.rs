//! Collaborator seams: where raw records and remote narratives come from.
//!
//! The engine never talks to the network itself. The orchestrator is handed
//! implementations of these traits (HTTP client, local CSV, or test fakes).

use serde::Deserialize;

use crate::domain::{Dataset, FilterSpec, RawRecord};
use crate::error::EngineError;

/// Separator used when several entities travel in one query parameter.
pub const ENTITY_DELIMITER: &str = ",";

/// Parameters sent to both collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesQuery {
    pub dataset: Dataset,
    pub entities: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,
}

impl SeriesQuery {
    pub fn new(dataset: Dataset, spec: &FilterSpec) -> Self {
        Self {
            dataset,
            entities: spec.entities().to_vec(),
            start_year: spec.start_year(),
            end_year: spec.end_year(),
        }
    }
}

/// Body returned by the narrative endpoint: either `summary` or `error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NarrativeResponse {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl NarrativeResponse {
    pub fn summary(text: impl Into<String>) -> Self {
        Self {
            summary: Some(text.into()),
            error: None,
        }
    }

    /// The summary text if present and not blank.
    pub fn usable_summary(&self) -> Option<&str> {
        self.summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Supplies raw observations for a query.
pub trait SeriesProvider: Send + Sync {
    fn fetch_series(&self, query: &SeriesQuery) -> Result<Vec<RawRecord>, EngineError>;
}

/// Supplies a ready-made narrative for a query.
pub trait NarrativeProvider: Send + Sync {
    fn fetch_narrative(&self, query: &SeriesQuery) -> Result<NarrativeResponse, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_carries_the_filter() {
        let spec = FilterSpec::new(["India", "Brazil"], 1950, 1960).unwrap();
        let q = SeriesQuery::new(Dataset::Co2, &spec);
        assert_eq!(q.entities, vec!["India", "Brazil"]);
        assert_eq!((q.start_year, q.end_year), (1950, 1960));
    }

    #[test]
    fn narrative_response_shapes() {
        let ok: NarrativeResponse = serde_json::from_str(r#"{"summary":"Rising."}"#).unwrap();
        assert_eq!(ok.usable_summary(), Some("Rising."));

        let err: NarrativeResponse = serde_json::from_str(r#"{"error":"quota"}"#).unwrap();
        assert_eq!(err.usable_summary(), None);
        assert_eq!(err.error.as_deref(), Some("quota"));

        let blank: NarrativeResponse = serde_json::from_str(r#"{"summary":"  "}"#).unwrap();
        assert_eq!(blank.usable_summary(), None);
    }
}
