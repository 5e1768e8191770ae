//! Local CSV-backed series provider.
//!
//! Used when the API is unavailable (or for reproducible offline runs). It has
//! no narrative counterpart: summaries are always rendered locally.

use std::path::Path;

use crate::data::provider::{SeriesProvider, SeriesQuery};
use crate::domain::{Dataset, RawRecord};
use crate::error::{AppError, EngineError};
use crate::io::ingest::{IngestedData, load_observations};

#[derive(Debug, Clone)]
pub struct LocalSource {
    records: Vec<RawRecord>,
    entities: Vec<String>,
}

impl LocalSource {
    pub fn load(path: &Path, dataset: Dataset) -> Result<Self, AppError> {
        Ok(Self::from_ingest(load_observations(path, dataset)?))
    }

    pub fn from_ingest(data: IngestedData) -> Self {
        let entities = data.entities().to_vec();
        Self {
            records: data.records,
            entities,
        }
    }

    /// Entities present in the file, in first-seen order.
    pub fn entities(&self) -> &[String] {
        &self.entities
    }
}

impl SeriesProvider for LocalSource {
    fn fetch_series(&self, query: &SeriesQuery) -> Result<Vec<RawRecord>, EngineError> {
        Ok(self
            .records
            .iter()
            .filter(|r| {
                r.year >= query.start_year
                    && r.year <= query.end_year
                    && query.entities.iter().any(|e| *e == r.entity)
            })
            .cloned()
            .collect())
    }
}
