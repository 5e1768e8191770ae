//! Data collaborators.
//!
//! - provider traits + query type (`provider`)
//! - climate API client (`http`)
//! - local CSV source (`local`)

pub mod http;
pub mod local;
pub mod provider;

pub use http::{ApiClient, ApiConfig};
pub use local::LocalSource;
pub use provider::{NarrativeProvider, NarrativeResponse, SeriesProvider, SeriesQuery};
