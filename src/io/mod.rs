//! Input/output helpers.
//!
//! - observation CSV ingest + validation (`ingest`)
//! - chart dataset JSON read/write (`dataset`)
//! - statistics CSV export (`export`)

pub mod dataset;
pub mod export;
pub mod ingest;

pub use dataset::*;
pub use export::*;
pub use ingest::*;
