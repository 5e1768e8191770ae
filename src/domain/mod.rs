//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw observations and the validated request (`RawRecord`, `FilterSpec`)
//! - engine outputs (`ChartDataset`, `EntityStats`, `SummaryReport`)
//! - the portable chart file (`DatasetFile`)
//! - run configuration (`Dataset`, `SourceKind`, `RunConfig`)

pub mod types;

pub use types::*;
