//! `climate-trends` library crate.
//!
//! The binary (`ct`) is a thin wrapper around this library so that:
//!
//! - the aggregation engine is testable without spawning processes
//! - collaborators (API, CSV) are swappable behind traits
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod engine;
pub mod error;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
