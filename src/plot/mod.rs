//! Terminal plotting.

pub mod ascii;

pub use ascii::{glyph_for, render_chart};
