//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - produced by the data collaborators (remote API or local CSV)
//! - consumed by the engine without copying the raw payload around
//! - exported to JSON/CSV and reloaded later for plotting

use std::collections::HashSet;
use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One observation: a metric value for an entity in a given year.
///
/// `value` is `None` when the provider knows the (entity, year) pair but has
/// no measurement for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub entity: String,
    pub year: i32,
    pub value: Option<f64>,
}

impl RawRecord {
    pub fn new(entity: impl Into<String>, year: i32, value: Option<f64>) -> Self {
        Self {
            entity: entity.into(),
            year,
            value,
        }
    }
}

/// Joins a country and one of its cities (or states) into a single entity name.
pub const CITY_SEPARATOR: &str = " / ";

/// Widest year window a request may cover.
pub const MAX_YEAR_SPAN: i64 = 5_000;

/// `"Country / City"` -> `("Country", Some("City"))`; a bare country has no city.
pub fn split_entity(entity: &str) -> (&str, Option<&str>) {
    match entity.split_once(CITY_SEPARATOR) {
        Some((country, city)) if !city.trim().is_empty() => (country.trim(), Some(city.trim())),
        _ => (entity.trim(), None),
    }
}

pub fn city_entity(country: &str, city: &str) -> String {
    format!("{country}{CITY_SEPARATOR}{city}")
}

/// A validated request: which entities, which inclusive year window.
///
/// Construction is the only validation point, so every `FilterSpec` that
/// exists has at least one entity, `end_year > start_year` and a window of
/// at most [`MAX_YEAR_SPAN`] years.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    entities: Vec<String>,
    start_year: i32,
    end_year: i32,
}

impl FilterSpec {
    /// Build a filter; duplicate entity names are collapsed (first one kept).
    pub fn new<I, S>(entities: I, start_year: i32, end_year: i32) -> Result<Self, EngineError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let entities: Vec<String> = entities
            .into_iter()
            .map(Into::into)
            .filter(|e| seen.insert(e.clone()))
            .collect();

        if entities.is_empty() {
            return Err(EngineError::InvalidFilterSpec(
                "at least one entity must be selected".to_string(),
            ));
        }
        if end_year <= start_year {
            return Err(EngineError::InvalidFilterSpec(format!(
                "end year ({end_year}) must be after start year ({start_year})"
            )));
        }
        if span(start_year, end_year) > MAX_YEAR_SPAN {
            return Err(EngineError::InvalidFilterSpec(format!(
                "year window {start_year}..={end_year} is wider than {MAX_YEAR_SPAN} years"
            )));
        }

        Ok(Self {
            entities,
            start_year,
            end_year,
        })
    }

    pub fn entities(&self) -> &[String] {
        &self.entities
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        self.end_year
    }

    pub fn contains_year(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }

    /// Number of years in the inclusive window.
    pub fn year_count(&self) -> usize {
        // Bounded by MAX_YEAR_SPAN at construction.
        span(self.start_year, self.end_year) as usize
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.start_year..=self.end_year
    }
}

/// Inclusive number of years, without `i32` overflow.
fn span(start_year: i32, end_year: i32) -> i64 {
    i64::from(end_year) - i64::from(start_year) + 1
}

/// What to do when the same (entity, year) pair appears more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The later record in input order overwrites the earlier one.
    #[default]
    LastWriteWins,
    /// A second record for the same pair is a computation error.
    Reject,
}

/// Why an entity was left out of a chart or a summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The provider returned no records at all for the entity.
    NotInData,
    /// Fewer than two defined values inside the year window.
    TooFewPoints { points: usize },
    /// The entity's records could not be used (e.g. non-finite values).
    Malformed { message: String },
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExclusionReason::NotInData => write!(f, "no data returned"),
            ExclusionReason::TooFewPoints { points } => {
                write!(f, "only {points} value(s) in range (need at least 2)")
            }
            ExclusionReason::Malformed { message } => write!(f, "malformed data: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub entity: String,
    pub reason: ExclusionReason,
}

/// An sRGB color, serialized as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn parse_hex(raw: &str) -> Option<Self> {
        let digits = raw.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.hex()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse_hex(&value).ok_or_else(|| format!("invalid color '{value}', expected #rrggbb"))
    }
}

/// One plotted line: an admitted entity with values aligned to `ChartDataset::years`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub entity: String,
    pub color: Color,
    /// `None` marks a gap to be spanned by the renderer, never a zero.
    pub points: Vec<Option<f64>>,
}

impl Series {
    pub fn defined_points(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }
}

/// Chart-ready output of `engine::aggregate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub years: Vec<i32>,
    pub series: Vec<Series>,
    /// Requested entities that were left out of `series`, with the reason.
    #[serde(default)]
    pub excluded: Vec<Exclusion>,
}

/// Portable chart file written by `--export` and read back by `ct plot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub tool: String,
    pub dataset: Dataset,
    pub unit: String,
    pub start_year: i32,
    pub end_year: i32,
    pub chart: ChartDataset,
}

/// Descriptive statistics for one entity over the requested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityStats {
    pub entity: String,
    pub min_value: f64,
    pub min_year: i32,
    pub max_value: f64,
    pub max_year: i32,
    pub earliest_year: i32,
    pub earliest_value: f64,
    pub latest_year: i32,
    pub latest_value: f64,
    /// Endpoint growth in percent, one decimal; `0.0` when the earliest value is zero.
    pub growth_percent: f64,
    pub mean_value: f64,
    /// Number of in-range observations with a defined value.
    pub points: usize,
    /// Least-squares slope in value units per year (needs two distinct years).
    pub trend_per_year: Option<f64>,
}

/// Where the summary text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NarrativeSource {
    Remote,
    Local,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub stats: Vec<EntityStats>,
    /// Entities whose statistics could not be computed.
    pub skipped: Vec<Exclusion>,
    pub text: String,
    pub source: NarrativeSource,
}

/// Known metric datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    Temperature,
    Co2,
}

/// How multiple observations for one (entity, year) collapse to a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Sum,
}

impl Dataset {
    /// Name used in API query strings.
    pub fn api_name(self) -> &'static str {
        match self {
            Dataset::Temperature => "temperature",
            Dataset::Co2 => "co2",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Dataset::Temperature => "Average temperature",
            Dataset::Co2 => "CO₂ emissions",
        }
    }

    pub fn unit_label(self) -> &'static str {
        match self {
            Dataset::Temperature => "°C",
            Dataset::Co2 => "metric tons",
        }
    }

    pub fn aggregation(self) -> Aggregation {
        match self {
            Dataset::Temperature => Aggregation::Mean,
            Dataset::Co2 => Aggregation::Sum,
        }
    }
}

/// Which collaborator supplies the raw records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// The remote data and summary API.
    Http,
    /// A local CSV file (no remote narrative; summaries are computed locally).
    Csv,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and environment).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub dataset: Dataset,
    pub entities: Vec<String>,
    pub start_year: i32,
    pub end_year: i32,

    pub source: SourceKind,
    pub csv_path: Option<PathBuf>,
    pub api_url: Option<String>,
    pub duplicate_policy: DuplicatePolicy,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_dataset: Option<PathBuf>,
    pub export_stats: Option<PathBuf>,
    pub debug_bundle: bool,
}

impl RunConfig {
    pub fn filter_spec(&self) -> Result<FilterSpec, EngineError> {
        FilterSpec::new(self.entities.iter().cloned(), self.start_year, self.end_year)
    }
}
