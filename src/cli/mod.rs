//! Command-line parsing for the climate trends explorer.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! engine and the collaborators.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Dataset, DuplicatePolicy, SourceKind};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ct", version, about = "Climate trends explorer: charts and summaries per country")]
pub struct Cli {
    /// Log engine decisions (exclusions, fallbacks, requests) to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build the chart and the summary (default).
    Run(RunArgs),
    /// Build and print the chart only.
    Chart(RunArgs),
    /// Print the summary only (no chart; sparse entities are still summarized).
    Summary(RunArgs),
    /// List the entities (or a country's cities) available for a dataset.
    Options(OptionsArgs),
    /// Plot a previously exported dataset JSON.
    Plot(PlotArgs),
}

/// Where records come from.
#[derive(Debug, Args, Clone)]
pub struct SourceArgs {
    /// Metric dataset.
    #[arg(short = 'd', long, value_enum, default_value_t = Dataset::Co2)]
    pub dataset: Dataset,

    /// Data source: the remote API or a local CSV.
    #[arg(long, value_enum, default_value_t = SourceKind::Http)]
    pub source: SourceKind,

    /// Local observation CSV (implies `--source csv`).
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// API base URL (overrides CLIMATE_API_URL).
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

/// Options for chart/summary runs.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Entities to compare (repeat or comma-separate).
    #[arg(short = 'e', long = "entity", value_delimiter = ',', num_args = 1.., required = true)]
    pub entities: Vec<String>,

    /// First year (inclusive).
    #[arg(long, default_value_t = 1950)]
    pub start: i32,

    /// Last year (inclusive); must be after `--start`.
    #[arg(long, default_value_t = 1960)]
    pub end: i32,

    /// How to treat repeated (entity, year) records.
    #[arg(long, value_enum, default_value_t = DuplicatePolicy::LastWriteWins)]
    pub duplicates: DuplicatePolicy,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the chart dataset to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,

    /// Export per-entity statistics to CSV.
    #[arg(long = "export-stats", value_name = "CSV")]
    pub export_stats: Option<PathBuf>,

    /// Write a Markdown debug bundle under `debug/`.
    #[arg(long = "debug-bundle")]
    pub debug_bundle: bool,
}

/// Options for listing available entities.
#[derive(Debug, Args, Clone)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// List the cities of this country instead (temperature, API only).
    #[arg(long)]
    pub country: Option<String>,
}

/// Options for plotting a saved dataset.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Dataset JSON file produced by `ct run --export`.
    #[arg(long, value_name = "JSON")]
    pub file: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

impl SourceArgs {
    /// `--csv` wins over `--source`.
    pub fn resolved_source(&self) -> SourceKind {
        if self.csv.is_some() { SourceKind::Csv } else { self.source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_entities() {
        let cli = Cli::parse_from(["ct", "run", "-e", "India,Brazil", "--start", "2000", "--end", "2010"]);
        let Command::Run(args) = cli.command else { panic!("expected run") };
        assert_eq!(args.entities, vec!["India", "Brazil"]);
        assert_eq!((args.start, args.end), (2000, 2010));
        assert_eq!(args.source.dataset, Dataset::Co2);
        assert!(!cli.verbose);
    }

    #[test]
    fn csv_flag_implies_csv_source() {
        let cli = Cli::parse_from(["ct", "chart", "-e", "A", "--csv", "obs.csv", "-d", "temperature", "-v"]);
        let Command::Chart(args) = cli.command else { panic!("expected chart") };
        assert_eq!(args.source.resolved_source(), SourceKind::Csv);
        assert_eq!(args.source.dataset, Dataset::Temperature);
        assert!(cli.verbose);
    }

    #[test]
    fn entity_is_required_for_runs() {
        assert!(Cli::try_parse_from(["ct", "run"]).is_err());
    }
}
