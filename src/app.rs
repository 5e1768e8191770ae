//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and installs logging
//! - runs the chart + summary pipeline
//! - prints overviews/plots/summaries
//! - writes optional exports and debug bundles

use std::path::Path;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::cli::{Command, OptionsArgs, PlotArgs, RunArgs};
use crate::data::LocalSource;
use crate::domain::{Dataset, RunConfig, SourceKind, SummaryReport, split_entity};
use crate::error::AppError;

pub mod orchestrator;
pub mod pipeline;

/// Entry point for the `ct` binary.
pub fn run() -> Result<(), AppError> {
    // `ct -e India ...` behaves like `ct run -e India ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run(args) => handle_run(args, OutputMode::Full),
        Command::Chart(args) => handle_run(args, OutputMode::ChartOnly),
        Command::Summary(args) => handle_summary(args),
        Command::Options(args) => handle_options(args),
        Command::Plot(args) => handle_plot(args),
    }
}

/// Log to stderr; `RUST_LOG` wins, otherwise `warn` (or `debug` with `--verbose`).
fn init_tracing(verbose: bool) {
    let default = if verbose { LevelFilter::DEBUG } else { LevelFilter::WARN };
    let filter = EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Full,
    ChartOnly,
}

fn handle_run(args: RunArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    let run = pipeline::run_chart(&config)?;
    let unit = config.dataset.unit_label();

    println!(
        "{}",
        crate::report::format_chart_overview(&run.chart, config.dataset, &run.spec)
    );
    if config.plot {
        println!(
            "{}",
            crate::plot::render_chart(&run.chart, unit, config.plot_width, config.plot_height)
        );
    }

    if mode == OutputMode::Full {
        print_summary(&run.summary, unit);
    }

    // Optional exports.
    if let Some(path) = &config.export_dataset {
        let file = crate::io::dataset_file(&run.chart, config.dataset, &run.spec);
        crate::io::write_dataset_json(path, &file)?;
        info!(path = %path.display(), "chart dataset exported");
    }
    if let Some(path) = &config.export_stats {
        crate::io::write_stats_csv(path, &run.summary.stats, config.dataset)?;
        info!(path = %path.display(), "statistics exported");
    }
    if config.debug_bundle {
        let path = crate::debug::write_debug_bundle(
            Path::new("debug"),
            &config,
            &run.spec,
            &run.chart,
            &run.summary,
        )?;
        eprintln!("Debug bundle written to {}", path.display());
    }

    Ok(())
}

/// `ct summary`: no chart is built, so an entity with a single in-range
/// value is still summarized.
fn handle_summary(args: RunArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args);
    if config.export_dataset.is_some() || config.debug_bundle {
        return Err(AppError::new(
            2,
            "`--export` and `--debug-bundle` need a chart; use `ct run` instead.",
        ));
    }

    let run = pipeline::run_summary(&config)?;
    print_summary(&run.summary, config.dataset.unit_label());

    if let Some(path) = &config.export_stats {
        crate::io::write_stats_csv(path, &run.summary.stats, config.dataset)?;
        info!(path = %path.display(), "statistics exported");
    }
    Ok(())
}

fn print_summary(summary: &SummaryReport, unit: &str) {
    println!("{}", crate::report::format_summary(summary));
    if !summary.stats.is_empty() {
        println!("{}", crate::report::format_stats_table(&summary.stats, unit));
    }
}

fn handle_options(args: OptionsArgs) -> Result<(), AppError> {
    let dataset = args.source.dataset;
    let (title, items) = match args.source.resolved_source() {
        SourceKind::Http => {
            let client = pipeline::api_client(args.source.api_url.as_deref())?;
            match &args.country {
                Some(country) if dataset == Dataset::Temperature => {
                    (format!("Cities in {country}"), client.fetch_cities(country)?)
                }
                Some(_) => {
                    return Err(AppError::new(2, "`--country` lists cities and needs `-d temperature`."));
                }
                None => (entities_title(dataset), client.fetch_entities(dataset)?),
            }
        }
        SourceKind::Csv => {
            let path = args
                .source
                .csv
                .as_deref()
                .ok_or_else(|| AppError::new(2, "`--source csv` requires `--csv <file.csv>`."))?;
            let local = LocalSource::load(path, dataset)?;
            let entities = local.entities().iter().map(|e| split_entity(e));
            let items: Vec<String> = match &args.country {
                Some(country) => entities
                    .filter(|(c, _)| c == country)
                    .filter_map(|(_, city)| city.map(str::to_string))
                    .collect(),
                None => entities
                    .filter(|(_, city)| city.is_none())
                    .map(|(c, _)| c.to_string())
                    .collect(),
            };
            let title = match &args.country {
                Some(country) => format!("Cities in {country}"),
                None => entities_title(dataset),
            };
            (title, items)
        }
    };

    println!("{}", crate::report::format_options(&title, &items));
    Ok(())
}

fn entities_title(dataset: Dataset) -> String {
    format!("Entities with {} data", dataset.display_name())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::read_dataset_json(&args.file)?;
    println!(
        "{} ({}), {} - {}",
        file.dataset.display_name(),
        file.unit,
        file.start_year,
        file.end_year
    );
    println!(
        "{}",
        crate::plot::render_chart(&file.chart, &file.unit, args.width, args.height)
    );
    Ok(())
}

pub fn run_config_from_args(args: &RunArgs) -> RunConfig {
    RunConfig {
        dataset: args.source.dataset,
        entities: args.entities.clone(),
        start_year: args.start,
        end_year: args.end,
        source: args.source.resolved_source(),
        csv_path: args.source.csv.clone(),
        api_url: args.source.api_url.clone(),
        duplicate_policy: args.duplicates,
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_dataset: args.export.clone(),
        export_stats: args.export_stats.clone(),
        debug_bundle: args.debug_bundle,
    }
}

/// Rewrite argv so `ct` defaults to `ct run`.
///
/// Rules:
/// - `ct`                      -> `ct run`
/// - `ct -e India ...`         -> `ct run -e India ...`
/// - `ct --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "run" | "chart" | "summary" | "options" | "plot");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "run".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_flags_default_to_run() {
        assert_eq!(rewrite_args(args(&["ct"])), args(&["ct", "run"]));
        assert_eq!(
            rewrite_args(args(&["ct", "-e", "India"])),
            args(&["ct", "run", "-e", "India"])
        );
        assert_eq!(rewrite_args(args(&["ct", "--help"])), args(&["ct", "--help"]));
        assert_eq!(
            rewrite_args(args(&["ct", "plot", "--file", "x.json"])),
            args(&["ct", "plot", "--file", "x.json"])
        );
    }

    #[test]
    fn run_config_reflects_flags() {
        let cli = Cli::parse_from(rewrite_args(args(&[
            "ct",
            "-e",
            "India,Brazil",
            "--csv",
            "obs.csv",
            "--no-plot",
            "--duplicates",
            "reject",
        ])));
        let Command::Run(run_args) = cli.command else { panic!("expected run") };
        let config = run_config_from_args(&run_args);

        assert_eq!(config.source, SourceKind::Csv);
        assert!(!config.plot);
        assert_eq!(config.duplicate_policy, crate::domain::DuplicatePolicy::Reject);
        assert_eq!((config.start_year, config.end_year), (1950, 1960));
        assert_eq!(config.filter_spec().unwrap().entities().len(), 2);
    }
}
