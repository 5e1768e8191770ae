//! Shared "chart + summary" pipeline used by the `run`, `chart` and `summary` commands.
//!
//! `summary` skips the chart (see [`run_summary`]) so sparse entities still
//! get a summary.
//!
//! Keeping this in one place avoids duplicating the workflow:
//! config -> collaborators -> orchestrator -> chart dataset + summary report
//!
//! The commands can then focus on presentation (which parts get printed).

use tracing::debug;

use crate::app::orchestrator::{FetchOrchestrator, InvocationOutcome, SummaryOutcome};
use crate::data::{ApiClient, ApiConfig, LocalSource, NarrativeProvider};
use crate::domain::{ChartDataset, FilterSpec, RunConfig, SourceKind, SummaryReport};
use crate::error::AppError;

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub invocation: u64,
    pub spec: FilterSpec,
    pub chart: ChartDataset,
    pub summary: SummaryReport,
}

/// Outputs of a summary-only run.
#[derive(Debug, Clone)]
pub struct SummaryOutput {
    pub invocation: u64,
    pub spec: FilterSpec,
    pub summary: SummaryReport,
}

/// Validate the filter, wire up collaborators and run one invocation.
pub fn run_chart(config: &RunConfig) -> Result<RunOutput, AppError> {
    // Reject bad filters before touching any collaborator.
    let spec = config.filter_spec()?;
    let orchestrator = build_orchestrator(config)?;
    run_with(&orchestrator, spec)
}

/// Run one invocation on an existing orchestrator.
pub fn run_with(orchestrator: &FetchOrchestrator, spec: FilterSpec) -> Result<RunOutput, AppError> {
    match orchestrator.invoke(spec.clone()) {
        InvocationOutcome::Completed { id, chart, summary } => Ok(RunOutput {
            invocation: id,
            spec,
            chart,
            summary,
        }),
        InvocationOutcome::Failed { error, .. } => Err(error.into()),
        InvocationOutcome::Superseded { id } => Err(AppError::new(
            4,
            format!("Invocation {id} was superseded by a newer request."),
        )),
    }
}

/// Summary without the chart: validate, wire up and run one summary invocation.
pub fn run_summary(config: &RunConfig) -> Result<SummaryOutput, AppError> {
    let spec = config.filter_spec()?;
    let orchestrator = build_orchestrator(config)?;
    run_summary_with(&orchestrator, spec)
}

pub fn run_summary_with(orchestrator: &FetchOrchestrator, spec: FilterSpec) -> Result<SummaryOutput, AppError> {
    match orchestrator.invoke_summary(spec.clone()) {
        SummaryOutcome::Completed { id, summary } => Ok(SummaryOutput {
            invocation: id,
            spec,
            summary,
        }),
        SummaryOutcome::Failed { error, .. } => Err(error.into()),
        SummaryOutcome::Superseded { id } => Err(AppError::new(
            4,
            format!("Invocation {id} was superseded by a newer request."),
        )),
    }
}

/// Pick the collaborators for the configured source.
pub fn build_orchestrator(config: &RunConfig) -> Result<FetchOrchestrator, AppError> {
    let orchestrator = match config.source {
        SourceKind::Http => {
            let client = api_client(config.api_url.as_deref())?;
            debug!(base_url = client.base_url(), "using remote API");
            let narrative: Box<dyn NarrativeProvider> = Box::new(client.clone());
            FetchOrchestrator::new(Box::new(client), Some(narrative), config.dataset)
        }
        SourceKind::Csv => {
            let path = config
                .csv_path
                .as_deref()
                .ok_or_else(|| AppError::new(2, "`--source csv` requires `--csv <file.csv>`."))?;
            debug!(path = %path.display(), "using local CSV");
            let local = LocalSource::load(path, config.dataset)?;
            FetchOrchestrator::new(Box::new(local), None, config.dataset)
        }
    };
    Ok(orchestrator.with_duplicate_policy(config.duplicate_policy))
}

/// API client from the environment, with an optional base URL override.
pub fn api_client(api_url: Option<&str>) -> Result<ApiClient, AppError> {
    let mut api = ApiConfig::from_env()?;
    if let Some(url) = api_url {
        api = api.with_base_url(url);
    }
    ApiClient::new(&api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Aggregation, Dataset, DuplicatePolicy, NarrativeSource};
    use crate::io::ingest::read_observations;

    fn local_orchestrator() -> FetchOrchestrator {
        let csv = "country,year,co2_emissions\nIndia,2000,10\nIndia,2001,12\nBrazil,2000,5\n";
        let local = LocalSource::from_ingest(read_observations(csv.as_bytes(), Aggregation::Sum).unwrap());
        FetchOrchestrator::new(Box::new(local), None, Dataset::Co2)
    }

    #[test]
    fn local_run_builds_chart_and_local_summary() {
        let orch = local_orchestrator();
        let spec = FilterSpec::new(["India", "Brazil"], 2000, 2001).unwrap();
        let out = run_with(&orch, spec).unwrap();

        assert_eq!(out.invocation, 1);
        assert_eq!(out.chart.series.len(), 1);
        assert_eq!(out.chart.excluded[0].entity, "Brazil");
        assert_eq!(out.summary.source, NarrativeSource::Local);
        assert_eq!(out.summary.stats.len(), 2);
    }

    #[test]
    fn insufficient_data_maps_to_exit_code_3() {
        let orch = local_orchestrator();
        let spec = FilterSpec::new(["Brazil"], 2000, 2001).unwrap();
        let err = run_with(&orch, spec).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn summary_run_covers_entities_the_chart_excludes() {
        let orch = local_orchestrator();
        let spec = FilterSpec::new(["Brazil"], 2000, 2001).unwrap();
        assert_eq!(run_with(&orch, spec.clone()).unwrap_err().exit_code(), 3);

        let out = run_summary_with(&orch, spec).unwrap();
        assert_eq!(out.summary.source, NarrativeSource::Local);
        assert_eq!(out.summary.stats[0].entity, "Brazil");
        assert!(out.summary.text.contains("Brazil"));
    }

    #[test]
    fn csv_source_without_path_is_an_input_error() {
        let config = RunConfig {
            dataset: Dataset::Co2,
            entities: vec!["India".to_string()],
            start_year: 2000,
            end_year: 2001,
            source: SourceKind::Csv,
            csv_path: None,
            api_url: None,
            duplicate_policy: DuplicatePolicy::LastWriteWins,
            plot: false,
            plot_width: 80,
            plot_height: 20,
            export_dataset: None,
            export_stats: None,
            debug_bundle: false,
        };
        let err = build_orchestrator(&config).err().unwrap();
        assert_eq!(err.exit_code(), 2);

        let bad_range = RunConfig {
            end_year: 1990,
            ..config
        };
        assert_eq!(run_chart(&bad_range).unwrap_err().exit_code(), 2);
    }
}
