//! Fetch orchestration for one chart + summary request.
//!
//! Each invocation:
//! 1. takes a fresh id from the [`InvocationGuard`]
//! 2. fetches series and narrative concurrently (independent; one failing
//!    never cancels the other)
//! 3. resolves both terminal states into a chart + summary, or a failure
//! 4. publishes the result only if no newer invocation has started
//!
//! The resolution step is a pure function ([`resolve`]) so the transition
//! rules can be tested without threads or a network.
//!
//! [`FetchOrchestrator::invoke_summary`] runs the same fetches but only
//! resolves the summary, so entities too sparse to plot still get statistics.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::data::provider::{NarrativeProvider, NarrativeResponse, SeriesProvider, SeriesQuery};
use crate::domain::{ChartDataset, Dataset, DuplicatePolicy, FilterSpec, RawRecord, SummaryReport};
use crate::engine;
use crate::error::{EngineError, FetchTarget};

/// Progress of the series fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesState {
    Idle,
    Fetching,
    Ready(Vec<RawRecord>),
    Failed(EngineError),
}

/// Progress of the narrative fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum NarrativeState {
    Idle,
    Fetching,
    Ready(NarrativeResponse),
    Failed(EngineError),
}

/// A started request, tagged with its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub id: u64,
    pub spec: FilterSpec,
}

/// Hands out increasing invocation ids; only the latest one may publish.
#[derive(Debug, Default)]
pub struct InvocationGuard {
    latest: AtomicU64,
}

impl InvocationGuard {
    pub fn begin(&self, spec: FilterSpec) -> Invocation {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        Invocation { id, spec }
    }

    pub fn is_current(&self, id: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == id
    }

    pub fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// What an invocation ended with, from the caller's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    Completed {
        id: u64,
        chart: ChartDataset,
        summary: SummaryReport,
    },
    Failed {
        id: u64,
        error: EngineError,
    },
    /// A newer invocation started before this one finished; its result was dropped.
    Superseded { id: u64 },
}

/// Outcome of a summary-only invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    Completed { id: u64, summary: SummaryReport },
    Failed { id: u64, error: EngineError },
    Superseded { id: u64 },
}

impl InvocationOutcome {
    pub fn id(&self) -> u64 {
        match self {
            InvocationOutcome::Completed { id, .. }
            | InvocationOutcome::Failed { id, .. }
            | InvocationOutcome::Superseded { id } => *id,
        }
    }
}

/// The most recent result that was allowed to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Published {
    pub id: u64,
    pub spec: FilterSpec,
    pub result: Result<(ChartDataset, SummaryReport), EngineError>,
}

pub struct FetchOrchestrator {
    series: Box<dyn SeriesProvider>,
    narrative: Option<Box<dyn NarrativeProvider>>,
    dataset: Dataset,
    policy: DuplicatePolicy,
    guard: InvocationGuard,
    published: Mutex<Option<Published>>,
}

impl FetchOrchestrator {
    /// `narrative = None` means no remote summaries: every summary is rendered locally.
    pub fn new(
        series: Box<dyn SeriesProvider>,
        narrative: Option<Box<dyn NarrativeProvider>>,
        dataset: Dataset,
    ) -> Self {
        Self {
            series,
            narrative,
            dataset,
            policy: DuplicatePolicy::default(),
            guard: InvocationGuard::default(),
            published: Mutex::new(None),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dataset(&self) -> Dataset {
        self.dataset
    }

    /// Run one invocation to completion.
    ///
    /// Safe to call from several threads; a call that is overtaken by a newer
    /// one returns [`InvocationOutcome::Superseded`].
    pub fn invoke(&self, spec: FilterSpec) -> InvocationOutcome {
        let Invocation { id, spec } = self.guard.begin(spec);
        let (series, narrative) = self.fetch_both(id, &spec);
        let result = resolve(&spec, series, narrative, self.dataset, self.policy);

        let mut published = self.published.lock().unwrap_or_else(PoisonError::into_inner);
        if !self.guard.is_current(id) {
            debug!(invocation = id, latest = self.guard.latest(), "discarding superseded result");
            return InvocationOutcome::Superseded { id };
        }
        *published = Some(Published {
            id,
            spec,
            result: result.clone(),
        });

        match result {
            Ok((chart, summary)) => InvocationOutcome::Completed { id, chart, summary },
            Err(error) => InvocationOutcome::Failed { id, error },
        }
    }

    /// Like [`invoke`](Self::invoke) without building the chart.
    ///
    /// Shares the id sequence with `invoke`; the published chart result is left untouched.
    pub fn invoke_summary(&self, spec: FilterSpec) -> SummaryOutcome {
        let Invocation { id, spec } = self.guard.begin(spec);
        let (series, narrative) = self.fetch_both(id, &spec);
        let result = resolve_summary(&spec, series, narrative, self.dataset, self.policy);

        if !self.guard.is_current(id) {
            debug!(invocation = id, latest = self.guard.latest(), "discarding superseded summary");
            return SummaryOutcome::Superseded { id };
        }
        match result {
            Ok(summary) => SummaryOutcome::Completed { id, summary },
            Err(error) => SummaryOutcome::Failed { id, error },
        }
    }

    /// Run the series and narrative fetches concurrently and wait for both.
    fn fetch_both(&self, id: u64, spec: &FilterSpec) -> (SeriesState, NarrativeState) {
        let query = SeriesQuery::new(self.dataset, spec);
        debug!(invocation = id, entities = ?query.entities, "invocation started");

        let query_ref = &query;
        std::thread::scope(|s| {
            let narrative = self
                .narrative
                .as_deref()
                .map(|provider| s.spawn(move || fetch_narrative(provider, query_ref, id)));
            let series = fetch_series(self.series.as_ref(), query_ref, id);
            let narrative = match narrative {
                Some(handle) => handle.join().unwrap_or_else(|_| {
                    NarrativeState::Failed(EngineError::fetch(
                        FetchTarget::Narrative,
                        "narrative fetch panicked",
                    ))
                }),
                None => NarrativeState::Failed(EngineError::fetch(
                    FetchTarget::Narrative,
                    "no narrative provider configured",
                )),
            };
            (series, narrative)
        })
    }

    /// The result of the latest invocation that completed while still current.
    pub fn latest_published(&self) -> Option<Published> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn fetch_series(provider: &dyn SeriesProvider, query: &SeriesQuery, id: u64) -> SeriesState {
    debug!(invocation = id, state = ?SeriesState::Fetching, "series");
    match provider.fetch_series(query) {
        Ok(records) => {
            debug!(invocation = id, records = records.len(), "series ready");
            SeriesState::Ready(records)
        }
        Err(err) => {
            warn!(invocation = id, error = %err, "series fetch failed");
            SeriesState::Failed(err)
        }
    }
}

fn fetch_narrative(provider: &dyn NarrativeProvider, query: &SeriesQuery, id: u64) -> NarrativeState {
    debug!(invocation = id, state = ?NarrativeState::Fetching, "narrative");
    match provider.fetch_narrative(query) {
        Ok(resp) => NarrativeState::Ready(resp),
        Err(err) => {
            info!(invocation = id, error = %err, "narrative fetch failed; using local summary");
            NarrativeState::Failed(err)
        }
    }
}

/// Turn the two fetch outcomes into the invocation result.
///
/// - series failed: the failure is the result, nothing is computed
/// - series ready + usable remote narrative: remote text is used verbatim
/// - series ready otherwise: the summary is computed locally from the same records
pub fn resolve(
    spec: &FilterSpec,
    series: SeriesState,
    narrative: NarrativeState,
    dataset: Dataset,
    policy: DuplicatePolicy,
) -> Result<(ChartDataset, SummaryReport), EngineError> {
    let records = ready_records(series)?;
    let chart = engine::aggregate_with_policy(&records, spec, policy)?;
    let summary = summary_from(&records, spec, &narrative, dataset);
    Ok((chart, summary))
}

/// Summary-only resolution: a failed series fetch is still terminal, the
/// plotting threshold is not applied.
pub fn resolve_summary(
    spec: &FilterSpec,
    series: SeriesState,
    narrative: NarrativeState,
    dataset: Dataset,
    policy: DuplicatePolicy,
) -> Result<SummaryReport, EngineError> {
    let records = ready_records(series)?;
    // Duplicates are rejected here too, not only when charting.
    engine::EntityYearIndex::build_with_policy(&records, policy)?;
    Ok(summary_from(&records, spec, &narrative, dataset))
}

fn ready_records(series: SeriesState) -> Result<Vec<RawRecord>, EngineError> {
    match series {
        SeriesState::Ready(records) => Ok(records),
        SeriesState::Failed(err) => Err(err),
        SeriesState::Idle | SeriesState::Fetching => {
            Err(EngineError::fetch(FetchTarget::Series, "series fetch did not complete"))
        }
    }
}

fn summary_from(
    records: &[RawRecord],
    spec: &FilterSpec,
    narrative: &NarrativeState,
    dataset: Dataset,
) -> SummaryReport {
    let remote = match narrative {
        NarrativeState::Ready(resp) => {
            if let Some(err) = &resp.error {
                info!(error = %err, "remote narrative returned an error; using local summary");
            }
            resp.usable_summary()
        }
        NarrativeState::Idle | NarrativeState::Fetching | NarrativeState::Failed(_) => None,
    };

    engine::summarize(records, spec, remote, Some(dataset.unit_label()))
}
