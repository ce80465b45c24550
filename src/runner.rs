//! Run orchestrator: sequences phases, owns the cache handle, manages the
//! sampler lifecycle.
//!
//! State machine:
//!
//! ```text
//!   INIT ──▶ LOAD_PHASE ──▶ TEST_PHASE ──▶ SHUTDOWN
//!              │    ▲            │
//!              │    └ sampler runs concurrently across both phases
//!              ▼                 ▼
//!           ABORTED ◀────────────┘   (any phase setup failure)
//! ```
//!
//! Phases are strictly sequential: the test phase starts only after every
//! load worker has joined. `SHUTDOWN` stops the sampler, closes the cache
//! handle exactly once, and returns an explicit [`RunSummary`] instead of
//! exiting the process. Writing the report artifact is a distinct step
//! ([`RunSummary::write_report`]) whose failure leaves the in-memory results
//! retrievable.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::RunConfig;
use crate::error::{HarnessError, ReportError};
use crate::executor::execute_phase;
use crate::generator::PayloadGenerator;
use crate::phase::{IterationPolicy, KeySelection, OperationKind, WorkloadPhase};
use crate::report::{write_report, PhaseReport, ReportArtifact};
use crate::sampler::{StatisticsSampler, StatisticsSnapshot};
use crate::store::CacheUnderTest;

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    Aborted,
}

/// Aggregated results of a run. Produced for aborted runs too, carrying the
/// phases that finished before the failure.
#[derive(Debug)]
pub struct RunSummary {
    pub status: RunStatus,
    pub phases: Vec<PhaseReport>,
    pub snapshots: Vec<StatisticsSnapshot>,
    pub skipped_sampling_cycles: u64,
    /// The failure that aborted the run, when `status` is `Aborted`.
    pub error: Option<HarnessError>,
    /// The failure from persisting the report, when
    /// [`run_to_completion`](Runner::run_to_completion) could not write it.
    /// Terminal for the report step only; the aggregated results here stay
    /// valid.
    pub report_error: Option<ReportError>,
    /// Category filter carried over from the configuration, applied at
    /// report-generation time only.
    filter: Option<std::collections::BTreeSet<crate::report::OutcomeCategory>>,
}

impl RunSummary {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Projects the summary into a report artifact, honoring the configured
    /// category filter.
    pub fn artifact(&self) -> ReportArtifact {
        ReportArtifact::from_phases(&self.phases, self.filter.as_ref())
    }

    /// Persists the report artifact. A failure here is terminal for the
    /// report step only; `self` remains valid.
    pub fn write_report(&self, path: &Path) -> Result<(), ReportError> {
        write_report(path, &self.artifact())
    }
}

/// Drives a full two-phase run against one cache handle.
pub struct Runner<C: CacheUnderTest + 'static> {
    config: RunConfig,
    cache: Arc<C>,
}

impl<C: CacheUnderTest + 'static> Runner<C> {
    /// Validates the configuration and takes ownership of the cache handle
    /// for the run's duration.
    pub fn new(config: RunConfig, cache: Arc<C>) -> Result<Self, HarnessError> {
        config.validate()?;
        Ok(Self { config, cache })
    }

    /// Executes load phase, then test phase, with the statistics sampler
    /// running concurrently across both. Always closes the cache handle and
    /// always returns a summary; an abort is reported through
    /// [`RunSummary::status`] and [`RunSummary::error`], never by exiting the
    /// process.
    pub fn run(self) -> RunSummary {
        let config = &self.config;
        let domain = config.element_count();

        info!(
            domain,
            payload_bytes = config.payload_size_bytes,
            "run starting"
        );

        let sampler = StatisticsSampler::start(
            Arc::clone(&self.cache),
            config.statistics_tier.clone(),
            config.sampling_interval,
        );

        let (phases, error) = self.execute_phases(domain);
        let (snapshots, skipped_sampling_cycles) = sampler.stop();
        self.cache.close();

        let status = match &error {
            None => {
                info!("run completed");
                RunStatus::Completed
            },
            Some(err) => {
                error!(error = %err, "run aborted");
                RunStatus::Aborted
            },
        };

        RunSummary {
            status,
            phases,
            snapshots,
            skipped_sampling_cycles,
            error,
            report_error: None,
            filter: self.config.reported_categories.clone(),
        }
    }

    /// Like [`run`](Self::run), but also persists the report artifact when
    /// the run completed and a path is configured. A failed write never
    /// discards the run: it lands in [`RunSummary::report_error`] and the
    /// aggregated results come back regardless.
    pub fn run_to_completion(self) -> RunSummary {
        let report_path = self.config.report_output_path.clone();
        let mut summary = self.run();
        if summary.is_completed() {
            if let Some(path) = report_path {
                match summary.write_report(&path) {
                    Ok(()) => info!(path = %path.display(), "report written"),
                    Err(err) => {
                        error!(path = %path.display(), error = %err, "report write failed");
                        summary.report_error = Some(err);
                    },
                }
            }
        }
        summary
    }

    /// Runs both phases in order, returning whatever phase reports finished
    /// plus the error that cut the run short, if any.
    fn execute_phases(&self, domain: u64) -> (Vec<PhaseReport>, Option<HarnessError>) {
        let config = &self.config;
        let mut phases = Vec::with_capacity(2);

        let payload = match PayloadGenerator::new(config.payload_size_bytes) {
            Ok(payload) => payload,
            Err(err) => return (phases, Some(err.into())),
        };

        let load = WorkloadPhase {
            name: "load".to_string(),
            kind: OperationKind::Put,
            iterations: IterationPolicy::Count(domain),
            concurrency: config.load_concurrency,
            keys: KeySelection::Sequential,
        };
        match execute_phase(&*self.cache, &load, domain, &payload, config.seed) {
            Ok(report) => phases.push(report),
            Err(err) => return (phases, Some(err)),
        }

        let test = WorkloadPhase {
            name: "test".to_string(),
            kind: OperationKind::Get,
            iterations: IterationPolicy::Duration(config.test_duration),
            concurrency: config.test_concurrency,
            keys: KeySelection::Gaussian {
                mean: config.mean(),
                stdev: config.stdev(),
            },
        };
        match execute_phase(&*self.cache, &test, domain, &payload, config.seed) {
            Ok(report) => phases.push(report),
            Err(err) => return (phases, Some(err)),
        }

        (phases, None)
    }
}
