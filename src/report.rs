//! Outcome aggregation and report artifacts.
//!
//! Workers classify each cache operation into an [`OutcomeCategory`] and
//! record it into a thread-local [`OutcomeRecorder`] (per-category counts plus
//! an HDR histogram of latencies). Recorders are merged once at the phase join
//! barrier, keeping the hot path free of shared-counter contention, and the
//! merged recorder becomes a [`PhaseReport`].
//!
//! Reports can be projected into a JSON [`ReportArtifact`], optionally
//! filtered by category. Filtering is presentation-only: excluded categories
//! are omitted from the artifact but were still counted internally.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono::Utc;
use hdrhistogram::Histogram;
use serde::{Deserialize, Serialize};

use crate::error::ReportError;

/// Artifact schema version, bumped when the JSON layout changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Latencies are recorded in microseconds; one minute is far beyond any
/// single cache operation.
const LATENCY_HIGH_US: u64 = 60_000_000;
const LATENCY_SIGFIG: u8 = 3;

/// Classification of a single operation's result.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum OutcomeCategory {
    PutOk,
    PutError,
    GetHit,
    GetMiss,
    GetError,
}

impl OutcomeCategory {
    pub const ALL: [OutcomeCategory; 5] = [
        OutcomeCategory::PutOk,
        OutcomeCategory::PutError,
        OutcomeCategory::GetHit,
        OutcomeCategory::GetMiss,
        OutcomeCategory::GetError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCategory::PutOk => "PUT_OK",
            OutcomeCategory::PutError => "PUT_ERROR",
            OutcomeCategory::GetHit => "GET_HIT",
            OutcomeCategory::GetMiss => "GET_MISS",
            OutcomeCategory::GetError => "GET_ERROR",
        }
    }

    #[inline]
    fn index(&self) -> usize {
        *self as usize
    }
}

/// Per-worker outcome accumulator: counts and latency histograms by category.
///
/// One recorder lives on each worker thread; the executor merges them after
/// the join barrier.
#[derive(Debug)]
pub struct OutcomeRecorder {
    counts: [u64; OutcomeCategory::ALL.len()],
    histograms: [Histogram<u64>; OutcomeCategory::ALL.len()],
}

impl OutcomeRecorder {
    pub fn new() -> Self {
        Self {
            counts: [0; OutcomeCategory::ALL.len()],
            histograms: std::array::from_fn(|_| {
                Histogram::new_with_bounds(1, LATENCY_HIGH_US, LATENCY_SIGFIG)
                    .expect("static histogram bounds are valid")
            }),
        }
    }

    /// Records one operation outcome with its latency.
    #[inline]
    pub fn record(&mut self, category: OutcomeCategory, latency: Duration) {
        let idx = category.index();
        self.counts[idx] += 1;
        let micros = (latency.as_micros() as u64).max(1);
        self.histograms[idx].saturating_record(micros);
    }

    /// Folds another recorder into this one. Used at the phase barrier.
    pub fn merge(&mut self, other: &OutcomeRecorder) {
        for idx in 0..OutcomeCategory::ALL.len() {
            self.counts[idx] += other.counts[idx];
            self.histograms[idx]
                .add(&other.histograms[idx])
                .expect("recorder histograms share identical bounds");
        }
    }

    #[inline]
    pub fn count(&self, category: OutcomeCategory) -> u64 {
        self.counts[category.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl Default for OutcomeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Latency percentile summary in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencySummary {
    pub min_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
    pub mean_us: f64,
}

impl LatencySummary {
    fn from_histogram(hist: &Histogram<u64>) -> Self {
        if hist.is_empty() {
            return Self::default();
        }
        Self {
            min_us: hist.min(),
            p50_us: hist.value_at_quantile(0.50),
            p95_us: hist.value_at_quantile(0.95),
            p99_us: hist.value_at_quantile(0.99),
            max_us: hist.max(),
            mean_us: hist.mean(),
        }
    }
}

/// Per-category statistics within one phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: OutcomeCategory,
    pub count: u64,
    pub ops_per_sec: f64,
    pub latency: LatencySummary,
}

/// Aggregated results of one completed phase.
#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub phase: String,
    pub elapsed: Duration,
    pub total_operations: u64,
    categories: Vec<CategoryStats>,
}

impl PhaseReport {
    /// Builds the report from the merged recorder and the phase's wall-clock
    /// elapsed time.
    pub fn from_recorder(phase: impl Into<String>, recorder: &OutcomeRecorder, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        let categories = OutcomeCategory::ALL
            .iter()
            .map(|&category| {
                let count = recorder.count(category);
                CategoryStats {
                    category,
                    count,
                    ops_per_sec: if secs > 0.0 { count as f64 / secs } else { 0.0 },
                    latency: LatencySummary::from_histogram(
                        &recorder.histograms[category.index()],
                    ),
                }
            })
            .collect();

        Self {
            phase: phase.into(),
            elapsed,
            total_operations: recorder.total(),
            categories,
        }
    }

    /// All categories, including empty ones. Never filtered.
    pub fn categories(&self) -> &[CategoryStats] {
        &self.categories
    }

    #[inline]
    pub fn count(&self, category: OutcomeCategory) -> u64 {
        self.categories[category.index()].count
    }

    /// Total operations per second across all categories.
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total_operations as f64 / secs
        } else {
            0.0
        }
    }

    fn to_row(&self, filter: Option<&BTreeSet<OutcomeCategory>>) -> PhaseRow {
        PhaseRow {
            phase: self.phase.clone(),
            elapsed_ms: self.elapsed.as_secs_f64() * 1000.0,
            total_operations: self.total_operations,
            ops_per_sec: self.ops_per_sec(),
            categories: self
                .categories
                .iter()
                .filter(|stats| {
                    stats.count > 0
                        && filter.map_or(true, |wanted| wanted.contains(&stats.category))
                })
                .cloned()
                .collect(),
        }
    }
}

/// One phase's rows in the emitted artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRow {
    pub phase: String,
    pub elapsed_ms: f64,
    pub total_operations: u64,
    pub ops_per_sec: f64,
    pub categories: Vec<CategoryStats>,
}

/// The structured report emitted at the end of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportArtifact {
    pub schema_version: u32,
    pub generated_at: String,
    pub phases: Vec<PhaseRow>,
}

impl ReportArtifact {
    /// Projects phase reports into an artifact, applying the optional
    /// category filter. Filtering never changes the underlying counts.
    pub fn from_phases(
        phases: &[PhaseReport],
        filter: Option<&BTreeSet<OutcomeCategory>>,
    ) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now().to_rfc3339(),
            phases: phases.iter().map(|report| report.to_row(filter)).collect(),
        }
    }
}

/// Persists the artifact as pretty-printed JSON, creating parent directories.
pub fn write_report(path: &Path, artifact: &ReportArtifact) -> Result<(), ReportError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(artifact)?;
    fs::write(path, json)?;
    Ok(())
}
