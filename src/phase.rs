//! Workload phase descriptions and the per-phase concurrency plan.
//!
//! A [`WorkloadPhase`] is one bounded stretch of execution: a fixed operation
//! kind, an iteration budget (count- or duration-bound), a concurrency degree,
//! and a key-selection mode. Phases execute strictly sequentially; the
//! executor joins every worker of phase *k* before phase *k + 1* starts.
//!
//! The concurrency plan for a count-bound phase is [`split_range`]: the total
//! iteration count is partitioned into disjoint, contiguous per-worker index
//! ranges so the key domain is covered exactly once with no duplicate or
//! skipped index. Duration-bound phases instead run independent per-worker
//! loops until a shared expiry flag flips (cooperative, checked once per
//! iteration, so overshoot is bounded by one operation's latency).

use std::ops::Range;
use std::time::Duration;

use crate::error::ConfigError;

/// The cache operation a phase issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Put,
    Get,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Put => "PUT",
            OperationKind::Get => "GET",
        }
    }
}

/// How long a phase runs: a fixed iteration count or a wall-clock budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationPolicy {
    Count(u64),
    Duration(Duration),
}

/// How workers pick keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySelection {
    /// Sequential coverage of the key domain via the key sequence.
    Sequential,
    /// Gaussian-distributed random draws remapped into the domain.
    Gaussian { mean: u64, stdev: u64 },
}

/// One bounded stretch of workload execution.
#[derive(Debug, Clone)]
pub struct WorkloadPhase {
    pub name: String,
    pub kind: OperationKind,
    pub iterations: IterationPolicy,
    pub concurrency: usize,
    pub keys: KeySelection,
}

impl WorkloadPhase {
    /// Validates the phase against the run's key domain.
    ///
    /// Any failure here is a phase setup failure: fatal, the run aborts and
    /// later phases do not execute.
    pub fn validate(&self, domain: u64) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::new(format!(
                "phase '{}': concurrency degree must be > 0",
                self.name
            )));
        }
        if domain == 0 {
            return Err(ConfigError::new(format!(
                "phase '{}': key domain must be > 0",
                self.name
            )));
        }
        match (self.iterations, self.keys) {
            (IterationPolicy::Duration(_), KeySelection::Sequential) => {
                Err(ConfigError::new(format!(
                    "phase '{}': sequential key selection requires a count-bound phase",
                    self.name
                )))
            },
            (IterationPolicy::Duration(d), _) if d.is_zero() => Err(ConfigError::new(format!(
                "phase '{}': duration budget must be > 0",
                self.name
            ))),
            (IterationPolicy::Count(0), _) => Err(ConfigError::new(format!(
                "phase '{}': iteration count must be > 0",
                self.name
            ))),
            _ => {
                if let KeySelection::Gaussian { stdev, .. } = self.keys {
                    if stdev == 0 {
                        return Err(ConfigError::new(format!(
                            "phase '{}': distribution stdev must be > 0",
                            self.name
                        )));
                    }
                }
                Ok(())
            },
        }
    }
}

/// Partitions `[0, total)` into `workers` disjoint, contiguous ranges.
///
/// Every index appears in exactly one range. The first `total % workers`
/// ranges are one element longer, so range sizes differ by at most one.
pub fn split_range(total: u64, workers: usize) -> Vec<Range<u64>> {
    let workers = workers.max(1) as u64;
    let base = total / workers;
    let remainder = total % workers;

    let mut ranges = Vec::with_capacity(workers as usize);
    let mut start = 0;
    for w in 0..workers {
        let len = base + u64::from(w < remainder);
        ranges.push(start..start + len);
        start += len;
    }
    ranges
}
