//! Phase executor: runs one workload phase to completion.
//!
//! Workers are scoped OS threads sharing only the cache handle. Each worker
//! owns an [`OutcomeRecorder`]; recorders are merged after the join barrier so
//! the hot path never touches a shared counter. Completion is a hard barrier:
//! `execute_phase` returns only once every worker has finished.
//!
//! A failed cache operation is classified as a `*_ERROR` outcome and the
//! worker continues. A setup failure (invalid phase, out-of-domain key range)
//! is fatal and surfaces as a [`HarnessError`] before or instead of results.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::{GeneratorError, HarnessError};
use crate::generator::{GaussianKeySampler, KeySequence, PayloadGenerator};
use crate::phase::{IterationPolicy, KeySelection, OperationKind, WorkloadPhase};
use crate::phase::split_range;
use crate::report::{OutcomeCategory, OutcomeRecorder, PhaseReport};
use crate::store::CacheUnderTest;

/// Executes one phase against the cache and returns its aggregated report.
///
/// `domain` is the run's key domain `[0, N)`; `seed` derives per-worker RNG
/// seeds so runs are reproducible.
pub fn execute_phase<C: CacheUnderTest>(
    cache: &C,
    phase: &WorkloadPhase,
    domain: u64,
    payload: &PayloadGenerator,
    seed: u64,
) -> Result<PhaseReport, HarnessError> {
    phase.validate(domain)?;

    let sequence = KeySequence::new(domain);
    let plan = match phase.iterations {
        IterationPolicy::Count(total) => {
            let ranges = split_range(total, phase.concurrency);
            // Sequential selection walks the key sequence directly, so the
            // whole budget must sit inside the domain. Caught here, before
            // any worker spawns.
            if phase.keys == KeySelection::Sequential {
                for range in &ranges {
                    sequence.check_range(range.start, range.end)?;
                }
            }
            Plan::Counted(ranges)
        },
        IterationPolicy::Duration(budget) => Plan::Timed(budget),
    };

    info!(
        phase = %phase.name,
        kind = phase.kind.as_str(),
        concurrency = phase.concurrency,
        "phase started"
    );

    let expired = AtomicBool::new(false);
    let started = Instant::now();

    let worker_results: Vec<thread::Result<Result<OutcomeRecorder, GeneratorError>>> =
        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(phase.concurrency);
            match &plan {
                Plan::Counted(ranges) => {
                    for (worker, range) in ranges.iter().enumerate() {
                        let range = range.clone();
                        handles.push(scope.spawn(move || {
                            run_counted_worker(cache, phase, sequence, payload, seed, worker, range)
                        }));
                    }
                },
                Plan::Timed(budget) => {
                    let expired = &expired;
                    for worker in 0..phase.concurrency {
                        handles.push(scope.spawn(move || {
                            run_timed_worker(cache, phase, domain, payload, seed, worker, expired)
                        }));
                    }
                    // Cooperative cancellation: workers observe the flag once
                    // per iteration, so overshoot is bounded by one operation.
                    thread::sleep(*budget);
                    expired.store(true, Ordering::Release);
                },
            }
            handles.into_iter().map(|handle| handle.join()).collect()
        });

    let elapsed = started.elapsed();

    let mut merged = OutcomeRecorder::new();
    for result in worker_results {
        let recorder = result
            .map_err(|panic| HarnessError::WorkerPanic(panic_message(&panic)))??;
        merged.merge(&recorder);
    }

    let report = PhaseReport::from_recorder(phase.name.clone(), &merged, elapsed);
    info!(
        phase = %phase.name,
        operations = report.total_operations,
        elapsed_ms = elapsed.as_millis() as u64,
        "phase completed"
    );
    Ok(report)
}

enum Plan {
    Counted(Vec<Range<u64>>),
    Timed(std::time::Duration),
}

fn run_counted_worker<C: CacheUnderTest>(
    cache: &C,
    phase: &WorkloadPhase,
    sequence: KeySequence,
    payload: &PayloadGenerator,
    seed: u64,
    worker: usize,
    range: Range<u64>,
) -> Result<OutcomeRecorder, GeneratorError> {
    let mut recorder = OutcomeRecorder::new();
    let mut sampler = match phase.keys {
        KeySelection::Sequential => None,
        KeySelection::Gaussian { mean, stdev } => Some(worker_sampler(
            sequence.domain(),
            mean,
            stdev,
            seed,
            worker,
        )),
    };

    for index in range {
        let key = match sampler.as_mut() {
            None => sequence.key_at(index)?,
            Some(sampler) => sampler.sample(),
        };
        run_one(cache, phase.kind, key, payload, &mut recorder);
    }

    debug!(worker, operations = recorder.total(), "worker finished");
    Ok(recorder)
}

fn run_timed_worker<C: CacheUnderTest>(
    cache: &C,
    phase: &WorkloadPhase,
    domain: u64,
    payload: &PayloadGenerator,
    seed: u64,
    worker: usize,
    expired: &AtomicBool,
) -> Result<OutcomeRecorder, GeneratorError> {
    let mut recorder = OutcomeRecorder::new();
    // validate() rejects Sequential for duration-bound phases.
    let KeySelection::Gaussian { mean, stdev } = phase.keys else {
        return Ok(recorder);
    };
    let mut sampler = worker_sampler(domain, mean, stdev, seed, worker);

    while !expired.load(Ordering::Acquire) {
        let key = sampler.sample();
        run_one(cache, phase.kind, key, payload, &mut recorder);
    }

    debug!(worker, operations = recorder.total(), "worker finished");
    Ok(recorder)
}

fn worker_sampler(
    domain: u64,
    mean: u64,
    stdev: u64,
    seed: u64,
    worker: usize,
) -> GaussianKeySampler {
    let worker_seed = seed ^ (worker as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    GaussianKeySampler::new(domain, mean, stdev, worker_seed)
        .expect("phase validation vetted sampler parameters")
}

#[inline]
fn run_one<C: CacheUnderTest>(
    cache: &C,
    kind: OperationKind,
    key: u64,
    payload: &PayloadGenerator,
    recorder: &mut OutcomeRecorder,
) {
    let op_start = Instant::now();
    let category = match kind {
        OperationKind::Put => match cache.put(key, payload.value_for(key)) {
            Ok(()) => OutcomeCategory::PutOk,
            Err(_) => OutcomeCategory::PutError,
        },
        OperationKind::Get => match cache.get(key) {
            Ok(Some(_)) => OutcomeCategory::GetHit,
            Ok(None) => OutcomeCategory::GetMiss,
            Err(_) => OutcomeCategory::GetError,
        },
    };
    recorder.record(category, op_start.elapsed());
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::store::{CacheError, HeapStore, ON_HEAP_TIER};

    fn load_phase(count: u64, concurrency: usize) -> WorkloadPhase {
        WorkloadPhase {
            name: "load".to_string(),
            kind: OperationKind::Put,
            iterations: IterationPolicy::Count(count),
            concurrency,
            keys: KeySelection::Sequential,
        }
    }

    fn get_phase(budget: Duration, concurrency: usize, domain: u64) -> WorkloadPhase {
        WorkloadPhase {
            name: "test".to_string(),
            kind: OperationKind::Get,
            iterations: IterationPolicy::Duration(budget),
            concurrency,
            keys: KeySelection::Gaussian {
                mean: domain / 2,
                stdev: (domain / 10).max(1),
            },
        }
    }

    #[test]
    fn count_bound_phase_covers_domain_exactly_once() {
        let store = HeapStore::default();
        let payload = PayloadGenerator::new(16).unwrap();
        let report =
            execute_phase(&store, &load_phase(100, 4), 100, &payload, 42).unwrap();

        assert_eq!(report.count(OutcomeCategory::PutOk), 100);
        assert_eq!(report.total_operations, 100);
        assert_eq!(store.len(), 100);
        for key in 0..100 {
            assert!(store.get(key).unwrap().is_some());
        }
    }

    #[test]
    fn sequential_overrun_is_fatal_before_any_operation() {
        let store = HeapStore::default();
        let payload = PayloadGenerator::new(16).unwrap();
        // 20 iterations over a domain of 10: generator exhaustion.
        let err = execute_phase(&store, &load_phase(20, 1), 10, &payload, 42).unwrap_err();
        assert!(matches!(err, HarnessError::Generator(_)));
        assert!(store.is_empty(), "no operation may run after a setup failure");
    }

    #[test]
    fn duration_phase_terminates_with_bounded_overshoot() {
        let store = HeapStore::default();
        let payload = PayloadGenerator::new(16).unwrap();
        for key in 0..64 {
            store.put(key, payload.value_for(key)).unwrap();
        }

        let budget = Duration::from_millis(300);
        let started = Instant::now();
        let report =
            execute_phase(&store, &get_phase(budget, 4, 64), 64, &payload, 42).unwrap();
        let elapsed = started.elapsed();

        assert!(elapsed >= budget);
        // Generous slack for scheduling; the cooperative check itself adds at
        // most one operation's latency per worker.
        assert!(elapsed < budget + Duration::from_secs(2));
        assert!(report.total_operations > 0);
    }

    #[test]
    fn gets_against_loaded_domain_are_all_hits() {
        let store = HeapStore::default();
        let payload = PayloadGenerator::new(16).unwrap();
        for key in 0..32 {
            store.put(key, payload.value_for(key)).unwrap();
        }

        let report = execute_phase(
            &store,
            &get_phase(Duration::from_millis(100), 4, 32),
            32,
            &payload,
            42,
        )
        .unwrap();

        assert_eq!(report.count(OutcomeCategory::GetMiss), 0);
        assert!(report.count(OutcomeCategory::GetHit) > 0);
    }

    #[test]
    fn operation_failures_are_outcomes_not_aborts() {
        struct FlakyStore {
            inner: HeapStore,
        }
        impl CacheUnderTest for FlakyStore {
            fn put(&self, key: u64, value: std::sync::Arc<[u8]>) -> Result<(), CacheError> {
                if key % 2 == 0 {
                    Err(CacheError::Backend("even keys rejected".to_string()))
                } else {
                    self.inner.put(key, value)
                }
            }
            fn get(&self, key: u64) -> Result<Option<std::sync::Arc<[u8]>>, CacheError> {
                self.inner.get(key)
            }
            fn statistics(
                &self,
                tier: &str,
            ) -> Result<crate::store::TierStatistics, crate::store::StatisticsError> {
                self.inner.statistics(tier)
            }
            fn close(&self) {
                self.inner.close()
            }
        }

        let store = FlakyStore {
            inner: HeapStore::default(),
        };
        let payload = PayloadGenerator::new(8).unwrap();
        let report = execute_phase(&store, &load_phase(10, 1), 10, &payload, 42).unwrap();

        assert_eq!(report.count(OutcomeCategory::PutError), 5);
        assert_eq!(report.count(OutcomeCategory::PutOk), 5);
        assert_eq!(report.total_operations, 10);
    }

    #[test]
    fn closed_cache_yields_get_errors() {
        let store = HeapStore::default();
        store.close();
        let payload = PayloadGenerator::new(8).unwrap();

        let phase = WorkloadPhase {
            name: "test".to_string(),
            kind: OperationKind::Get,
            iterations: IterationPolicy::Count(10),
            concurrency: 1,
            keys: KeySelection::Gaussian { mean: 5, stdev: 2 },
        };
        let report = execute_phase(&store, &phase, 10, &payload, 42).unwrap();
        assert_eq!(report.count(OutcomeCategory::GetError), 10);
    }

    #[test]
    fn load_updates_store_statistics() {
        let store = HeapStore::default();
        let payload = PayloadGenerator::new(8).unwrap();
        execute_phase(&store, &load_phase(25, 1), 25, &payload, 42).unwrap();
        let stats = store.statistics(ON_HEAP_TIER).unwrap();
        assert_eq!(stats.puts, 25);
        assert_eq!(stats.entries, 25);
    }
}
