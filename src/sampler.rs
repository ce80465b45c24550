//! Background statistics sampler.
//!
//! A periodic poller of the cache's tier counters, independent of phase
//! boundaries: it starts once, keeps sampling across the load/test transition,
//! and never participates in the workers' critical path. Reads are eventually
//! consistent with concurrent writes by design; no synchronization with
//! workers is needed.
//!
//! The sampler is explicitly stoppable so embedding the harness does not leak
//! a background thread. An unknown tier in a sampling cycle is logged and
//! skipped, never fatal.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::store::{CacheUnderTest, TierStatistics};

/// Immutable point-in-time read of one tier's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StatisticsSnapshot {
    pub taken_at: DateTime<Utc>,
    pub stats: TierStatistics,
}

struct Shared {
    stop: Mutex<bool>,
    wakeup: Condvar,
    snapshots: Mutex<Vec<StatisticsSnapshot>>,
    skipped_cycles: AtomicU64,
}

/// Handle to the background sampling thread.
pub struct StatisticsSampler {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl StatisticsSampler {
    /// Spawns the sampling thread polling `tier` on `cache` every `interval`.
    pub fn start<C: CacheUnderTest + 'static>(
        cache: Arc<C>,
        tier: impl Into<String>,
        interval: Duration,
    ) -> Self {
        let tier = tier.into();
        let shared = Arc::new(Shared {
            stop: Mutex::new(false),
            wakeup: Condvar::new(),
            snapshots: Mutex::new(Vec::new()),
            skipped_cycles: AtomicU64::new(0),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("stats-sampler".to_string())
            .spawn(move || sample_loop(cache, tier, interval, thread_shared))
            .expect("spawning the sampler thread");

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Snapshots collected so far.
    pub fn snapshots(&self) -> Vec<StatisticsSnapshot> {
        self.shared.snapshots.lock().clone()
    }

    /// Cycles skipped so far because the tier's statistics were unavailable.
    pub fn skipped_cycles(&self) -> u64 {
        self.shared.skipped_cycles.load(Ordering::Relaxed)
    }

    /// Signals the thread, joins it, and returns all collected snapshots
    /// plus the final skipped-cycle count. Both are read after the join, so
    /// nothing the thread recorded in its last cycle is lost.
    pub fn stop(mut self) -> (Vec<StatisticsSnapshot>, u64) {
        self.shutdown();
        let snapshots = std::mem::take(&mut *self.shared.snapshots.lock());
        let skipped = self.shared.skipped_cycles.load(Ordering::Relaxed);
        (snapshots, skipped)
    }

    fn shutdown(&mut self) {
        {
            let mut stop = self.shared.stop.lock();
            *stop = true;
        }
        self.shared.wakeup.notify_all();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatisticsSampler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn sample_loop<C: CacheUnderTest>(
    cache: Arc<C>,
    tier: String,
    interval: Duration,
    shared: Arc<Shared>,
) {
    loop {
        {
            let mut stop = shared.stop.lock();
            if !*stop {
                shared.wakeup.wait_for(&mut stop, interval);
            }
            if *stop {
                break;
            }
        }

        match cache.statistics(&tier) {
            Ok(stats) => {
                debug!(tier = %tier, hits = stats.hits, entries = stats.entries, "tier statistics");
                shared.snapshots.lock().push(StatisticsSnapshot {
                    taken_at: Utc::now(),
                    stats,
                });
            },
            Err(err) => {
                warn!(tier = %tier, error = %err, "statistics unavailable, skipping cycle");
                shared.skipped_cycles.fetch_add(1, Ordering::Relaxed);
            },
        }
    }
}
