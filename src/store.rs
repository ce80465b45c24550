//! The cache-under-test contract and an in-memory reference store.
//!
//! The harness never implements caching itself; it drives any store that
//! exposes [`CacheUnderTest`]. [`HeapStore`] is the bundled reference
//! implementation: a sharded on-heap map with a single `"on-heap"` tier whose
//! hit counters back the statistics sampler. It exists so the harness is
//! runnable and testable out of the box; production use points the harness at
//! a real cache behind the same trait.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::fmt;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

/// Tier name exposed by [`HeapStore`].
pub const ON_HEAP_TIER: &str = "on-heap";

/// Error returned by a failed cache operation.
///
/// Recorded by the executor as a `PUT_ERROR`/`GET_ERROR` outcome for that one
/// operation; never aborts a phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The cache handle was closed.
    Closed,
    /// Store-specific failure.
    Backend(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Closed => f.write_str("cache handle is closed"),
            CacheError::Backend(msg) => write!(f, "cache backend error: {}", msg),
        }
    }
}

impl std::error::Error for CacheError {}

/// Error returned by the statistics query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatisticsError {
    /// The requested tier name is unknown to the store.
    TierNotFound(String),
}

impl fmt::Display for StatisticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatisticsError::TierNotFound(tier) => write!(f, "unknown tier: {}", tier),
        }
    }
}

impl std::error::Error for StatisticsError {}

/// Point-in-time counters for one storage tier.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TierStatistics {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    pub entries: u64,
}

/// The opaque key/value store the harness drives.
///
/// Internal thread-safety is the implementor's contract: workers share one
/// handle across threads. `close` must be idempotent.
pub trait CacheUnderTest: Send + Sync {
    fn put(&self, key: u64, value: Arc<[u8]>) -> Result<(), CacheError>;

    fn get(&self, key: u64) -> Result<Option<Arc<[u8]>>, CacheError>;

    /// Queries the counters for a named tier.
    fn statistics(&self, tier: &str) -> Result<TierStatistics, StatisticsError>;

    /// Releases the handle. Idempotent; operations after close fail with
    /// [`CacheError::Closed`].
    fn close(&self);
}

/// Whether values are defensively copied at the store boundary.
///
/// The original configuration left this ambiguous (a copier step was present
/// but disabled), so it is a policy rather than a fixed behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CopyPolicy {
    /// Share the caller's buffer on store and the stored buffer on read.
    #[default]
    Shared,
    /// Copy bytes on store and on read, guarding against caller-side mutation.
    Copied,
}

const SHARD_COUNT: usize = 16;

/// Sharded in-memory reference implementation of [`CacheUnderTest`].
pub struct HeapStore {
    shards: Vec<RwLock<FxHashMap<u64, Arc<[u8]>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    closed: AtomicBool,
    policy: CopyPolicy,
}

impl HeapStore {
    pub fn new(policy: CopyPolicy) -> Self {
        Self {
            shards: (0..SHARD_COUNT).map(|_| RwLock::new(FxHashMap::default())).collect(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            puts: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            policy,
        }
    }

    #[inline]
    fn shard(&self, key: u64) -> &RwLock<FxHashMap<u64, Arc<[u8]>>> {
        &self.shards[(key as usize) & (SHARD_COUNT - 1)]
    }

    fn check_open(&self) -> Result<(), CacheError> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    /// Number of entries across all shards.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HeapStore {
    fn default() -> Self {
        Self::new(CopyPolicy::default())
    }
}

impl CacheUnderTest for HeapStore {
    fn put(&self, key: u64, value: Arc<[u8]>) -> Result<(), CacheError> {
        self.check_open()?;
        let stored = match self.policy {
            CopyPolicy::Shared => value,
            CopyPolicy::Copied => Arc::from(&value[..]),
        };
        self.shard(key).write().insert(key, stored);
        self.puts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn get(&self, key: u64) -> Result<Option<Arc<[u8]>>, CacheError> {
        self.check_open()?;
        let found = self.shard(key).read().get(&key).cloned();
        match found {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                let returned = match self.policy {
                    CopyPolicy::Shared => value,
                    CopyPolicy::Copied => Arc::from(&value[..]),
                };
                Ok(Some(returned))
            },
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            },
        }
    }

    fn statistics(&self, tier: &str) -> Result<TierStatistics, StatisticsError> {
        if tier != ON_HEAP_TIER {
            return Err(StatisticsError::TierNotFound(tier.to_string()));
        }
        Ok(TierStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            entries: self.len() as u64,
        })
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
