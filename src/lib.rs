//! cachedrill: a two-phase load-testing harness for key/value caches.
//!
//! The harness populates a cache deterministically (load phase), then exercises
//! it with a randomized read workload (test phase) while a background sampler
//! polls the cache's tier statistics. Per-operation outcomes are aggregated into
//! per-category throughput and latency reports.

pub mod config;
pub mod error;
pub mod executor;
pub mod generator;
pub mod phase;
pub mod prelude;
pub mod report;
pub mod runner;
pub mod sampler;
pub mod store;
