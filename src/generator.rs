//! Deterministic key and payload generators.
//!
//! Provides the three producers the workload phases draw from:
//!
//! - [`KeySequence`]: total, monotonic index → key mapping over `[0, N)`, used
//!   for sequential coverage during the load phase.
//! - [`GaussianKeySampler`]: statistically distributed key draws remapped into
//!   `[0, N)`, used for the randomized read phase.
//! - [`PayloadGenerator`]: fixed-size deterministic value payloads. Content is
//!   derived from the key so repeated calls are referentially identical; only
//!   size and allocation cost matter to the benchmark.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::error::{ConfigError, GeneratorError};

/// Monotonic mapping from an integer index to a key over `[0, domain)`.
///
/// The mapping is the identity: index `i` yields key `i`. It is total over the
/// domain; requesting an index at or beyond the bound is a configuration error.
#[derive(Debug, Clone, Copy)]
pub struct KeySequence {
    domain: u64,
}

impl KeySequence {
    pub fn new(domain: u64) -> Self {
        Self { domain }
    }

    /// Returns the key for `index`, or an error when `index >= domain`.
    #[inline]
    pub fn key_at(&self, index: u64) -> Result<u64, GeneratorError> {
        if index < self.domain {
            Ok(index)
        } else {
            Err(GeneratorError::IndexOutOfDomain {
                index,
                domain: self.domain,
            })
        }
    }

    /// Checks that every index in `[start, end)` is inside the domain. An
    /// empty range is trivially valid.
    ///
    /// Called during phase setup so an out-of-domain range aborts the run
    /// before any worker starts.
    pub fn check_range(&self, start: u64, end: u64) -> Result<(), GeneratorError> {
        if end > start {
            self.key_at(start)?;
            self.key_at(end - 1)?;
        }
        Ok(())
    }

    #[inline]
    pub fn domain(&self) -> u64 {
        self.domain
    }
}

/// Draws keys under a Gaussian distribution, clamped into `[0, domain)`.
///
/// A draw outside the domain is remapped into range (wrapping, not rejected),
/// so the sampler never produces an out-of-domain key.
#[derive(Debug, Clone)]
pub struct GaussianKeySampler {
    domain: u64,
    normal: Normal<f64>,
    rng: SmallRng,
}

impl GaussianKeySampler {
    /// Creates a sampler centered on `mean` with standard deviation `stdev`.
    ///
    /// `domain` and `stdev` must be non-zero; both are caller configuration.
    pub fn new(domain: u64, mean: u64, stdev: u64, seed: u64) -> Result<Self, ConfigError> {
        if domain == 0 {
            return Err(ConfigError::new("key domain must be > 0"));
        }
        let normal = Normal::new(mean as f64, stdev as f64)
            .map_err(|err| ConfigError::new(format!("invalid distribution stdev: {}", err)))?;
        Ok(Self {
            domain,
            normal,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    /// Draws the next key. Always within `[0, domain)`.
    #[inline]
    pub fn sample(&mut self) -> u64 {
        let draw = self.normal.sample(&mut self.rng).round() as i64;
        draw.rem_euclid(self.domain as i64) as u64
    }
}

/// Produces fixed-size value payloads with key-derived content.
#[derive(Debug, Clone, Copy)]
pub struct PayloadGenerator {
    size: usize,
}

impl PayloadGenerator {
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::new("payload size must be > 0"));
        }
        Ok(Self { size })
    }

    /// Returns the payload for `key`. Deterministic: the same key always
    /// yields the same bytes.
    pub fn value_for(&self, key: u64) -> Arc<[u8]> {
        let seed = key.to_le_bytes();
        let bytes: Vec<u8> = (0..self.size)
            .map(|i| seed[i % 8].wrapping_add(i as u8))
            .collect();
        Arc::from(bytes)
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_sequence_is_identity_over_domain() {
        let seq = KeySequence::new(100);
        for i in 0..100 {
            assert_eq!(seq.key_at(i).unwrap(), i);
        }
    }

    #[test]
    fn key_sequence_rejects_out_of_domain_index() {
        let seq = KeySequence::new(10);
        let err = seq.key_at(10).unwrap_err();
        assert_eq!(
            err,
            GeneratorError::IndexOutOfDomain {
                index: 10,
                domain: 10
            }
        );
    }

    #[test]
    fn check_range_accepts_full_domain() {
        let seq = KeySequence::new(10);
        assert!(seq.check_range(0, 10).is_ok());
    }

    #[test]
    fn check_range_rejects_overrun() {
        let seq = KeySequence::new(10);
        assert!(seq.check_range(5, 11).is_err());
    }

    #[test]
    fn check_range_accepts_empty_range_at_the_boundary() {
        // More workers than elements leaves trailing empty ranges.
        let seq = KeySequence::new(10);
        assert!(seq.check_range(10, 10).is_ok());
    }

    #[test]
    fn gaussian_samples_stay_in_domain() {
        let domain = 1000;
        let mut sampler = GaussianKeySampler::new(domain, domain / 2, domain / 10, 42).unwrap();
        for _ in 0..50_000 {
            let key = sampler.sample();
            assert!(key < domain, "key {} escaped domain [0, {})", key, domain);
        }
    }

    #[test]
    fn gaussian_samples_stay_in_domain_with_wide_stdev() {
        // Stdev far wider than the domain forces frequent remapping.
        let domain = 16;
        let mut sampler = GaussianKeySampler::new(domain, 8, 1000, 7).unwrap();
        for _ in 0..10_000 {
            assert!(sampler.sample() < domain);
        }
    }

    #[test]
    fn gaussian_is_deterministic_per_seed() {
        let mut a = GaussianKeySampler::new(100, 50, 10, 9).unwrap();
        let mut b = GaussianKeySampler::new(100, 50, 10, 9).unwrap();
        let keys_a: Vec<u64> = (0..100).map(|_| a.sample()).collect();
        let keys_b: Vec<u64> = (0..100).map(|_| b.sample()).collect();
        assert_eq!(keys_a, keys_b);
    }

    #[test]
    fn gaussian_rejects_zero_domain() {
        assert!(GaussianKeySampler::new(0, 0, 1, 0).is_err());
    }

    #[test]
    fn payload_has_configured_size() {
        let payload = PayloadGenerator::new(4096).unwrap();
        assert_eq!(payload.value_for(123).len(), 4096);
    }

    #[test]
    fn payload_is_deterministic_per_key() {
        let payload = PayloadGenerator::new(64).unwrap();
        assert_eq!(payload.value_for(7), payload.value_for(7));
        assert_ne!(payload.value_for(7), payload.value_for(8));
    }

    #[test]
    fn payload_rejects_zero_size() {
        assert!(PayloadGenerator::new(0).is_err());
    }
}
