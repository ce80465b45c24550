//! Run configuration.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::report::OutcomeCategory;
use crate::store::{CopyPolicy, ON_HEAP_TIER};

/// Configuration for one harness run.
///
/// The key domain is `[0, N)` with `N = elements_per_thread * load_concurrency`;
/// the load phase covers it exactly once. Distribution mean and stdev default
/// to `N / 2` and `N / 10` when unset, matching a bell curve centered on the
/// loaded keys.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Elements inserted per load worker.
    pub elements_per_thread: u64,
    /// Size of every stored value, in bytes.
    pub payload_size_bytes: usize,
    /// Worker count for the load phase. Degree 1 gives deterministic
    /// population order.
    pub load_concurrency: usize,
    /// Worker count for the test phase.
    pub test_concurrency: usize,
    /// Wall-clock budget for the test phase.
    pub test_duration: Duration,
    /// Interval between statistics samples.
    pub sampling_interval: Duration,
    /// Where to persist the report artifact; `None` keeps results in memory.
    pub report_output_path: Option<PathBuf>,
    /// Center of the Gaussian key distribution. Defaults to `N / 2`.
    pub distribution_mean: Option<u64>,
    /// Spread of the Gaussian key distribution. Defaults to `N / 10`.
    pub distribution_stdev: Option<u64>,
    /// Categories included in the emitted report. `None` reports everything.
    /// Presentation-only; all categories are always counted.
    pub reported_categories: Option<BTreeSet<OutcomeCategory>>,
    /// Value copy behavior at the store boundary.
    pub copy_policy: CopyPolicy,
    /// Tier the sampler polls.
    pub statistics_tier: String,
    /// Base seed for the random key samplers.
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            elements_per_thread: 100_000,
            payload_size_bytes: 4096,
            load_concurrency: 1,
            test_concurrency: std::thread::available_parallelism().map_or(1, |n| n.get()),
            test_duration: Duration::from_secs(120),
            sampling_interval: Duration::from_secs(1),
            report_output_path: None,
            distribution_mean: None,
            distribution_stdev: None,
            reported_categories: None,
            copy_policy: CopyPolicy::default(),
            statistics_tier: ON_HEAP_TIER.to_string(),
            seed: 42,
        }
    }
}

impl RunConfig {
    /// Total key domain size `N`. Saturates on overflow; `validate` rejects
    /// any configuration whose domain would not fit in `u64`.
    pub fn element_count(&self) -> u64 {
        self.elements_per_thread
            .saturating_mul(self.load_concurrency as u64)
    }

    /// Effective Gaussian mean.
    pub fn mean(&self) -> u64 {
        self.distribution_mean
            .unwrap_or_else(|| self.element_count() / 2)
    }

    /// Effective Gaussian stdev, never zero.
    pub fn stdev(&self) -> u64 {
        self.distribution_stdev
            .unwrap_or_else(|| self.element_count() / 10)
            .max(1)
    }

    /// Validates the whole configuration up front. Any error here aborts the
    /// run before the first phase.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.elements_per_thread == 0 {
            return Err(ConfigError::new("elements_per_thread must be > 0"));
        }
        if self.payload_size_bytes == 0 {
            return Err(ConfigError::new("payload_size_bytes must be > 0"));
        }
        if self.load_concurrency == 0 {
            return Err(ConfigError::new("load_concurrency must be > 0"));
        }
        if self.test_concurrency == 0 {
            return Err(ConfigError::new("test_concurrency must be > 0"));
        }
        if self.test_duration.is_zero() {
            return Err(ConfigError::new("test_duration must be > 0"));
        }
        if self.sampling_interval.is_zero() {
            return Err(ConfigError::new("sampling_interval must be > 0"));
        }
        if self.statistics_tier.is_empty() {
            return Err(ConfigError::new("statistics_tier must not be empty"));
        }
        if self
            .elements_per_thread
            .checked_mul(self.load_concurrency as u64)
            .is_none()
        {
            return Err(ConfigError::new(
                "elements_per_thread * load_concurrency overflows the key domain",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RunConfig::default().validate().is_ok());
    }

    #[test]
    fn domain_is_elements_times_load_concurrency() {
        let config = RunConfig {
            elements_per_thread: 1000,
            load_concurrency: 4,
            ..RunConfig::default()
        };
        assert_eq!(config.element_count(), 4000);
    }

    #[test]
    fn distribution_defaults_derive_from_domain() {
        let config = RunConfig {
            elements_per_thread: 1000,
            load_concurrency: 1,
            ..RunConfig::default()
        };
        assert_eq!(config.mean(), 500);
        assert_eq!(config.stdev(), 100);
    }

    #[test]
    fn stdev_never_collapses_to_zero() {
        let config = RunConfig {
            elements_per_thread: 5,
            load_concurrency: 1,
            ..RunConfig::default()
        };
        assert_eq!(config.stdev(), 1);
    }

    #[test]
    fn explicit_distribution_overrides_defaults() {
        let config = RunConfig {
            distribution_mean: Some(10),
            distribution_stdev: Some(3),
            ..RunConfig::default()
        };
        assert_eq!(config.mean(), 10);
        assert_eq!(config.stdev(), 3);
    }

    #[test]
    fn overflowing_key_domain_is_rejected() {
        let config = RunConfig {
            elements_per_thread: u64::MAX,
            load_concurrency: 2,
            ..RunConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.message().contains("overflow"));
    }

    #[test]
    fn zero_fields_are_rejected() {
        for mutate in [
            (|c: &mut RunConfig| c.elements_per_thread = 0) as fn(&mut RunConfig),
            |c| c.payload_size_bytes = 0,
            |c| c.load_concurrency = 0,
            |c| c.test_concurrency = 0,
            |c| c.test_duration = Duration::ZERO,
            |c| c.sampling_interval = Duration::ZERO,
            |c| c.statistics_tier = String::new(),
        ] {
            let mut config = RunConfig::default();
            mutate(&mut config);
            assert!(config.validate().is_err());
        }
    }
}
