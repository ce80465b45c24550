//! Error types for the cachedrill harness.
//!
//! ## Key Components
//!
//! - [`ConfigError`]: Returned when run or phase configuration is invalid
//!   (e.g. zero concurrency, payload size of zero). Always fatal.
//! - [`GeneratorError`]: Returned when a key index outside `[0, N)` is
//!   requested. Always fatal, raised during phase setup before any cache
//!   operation runs.
//! - [`ReportError`]: Returned when persisting the report artifact fails.
//!   Terminal for the report step only; aggregated results stay retrievable.
//! - [`HarnessError`]: Top-level error for a run, covering the fatal kinds
//!   above plus worker panics.
//!
//! Per-operation cache failures are *not* errors at this level: the executor
//! classifies them into `PUT_ERROR`/`GET_ERROR` outcomes and the worker keeps
//! going. See [`crate::store::CacheError`].

use std::fmt;
use std::io;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Error returned when run or phase configuration parameters are invalid.
///
/// Carries a human-readable description of which parameter failed validation.
/// A `ConfigError` during phase setup transitions the run to `Aborted`; later
/// phases do not execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(String);

impl ConfigError {
    /// Creates a new `ConfigError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

// ---------------------------------------------------------------------------
// GeneratorError
// ---------------------------------------------------------------------------

/// Error returned when a generator is asked for an index outside its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorError {
    /// An index `>= domain` was requested from a key sequence over `[0, domain)`.
    IndexOutOfDomain { index: u64, domain: u64 },
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::IndexOutOfDomain { index, domain } => {
                write!(f, "key index {} outside domain [0, {})", index, domain)
            },
        }
    }
}

impl std::error::Error for GeneratorError {}

// ---------------------------------------------------------------------------
// ReportError
// ---------------------------------------------------------------------------

/// Error returned when the report artifact cannot be persisted.
#[derive(Debug)]
pub enum ReportError {
    /// The artifact could not be serialized to JSON.
    Serialize(serde_json::Error),
    /// The artifact could not be written to disk.
    Io(io::Error),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Serialize(err) => write!(f, "report serialization failed: {}", err),
            ReportError::Io(err) => write!(f, "report write failed: {}", err),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Serialize(err) => Some(err),
            ReportError::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for ReportError {
    fn from(err: io::Error) -> Self {
        ReportError::Io(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialize(err)
    }
}

// ---------------------------------------------------------------------------
// HarnessError
// ---------------------------------------------------------------------------

/// Top-level error for a harness run.
#[derive(Debug)]
pub enum HarnessError {
    /// Invalid run or phase configuration.
    Config(ConfigError),
    /// A generator was driven outside its key domain.
    Generator(GeneratorError),
    /// A worker thread panicked. Treated as fatal since it indicates a harness
    /// bug rather than a cache failure.
    WorkerPanic(String),
    /// The report artifact could not be persisted.
    Report(ReportError),
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Config(err) => write!(f, "configuration error: {}", err),
            HarnessError::Generator(err) => write!(f, "generator error: {}", err),
            HarnessError::WorkerPanic(msg) => write!(f, "worker thread panicked: {}", msg),
            HarnessError::Report(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Config(err) => Some(err),
            HarnessError::Generator(err) => Some(err),
            HarnessError::WorkerPanic(_) => None,
            HarnessError::Report(err) => Some(err),
        }
    }
}

impl From<ConfigError> for HarnessError {
    fn from(err: ConfigError) -> Self {
        HarnessError::Config(err)
    }
}

impl From<GeneratorError> for HarnessError {
    fn from(err: GeneratorError) -> Self {
        HarnessError::Generator(err)
    }
}

impl From<ReportError> for HarnessError {
    fn from(err: ReportError) -> Self {
        HarnessError::Report(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
