pub use crate::config::RunConfig;
pub use crate::error::{ConfigError, GeneratorError, HarnessError, ReportError};
pub use crate::executor::execute_phase;
pub use crate::generator::{GaussianKeySampler, KeySequence, PayloadGenerator};
pub use crate::phase::{IterationPolicy, KeySelection, OperationKind, WorkloadPhase};
pub use crate::report::{
    OutcomeCategory, OutcomeRecorder, PhaseReport, ReportArtifact, SCHEMA_VERSION,
};
pub use crate::runner::{RunStatus, RunSummary, Runner};
pub use crate::sampler::{StatisticsSampler, StatisticsSnapshot};
pub use crate::store::{
    CacheError, CacheUnderTest, CopyPolicy, HeapStore, StatisticsError, TierStatistics,
    ON_HEAP_TIER,
};
