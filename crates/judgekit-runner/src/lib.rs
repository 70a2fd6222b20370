//! judgekit runner
//!
//! Drives an injected [`TestcaseExecutor`] over a problem's testdata tree,
//! honouring `break`/`continue` short-circuiting, and checks batches of
//! submissions against the expectations registry.

pub mod batch;
pub mod config;
pub mod error;
pub mod executor;
pub mod judge;
pub mod obs;
pub mod telemetry;

pub use batch::{assess, BatchEvaluator, BatchReport, BatchSummary, SubmissionReport};
pub use config::JudgeConfig;
pub use error::{RunnerError, RunnerResult};
pub use executor::TestcaseExecutor;
pub use judge::SubmissionJudge;
pub use telemetry::{init_tracing, TelemetryConfig};
