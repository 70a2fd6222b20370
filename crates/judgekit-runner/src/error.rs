//! Error types for the submission runner.

use judgekit_core::JudgeError;
use thiserror::Error;

/// Errors produced while judging submissions.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The testcase executor could not produce a result.
    #[error("executor failed on testcase '{testcase}': {source}")]
    Executor {
        testcase: String,
        #[source]
        source: anyhow::Error,
    },

    /// The executor answered for a different testcase than it was asked for.
    #[error("executor returned a result for '{returned}' while running '{requested}'")]
    MismatchedResult { requested: String, returned: String },

    /// A spawned judge task panicked or was cancelled.
    #[error("judge task join error: {0}")]
    Join(String),

    /// Runner configuration is unusable.
    #[error("invalid runner config: {0}")]
    Config(String),

    /// Bubbled-up core error.
    #[error("core error: {0}")]
    Core(#[from] JudgeError),
}

impl RunnerError {
    /// Wrap any executor-side failure for `testcase`.
    pub fn executor(testcase: impl ToString, source: impl Into<anyhow::Error>) -> Self {
        RunnerError::Executor {
            testcase: testcase.to_string(),
            source: source.into(),
        }
    }
}

/// Convenience result alias.
pub type RunnerResult<T> = std::result::Result<T, RunnerError>;
