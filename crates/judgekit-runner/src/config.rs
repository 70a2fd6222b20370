//! Runner configuration.

use serde::{Deserialize, Serialize};

use crate::error::{RunnerError, RunnerResult};

/// Concurrency limits for judging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    /// Testcases of one submission executing at the same time.
    pub max_concurrent_testcases: usize,
    /// Submissions judged at the same time by a batch.
    pub max_concurrent_submissions: usize,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            max_concurrent_testcases: 4,
            max_concurrent_submissions: 2,
        }
    }
}

impl JudgeConfig {
    pub fn from_json_str(raw: &str) -> RunnerResult<Self> {
        let config: JudgeConfig = serde_json::from_str(raw)
            .map_err(|e| RunnerError::Config(format!("malformed judge config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Both limits must be at least 1.
    pub fn validate(&self) -> RunnerResult<()> {
        if self.max_concurrent_testcases == 0 {
            return Err(RunnerError::Config(
                "max_concurrent_testcases must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_submissions == 0 {
            return Err(RunnerError::Config(
                "max_concurrent_submissions must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
