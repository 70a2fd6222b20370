//! The seam to whatever actually runs a submission on a testcase.

use async_trait::async_trait;
use judgekit_core::{SubmissionPath, Testcase, TestcaseResult};

use crate::error::RunnerResult;

/// Injectable testcase executor.
///
/// Implement this to plug in a sandbox, a remote judge, or a test stub. The
/// returned result must carry the testcase's own path.
#[async_trait]
pub trait TestcaseExecutor: Send + Sync {
    async fn execute(
        &self,
        submission: &SubmissionPath,
        testcase: &Testcase,
    ) -> RunnerResult<TestcaseResult>;
}
