//! Judge many submissions against one problem and check each against the
//! expectations registry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use judgekit_core::{
    grade, ExpectationEvaluation, ExpectationEvaluator, ExpectationRegistry, GradeReport,
    SubmissionPath, TestcaseResult, TestdataTree,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::instrument;
use uuid::Uuid;

use crate::config::JudgeConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::executor::TestcaseExecutor;
use crate::judge::SubmissionJudge;
use crate::obs;

/// Everything known about one judged submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub evaluation_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub submission: SubmissionPath,
    /// Digest of the testdata tree the submission was judged against.
    pub tree_digest: String,
    pub results: Vec<TestcaseResult>,
    pub grades: GradeReport,
    pub expectations: ExpectationEvaluation,
}

impl SubmissionReport {
    pub fn passed(&self) -> bool {
        self.expectations.passed
    }
}

/// Counts over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Submissions with at least one testcase that should have run but did not.
    pub incomplete: usize,
    /// Submissions no expectation pattern matched.
    pub unmatched: usize,
}

impl BatchSummary {
    fn from_reports(reports: &[SubmissionReport]) -> Self {
        let mut summary = BatchSummary {
            total: reports.len(),
            ..Default::default()
        };
        for report in reports {
            if report.passed() {
                summary.passed += 1;
            } else {
                summary.failed += 1;
            }
            if !report.expectations.complete {
                summary.incomplete += 1;
            }
            if report.expectations.matched_patterns.is_empty() {
                summary.unmatched += 1;
            }
        }
        summary
    }
}

/// Per-submission reports in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub reports: Vec<SubmissionReport>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn all_passed(&self) -> bool {
        self.summary.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &SubmissionReport> {
        self.reports.iter().filter(|r| !r.passed())
    }
}

/// Grade `results` and check them against `registry`.
pub fn assess(
    tree: &TestdataTree,
    registry: &ExpectationRegistry,
    tree_digest: &str,
    submission: SubmissionPath,
    results: Vec<TestcaseResult>,
) -> SubmissionReport {
    let grades = grade(tree, &results);
    let expectations = ExpectationEvaluator::new(registry, tree).evaluate(&submission, &grades);
    SubmissionReport {
        evaluation_id: Uuid::new_v4(),
        evaluated_at: Utc::now(),
        submission,
        tree_digest: tree_digest.to_string(),
        results,
        grades,
        expectations,
    }
}

/// Shares one tree and one registry across concurrently judged submissions.
pub struct BatchEvaluator {
    tree: Arc<TestdataTree>,
    registry: Arc<ExpectationRegistry>,
    judge: Arc<SubmissionJudge>,
    tree_digest: Arc<str>,
    max_concurrent_submissions: usize,
}

impl BatchEvaluator {
    pub fn new(
        tree: Arc<TestdataTree>,
        registry: Arc<ExpectationRegistry>,
        executor: Arc<dyn TestcaseExecutor>,
        config: JudgeConfig,
    ) -> RunnerResult<Self> {
        let judge = SubmissionJudge::new(executor, config)?;
        let tree_digest: Arc<str> = tree.digest().into();
        Ok(Self {
            tree,
            registry,
            judge: Arc::new(judge),
            tree_digest,
            max_concurrent_submissions: config.max_concurrent_submissions,
        })
    }

    pub fn tree_digest(&self) -> &str {
        &self.tree_digest
    }

    /// Check already-collected results without running anything.
    pub fn assess(&self, submission: SubmissionPath, results: Vec<TestcaseResult>) -> SubmissionReport {
        assess(&self.tree, &self.registry, &self.tree_digest, submission, results)
    }

    /// Judge every submission and check it against the registry.
    ///
    /// Reports come back in the order of `submissions`. Executor failures
    /// surface as incomplete reports; only a panicked judge task fails the
    /// whole batch.
    #[instrument(skip_all, fields(submissions = submissions.len()))]
    pub async fn evaluate_all(&self, submissions: &[SubmissionPath]) -> RunnerResult<BatchReport> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_submissions));

        let mut join_set = JoinSet::new();
        for (idx, submission) in submissions.iter().cloned().enumerate() {
            let tree = Arc::clone(&self.tree);
            let registry = Arc::clone(&self.registry);
            let judge = Arc::clone(&self.judge);
            let digest = Arc::clone(&self.tree_digest);
            let permits = Arc::clone(&permits);
            join_set.spawn(async move {
                let _permit = permits.acquire_owned().await.ok();
                let results = judge.judge(&tree, &submission).await;
                (idx, assess(&tree, &registry, &digest, submission, results))
            });
        }

        let mut ordered: Vec<Option<SubmissionReport>> = vec![None; submissions.len()];
        while let Some(joined) = join_set.join_next().await {
            let (idx, report) =
                joined.map_err(|e| RunnerError::Join(format!("submission task: {e}")))?;
            ordered[idx] = Some(report);
        }

        let mut reports = Vec::with_capacity(submissions.len());
        for (submission, slot) in submissions.iter().zip(ordered) {
            let report = slot.ok_or_else(|| {
                RunnerError::Join(format!("no report produced for '{submission}'"))
            })?;
            reports.push(report);
        }

        let summary = BatchSummary::from_reports(&reports);
        obs::emit_batch_completed(
            summary.total,
            summary.passed,
            summary.failed,
            summary.incomplete,
        );
        Ok(BatchReport {
            generated_at: Utc::now(),
            reports,
            summary,
        })
    }
}
