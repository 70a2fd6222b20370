//! Runs one submission over the testdata tree.
//!
//! Children of a `continue` group are judged concurrently; children of a
//! `break` group run one after another and evaluation stops at the first
//! child whose grade rejects. The number of executor calls in flight for one
//! submission is bounded by `max_concurrent_testcases`.

use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};
use judgekit_core::grading::{aggregate_group, leaf_grade, stops_evaluation, ChildGrade};
use judgekit_core::{
    Grade, OnReject, SubmissionPath, TestGroup, Testcase, TestcaseResult, TestdataNode,
    TestdataTree,
};
use tokio::sync::Semaphore;
use tracing::instrument;

use crate::config::JudgeConfig;
use crate::error::{RunnerError, RunnerResult};
use crate::executor::TestcaseExecutor;
use crate::obs;

/// Results of one subtree plus the grade they aggregate to.
struct SubtreeRun {
    grade: Grade,
    results: Vec<TestcaseResult>,
}

impl SubtreeRun {
    fn testcase(parent: &TestGroup, result: Option<TestcaseResult>) -> Self {
        let grade = result
            .as_ref()
            .map_or(Grade::NOT_RUN, |r| leaf_grade(parent, r));
        Self {
            grade,
            results: result.into_iter().collect(),
        }
    }
}

/// Judges submissions with an injected [`TestcaseExecutor`].
pub struct SubmissionJudge {
    executor: Arc<dyn TestcaseExecutor>,
    config: JudgeConfig,
}

impl SubmissionJudge {
    pub fn new(executor: Arc<dyn TestcaseExecutor>, config: JudgeConfig) -> RunnerResult<Self> {
        config.validate()?;
        Ok(Self { executor, config })
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    /// Run `submission` over `tree` and collect every result produced.
    ///
    /// Testcases skipped by a `break` group, and testcases whose executor
    /// call failed, have no entry in the returned list.
    #[instrument(skip_all, fields(submission = %submission))]
    pub async fn judge(&self, tree: &TestdataTree, submission: &SubmissionPath) -> Vec<TestcaseResult> {
        let permits = Semaphore::new(self.config.max_concurrent_testcases);
        let run = self.judge_group(tree.root(), submission, &permits).await;
        obs::emit_submission_judged(
            submission.as_str(),
            run.results.len(),
            tree.testcase_count(),
            &run.grade.outcome.to_string(),
        );
        run.results
    }

    fn judge_group<'a>(
        &'a self,
        group: &'a TestGroup,
        submission: &'a SubmissionPath,
        permits: &'a Semaphore,
    ) -> BoxFuture<'a, SubtreeRun> {
        async move {
            let mut results = Vec::new();
            let mut grades: Vec<ChildGrade<'a>> = Vec::with_capacity(group.children.len());

            match group.grader.on_reject {
                OnReject::Break => {
                    for (idx, child) in group.children.iter().enumerate() {
                        let run = self.judge_child(group, child, submission, permits).await;
                        results.extend(run.results);
                        grades.push(ChildGrade {
                            name: child.name(),
                            grade: run.grade,
                        });
                        if stops_evaluation(group, child.name(), &run.grade) {
                            obs::emit_group_stopped(
                                submission.as_str(),
                                &group.path.to_string(),
                                child.name(),
                                group.children.len() - idx - 1,
                            );
                            break;
                        }
                    }
                }
                OnReject::Continue => {
                    let runs = join_all(
                        group
                            .children
                            .iter()
                            .map(|child| self.judge_child(group, child, submission, permits)),
                    )
                    .await;
                    for (child, run) in group.children.iter().zip(runs) {
                        results.extend(run.results);
                        grades.push(ChildGrade {
                            name: child.name(),
                            grade: run.grade,
                        });
                    }
                }
            }

            SubtreeRun {
                grade: aggregate_group(group, &grades),
                results,
            }
        }
        .boxed()
    }

    fn judge_child<'a>(
        &'a self,
        parent: &'a TestGroup,
        child: &'a TestdataNode,
        submission: &'a SubmissionPath,
        permits: &'a Semaphore,
    ) -> BoxFuture<'a, SubtreeRun> {
        async move {
            match child {
                TestdataNode::Testcase(testcase) => {
                    let result = self.run_testcase(testcase, submission, permits).await;
                    SubtreeRun::testcase(parent, result)
                }
                TestdataNode::Group(group) => self.judge_group(group, submission, permits).await,
            }
        }
        .boxed()
    }

    async fn run_testcase(
        &self,
        testcase: &Testcase,
        submission: &SubmissionPath,
        permits: &Semaphore,
    ) -> Option<TestcaseResult> {
        let _permit = permits.acquire().await.ok();
        let outcome = match self.executor.execute(submission, testcase).await {
            Ok(result) if result.path == testcase.path => Ok(result),
            Ok(result) => Err(RunnerError::MismatchedResult {
                requested: testcase.path.to_string(),
                returned: result.path.to_string(),
            }),
            Err(err) => Err(err),
        };
        match outcome {
            Ok(result) => Some(result),
            Err(err) => {
                obs::emit_testcase_failed(
                    submission.as_str(),
                    &testcase.path.to_string(),
                    &err.to_string(),
                );
                None
            }
        }
    }
}
