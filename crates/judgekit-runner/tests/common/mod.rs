#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use judgekit_core::{SubmissionPath, Testcase, TestcaseResult, Verdict};
use judgekit_runner::{RunnerError, RunnerResult, TestcaseExecutor};

/// Executor answering from a lookup table. Keys are either
/// `"<submission>:<testcase>"` or a bare testcase path; anything not listed
/// is accepted.
#[derive(Default)]
pub struct TableExecutor {
    verdicts: HashMap<String, Verdict>,
    failing: HashSet<String>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl TableExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verdict(mut self, key: &str, verdict: Verdict) -> Self {
        self.verdicts.insert(key.to_string(), verdict);
        self
    }

    pub fn failing(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Testcase paths executed, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TestcaseExecutor for TableExecutor {
    async fn execute(
        &self,
        submission: &SubmissionPath,
        testcase: &Testcase,
    ) -> RunnerResult<TestcaseResult> {
        let path = testcase.path.to_string();
        let keyed = format!("{submission}:{path}");
        self.calls.lock().unwrap().push(path.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&keyed) || self.failing.contains(&path) {
            return Err(RunnerError::executor(&path, anyhow::anyhow!("sandbox crashed")));
        }
        let verdict = self
            .verdicts
            .get(&keyed)
            .or_else(|| self.verdicts.get(&path))
            .copied()
            .unwrap_or(Verdict::Accepted);
        Ok(TestcaseResult::new(testcase.path.clone(), verdict))
    }
}

/// Always answers for the wrong testcase.
pub struct MisroutingExecutor;

#[async_trait]
impl TestcaseExecutor for MisroutingExecutor {
    async fn execute(
        &self,
        _submission: &SubmissionPath,
        _testcase: &Testcase,
    ) -> RunnerResult<TestcaseResult> {
        Ok(TestcaseResult::new(
            judgekit_core::TestcasePath::parse("secret/elsewhere").unwrap(),
            Verdict::Accepted,
        ))
    }
}

pub fn sub(raw: &str) -> SubmissionPath {
    SubmissionPath::parse(raw).unwrap()
}
