//! Batch grading of one submission's results over a testdata tree.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::grading::group::{aggregate_group, stops_evaluation, ChildGrade, Grade};
use crate::obs;
use crate::path::{TestcasePath, TestdataPath};
use crate::range::ScoreRange;
use crate::testdata::{TestGroup, TestdataNode, TestdataTree};
use crate::verdict::{Outcome, TestcaseResult, Verdict};

/// A group whose aggregated score lies outside its declared `range`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeViolation {
    pub node: TestdataPath,
    pub score: f64,
    pub range: ScoreRange,
}

/// A computed outcome that disagrees with an independently known one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationInconsistency {
    pub node: TestdataPath,
    pub computed: Outcome,
    pub expected: Outcome,
}

/// Grades for every node of the tree, plus the non-fatal findings collected
/// on the way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeReport {
    /// Grade of every node, root included.
    pub grades: BTreeMap<TestdataPath, Grade>,
    /// Testcases not evaluated because an earlier sibling rejected under
    /// `on_reject: break`.
    pub skipped: BTreeSet<TestcasePath>,
    /// Testcases that should have run but have no result.
    pub missing: BTreeSet<TestcasePath>,
    /// Results whose path is not a testcase of the tree; ignored.
    pub unknown_results: Vec<TestcasePath>,
    pub range_violations: Vec<RangeViolation>,
    pub inconsistencies: Vec<AggregationInconsistency>,
}

impl GradeReport {
    fn empty() -> Self {
        Self {
            grades: BTreeMap::new(),
            skipped: BTreeSet::new(),
            missing: BTreeSet::new(),
            unknown_results: Vec::new(),
            range_violations: Vec::new(),
            inconsistencies: Vec::new(),
        }
    }

    pub fn root(&self) -> Grade {
        self.grades
            .get(&TestdataPath::root())
            .copied()
            .unwrap_or(Grade::NOT_RUN)
    }

    pub fn root_verdict(&self) -> Option<Verdict> {
        self.root().verdict()
    }

    pub fn root_score(&self) -> Option<f64> {
        self.root().score
    }

    pub fn grade(&self, path: &TestdataPath) -> Option<Grade> {
        self.grades.get(path).copied()
    }

    pub fn outcome(&self, path: &TestdataPath) -> Outcome {
        self.grade(path).map(|g| g.outcome).unwrap_or(Outcome::NotRun)
    }

    pub fn is_skipped(&self, path: &TestcasePath) -> bool {
        self.skipped.contains(path)
    }

    pub fn is_missing(&self, path: &TestcasePath) -> bool {
        self.missing.contains(path)
    }

    /// Every testcase that should have run has a result.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Compare the computed root verdict with one reported independently
    /// (for example by an external grader). A mismatch is recorded and
    /// emitted; returns whether the two agree.
    pub fn check_root(&mut self, expected: Verdict) -> bool {
        let computed = self.root().outcome;
        let expected = Outcome::Judged(expected);
        if computed == expected {
            return true;
        }
        obs::emit_inconsistency(".", &computed.to_string(), &expected.to_string());
        self.inconsistencies.push(AggregationInconsistency {
            node: TestdataPath::root(),
            computed,
            expected,
        });
        false
    }
}

/// Grade `results` against `tree`.
///
/// Leaves take their result's verdict and score (falling back to the parent
/// group's `accept_score`/`reject_score`); groups aggregate their children
/// per their grader config. Leaves behind a `break` are `NotRun` even when a
/// result exists for them.
pub fn grade(tree: &TestdataTree, results: &[TestcaseResult]) -> GradeReport {
    let mut report = GradeReport::empty();
    let mut by_path: HashMap<&TestcasePath, &TestcaseResult> = HashMap::new();
    for result in results {
        if !tree.contains_testcase(&result.path) {
            debug!(event = "grading.unknown_result", path = %result.path);
            report.unknown_results.push(result.path.clone());
            continue;
        }
        by_path.entry(&result.path).or_insert(result);
    }

    let root = grade_group(tree.root(), &by_path, false, &mut report);
    obs::emit_graded(&root.outcome.to_string(), root.score);
    report
}

fn grade_group(
    group: &TestGroup,
    results: &HashMap<&TestcasePath, &TestcaseResult>,
    skipped: bool,
    report: &mut GradeReport,
) -> Grade {
    let mut children = Vec::with_capacity(group.children.len());
    let mut stopped = skipped;
    for child in &group.children {
        let grade = match child {
            TestdataNode::Testcase(tc) => {
                let grade = grade_leaf(group, &tc.path, results, stopped, report);
                report.grades.insert(tc.path.clone(), grade);
                grade
            }
            TestdataNode::Group(sub) => grade_group(sub, results, stopped, report),
        };
        if !stopped && stops_evaluation(group, child.name(), &grade) {
            stopped = true;
        }
        children.push(ChildGrade {
            name: child.name(),
            grade,
        });
    }

    let grade = if skipped {
        Grade::NOT_RUN
    } else {
        aggregate_group(group, &children)
    };

    if let Some(score) = grade.score {
        if !group.grader.range.contains(score) {
            obs::emit_range_violation(&group.path.to_string(), score, &group.grader.range.to_string());
            report.range_violations.push(RangeViolation {
                node: group.path.clone(),
                score,
                range: group.grader.range,
            });
        }
    }

    report.grades.insert(group.path.clone(), grade);
    grade
}

fn grade_leaf(
    parent: &TestGroup,
    path: &TestcasePath,
    results: &HashMap<&TestcasePath, &TestcaseResult>,
    skipped: bool,
    report: &mut GradeReport,
) -> Grade {
    if skipped {
        report.skipped.insert(path.clone());
        return Grade::NOT_RUN;
    }
    match results.get(path) {
        Some(result) => leaf_grade(parent, result),
        None => {
            report.missing.insert(path.clone());
            Grade::NOT_RUN
        }
    }
}

/// Grade of a single testcase result inside `parent`.
pub fn leaf_grade(parent: &TestGroup, result: &TestcaseResult) -> Grade {
    let score = result
        .score
        .unwrap_or_else(|| parent.grader.default_score(result.verdict.is_accepted()));
    Grade::judged(result.verdict, score)
}
