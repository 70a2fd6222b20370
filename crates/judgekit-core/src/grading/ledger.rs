//! Incremental grading: results arrive one at a time, grades propagate upward
//! as soon as they are determined.

use std::collections::HashMap;

use crate::error::GradingError;
use crate::grading::group::{aggregate_group, stops_evaluation, ChildGrade, Grade};
use crate::grading::report::{leaf_grade, AggregationInconsistency};
use crate::obs;
use crate::path::TestdataPath;
use crate::testdata::{NodeRef, TestGroup, TestdataTree};
use crate::verdict::TestcaseResult;

/// Running grade state of one submission.
///
/// A group is gradeable once all of its children are graded, or under
/// `on_reject: break` once a rejecting child exists and every earlier
/// sibling is graded.
#[derive(Debug)]
pub struct GradeLedger<'a> {
    tree: &'a TestdataTree,
    grades: HashMap<TestdataPath, Grade>,
    inconsistencies: Vec<AggregationInconsistency>,
}

impl<'a> GradeLedger<'a> {
    pub fn new(tree: &'a TestdataTree) -> Self {
        let mut ledger = Self {
            tree,
            grades: HashMap::new(),
            inconsistencies: Vec::new(),
        };
        // Groups without testcases are gradeable up front; children before
        // parents.
        for node in tree.iter().into_iter().rev() {
            if let NodeRef::Group(group) = node {
                if let Some(grade) = ledger.try_aggregate(group) {
                    ledger.grades.insert(group.path.clone(), grade);
                }
            }
        }
        ledger
    }

    /// Record one result. Returns the grades newly determined by it, leaf
    /// first and root last.
    pub fn record(
        &mut self,
        result: &TestcaseResult,
    ) -> Result<Vec<(TestdataPath, Grade)>, GradingError> {
        let tree = self.tree;
        let path = &result.path;
        let parent = path
            .parent()
            .and_then(|p| tree.group(&p))
            .filter(|_| tree.contains_testcase(path))
            .ok_or_else(|| GradingError::UnknownTestcase {
                path: path.to_string(),
            })?;
        if self.grades.contains_key(path) {
            return Err(GradingError::AlreadyGraded {
                path: path.to_string(),
            });
        }

        let leaf = leaf_grade(parent, result);
        self.grades.insert(path.clone(), leaf);
        let mut determined = vec![(path.clone(), leaf)];

        for ancestor in path.ancestors() {
            let Some(group) = tree.group(&ancestor) else {
                break;
            };
            let Some(grade) = self.try_aggregate(group) else {
                continue;
            };
            match self.grades.get(&ancestor) {
                None => {
                    self.grades.insert(ancestor.clone(), grade);
                    determined.push((ancestor, grade));
                }
                Some(previous) if previous.outcome != grade.outcome => {
                    obs::emit_inconsistency(
                        &ancestor.to_string(),
                        &grade.outcome.to_string(),
                        &previous.outcome.to_string(),
                    );
                    self.inconsistencies.push(AggregationInconsistency {
                        node: ancestor,
                        computed: grade.outcome,
                        expected: previous.outcome,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(determined)
    }

    pub fn grade(&self, path: &TestdataPath) -> Option<Grade> {
        self.grades.get(path).copied()
    }

    /// Root grade, once determined.
    pub fn root(&self) -> Option<Grade> {
        self.grade(&TestdataPath::root())
    }

    pub fn inconsistencies(&self) -> &[AggregationInconsistency] {
        &self.inconsistencies
    }

    fn try_aggregate(&self, group: &TestGroup) -> Option<Grade> {
        let mut children = Vec::with_capacity(group.children.len());
        for child in &group.children {
            let grade = *self.grades.get(child.path())?;
            children.push(ChildGrade {
                name: child.name(),
                grade,
            });
            if stops_evaluation(group, child.name(), &grade) {
                break;
            }
        }
        Some(aggregate_group(group, &children))
    }
}
