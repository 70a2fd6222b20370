//! Checks a submission's graded results against the expectations that apply
//! to it.
//!
//! For each matched submission pattern, every node of the testdata tree gets
//! an effective expectation by walking the pattern's nested entries along
//! the node's path. At each step the candidate that consumes the most path
//! segments wins, then a literal pattern beats one with `*`, then the
//! earlier declaration. A node's own expectation replaces the inherited one
//! for its subtree.
//!
//! `permitted` is checked at every node. `required` is checked only at the
//! node an expectation is declared for: `secret: wrong answer` asks for a
//! `WA` somewhere in `secret`, not in every testcase below it.

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::expectations::expectation::{join, Abbreviation, Expectation};
use crate::expectations::pattern::Pattern;
use crate::expectations::registry::{ExpectationNode, ExpectationRegistry};
use crate::grading::{grade, is_ignored_child, masks_children, GradeReport};
use crate::obs;
use crate::path::{SubmissionPath, TestcasePath, TestdataPath};
use crate::range::ScoreRange;
use crate::testdata::{NodeRef, TestGroup, TestdataNode, TestdataTree};
use crate::verdict::{Outcome, TestcaseResult, Verdict};

/// Why a node failed its expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// Testcases under the node produced verdicts outside `permitted`.
    Forbidden {
        verdicts: BTreeSet<Verdict>,
        testcases: Vec<TestcasePath>,
    },
    /// None of the `required` verdicts occurred under the node.
    MissingRequired { required: BTreeSet<Verdict> },
    /// Testcases that should have run have no result.
    MissingResults { testcases: Vec<TestcasePath> },
    /// The node's aggregated score is outside the expected range.
    ScoreOutOfRange { score: f64, range: ScoreRange },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationViolation {
    /// Submission pattern the expectation came from.
    pub pattern: Pattern,
    pub node: TestdataPath,
    pub expectation: Expectation,
    #[serde(flatten)]
    pub kind: ViolationKind,
}

impl ExpectationViolation {
    pub fn reason(&self) -> String {
        match &self.kind {
            ViolationKind::Forbidden { verdicts, .. } => {
                format!("verdicts {{{}}} not permitted", join(verdicts))
            }
            ViolationKind::MissingRequired { required } => {
                format!("none of the required verdicts {{{}}} occurred", join(required))
            }
            ViolationKind::MissingResults { testcases } => {
                format!("{} testcase(s) without result", testcases.len())
            }
            ViolationKind::ScoreOutOfRange { score, range } => {
                format!("score {score} outside {range}")
            }
        }
    }
}

/// A nested expectation permits verdicts its ancestor forbids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousOverride {
    pub pattern: Pattern,
    pub node: TestdataPath,
    pub loosened: BTreeSet<Verdict>,
}

/// Outcome of checking one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectationEvaluation {
    pub submission: SubmissionPath,
    pub matched_patterns: Vec<Pattern>,
    pub passed: bool,
    /// Every testcase that should have run has a result.
    pub complete: bool,
    pub violations: Vec<ExpectationViolation>,
    pub warnings: Vec<AmbiguousOverride>,
}

/// Effective expectation at one testdata node under one matched pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub expectation: Expectation,
    /// The expectation is declared for exactly this node.
    pub declared_here: bool,
    /// Set when an override that loosens its ancestor ends at this node.
    pub loosened: Option<BTreeSet<Verdict>>,
}

/// Walk `root` along `path` and return the effective expectation.
pub fn resolve(root: &ExpectationNode, path: &TestdataPath) -> Resolution {
    let segments = path.segments();
    let mut node = root;
    let mut pos = 0;
    let mut effective = root.expectation.clone().unwrap_or_default();
    let mut declared_at = 0;
    let mut loosened = None;

    while pos < segments.len() {
        let Some((pattern, child)) = best_child(node, &segments[pos..]) else {
            break;
        };
        pos += pattern.segment_count();
        if let Some(own) = &child.expectation {
            let extra = own.loosened_from(&effective);
            loosened = (pos == segments.len() && !extra.is_empty()).then_some(extra);
            effective = own.clone();
            declared_at = pos;
        }
        node = child;
    }

    Resolution {
        expectation: effective,
        declared_here: declared_at == segments.len(),
        loosened,
    }
}

fn best_child<'n>(node: &'n ExpectationNode, rest: &[String]) -> Option<(&'n Pattern, &'n ExpectationNode)> {
    node.children
        .iter()
        .enumerate()
        .filter(|(_, (pattern, _))| {
            let k = pattern.segment_count();
            k <= rest.len() && pattern.matches(&rest[..k].join("/"))
        })
        .max_by_key(|(idx, (pattern, _))| {
            (
                pattern.segment_count(),
                pattern.is_literal(),
                std::cmp::Reverse(*idx),
            )
        })
        .map(|(_, (pattern, child))| (pattern, child))
}

/// Checks submissions against one registry over one testdata tree.
#[derive(Debug, Clone, Copy)]
pub struct ExpectationEvaluator<'a> {
    registry: &'a ExpectationRegistry,
    tree: &'a TestdataTree,
}

impl<'a> ExpectationEvaluator<'a> {
    pub fn new(registry: &'a ExpectationRegistry, tree: &'a TestdataTree) -> Self {
        Self { registry, tree }
    }

    /// Expectation trees that apply to `submission`: every matching registry
    /// entry, or the default for its top-level directory when none match.
    pub fn applicable(&self, submission: &SubmissionPath) -> Vec<(Pattern, Cow<'a, ExpectationNode>)> {
        let matched: Vec<(Pattern, Cow<'a, ExpectationNode>)> = self
            .registry
            .matching(submission)
            .into_iter()
            .map(|(pattern, node)| (pattern.clone(), Cow::Borrowed(node)))
            .collect();
        if !matched.is_empty() {
            return matched;
        }
        directory_default(submission)
            .map(|(pattern, node)| vec![(pattern, Cow::Owned(node))])
            .unwrap_or_default()
    }

    /// Effective expectation at `path` for every expectation tree that
    /// applies to the submission.
    pub fn effective(&self, submission: &SubmissionPath, path: &TestdataPath) -> Vec<(Pattern, Expectation)> {
        let unconstrained = self.is_unconstrained(path);
        self.applicable(submission)
            .into_iter()
            .map(|(pattern, root)| {
                let expectation = if unconstrained {
                    Expectation::default()
                } else {
                    resolve(&root, path).expectation
                };
                (pattern, expectation)
            })
            .collect()
    }

    /// Grade the raw results, then evaluate.
    pub fn check(&self, submission: &SubmissionPath, results: &[TestcaseResult]) -> ExpectationEvaluation {
        let report = grade(self.tree, results);
        self.evaluate(submission, &report)
    }

    #[instrument(skip_all, fields(submission = %submission))]
    pub fn evaluate(&self, submission: &SubmissionPath, report: &GradeReport) -> ExpectationEvaluation {
        let applicable = self.applicable(submission);
        if applicable.is_empty() {
            obs::emit_unmatched_submission(submission.as_str());
        }

        let mut violations = Vec::new();
        let mut warnings = Vec::new();
        let nodes = self.tree.iter();

        for (pattern, root) in &applicable {
            for node in &nodes {
                let path = node.path();
                if self.is_unconstrained(path) {
                    continue;
                }
                let resolution = resolve(root, path);
                if let Some(loosened) = &resolution.loosened {
                    obs::emit_ambiguous_override(pattern.as_str(), &path.to_string(), &join(loosened));
                    warnings.push(AmbiguousOverride {
                        pattern: pattern.clone(),
                        node: path.clone(),
                        loosened: loosened.clone(),
                    });
                }

                let observed = observed_paths(*node, report);
                for kind in check_node(&resolution, path, &observed, report) {
                    violations.push(ExpectationViolation {
                        pattern: pattern.clone(),
                        node: path.clone(),
                        expectation: resolution.expectation.clone(),
                        kind,
                    });
                }
            }
        }

        let complete = report.is_complete();
        let passed = violations.is_empty();
        obs::emit_expectations_evaluated(submission.as_str(), passed, violations.len(), complete);
        ExpectationEvaluation {
            submission: submission.clone(),
            matched_patterns: applicable.into_iter().map(|(p, _)| p).collect(),
            passed,
            complete,
            violations,
            warnings,
        }
    }

    /// A node is unconstrained when no verdict below some ancestor can change
    /// that ancestor's grade: `sample` under a root with `ignore_sample`, and
    /// everything below a group with `always_accept` or
    /// `accept_if_any_accepted`.
    fn is_unconstrained(&self, path: &TestdataPath) -> bool {
        path.ancestors().iter().any(|ancestor| {
            self.tree.group(ancestor).is_some_and(|group| {
                masks_children(group) || is_ignored_child(group, &path.segments()[ancestor.depth()])
            })
        })
    }
}

/// Default expectation for a submission that no registry entry matches,
/// taken from its top-level directory.
fn directory_default(submission: &SubmissionPath) -> Option<(Pattern, ExpectationNode)> {
    let (directory, _) = submission.as_str().split_once('/')?;
    let abbreviation = Abbreviation::for_directory(directory)?;
    let pattern = Pattern::parse(directory).ok()?;
    obs::emit_directory_default(submission.as_str(), abbreviation.name());
    Some((pattern, ExpectationNode::leaf(abbreviation.expectation())))
}

/// Nodes whose outcomes form the verdict set at `node`: its non-skipped
/// testcases, except that a group masking its children contributes its own
/// grade and an ignored `sample` contributes nothing.
fn observed_paths<'t>(node: NodeRef<'t>, report: &GradeReport) -> Vec<&'t TestdataPath> {
    let mut out = Vec::new();
    match node {
        NodeRef::Testcase(tc) => {
            if !report.is_skipped(&tc.path) {
                out.push(&tc.path);
            }
        }
        NodeRef::Group(group) => collect_observed(group, report, &mut out),
    }
    out
}

fn collect_observed<'t>(group: &'t TestGroup, report: &GradeReport, out: &mut Vec<&'t TestdataPath>) {
    if masks_children(group) {
        if group.testcases().iter().any(|tc| !report.is_skipped(&tc.path)) {
            out.push(&group.path);
        }
        return;
    }
    for child in &group.children {
        if is_ignored_child(group, child.name()) {
            continue;
        }
        match child {
            TestdataNode::Testcase(tc) => {
                if !report.is_skipped(&tc.path) {
                    out.push(&tc.path);
                }
            }
            TestdataNode::Group(sub) => collect_observed(sub, report, out),
        }
    }
}

/// Checks one node's expectation over the outcomes of its observed nodes.
/// Missing results count as outside `permitted`.
fn check_node(
    resolution: &Resolution,
    path: &TestdataPath,
    testcases: &[&TestdataPath],
    report: &GradeReport,
) -> Vec<ViolationKind> {
    let expectation = &resolution.expectation;
    let mut observed = Vec::with_capacity(testcases.len());
    let mut offending = Vec::new();
    let mut missing = Vec::new();
    for tc in testcases {
        match report.outcome(tc) {
            Outcome::Judged(verdict) => {
                if !expectation.permits(verdict) {
                    offending.push((*tc).clone());
                }
                observed.push(verdict);
            }
            Outcome::NotRun => missing.push((*tc).clone()),
        }
    }

    let mut kinds = Vec::new();
    let forbidden = expectation.forbidden_in(&observed);
    if !forbidden.is_empty() {
        kinds.push(ViolationKind::Forbidden {
            verdicts: forbidden,
            testcases: offending,
        });
    }
    if !missing.is_empty() {
        kinds.push(ViolationKind::MissingResults { testcases: missing });
    }
    if resolution.declared_here && !expectation.required_met(&observed) {
        kinds.push(ViolationKind::MissingRequired {
            required: expectation.required.clone(),
        });
    }
    if let (Some(range), Some(score)) = (expectation.score, report.grade(path).and_then(|g| g.score)) {
        if !range.contains(score) {
            kinds.push(ViolationKind::ScoreOutOfRange { score, range });
        }
    }
    kinds
}
