//! Grader policy for a single group: which children count, and how their
//! grades combine.

use serde::{Deserialize, Serialize};

use crate::grader::{OnReject, VerdictMode};
use crate::grading::score::aggregate_score;
use crate::grading::verdict::{aggregate_verdict, truncate_on_reject};
use crate::testdata::TestGroup;
use crate::verdict::{Outcome, Verdict};

/// Outcome and score of one node. `score` is `None` exactly when the node
/// was not run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub outcome: Outcome,
    pub score: Option<f64>,
}

impl Grade {
    pub const NOT_RUN: Grade = Grade {
        outcome: Outcome::NotRun,
        score: None,
    };

    pub fn judged(verdict: Verdict, score: f64) -> Self {
        Self {
            outcome: Outcome::Judged(verdict),
            score: Some(score),
        }
    }

    pub fn verdict(&self) -> Option<Verdict> {
        self.outcome.verdict()
    }
}

/// A child's grade as seen by its parent during aggregation.
#[derive(Debug, Clone, Copy)]
pub struct ChildGrade<'a> {
    pub name: &'a str,
    pub grade: Grade,
}

/// `sample` under a root with `ignore_sample` neither counts toward the root
/// grade nor stops evaluation under `break`.
pub fn is_ignored_child(group: &TestGroup, child_name: &str) -> bool {
    group.is_root() && group.grader.flags.ignore_sample && child_name == "sample"
}

/// Under `always_accept` or `accept_if_any_accepted` a single child's
/// verdict cannot decide the group, so only the group's own grade matters.
pub fn masks_children(group: &TestGroup) -> bool {
    group.grader.flags.verdict_mode == VerdictMode::AlwaysAccept
        || group.grader.flags.accept_if_any_accepted
}

/// Whether evaluation of `group` stops after a child with this grade.
pub fn stops_evaluation(group: &TestGroup, child_name: &str, grade: &Grade) -> bool {
    group.grader.on_reject == OnReject::Break
        && grade.outcome.is_rejected()
        && !is_ignored_child(group, child_name)
}

/// Combine the children of `group` (in evaluation order) into the group's
/// grade.
pub fn aggregate_group(group: &TestGroup, children: &[ChildGrade<'_>]) -> Grade {
    let counted: Vec<&ChildGrade<'_>> = children
        .iter()
        .filter(|c| !is_ignored_child(group, c.name))
        .collect();
    let input = truncate_on_reject(&counted, group.grader.on_reject, |c| c.grade.outcome);

    let outcomes: Vec<Outcome> = input.iter().map(|c| c.grade.outcome).collect();
    let outcome = aggregate_verdict(&outcomes, &group.grader.flags);
    if outcome == Outcome::NotRun {
        return Grade::NOT_RUN;
    }

    let scores: Vec<Option<f64>> = input.iter().map(|c| c.grade.score).collect();
    Grade {
        outcome,
        score: Some(aggregate_score(&scores, group.grader.flags.score_mode)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grader::{GraderConfig, GraderFlags, ScoreMode};
    use crate::path::TestdataPath;
    use crate::testdata::ChildOrder;

    fn group(path: &str, grader: GraderConfig) -> TestGroup {
        TestGroup {
            path: TestdataPath::parse(path).unwrap(),
            grader,
            order: ChildOrder::Unordered,
            children: Vec::new(),
        }
    }

    fn child(name: &str, verdict: Verdict, score: f64) -> ChildGrade<'_> {
        ChildGrade {
            name,
            grade: Grade::judged(verdict, score),
        }
    }

    #[test]
    fn test_break_truncates_scores_after_first_rejection() {
        let g = group("secret", GraderConfig::default());
        let children = [
            child("a", Verdict::Accepted, 1.0),
            child("b", Verdict::WrongAnswer, 0.0),
            child("c", Verdict::Accepted, 1.0),
        ];
        let grade = aggregate_group(&g, &children);
        assert_eq!(grade.verdict(), Some(Verdict::WrongAnswer));
        assert_eq!(grade.score, Some(1.0));
    }

    #[test]
    fn test_continue_sums_every_child() {
        let grader = GraderConfig {
            on_reject: OnReject::Continue,
            ..Default::default()
        };
        let g = group("secret", grader);
        let children = [
            child("a", Verdict::Accepted, 1.0),
            child("b", Verdict::WrongAnswer, 0.0),
            child("c", Verdict::Accepted, 1.0),
        ];
        assert_eq!(aggregate_group(&g, &children).score, Some(2.0));
    }

    #[test]
    fn test_ignore_sample_only_at_root() {
        let grader = GraderConfig {
            flags: GraderFlags {
                ignore_sample: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let root = group(".", grader);
        let children = [
            child("sample", Verdict::WrongAnswer, 0.0),
            child("secret", Verdict::Accepted, 5.0),
        ];
        let grade = aggregate_group(&root, &children);
        assert_eq!(grade, Grade::judged(Verdict::Accepted, 5.0));
        assert!(!stops_evaluation(&root, "sample", &children[0].grade));

        let nested = group("secret", grader);
        let grade = aggregate_group(&nested, &children);
        assert_eq!(grade.verdict(), Some(Verdict::WrongAnswer));
    }

    #[test]
    fn test_all_not_run_children_give_not_run() {
        let g = group("secret", GraderConfig::default());
        let children = [ChildGrade {
            name: "a",
            grade: Grade::NOT_RUN,
        }];
        assert_eq!(aggregate_group(&g, &children), Grade::NOT_RUN);
    }

    #[test]
    fn test_empty_group_is_accepted_with_zero() {
        let grader = GraderConfig {
            flags: GraderFlags {
                score_mode: ScoreMode::Min,
                ..Default::default()
            },
            ..Default::default()
        };
        let g = group("secret/empty", grader);
        assert_eq!(aggregate_group(&g, &[]), Grade::judged(Verdict::Accepted, 0.0));
    }

    #[test]
    fn test_masks_children_for_acceptance_overrides() {
        assert!(!masks_children(&group("secret", GraderConfig::default())));

        let any = GraderConfig {
            flags: GraderFlags {
                accept_if_any_accepted: true,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(masks_children(&group("secret", any)));

        let always = GraderConfig {
            flags: GraderFlags {
                verdict_mode: VerdictMode::AlwaysAccept,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(masks_children(&group("secret", always)));
    }
}
