//! Verdict aggregation for one group.

use crate::grader::{GraderFlags, OnReject, VerdictMode};
use crate::verdict::{Outcome, Verdict};

/// Under `on_reject: break` only the children up to and including the first
/// rejection (in evaluation order) take part in aggregation.
pub fn truncate_on_reject<T>(children: &[T], on_reject: OnReject, outcome: impl Fn(&T) -> Outcome) -> &[T] {
    match on_reject {
        OnReject::Continue => children,
        OnReject::Break => match children.iter().position(|c| outcome(c).is_rejected()) {
            Some(idx) => &children[..=idx],
            None => children,
        },
    }
}

/// Aggregate child outcomes (already in evaluation order and already
/// truncated) into the group's outcome.
///
/// - no children at all: `AC`
/// - every child `NotRun`: `NotRun`
/// - otherwise the verdict mode decides, and `accept_if_any_accepted` forces
///   `AC` when some child is accepted.
pub fn aggregate_verdict(children: &[Outcome], flags: &GraderFlags) -> Outcome {
    if children.is_empty() {
        return Outcome::Judged(Verdict::Accepted);
    }
    let judged: Vec<Verdict> = children.iter().filter_map(|o| o.verdict()).collect();
    if judged.is_empty() {
        return Outcome::NotRun;
    }

    let base = match flags.verdict_mode {
        VerdictMode::WorstError => judged.iter().copied().max().unwrap_or(Verdict::Accepted),
        VerdictMode::FirstError => judged
            .iter()
            .copied()
            .find(|v| !v.is_accepted())
            .unwrap_or(Verdict::Accepted),
        VerdictMode::AlwaysAccept => Verdict::Accepted,
    };

    if flags.accept_if_any_accepted && judged.iter().any(|v| v.is_accepted()) {
        return Outcome::Judged(Verdict::Accepted);
    }
    Outcome::Judged(base)
}
