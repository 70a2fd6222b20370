//! Structured tracing events for grading and expectation checks.
//!
//! Non-fatal findings (range violations, inconsistencies, ambiguous
//! overrides) are emitted at `warn!` level when they are produced; lifecycle
//! events at `info!`/`debug!`.

use tracing::{debug, info, warn};

/// Emit event: testdata tree built.
pub fn emit_testdata_built(testcases: usize, groups: usize, digest: &str) {
    info!(
        event = "testdata.built",
        testcases = testcases,
        groups = groups,
        digest = %digest,
    );
}

/// Emit event: a group asks for a custom grader; the default policy is used.
pub fn emit_custom_grading(group: &str) {
    warn!(event = "testdata.custom_grading", group = %group, "custom grader declared; aggregating with the default grader policy");
}

/// Emit event: `ignore_sample` set below the root has no effect.
pub fn emit_ignore_sample_below_root(group: &str) {
    debug!(event = "grading.ignore_sample_ignored", group = %group);
}

/// Emit event: aggregated score outside the group's declared range.
pub fn emit_range_violation(node: &str, score: f64, range: &str) {
    warn!(
        event = "grading.range_violation",
        node = %node,
        score = score,
        range = %range,
    );
}

/// Emit event: computed verdict disagrees with an independently known one.
pub fn emit_inconsistency(node: &str, computed: &str, expected: &str) {
    warn!(
        event = "grading.inconsistency",
        node = %node,
        computed = %computed,
        expected = %expected,
    );
}

/// Emit event: root grade computed for a submission.
pub fn emit_graded(root_verdict: &str, root_score: Option<f64>) {
    debug!(event = "grading.graded", verdict = %root_verdict, score = ?root_score);
}

/// Emit event: nested expectation permits verdicts its ancestor forbids.
pub fn emit_ambiguous_override(pattern: &str, node: &str, loosened: &str) {
    warn!(
        event = "expectations.ambiguous_override",
        pattern = %pattern,
        node = %node,
        loosened = %loosened,
    );
}

/// Emit event: no registry pattern matches the submission.
pub fn emit_unmatched_submission(submission: &str) {
    warn!(event = "expectations.unmatched_submission", submission = %submission);
}

/// Emit event: no pattern matched; the submission directory decides.
pub fn emit_directory_default(submission: &str, abbreviation: &str) {
    debug!(
        event = "expectations.directory_default",
        submission = %submission,
        expectation = %abbreviation,
    );
}

/// Emit event: expectations checked for one submission.
pub fn emit_expectations_evaluated(submission: &str, passed: bool, violations: usize, complete: bool) {
    info!(
        event = "expectations.evaluated",
        submission = %submission,
        passed = passed,
        violations = violations,
        complete = complete,
    );
}
