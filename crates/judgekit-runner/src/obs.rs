//! Structured tracing events for the runner.

use tracing::{debug, info, warn};

/// Emit event: a testcase produced no usable result.
pub fn emit_testcase_failed(submission: &str, testcase: &str, error: &str) {
    warn!(
        event = "runner.testcase_failed",
        submission = %submission,
        testcase = %testcase,
        error = %error,
        "testcase left NOT_RUN",
    );
}

/// Emit event: a `break` group stopped after a rejected child.
pub fn emit_group_stopped(submission: &str, group: &str, child: &str, skipped: usize) {
    debug!(
        event = "runner.group_stopped",
        submission = %submission,
        group = %group,
        child = %child,
        skipped = skipped,
    );
}

/// Emit event: one submission fully judged.
pub fn emit_submission_judged(submission: &str, results: usize, testcases: usize, outcome: &str) {
    info!(
        event = "runner.submission_judged",
        submission = %submission,
        results = results,
        testcases = testcases,
        outcome = %outcome,
    );
}

/// Emit event: batch finished.
pub fn emit_batch_completed(total: usize, passed: usize, failed: usize, incomplete: usize) {
    info!(
        event = "runner.batch_completed",
        total = total,
        passed = passed,
        failed = failed,
        incomplete = incomplete,
    );
}
