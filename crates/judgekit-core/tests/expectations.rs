use std::collections::BTreeSet;

use judgekit_core::{
    grade, Abbreviation, Expectation, ExpectationEvaluation, ExpectationEvaluator,
    ExpectationRegistry, SubmissionPath, TestcasePath, TestcaseResult, TestdataPath,
    TestdataTree, Verdict, ViolationKind,
};
use serde_json::json;

const LEAVES: [&str; 5] = [
    "sample/1",
    "secret/large/01",
    "secret/large/02",
    "secret/small/01",
    "secret/small/02",
];

fn tree() -> TestdataTree {
    TestdataTree::from_yaml_str(
        r#"
data:
  sample:
    data: { "1": gen }
  secret:
    on_reject: continue
    data:
      small: { data: { "01": gen, "02": gen } }
      large: { data: { "01": gen, "02": gen } }
"#,
    )
    .unwrap()
}

fn registry() -> ExpectationRegistry {
    ExpectationRegistry::from_yaml_str(
        r#"
accepted/: accepted
wrong_answer/th.py:
  sample: accepted
  secret: wrong answer
wrong_answer/:
  secret: wrong answer
  secret/small: accepted
mixed/failing.java:
  secret/large/02:
    allowed: [TLE, RTE]
"#,
    )
    .unwrap()
}

fn sub(raw: &str) -> SubmissionPath {
    SubmissionPath::parse(raw).unwrap()
}

/// Every leaf accepted unless overridden.
fn results(overrides: &[(&str, Verdict)]) -> Vec<TestcaseResult> {
    LEAVES
        .iter()
        .map(|leaf| {
            let verdict = overrides
                .iter()
                .find(|(path, _)| path == leaf)
                .map(|(_, v)| *v)
                .unwrap_or(Verdict::Accepted);
            TestcaseResult::new(TestcasePath::parse(leaf).unwrap(), verdict)
        })
        .collect()
}

fn check(submission: &str, overrides: &[(&str, Verdict)]) -> ExpectationEvaluation {
    let tree = tree();
    let registry = registry();
    ExpectationEvaluator::new(&registry, &tree).check(&sub(submission), &results(overrides))
}

fn violated_nodes(eval: &ExpectationEvaluation) -> BTreeSet<String> {
    eval.violations.iter().map(|v| v.node.to_string()).collect()
}

// ── Abbreviations ──────────────────────────────────────────────────────

#[test]
fn accepted_submission_with_all_ac_passes() {
    let eval = check("accepted/sol.py", &[]);
    assert!(eval.passed);
    assert!(eval.complete);
    let matched: Vec<&str> = eval.matched_patterns.iter().map(|p| p.as_str()).collect();
    assert_eq!(matched, vec!["accepted"]);
}

#[test]
fn accepted_submission_with_wa_fails_on_every_enclosing_node() {
    let eval = check("accepted/sol.py", &[("secret/large/02", Verdict::WrongAnswer)]);
    assert!(!eval.passed);
    assert_eq!(
        violated_nodes(&eval),
        BTreeSet::from([
            ".".to_string(),
            "secret".to_string(),
            "secret/large".to_string(),
            "secret/large/02".to_string(),
        ])
    );
    let leaf = eval
        .violations
        .iter()
        .find(|v| v.node.to_string() == "secret/large/02")
        .unwrap();
    assert_eq!(
        leaf.kind,
        ViolationKind::Forbidden {
            verdicts: BTreeSet::from([Verdict::WrongAnswer]),
            testcases: vec![TestcasePath::parse("secret/large/02").unwrap()],
        }
    );
}

#[test]
fn wrong_answer_needs_one_wa_in_its_scope() {
    let eval = check("wrong_answer/other.py", &[("secret/large/01", Verdict::WrongAnswer)]);
    assert!(eval.passed, "{:?}", eval.violations);

    let eval = check("wrong_answer/other.py", &[]);
    assert!(!eval.passed);
    assert_eq!(violated_nodes(&eval), BTreeSet::from(["secret".to_string()]));
    assert!(matches!(
        eval.violations[0].kind,
        ViolationKind::MissingRequired { .. }
    ));
}

#[test]
fn wrong_answer_rejects_tle() {
    let eval = check(
        "wrong_answer/other.py",
        &[
            ("secret/large/01", Verdict::WrongAnswer),
            ("secret/large/02", Verdict::TimeLimitExceeded),
        ],
    );
    assert!(!eval.passed);
    assert!(eval.violations.iter().any(|v| matches!(
        &v.kind,
        ViolationKind::Forbidden { verdicts, .. } if verdicts.contains(&Verdict::TimeLimitExceeded)
    )));
}

// ── Nested overrides ───────────────────────────────────────────────────

#[test]
fn nested_override_applies_to_its_subtree_only() {
    let eval = check("wrong_answer/other.py", &[("secret/small/01", Verdict::WrongAnswer)]);
    assert!(!eval.passed);
    assert_eq!(
        violated_nodes(&eval),
        BTreeSet::from(["secret/small".to_string(), "secret/small/01".to_string()])
    );
}

#[test]
fn submission_matching_two_patterns_checks_both() {
    let eval = check("wrong_answer/th.py", &[("secret/large/01", Verdict::WrongAnswer)]);
    let matched: Vec<&str> = eval.matched_patterns.iter().map(|p| p.as_str()).collect();
    assert_eq!(matched, vec!["wrong_answer/th.py", "wrong_answer"]);
    assert!(eval.passed);

    let eval = check("wrong_answer/th.py", &[("secret/small/02", Verdict::WrongAnswer)]);
    assert!(!eval.passed);
    assert!(eval
        .violations
        .iter()
        .all(|v| v.pattern.as_str() == "wrong_answer"));
}

#[test]
fn multi_segment_key_targets_single_testcase() {
    let eval = check("mixed/failing.java", &[("secret/large/02", Verdict::TimeLimitExceeded)]);
    assert!(eval.passed);

    let eval = check("mixed/failing.java", &[("secret/large/02", Verdict::WrongAnswer)]);
    assert_eq!(
        violated_nodes(&eval),
        BTreeSet::from(["secret/large/02".to_string()])
    );

    // AC is not in the allowed set either.
    let eval = check("mixed/failing.java", &[]);
    assert!(!eval.passed);
}

#[test]
fn loosening_override_is_warned_not_rejected() {
    let tree = tree();
    let registry = ExpectationRegistry::from_value(&json!({
        "loose.py": {"permitted": ["AC"], "secret": "wrong answer"}
    }))
    .unwrap();
    let eval = ExpectationEvaluator::new(&registry, &tree)
        .check(&sub("loose.py"), &results(&[("secret/small/01", Verdict::WrongAnswer)]));
    assert_eq!(eval.warnings.len(), 1);
    assert_eq!(eval.warnings[0].node, TestdataPath::parse("secret").unwrap());
    assert_eq!(
        eval.warnings[0].loosened,
        BTreeSet::from([Verdict::WrongAnswer])
    );
    // The root still forbids WA anywhere below it.
    assert!(violated_nodes(&eval).contains("."));
    assert!(!violated_nodes(&eval).contains("secret"));
}

// ── Grader flags ───────────────────────────────────────────────────────

fn raw(results: &[(&str, Verdict)]) -> Vec<TestcaseResult> {
    results
        .iter()
        .map(|(path, v)| TestcaseResult::new(TestcasePath::parse(path).unwrap(), *v))
        .collect()
}

fn accepted_registry() -> ExpectationRegistry {
    ExpectationRegistry::from_value(&json!({"accepted": "accepted"})).unwrap()
}

#[test]
fn ignored_sample_is_unconstrained() {
    let tree = TestdataTree::from_value(&json!({
        "grader_flags": "ignore_sample",
        "data": {
            "sample": {"data": {"1": "gen"}},
            "secret": {"data": {"a": "gen"}}
        }
    }))
    .unwrap();
    let registry = accepted_registry();
    let evaluator = ExpectationEvaluator::new(&registry, &tree);
    let results = raw(&[("sample/1", Verdict::WrongAnswer), ("secret/a", Verdict::Accepted)]);

    assert_eq!(grade(&tree, &results).root_verdict(), Some(Verdict::Accepted));
    let eval = evaluator.check(&sub("accepted/sol.py"), &results);
    assert!(eval.passed, "{:?}", eval.violations);

    let at = |path: &str| {
        evaluator
            .effective(&sub("accepted/sol.py"), &TestdataPath::parse(path).unwrap())
            .remove(0)
            .1
    };
    assert_eq!(at("sample"), Expectation::default());
    assert_eq!(at("sample/1"), Expectation::default());
    assert_eq!(at("secret"), Abbreviation::Accepted.expectation());
    assert_eq!(at("."), Abbreviation::Accepted.expectation());

    // Without the flag the sample WA counts everywhere above it.
    let strict = TestdataTree::from_value(&json!({
        "data": {
            "sample": {"data": {"1": "gen"}},
            "secret": {"data": {"a": "gen"}}
        }
    }))
    .unwrap();
    let eval = ExpectationEvaluator::new(&registry, &strict).check(&sub("accepted/sol.py"), &results);
    assert_eq!(
        violated_nodes(&eval),
        BTreeSet::from([".".to_string(), "sample".to_string(), "sample/1".to_string()])
    );
}

#[test]
fn accept_if_any_accepted_judges_the_group_not_its_children() {
    let tree = TestdataTree::from_value(&json!({
        "data": {
            "sample": {"data": {"1": "gen"}},
            "secret": {
                "on_reject": "continue",
                "grader_flags": "accept_if_any_accepted",
                "data": [{"1": "gen"}, {"2": "gen"}, {"3": "gen"}]
            }
        }
    }))
    .unwrap();
    let registry = accepted_registry();
    let evaluator = ExpectationEvaluator::new(&registry, &tree);

    let eval = evaluator.check(
        &sub("accepted/sol.py"),
        &raw(&[
            ("sample/1", Verdict::Accepted),
            ("secret/1", Verdict::WrongAnswer),
            ("secret/2", Verdict::Accepted),
            ("secret/3", Verdict::WrongAnswer),
        ]),
    );
    assert!(eval.passed, "{:?}", eval.violations);

    let eval = evaluator.check(
        &sub("accepted/sol.py"),
        &raw(&[
            ("sample/1", Verdict::Accepted),
            ("secret/1", Verdict::WrongAnswer),
            ("secret/2", Verdict::TimeLimitExceeded),
            ("secret/3", Verdict::WrongAnswer),
        ]),
    );
    assert_eq!(
        violated_nodes(&eval),
        BTreeSet::from([".".to_string(), "secret".to_string()])
    );
}

#[test]
fn always_accept_root_leaves_everything_below_unconstrained() {
    let tree = TestdataTree::from_value(&json!({
        "grader_flags": "always_accept",
        "data": {
            "sample": {"data": {"1": "gen"}},
            "secret": {"data": {"a": "gen"}}
        }
    }))
    .unwrap();
    let registry = accepted_registry();
    let results = raw(&[("sample/1", Verdict::Accepted), ("secret/a", Verdict::WrongAnswer)]);

    assert_eq!(grade(&tree, &results).root_verdict(), Some(Verdict::Accepted));
    let evaluator = ExpectationEvaluator::new(&registry, &tree);
    let eval = evaluator.check(&sub("accepted/sol.py"), &results);
    assert!(eval.passed, "{:?}", eval.violations);
    assert_eq!(
        evaluator
            .effective(&sub("accepted/sol.py"), &TestdataPath::parse("secret").unwrap())
            .remove(0)
            .1,
        Expectation::default()
    );
}

// ── Directory defaults ─────────────────────────────────────────────────

#[test]
fn unmatched_submission_falls_back_to_its_directory() {
    let tree = tree();
    let empty = ExpectationRegistry::default();
    let evaluator = ExpectationEvaluator::new(&empty, &tree);

    let eval = evaluator.check(&sub("accepted/sol.py"), &results(&[("secret/small/01", Verdict::WrongAnswer)]));
    assert!(!eval.passed);
    let matched: Vec<&str> = eval.matched_patterns.iter().map(|p| p.as_str()).collect();
    assert_eq!(matched, vec!["accepted"]);

    let eval = evaluator.check(&sub("time_limit_exceeded/slow.cpp"), &results(&[]));
    assert!(!eval.passed);
    assert!(eval
        .violations
        .iter()
        .any(|v| matches!(v.kind, ViolationKind::MissingRequired { .. })));

    let eval = evaluator.check(&sub("partially_accepted/p.py"), &results(&[("sample/1", Verdict::WrongAnswer)]));
    assert!(eval.passed);
    assert!(eval.matched_patterns.is_empty());
}

#[test]
fn registry_entry_beats_directory_default() {
    let tree = tree();
    let registry = ExpectationRegistry::from_value(&json!({"accepted/odd.py": "wrong answer"})).unwrap();
    let eval = ExpectationEvaluator::new(&registry, &tree)
        .check(&sub("accepted/odd.py"), &results(&[("secret/large/01", Verdict::WrongAnswer)]));
    assert!(eval.passed, "{:?}", eval.violations);
}

// ── Partial and short-circuited results ────────────────────────────────

#[test]
fn unmatched_submission_passes() {
    let eval = check("misc/experiment.py", &[("sample/1", Verdict::RunTimeError)]);
    assert!(eval.passed);
    assert!(eval.matched_patterns.is_empty());
}

#[test]
fn missing_results_fail_and_mark_incomplete() {
    let tree = tree();
    let registry = registry();
    let mut partial = results(&[]);
    partial.retain(|r| r.path.to_string() != "secret/small/02");

    let eval = ExpectationEvaluator::new(&registry, &tree).check(&sub("accepted/sol.py"), &partial);
    assert!(!eval.complete);
    assert!(!eval.passed);
    assert!(eval.violations.iter().any(|v| v.node.to_string() == "secret/small/02"
        && matches!(v.kind, ViolationKind::MissingResults { .. })));
}

#[test]
fn break_excludes_skipped_testcases_from_required() {
    let registry = ExpectationRegistry::from_value(&json!({
        "x.py": {"secret": {"required": ["RTE"]}}
    }))
    .unwrap();
    let raw = vec![
        TestcaseResult::new(TestcasePath::parse("secret/a").unwrap(), Verdict::TimeLimitExceeded),
        TestcaseResult::new(TestcasePath::parse("secret/b").unwrap(), Verdict::RunTimeError),
        TestcaseResult::new(TestcasePath::parse("secret/c").unwrap(), Verdict::Accepted),
    ];

    let breaking = TestdataTree::from_value(&json!({
        "data": {"secret": {"data": [{"a": "gen"}, {"b": "gen"}, {"c": "gen"}]}}
    }))
    .unwrap();
    let eval = ExpectationEvaluator::new(&registry, &breaking).check(&sub("x.py"), &raw);
    assert!(eval.complete);
    assert!(!eval.passed);

    let continuing = TestdataTree::from_value(&json!({
        "data": {"secret": {
            "on_reject": "continue",
            "data": [{"a": "gen"}, {"b": "gen"}, {"c": "gen"}]
        }}
    }))
    .unwrap();
    let eval = ExpectationEvaluator::new(&registry, &continuing).check(&sub("x.py"), &raw);
    assert!(eval.passed, "{:?}", eval.violations);
}

#[test]
fn score_expectation_checks_aggregated_score() {
    let tree = tree();
    let registry = ExpectationRegistry::from_value(&json!({
        "partial.py": {"secret": {"score": "0 3"}}
    }))
    .unwrap();
    let report = grade(&tree, &results(&[]));
    let eval = ExpectationEvaluator::new(&registry, &tree).evaluate(&sub("partial.py"), &report);
    assert_eq!(eval.violations.len(), 1);
    assert!(matches!(
        eval.violations[0].kind,
        ViolationKind::ScoreOutOfRange { score, .. } if score == 4.0
    ));
}

#[test]
fn evaluation_serializes_with_violation_kind_tag() {
    let eval = check("accepted/sol.py", &[("sample/1", Verdict::WrongAnswer)]);
    let value = serde_json::to_value(&eval).unwrap();
    assert_eq!(value["passed"], json!(false));
    assert_eq!(value["violations"][0]["kind"], json!("forbidden"));
    assert_eq!(value["violations"][0]["pattern"], json!("accepted"));
}
