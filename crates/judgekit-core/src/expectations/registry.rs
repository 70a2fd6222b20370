//! Expectations document: submission pattern → expectation tree.
//!
//! ```yaml
//! accepted/: accepted
//! wrong_answer/th.py:
//!   sample: accepted
//!   secret: wrong answer
//! mixed/failing.java:
//!   secret/huge/graph07:
//!     allowed: [TLE, RTE]
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::expectations::expectation::{parse_score_range, parse_verdict_set, Abbreviation, Expectation};
use crate::expectations::pattern::Pattern;
use crate::path::SubmissionPath;

const PERMITTED_KEYS: [&str; 2] = ["permitted", "allowed"];
const REQUIRED_KEY: &str = "required";
const SCORE_KEY: &str = "score";

/// One level of an expectation tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpectationNode {
    /// Own expectation; `None` inherits the parent's.
    pub expectation: Option<Expectation>,
    /// Nested testdata patterns in declaration order.
    pub children: Vec<(Pattern, ExpectationNode)>,
}

impl ExpectationNode {
    pub(crate) fn leaf(expectation: Expectation) -> Self {
        Self {
            expectation: Some(expectation),
            children: Vec::new(),
        }
    }
}

/// Parsed expectations document. Read-only after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExpectationRegistry {
    entries: Vec<(Pattern, ExpectationNode)>,
}

impl ExpectationRegistry {
    pub fn from_value(doc: &Value) -> std::result::Result<Self, ConfigError> {
        let map = match doc {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => {
                return Err(ConfigError::MalformedNode {
                    path: ".".to_string(),
                    reason: "expectations must be a mapping from pattern to expectation".to_string(),
                })
            }
        };

        let mut entries: Vec<(Pattern, ExpectationNode)> = Vec::with_capacity(map.len());
        for (key, value) in map {
            let pattern = Pattern::parse(key)?;
            if entries.iter().any(|(p, _)| *p == pattern) {
                return Err(ConfigError::InvalidPattern {
                    pattern: key.clone(),
                    reason: "declared more than once".to_string(),
                });
            }
            let node = parse_node(value, key, true)?;
            entries.push((pattern, node));
        }
        Ok(Self { entries })
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(&doc)?)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(raw)?;
        Ok(Self::from_value(&doc)?)
    }

    pub fn entries(&self) -> &[(Pattern, ExpectationNode)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry whose pattern matches the submission or one of its
    /// ancestor directories, in declaration order.
    pub fn matching(&self, submission: &SubmissionPath) -> Vec<(&Pattern, &ExpectationNode)> {
        self.entries
            .iter()
            .filter(|(pattern, _)| pattern.matches_submission(submission))
            .map(|(pattern, node)| (pattern, node))
            .collect()
    }
}

fn parse_node(value: &Value, label: &str, top_level: bool) -> std::result::Result<ExpectationNode, ConfigError> {
    match value {
        Value::String(name) => {
            let abbreviation: Abbreviation = name.parse()?;
            Ok(ExpectationNode::leaf(abbreviation.expectation()))
        }
        Value::Array(_) => {
            let permitted = parse_verdict_set(value, label, "permitted")?;
            Ok(ExpectationNode::leaf(Expectation {
                permitted,
                ..Expectation::new(&[], &[])
            }))
        }
        Value::Object(map) => parse_object(map, label, top_level),
        other => Err(ConfigError::MalformedNode {
            path: label.to_string(),
            reason: format!("expected an abbreviation, a verdict list or a mapping, got {other}"),
        }),
    }
}

fn parse_object(
    map: &Map<String, Value>,
    label: &str,
    top_level: bool,
) -> std::result::Result<ExpectationNode, ConfigError> {
    let mut permitted = None;
    let mut required = None;
    let mut score = None;
    let mut children: Vec<(Pattern, ExpectationNode)> = Vec::new();

    for (key, value) in map {
        if PERMITTED_KEYS.contains(&key.as_str()) {
            if permitted.is_some() {
                return Err(ConfigError::MalformedNode {
                    path: label.to_string(),
                    reason: "both 'permitted' and 'allowed' given".to_string(),
                });
            }
            permitted = Some(parse_verdict_set(value, label, key)?);
        } else if key == REQUIRED_KEY {
            required = Some(parse_verdict_set(value, label, key)?);
        } else if key == SCORE_KEY {
            score = Some(parse_score_range(value)?);
        } else {
            let pattern = nested_pattern(key, label, top_level)?;
            let child = parse_node(value, key, false)?;
            children.push((pattern, child));
        }
    }

    let expectation = if permitted.is_some() || required.is_some() || score.is_some() {
        let defaults = Expectation::default();
        Some(Expectation {
            permitted: permitted.unwrap_or(defaults.permitted),
            required: required.unwrap_or(defaults.required),
            score,
        })
    } else {
        None
    };
    Ok(ExpectationNode {
        expectation,
        children,
    })
}

/// Keys directly below a submission pattern must address `sample`,
/// `secret` or `*`.
fn nested_pattern(key: &str, label: &str, top_level: bool) -> std::result::Result<Pattern, ConfigError> {
    let pattern = Pattern::parse(key)?;
    if !top_level {
        return Ok(pattern);
    }
    let head = Pattern::parse(pattern.first_segment())?;
    if head.matches("sample") || head.matches("secret") {
        return Ok(pattern);
    }
    if pattern.is_literal() && pattern.segment_count() == 1 {
        Err(ConfigError::UnknownExpectationKey {
            pattern: label.to_string(),
            key: key.to_string(),
        })
    } else {
        Err(ConfigError::InvalidNestedPattern {
            pattern: key.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::Verdict;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn sub(raw: &str) -> SubmissionPath {
        SubmissionPath::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_documented_example() {
        let registry = ExpectationRegistry::from_yaml_str(
            "accepted/: accepted\n\
             wrong_answer/th.py:\n  sample: accepted\n  secret: wrong answer\n\
             mixed/failing.java:\n  secret/huge/graph07:\n    allowed: [TLE, RTE]\n",
        )
        .unwrap();
        assert_eq!(registry.len(), 3);

        let (pattern, node) = &registry.entries()[0];
        assert_eq!(pattern.as_str(), "accepted");
        assert_eq!(node.expectation, Some(Abbreviation::Accepted.expectation()));

        let (_, th) = &registry.entries()[1];
        assert!(th.expectation.is_none());
        let names: Vec<&str> = th.children.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(names, vec!["sample", "secret"]);

        let (_, failing) = &registry.entries()[2];
        let graph = &failing.children[0].1;
        let expectation = graph.expectation.as_ref().unwrap();
        assert_eq!(
            expectation.permitted,
            BTreeSet::from([Verdict::TimeLimitExceeded, Verdict::RunTimeError])
        );
        assert!(expectation.required.is_empty());
    }

    #[test]
    fn test_matching_uses_ancestors() {
        let registry = ExpectationRegistry::from_value(&json!({
            "accepted": "accepted",
            "*/th.py": "wrong answer",
            "wrong_answer": "wrong answer"
        }))
        .unwrap();
        let matched: Vec<&str> = registry
            .matching(&sub("accepted/th.py"))
            .into_iter()
            .map(|(p, _)| p.as_str())
            .collect();
        assert_eq!(matched, vec!["accepted", "*/th.py"]);
        assert!(registry.matching(&sub("misc/x.cpp")).is_empty());
    }

    #[test]
    fn test_list_shorthand_and_score() {
        let registry = ExpectationRegistry::from_value(&json!({
            "partial": {"permitted": ["AC", "WA"], "required": "WA", "score": "10 50"},
            "slow": ["AC", "TLE"]
        }))
        .unwrap();
        let partial = registry.entries()[0].1.expectation.clone().unwrap();
        assert_eq!(partial.required, BTreeSet::from([Verdict::WrongAnswer]));
        assert!(partial.score.is_some());

        let slow = registry.entries()[1].1.expectation.clone().unwrap();
        assert_eq!(
            slow.permitted,
            BTreeSet::from([Verdict::Accepted, Verdict::TimeLimitExceeded])
        );
        assert!(slow.required.is_empty());
    }

    #[test]
    fn test_deeper_nesting_is_unconstrained() {
        let registry = ExpectationRegistry::from_value(&json!({
            "a.py": {"secret": {"huge": "time limit exceeded", "*": "accepted"}}
        }))
        .unwrap();
        let secret = &registry.entries()[0].1.children[0].1;
        assert_eq!(secret.children.len(), 2);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            ExpectationRegistry::from_value(&json!({"": "accepted"})),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            ExpectationRegistry::from_value(&json!({"a": "mostly correct"})),
            Err(ConfigError::UnknownAbbreviation { .. })
        ));
        assert!(matches!(
            ExpectationRegistry::from_value(&json!({"a": {"huge/*": "accepted"}})),
            Err(ConfigError::InvalidNestedPattern { .. })
        ));
        assert!(matches!(
            ExpectationRegistry::from_value(&json!({"a": {"judge_message": "x"}})),
            Err(ConfigError::UnknownExpectationKey { .. })
        ));
        assert!(matches!(
            ExpectationRegistry::from_value(&json!({"a": {"permitted": ["AC"], "allowed": ["WA"]}})),
            Err(ConfigError::MalformedNode { .. })
        ));
        assert!(matches!(
            ExpectationRegistry::from_value(&json!({"a/": "accepted", "a": "accepted"})),
            Err(ConfigError::InvalidPattern { .. })
        ));
        assert!(matches!(
            ExpectationRegistry::from_value(&json!({"a": 3})),
            Err(ConfigError::MalformedNode { .. })
        ));
    }

    #[test]
    fn test_wildcard_nested_key_allowed_at_top() {
        let registry = ExpectationRegistry::from_value(&json!({
            "a.py": {"s*": "accepted", "*": "wrong answer"}
        }))
        .unwrap();
        assert_eq!(registry.entries()[0].1.children.len(), 2);
    }
}
