//! Glob patterns over submission and testdata paths.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::path::SubmissionPath;

fn is_pattern_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '/' | '-' | '*')
}

/// Case-insensitive glob where `*` matches any run of characters, `/`
/// included. Trailing slashes are dropped on parse, so `accepted/` and
/// `accepted` are the same pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern(String);

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim_end_matches('/');
        let invalid = |reason: &str| ConfigError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };
        if trimmed.is_empty() {
            return Err(invalid("pattern is empty"));
        }
        if let Some(c) = trimmed.chars().find(|c| !is_pattern_char(*c)) {
            return Err(invalid(&format!("character '{c}' is not allowed")));
        }
        if trimmed.split('/').any(str::is_empty) {
            return Err(invalid("empty path segment"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// No wildcard.
    pub fn is_literal(&self) -> bool {
        !self.0.contains('*')
    }

    /// Number of `/`-separated segments.
    pub fn segment_count(&self) -> usize {
        self.0.split('/').count()
    }

    pub fn first_segment(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    pub fn matches(&self, value: &str) -> bool {
        glob_match(&self.0, value)
    }

    /// The submission itself or one of its ancestor directories matches.
    pub fn matches_submission(&self, submission: &SubmissionPath) -> bool {
        submission
            .with_ancestors()
            .into_iter()
            .any(|candidate| self.matches(candidate))
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Pattern {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Pattern::parse(&value)
    }
}

impl From<Pattern> for String {
    fn from(pattern: Pattern) -> Self {
        pattern.0
    }
}

fn glob_match(pattern: &str, value: &str) -> bool {
    let p: Vec<char> = pattern.chars().map(|c| c.to_ascii_lowercase()).collect();
    let v: Vec<char> = value.chars().map(|c| c.to_ascii_lowercase()).collect();

    let mut pi = 0usize;
    let mut vi = 0usize;
    let mut last_star: Option<usize> = None;
    let mut star_vi = 0usize;

    while vi < v.len() {
        if pi < p.len() && p[pi] != '*' && p[pi] == v[vi] {
            pi += 1;
            vi += 1;
            continue;
        }

        if pi < p.len() && p[pi] == '*' {
            last_star = Some(pi);
            pi += 1;
            star_vi = vi;
            continue;
        }

        // Backtrack: let the last `*` swallow one more character.
        if let Some(star) = last_star {
            star_vi += 1;
            vi = star_vi;
            pi = star + 1;
            continue;
        }

        return false;
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pat(raw: &str) -> Pattern {
        Pattern::parse(raw).unwrap()
    }

    #[test]
    fn test_submission_matches_itself_or_ancestor() {
        let sub = SubmissionPath::parse("accepted/th.py").unwrap();
        assert!(pat("accepted").matches_submission(&sub));
        assert!(pat("*/th.py").matches_submission(&sub));
        assert!(pat("accepted/*.py").matches_submission(&sub));
        assert!(!pat("wrong_answer").matches_submission(&sub));
        assert!(!pat("accept").matches_submission(&sub));
    }

    #[test]
    fn test_star_crosses_slashes() {
        assert!(pat("*").matches("secret/huge/graph07"));
        assert!(pat("secret/*7").matches("secret/huge/graph07"));
        assert!(pat("*graph*").matches("secret/huge/graph07"));
        assert!(!pat("*graph").matches("secret/huge/graph07"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(pat("Accepted/*.PY").matches("accepted/Sol.py"));
    }

    #[test]
    fn test_trailing_slash_dropped() {
        assert_eq!(pat("accepted/"), pat("accepted"));
        assert_eq!(pat("accepted//").as_str(), "accepted");
    }

    #[test]
    fn test_invalid_patterns() {
        for raw in ["", "/", "a b", "a//b", "acc$"] {
            assert!(
                matches!(Pattern::parse(raw), Err(ConfigError::InvalidPattern { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_segments_and_literal() {
        let p = pat("secret/huge/*");
        assert_eq!(p.segment_count(), 3);
        assert_eq!(p.first_segment(), "secret");
        assert!(!p.is_literal());
        assert!(pat("sample").is_literal());
    }
}
