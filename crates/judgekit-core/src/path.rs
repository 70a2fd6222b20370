//! Normalized slash-separated paths for testdata nodes and submissions.
//!
//! Every path segment is restricted to ASCII alphanumerics and `_.-`, and may
//! not be `.` or `..`. The testdata root is the empty path, displayed as `.`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// `false` for every input if the pattern failed to compile.
fn is_segment(raw: &str) -> bool {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.\-]+$"))
        .as_ref()
        .map_or(false, |re| re.is_match(raw))
}

/// Validate a single path segment (a group or testcase name).
pub fn validate_segment(segment: &str) -> Result<(), ConfigError> {
    if segment == "." || segment == ".." {
        return Err(ConfigError::InvalidPath {
            path: segment.to_string(),
            reason: "relative segments are not allowed".to_string(),
        });
    }
    if !is_segment(segment) {
        return Err(ConfigError::InvalidPath {
            path: segment.to_string(),
            reason: "segments may only contain alphanumerics and '_', '.', '-'".to_string(),
        });
    }
    Ok(())
}

fn split_segments(raw: &str) -> Result<Vec<String>, ConfigError> {
    if raw.is_empty() {
        return Err(ConfigError::InvalidPath {
            path: raw.to_string(),
            reason: "path must not be empty".to_string(),
        });
    }
    raw.split('/')
        .map(|segment| {
            if segment.is_empty() {
                return Err(ConfigError::InvalidPath {
                    path: raw.to_string(),
                    reason: "empty segment".to_string(),
                });
            }
            validate_segment(segment).map_err(|_| ConfigError::InvalidPath {
                path: raw.to_string(),
                reason: format!("invalid segment '{segment}'"),
            })?;
            Ok(segment.to_string())
        })
        .collect()
}

/// Path of a node in the testdata tree (`secret/group1/01`).
///
/// The root is the empty path and renders as `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TestdataPath {
    segments: Vec<String>,
}

/// Testcases are addressed by their testdata path.
pub type TestcasePath = TestdataPath;

impl TestdataPath {
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse a path; `.` denotes the root.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw == "." {
            return Ok(Self::root());
        }
        Ok(Self {
            segments: split_segments(raw)?,
        })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append a validated segment.
    pub fn join(&self, segment: &str) -> Result<Self, ConfigError> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Whether `self` equals `prefix` or lies underneath it.
    pub fn starts_with(&self, prefix: &TestdataPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Proper ancestors from the parent up to the root.
    pub fn ancestors(&self) -> Vec<TestdataPath> {
        (0..self.segments.len())
            .rev()
            .map(|len| Self {
                segments: self.segments[..len].to_vec(),
            })
            .collect()
    }
}

impl fmt::Display for TestdataPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            f.write_str(&self.segments.join("/"))
        }
    }
}

impl TryFrom<String> for TestdataPath {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TestdataPath> for String {
    fn from(path: TestdataPath) -> Self {
        path.to_string()
    }
}

/// Path of a submission inside the package (`accepted/th.py`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubmissionPath(String);

impl SubmissionPath {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        split_segments(raw)?;
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path itself followed by its logical ancestors, longest first
    /// (`a/b/c.py`, `a/b`, `a`).
    pub fn with_ancestors(&self) -> Vec<&str> {
        let mut out = vec![self.0.as_str()];
        let mut rest = self.0.as_str();
        while let Some(idx) = rest.rfind('/') {
            rest = &rest[..idx];
            out.push(rest);
        }
        out
    }
}

impl fmt::Display for SubmissionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SubmissionPath {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SubmissionPath> for String {
    fn from(path: SubmissionPath) -> Self {
        path.0
    }
}
