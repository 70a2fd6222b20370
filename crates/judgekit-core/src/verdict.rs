//! Verdicts and per-testcase results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::path::TestcasePath;

/// Outcome of running a submission on one testcase.
///
/// Variants are declared from least to most severe, so the derived `Ord`
/// is the aggregation severity order: `AC < WA < TLE < RTE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "AC")]
    Accepted,
    #[serde(rename = "WA")]
    WrongAnswer,
    #[serde(rename = "TLE")]
    TimeLimitExceeded,
    #[serde(rename = "RTE")]
    RunTimeError,
}

impl Verdict {
    pub const ALL: [Verdict; 4] = [
        Verdict::Accepted,
        Verdict::WrongAnswer,
        Verdict::TimeLimitExceeded,
        Verdict::RunTimeError,
    ];

    pub fn short_name(self) -> &'static str {
        match self {
            Verdict::Accepted => "AC",
            Verdict::WrongAnswer => "WA",
            Verdict::TimeLimitExceeded => "TLE",
            Verdict::RunTimeError => "RTE",
        }
    }

    pub fn long_name(self) -> &'static str {
        match self {
            Verdict::Accepted => "ACCEPTED",
            Verdict::WrongAnswer => "WRONG_ANSWER",
            Verdict::TimeLimitExceeded => "TIME_LIMIT_EXCEEDED",
            Verdict::RunTimeError => "RUN_TIME_ERROR",
        }
    }

    pub fn is_accepted(self) -> bool {
        self == Verdict::Accepted
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for Verdict {
    type Err = ConfigError;

    /// Accepts the short (`TLE`) and long (`TIME_LIMIT_EXCEEDED`) spellings,
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Verdict::ALL
            .into_iter()
            .find(|v| v.short_name() == upper || v.long_name() == upper)
            .ok_or_else(|| ConfigError::UnknownVerdict {
                value: s.to_string(),
            })
    }
}

/// Resolved verdict of a tree node: either a real verdict or `NotRun` when no
/// result exists (short-circuited by `on_reject: break`, cancelled, or not yet
/// produced).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Judged(Verdict),
    NotRun,
}

impl Outcome {
    pub fn verdict(self) -> Option<Verdict> {
        match self {
            Outcome::Judged(v) => Some(v),
            Outcome::NotRun => None,
        }
    }

    pub fn is_accepted(self) -> bool {
        matches!(self, Outcome::Judged(Verdict::Accepted))
    }

    /// A judged, non-accepted outcome.
    pub fn is_rejected(self) -> bool {
        matches!(self, Outcome::Judged(v) if !v.is_accepted())
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Judged(v) => v.fmt(f),
            Outcome::NotRun => f.write_str("NOT_RUN"),
        }
    }
}

/// Result of running a submission on a single testcase. Produced by the
/// executor and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestcaseResult {
    pub path: TestcasePath,
    pub verdict: Verdict,
    /// Explicit score; when absent the group's accept/reject score applies.
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub judge_message: Option<String>,
}

impl TestcaseResult {
    pub fn new(path: TestcasePath, verdict: Verdict) -> Self {
        Self {
            path,
            verdict,
            score: None,
            judge_message: None,
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_judge_message(mut self, message: impl Into<String>) -> Self {
        self.judge_message = Some(message.into());
        self
    }
}
