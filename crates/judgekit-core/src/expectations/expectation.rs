//! Permitted/required verdict sets and their named abbreviations.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::range::ScoreRange;
use crate::verdict::Verdict;

/// What a submission's results must look like over one scope.
///
/// Satisfied by a verdict set `S` iff `S ⊆ permitted` and, when `required`
/// is nonempty, `S ∩ required ≠ ∅`. An optional `score` range constrains the
/// node's aggregated score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    pub permitted: BTreeSet<Verdict>,
    pub required: BTreeSet<Verdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<ScoreRange>,
}

impl Default for Expectation {
    /// Anything goes.
    fn default() -> Self {
        Self {
            permitted: Verdict::ALL.into_iter().collect(),
            required: BTreeSet::new(),
            score: None,
        }
    }
}

impl Expectation {
    pub fn new(permitted: &[Verdict], required: &[Verdict]) -> Self {
        Self {
            permitted: permitted.iter().copied().collect(),
            required: required.iter().copied().collect(),
            score: None,
        }
    }

    pub fn with_score(mut self, range: ScoreRange) -> Self {
        self.score = Some(range);
        self
    }

    pub fn permits(&self, verdict: Verdict) -> bool {
        self.permitted.contains(&verdict)
    }

    /// Verdicts of `observed` outside `permitted`.
    pub fn forbidden_in<'v>(&self, observed: impl IntoIterator<Item = &'v Verdict>) -> BTreeSet<Verdict> {
        observed
            .into_iter()
            .filter(|v| !self.permits(**v))
            .copied()
            .collect()
    }

    /// `required` is empty or met by `observed`.
    pub fn required_met<'v>(&self, observed: impl IntoIterator<Item = &'v Verdict>) -> bool {
        if self.required.is_empty() {
            return true;
        }
        observed.into_iter().any(|v| self.required.contains(v))
    }

    pub fn is_satisfied_by(&self, observed: &[Verdict]) -> bool {
        self.forbidden_in(observed).is_empty() && self.required_met(observed)
    }

    /// Verdicts this expectation permits that `ancestor` does not.
    pub fn loosened_from(&self, ancestor: &Expectation) -> BTreeSet<Verdict> {
        self.permitted
            .difference(&ancestor.permitted)
            .copied()
            .collect()
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "permitted {{{}}}", join(&self.permitted))?;
        if !self.required.is_empty() {
            write!(f, ", required {{{}}}", join(&self.required))?;
        }
        if let Some(range) = &self.score {
            write!(f, ", score {range}")?;
        }
        Ok(())
    }
}

pub(crate) fn join(verdicts: &BTreeSet<Verdict>) -> String {
    verdicts
        .iter()
        .map(|v| v.short_name())
        .collect::<Vec<_>>()
        .join(",")
}

/// Named shorthand for a common expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Abbreviation {
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    RuntimeException,
    DoesNotTerminate,
    NotAccepted,
    Rejected,
}

impl Abbreviation {
    pub const ALL: [Abbreviation; 7] = [
        Abbreviation::Accepted,
        Abbreviation::WrongAnswer,
        Abbreviation::TimeLimitExceeded,
        Abbreviation::RuntimeException,
        Abbreviation::DoesNotTerminate,
        Abbreviation::NotAccepted,
        Abbreviation::Rejected,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Abbreviation::Accepted => "accepted",
            Abbreviation::WrongAnswer => "wrong answer",
            Abbreviation::TimeLimitExceeded => "time limit exceeded",
            Abbreviation::RuntimeException => "runtime exception",
            Abbreviation::DoesNotTerminate => "does not terminate",
            Abbreviation::NotAccepted => "not accepted",
            Abbreviation::Rejected => "rejected",
        }
    }

    /// Expectation implied by a conventional submission directory name.
    pub fn for_directory(directory: &str) -> Option<Abbreviation> {
        match directory.to_ascii_lowercase().as_str() {
            "accepted" => Some(Abbreviation::Accepted),
            "wrong_answer" => Some(Abbreviation::WrongAnswer),
            "time_limit_exceeded" => Some(Abbreviation::TimeLimitExceeded),
            "run_time_error" => Some(Abbreviation::RuntimeException),
            _ => None,
        }
    }

    pub fn expectation(self) -> Expectation {
        use Verdict::*;
        const ALL: [Verdict; 4] = Verdict::ALL;
        match self {
            Abbreviation::Accepted => Expectation::new(&[Accepted], &[]),
            Abbreviation::WrongAnswer => Expectation::new(&[Accepted, WrongAnswer], &[WrongAnswer]),
            Abbreviation::TimeLimitExceeded => {
                Expectation::new(&[Accepted, TimeLimitExceeded], &[TimeLimitExceeded])
            }
            Abbreviation::RuntimeException => {
                Expectation::new(&[Accepted, RunTimeError], &[RunTimeError])
            }
            Abbreviation::DoesNotTerminate => Expectation::new(
                &[Accepted, RunTimeError, TimeLimitExceeded],
                &[RunTimeError, TimeLimitExceeded],
            ),
            Abbreviation::NotAccepted => {
                Expectation::new(&ALL, &[RunTimeError, TimeLimitExceeded, WrongAnswer])
            }
            Abbreviation::Rejected => Expectation::new(&ALL, &[RunTimeError, WrongAnswer]),
        }
    }
}

impl FromStr for Abbreviation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Abbreviation::ALL
            .into_iter()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownAbbreviation {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for Abbreviation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a verdict list (`[AC, WA]`) or a single verdict string.
pub(crate) fn parse_verdict_set(value: &Value, pattern: &str, key: &str) -> Result<BTreeSet<Verdict>, ConfigError> {
    let malformed = || ConfigError::MalformedNode {
        path: pattern.to_string(),
        reason: format!("'{key}' must be a verdict or a list of verdicts"),
    };
    match value {
        Value::String(s) => Ok(BTreeSet::from([s.parse::<Verdict>()?])),
        Value::Array(items) => items
            .iter()
            .map(|item| item.as_str().ok_or_else(malformed)?.parse::<Verdict>())
            .collect(),
        _ => Err(malformed()),
    }
}

/// Parse an expectation `score`: a range string, or a single number meaning
/// the point range.
pub(crate) fn parse_score_range(value: &Value) -> Result<ScoreRange, ConfigError> {
    match value {
        Value::Number(n) => ScoreRange::point(crate::range::parse_score(&n.to_string())?),
        Value::String(s) if s.split_whitespace().count() == 1 => {
            ScoreRange::point(crate::range::parse_score(s.trim())?)
        }
        Value::String(s) => ScoreRange::parse(s),
        other => Err(ConfigError::InvalidRange {
            value: other.to_string(),
        }),
    }
}
