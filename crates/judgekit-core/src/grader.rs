//! Grader configuration for test groups.
//!
//! A group declares a partial [`GraderSettings`]; the builder overlays it on
//! the parent's effective [`GraderConfig`] (the root starts from
//! [`GraderConfig::default`]). Every field is parsed and validated when the
//! settings are read, so a `GraderConfig` is always well-formed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::range::{parse_score, ScoreRange};

/// What happens to later siblings once a child of a group is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnReject {
    /// Stop evaluating the group; later siblings stay `NotRun`.
    #[default]
    Break,
    /// Evaluate every child regardless.
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grading {
    #[default]
    Default,
    Custom,
}

/// How a group's verdict is derived from its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictMode {
    FirstError,
    #[default]
    WorstError,
    AlwaysAccept,
}

/// How a group's score is derived from its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMode {
    Min,
    Max,
    #[default]
    Sum,
    Avg,
}

/// Parsed `grader_flags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GraderFlags {
    pub verdict_mode: VerdictMode,
    pub score_mode: ScoreMode,
    pub ignore_sample: bool,
    pub accept_if_any_accepted: bool,
}

impl GraderFlags {
    /// Parse whitespace-separated flag tokens. At most one token from the
    /// verdict-mode family and one from the score-mode family may appear.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut flags = GraderFlags::default();
        let mut verdict_token: Option<&str> = None;
        let mut score_token: Option<&str> = None;

        for token in raw.split_whitespace() {
            let verdict_mode = match token {
                "first_error" => Some(VerdictMode::FirstError),
                "worst_error" => Some(VerdictMode::WorstError),
                "always_accept" => Some(VerdictMode::AlwaysAccept),
                _ => None,
            };
            if let Some(mode) = verdict_mode {
                if let Some(first) = verdict_token {
                    return Err(ConfigError::ConflictingGraderFlags {
                        family: "verdict mode",
                        first: first.to_string(),
                        second: token.to_string(),
                    });
                }
                verdict_token = Some(token);
                flags.verdict_mode = mode;
                continue;
            }

            let score_mode = match token {
                "min" => Some(ScoreMode::Min),
                "max" => Some(ScoreMode::Max),
                "sum" => Some(ScoreMode::Sum),
                "avg" => Some(ScoreMode::Avg),
                _ => None,
            };
            if let Some(mode) = score_mode {
                if let Some(first) = score_token {
                    return Err(ConfigError::ConflictingGraderFlags {
                        family: "score mode",
                        first: first.to_string(),
                        second: token.to_string(),
                    });
                }
                score_token = Some(token);
                flags.score_mode = mode;
                continue;
            }

            match token {
                "ignore_sample" => flags.ignore_sample = true,
                "accept_if_any_accepted" => flags.accept_if_any_accepted = true,
                other => {
                    return Err(ConfigError::UnknownGraderFlag {
                        flag: other.to_string(),
                    })
                }
            }
        }

        Ok(flags)
    }
}

/// Fully resolved grading policy of one group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraderConfig {
    pub on_reject: OnReject,
    pub grading: Grading,
    pub flags: GraderFlags,
    /// Score of an accepted testcase whose result carries no score.
    pub accept_score: f64,
    /// Score of a rejected testcase whose result carries no score.
    pub reject_score: f64,
    /// Declared bounds for the group's aggregated score.
    pub range: ScoreRange,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            on_reject: OnReject::Break,
            grading: Grading::Default,
            flags: GraderFlags::default(),
            accept_score: 1.0,
            reject_score: 0.0,
            range: ScoreRange::UNBOUNDED,
        }
    }
}

impl GraderConfig {
    /// Overlay explicitly declared settings on this (inherited) config.
    pub fn inherit(&self, settings: &GraderSettings) -> GraderConfig {
        GraderConfig {
            on_reject: settings.on_reject.unwrap_or(self.on_reject),
            grading: settings.grading.unwrap_or(self.grading),
            flags: settings.grader_flags.unwrap_or(self.flags),
            accept_score: settings.accept_score.unwrap_or(self.accept_score),
            reject_score: settings.reject_score.unwrap_or(self.reject_score),
            range: settings.range.unwrap_or(self.range),
        }
    }

    /// Default score for a result without an explicit score.
    pub fn default_score(&self, accepted: bool) -> f64 {
        if accepted {
            self.accept_score
        } else {
            self.reject_score
        }
    }
}

/// Grader fields explicitly declared on one group; `None` means inherit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GraderSettings {
    pub on_reject: Option<OnReject>,
    pub grading: Option<Grading>,
    pub grader_flags: Option<GraderFlags>,
    pub accept_score: Option<f64>,
    pub reject_score: Option<f64>,
    pub range: Option<ScoreRange>,
}

pub(crate) const GRADER_KEYS: [&str; 6] = [
    "on_reject",
    "grading",
    "grader_flags",
    "accept_score",
    "reject_score",
    "range",
];

impl GraderSettings {
    /// Read grader fields from a group object. Keys that are not grader
    /// fields are ignored.
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, ConfigError> {
        let mut settings = GraderSettings::default();

        if let Some(value) = map.get("on_reject") {
            settings.on_reject = Some(match expect_str("on_reject", value)? {
                "break" => OnReject::Break,
                "continue" => OnReject::Continue,
                other => return Err(invalid_enum("on_reject", other)),
            });
        }
        if let Some(value) = map.get("grading") {
            settings.grading = Some(match expect_str("grading", value)? {
                "default" => Grading::Default,
                "custom" => Grading::Custom,
                other => return Err(invalid_enum("grading", other)),
            });
        }
        if let Some(value) = map.get("grader_flags") {
            settings.grader_flags = Some(GraderFlags::parse(expect_str("grader_flags", value)?)?);
        }
        if let Some(value) = map.get("accept_score") {
            settings.accept_score = Some(score_value(value)?);
        }
        if let Some(value) = map.get("reject_score") {
            settings.reject_score = Some(score_value(value)?);
        }
        if let Some(value) = map.get("range") {
            settings.range = Some(ScoreRange::parse(expect_str("range", value)?)?);
        }

        Ok(settings)
    }

    /// Fields of `other` take precedence over fields of `self`.
    pub fn overlay(&self, other: &GraderSettings) -> GraderSettings {
        GraderSettings {
            on_reject: other.on_reject.or(self.on_reject),
            grading: other.grading.or(self.grading),
            grader_flags: other.grader_flags.or(self.grader_flags),
            accept_score: other.accept_score.or(self.accept_score),
            reject_score: other.reject_score.or(self.reject_score),
            range: other.range.or(self.range),
        }
    }
}

fn expect_str<'a>(field: &'static str, value: &'a Value) -> Result<&'a str, ConfigError> {
    value.as_str().ok_or_else(|| ConfigError::InvalidEnumValue {
        field,
        value: value.to_string(),
    })
}

fn invalid_enum(field: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidEnumValue {
        field,
        value: value.to_string(),
    }
}

/// Scores may be written as YAML/JSON numbers or as score strings.
fn score_value(value: &Value) -> Result<f64, ConfigError> {
    match value {
        Value::String(s) => parse_score(s),
        Value::Number(n) => parse_score(&n.to_string()),
        other => Err(ConfigError::InvalidScore {
            value: other.to_string(),
        }),
    }
}
