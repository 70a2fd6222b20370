//! Score and range parsing.
//!
//! Scores follow the grammar `-?(\d+|\d*\.\d+)`. A range is two
//! whitespace-separated scores where either endpoint may also be `inf` or
//! `-inf`. Raw strings are parsed once here; everything downstream works on
//! [`ScoreRange`] and `f64`.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// `false` for every input if the pattern failed to compile.
fn is_score(raw: &str) -> bool {
    static RE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^-?(\d+|\d*\.\d+)$"))
        .as_ref()
        .map_or(false, |re| re.is_match(raw))
}

/// Parse a finite score string such as `1`, `-3`, `0.25` or `.5`.
pub fn parse_score(raw: &str) -> Result<f64, ConfigError> {
    let trimmed = raw.trim();
    if !is_score(trimmed) {
        return Err(ConfigError::InvalidScore {
            value: raw.to_string(),
        });
    }
    trimmed.parse::<f64>().map_err(|_| ConfigError::InvalidScore {
        value: raw.to_string(),
    })
}

fn parse_endpoint(raw: &str) -> Result<f64, ConfigError> {
    match raw {
        "inf" => Ok(f64::INFINITY),
        "-inf" => Ok(f64::NEG_INFINITY),
        other => parse_score(other),
    }
}

/// Closed interval `[lo, hi]` over the extended reals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScoreRange {
    lo: f64,
    hi: f64,
}

impl ScoreRange {
    /// The unbounded range `-inf inf`.
    pub const UNBOUNDED: ScoreRange = ScoreRange {
        lo: f64::NEG_INFINITY,
        hi: f64::INFINITY,
    };

    pub fn new(lo: f64, hi: f64) -> Result<Self, ConfigError> {
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(ConfigError::EmptyRange {
                value: format!("{} {}", format_endpoint(lo), format_endpoint(hi)),
            });
        }
        Ok(Self { lo, hi })
    }

    /// The single-point range `x x`.
    pub fn point(x: f64) -> Result<Self, ConfigError> {
        Self::new(x, x)
    }

    /// Parse `"lo hi"`; fails when either endpoint is malformed or `lo > hi`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let parts: Vec<&str> = raw.split_whitespace().collect();
        let [lo, hi] = parts.as_slice() else {
            return Err(ConfigError::InvalidRange {
                value: raw.to_string(),
            });
        };
        let lo = parse_endpoint(lo).map_err(|_| ConfigError::InvalidRange {
            value: raw.to_string(),
        })?;
        let hi = parse_endpoint(hi).map_err(|_| ConfigError::InvalidRange {
            value: raw.to_string(),
        })?;
        if lo > hi {
            return Err(ConfigError::EmptyRange {
                value: raw.to_string(),
            });
        }
        Ok(Self { lo, hi })
    }

    pub fn lo(&self) -> f64 {
        self.lo
    }

    pub fn hi(&self) -> f64 {
        self.hi
    }

    pub fn contains(&self, score: f64) -> bool {
        self.lo <= score && score <= self.hi
    }
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

fn format_endpoint(x: f64) -> String {
    if x == f64::INFINITY {
        "inf".to_string()
    } else if x == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        x.to_string()
    }
}

impl fmt::Display for ScoreRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_endpoint(self.lo), format_endpoint(self.hi))
    }
}

impl TryFrom<String> for ScoreRange {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ScoreRange> for String {
    fn from(range: ScoreRange) -> Self {
        range.to_string()
    }
}
