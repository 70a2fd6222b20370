//! Error taxonomy for judgekit.
//!
//! [`ConfigError`] covers everything that makes a problem package unusable at
//! load time. [`GradingError`] covers misuse of the incremental ledger.
//! Non-fatal findings (range violations, inconsistencies, ambiguous overrides)
//! are not errors; they travel as data inside reports.

use thiserror::Error;

/// Fatal configuration errors raised while building the testdata tree or the
/// expectation registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid score '{value}': expected a number like 1, -2 or .5")]
    InvalidScore { value: String },

    #[error("invalid range '{value}': expected two whitespace-separated scores")]
    InvalidRange { value: String },

    #[error("empty range '{value}': lower bound exceeds upper bound")]
    EmptyRange { value: String },

    #[error("unknown grader flag '{flag}'")]
    UnknownGraderFlag { flag: String },

    #[error("conflicting {family} grader flags: '{first}' and '{second}'")]
    ConflictingGraderFlags {
        family: &'static str,
        first: String,
        second: String,
    },

    #[error("invalid value '{value}' for field '{field}'")]
    InvalidEnumValue { field: &'static str, value: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("group '{group}' must not be empty")]
    EmptyGroup { group: String },

    #[error("top-level group '{name}' is not allowed: only 'sample' and 'secret'")]
    UnexpectedTopLevelGroup { name: String },

    #[error("ordered entry {index} of group '{group}' must have exactly one key, found {keys}")]
    MalformedSingleton {
        group: String,
        index: usize,
        keys: usize,
    },

    #[error("malformed node at '{path}': {reason}")]
    MalformedNode { path: String, reason: String },

    #[error("invalid command '{command}': {reason}")]
    InvalidCommand { command: String, reason: String },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("nested pattern '{pattern}' must match 'sample', 'secret' or '*'")]
    InvalidNestedPattern { pattern: String },

    #[error("unknown abbreviation '{name}'")]
    UnknownAbbreviation { name: String },

    #[error("unknown verdict '{value}'")]
    UnknownVerdict { value: String },

    #[error("unknown key '{key}' in expectation for pattern '{pattern}'")]
    UnknownExpectationKey { pattern: String, key: String },
}

/// Errors raised by the incremental [`GradeLedger`](crate::grading::GradeLedger).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GradingError {
    #[error("'{path}' is not a testcase of this tree")]
    UnknownTestcase { path: String },

    #[error("grade for '{path}' was already set")]
    AlreadyGraded { path: String },
}

/// Top-level error for judgekit-core operations.
#[derive(Debug, Error)]
pub enum JudgeError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("grading error: {0}")]
    Grading(#[from] GradingError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type for judgekit-core operations.
pub type Result<T> = std::result::Result<T, JudgeError>;
