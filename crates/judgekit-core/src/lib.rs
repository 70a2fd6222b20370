//! judgekit core library
//!
//! Builds the testdata tree of a problem package, aggregates per-testcase
//! verdicts and scores up that tree, and checks submissions against their
//! declared expectations.

pub mod error;
pub mod expectations;
pub mod grader;
pub mod grading;
pub mod obs;
pub mod path;
pub mod range;
pub mod testdata;
pub mod verdict;

pub use error::{ConfigError, GradingError, JudgeError, Result};

pub use path::{SubmissionPath, TestcasePath, TestdataPath};
pub use range::{parse_score, ScoreRange};
pub use verdict::{Outcome, TestcaseResult, Verdict};

pub use grader::{
    GraderConfig, GraderFlags, GraderSettings, Grading, OnReject, ScoreMode, VerdictMode,
};

pub use testdata::{
    ChildOrder, GenerationCommand, GenerationDefaults, NodeRef, TestGroup, Testcase,
    TestcaseConfig, TestcaseSource, TestdataNode, TestdataTree,
};

pub use grading::{
    aggregate_score, aggregate_verdict, grade, AggregationInconsistency, Grade, GradeLedger,
    GradeReport, RangeViolation,
};

pub use expectations::{
    Abbreviation, AmbiguousOverride, Expectation, ExpectationEvaluation, ExpectationEvaluator,
    ExpectationNode, ExpectationRegistry, ExpectationViolation, Pattern, ViolationKind,
};
