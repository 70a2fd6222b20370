//! Submission expectations: which verdicts a submission may and must
//! produce on which part of the testdata.

pub mod evaluator;
pub mod expectation;
pub mod pattern;
pub mod registry;

pub use evaluator::{
    resolve, AmbiguousOverride, ExpectationEvaluation, ExpectationEvaluator, ExpectationViolation,
    Resolution, ViolationKind,
};
pub use expectation::{Abbreviation, Expectation};
pub use pattern::Pattern;
pub use registry::{ExpectationNode, ExpectationRegistry};
