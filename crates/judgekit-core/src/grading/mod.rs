//! Verdict and score aggregation over the testdata tree.

pub mod group;
pub mod ledger;
pub mod report;
pub mod score;
pub mod verdict;

pub use group::{
    aggregate_group, is_ignored_child, masks_children, stops_evaluation, ChildGrade, Grade,
};
pub use ledger::GradeLedger;
pub use report::{grade, leaf_grade, AggregationInconsistency, GradeReport, RangeViolation};
pub use score::aggregate_score;
pub use verdict::{aggregate_verdict, truncate_on_reject};
