//! Testdata tree: groups, testcases and the builder that validates them.

pub mod builder;
pub mod testcase;
pub mod tree;

pub use testcase::{GenerationCommand, GenerationDefaults, TestcaseConfig, TestcaseSource};
pub use tree::{ChildOrder, NodeRef, TestGroup, Testcase, TestdataNode, TestdataTree};
