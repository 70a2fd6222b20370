//! The immutable testdata tree.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::grader::GraderConfig;
use crate::path::{TestcasePath, TestdataPath};
use crate::testdata::testcase::TestcaseConfig;

/// A leaf of the testdata tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testcase {
    pub path: TestcasePath,
    pub config: TestcaseConfig,
}

impl Testcase {
    pub fn name(&self) -> &str {
        self.path.name().unwrap_or_default()
    }
}

/// Whether a group's children carry an explicit evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildOrder {
    /// Declared as a list of single-entry mappings; evaluated in that order.
    Ordered,
    /// Declared as a mapping; evaluated in lexicographic name order.
    Unordered,
}

/// An internal node of the testdata tree.
#[derive(Debug, Clone, PartialEq)]
pub struct TestGroup {
    pub path: TestdataPath,
    pub grader: GraderConfig,
    pub order: ChildOrder,
    /// Children in evaluation order.
    pub children: Vec<TestdataNode>,
}

impl TestGroup {
    /// Group name; `.` for the root.
    pub fn name(&self) -> &str {
        self.path.name().unwrap_or(".")
    }

    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }

    /// All testcases below this group in evaluation order.
    pub fn testcases(&self) -> Vec<&Testcase> {
        let mut out = Vec::new();
        for child in &self.children {
            match child {
                TestdataNode::Testcase(tc) => out.push(tc.as_ref()),
                TestdataNode::Group(group) => out.extend(group.testcases()),
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TestdataNode {
    Testcase(Arc<Testcase>),
    Group(TestGroup),
}

impl TestdataNode {
    pub fn path(&self) -> &TestdataPath {
        match self {
            TestdataNode::Testcase(tc) => &tc.path,
            TestdataNode::Group(group) => &group.path,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            TestdataNode::Testcase(tc) => tc.name(),
            TestdataNode::Group(group) => group.name(),
        }
    }

    pub fn as_group(&self) -> Option<&TestGroup> {
        match self {
            TestdataNode::Group(group) => Some(group),
            TestdataNode::Testcase(_) => None,
        }
    }
}

/// Borrowed view of any node, including the root group.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Group(&'a TestGroup),
    Testcase(&'a Testcase),
}

impl<'a> NodeRef<'a> {
    pub fn path(&self) -> &'a TestdataPath {
        match self {
            NodeRef::Group(group) => &group.path,
            NodeRef::Testcase(tc) => &tc.path,
        }
    }

    pub fn testcases(&self) -> Vec<&'a Testcase> {
        match self {
            NodeRef::Group(group) => group.testcases(),
            NodeRef::Testcase(tc) => vec![*tc],
        }
    }
}

impl<'a> From<&'a TestdataNode> for NodeRef<'a> {
    fn from(node: &'a TestdataNode) -> Self {
        match node {
            TestdataNode::Testcase(tc) => NodeRef::Testcase(tc),
            TestdataNode::Group(group) => NodeRef::Group(group),
        }
    }
}

/// Testdata tree of one problem package plus a flat testcase index.
///
/// Built once by [`TestdataTree::from_value`] and read-only afterwards; share
/// it behind an `Arc` to grade many submissions concurrently.
#[derive(Debug, Clone)]
pub struct TestdataTree {
    root: TestGroup,
    index: HashMap<TestcasePath, Arc<Testcase>>,
}

impl TestdataTree {
    pub(crate) fn new(root: TestGroup) -> Self {
        let mut index = HashMap::new();
        collect_index(&root, &mut index);
        Self { root, index }
    }

    pub fn root(&self) -> &TestGroup {
        &self.root
    }

    pub fn testcase(&self, path: &TestcasePath) -> Option<&Testcase> {
        self.index.get(path).map(Arc::as_ref)
    }

    pub fn contains_testcase(&self, path: &TestcasePath) -> bool {
        self.index.contains_key(path)
    }

    pub fn testcase_count(&self) -> usize {
        self.index.len()
    }

    /// All testcases in evaluation order.
    pub fn testcases(&self) -> Vec<&Testcase> {
        self.root.testcases()
    }

    /// Look up a group by path.
    pub fn group(&self, path: &TestdataPath) -> Option<&TestGroup> {
        let mut current = &self.root;
        for segment in path.segments() {
            current = current
                .children
                .iter()
                .filter_map(TestdataNode::as_group)
                .find(|g| g.name() == segment.as_str())?;
        }
        Some(current)
    }

    /// Nodes breadth-first, each level in evaluation order:
    /// `., sample, secret, sample/1, secret/group1, ...`.
    pub fn iter(&self) -> Vec<NodeRef<'_>> {
        let mut out = Vec::new();
        let mut queue = VecDeque::from([NodeRef::Group(&self.root)]);
        while let Some(node) = queue.pop_front() {
            if let NodeRef::Group(group) = node {
                queue.extend(group.children.iter().map(NodeRef::from));
            }
            out.push(node);
        }
        out
    }

    pub fn group_count(&self) -> usize {
        self.iter()
            .iter()
            .filter(|n| matches!(n, NodeRef::Group(_)))
            .count()
    }

    /// Deterministic SHA-256 fingerprint over node paths, evaluation order
    /// and effective grader configs.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for node in self.iter() {
            hasher.update(node.path().to_string().as_bytes());
            hasher.update(b"\0");
            if let NodeRef::Group(group) = node {
                let grader = serde_json::to_string(&group.grader).unwrap_or_default();
                hasher.update(grader.as_bytes());
                hasher.update(b"\0");
            }
        }
        hex::encode(hasher.finalize())
    }
}

fn collect_index(group: &TestGroup, index: &mut HashMap<TestcasePath, Arc<Testcase>>) {
    for child in &group.children {
        match child {
            TestdataNode::Testcase(tc) => {
                index.insert(tc.path.clone(), Arc::clone(tc));
            }
            TestdataNode::Group(sub) => collect_index(sub, index),
        }
    }
}
