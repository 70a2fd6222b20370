//! Build a [`TestdataTree`] from a generator-style configuration document.
//!
//! ```yaml
//! grader_flags: ignore_sample
//! data:
//!   sample:
//!     data:
//!       "1": { in: "1 2", ans: "3" }
//!   secret:
//!     on_reject: continue
//!     data:
//!       - small: { data: { "01": "gen 10 {seed}" } }
//!       - large: { data: { "01": "gen 1000 {seed}" } }
//! ```
//!
//! A node is a group iff it is an object with a `data` key. `data` is either a
//! mapping (evaluated in name order) or a list of single-entry mappings
//! (evaluated in list order). Grader settings may sit on the group itself or
//! under a `testdata.yaml` key, which wins.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{ConfigError, Result};
use crate::grader::{GraderConfig, GraderSettings, Grading, GRADER_KEYS};
use crate::obs;
use crate::path::TestdataPath;
use crate::testdata::testcase::{GenerationDefaults, TestcaseConfig};
use crate::testdata::tree::{ChildOrder, TestGroup, Testcase, TestdataNode, TestdataTree};

const TOP_LEVEL_GROUPS: [&str; 2] = ["sample", "secret"];
const GROUP_KEYS: [&str; 5] = ["data", "testdata.yaml", "solution", "visualizer", "random_salt"];

impl TestdataTree {
    /// Build and validate the tree; fails on the first configuration error.
    pub fn from_value(doc: &Value) -> std::result::Result<Self, ConfigError> {
        let root_path = TestdataPath::root();
        let map = doc.as_object().ok_or_else(|| ConfigError::MalformedNode {
            path: root_path.to_string(),
            reason: "root must be an object with a 'data' key".to_string(),
        })?;
        if !map.contains_key("data") {
            return Err(ConfigError::MalformedNode {
                path: root_path.to_string(),
                reason: "root must have a 'data' key".to_string(),
            });
        }

        let root = build_group(
            map,
            root_path,
            &GraderConfig::default(),
            &GenerationDefaults::default(),
        )?;
        let tree = TestdataTree::new(root);
        obs::emit_testdata_built(tree.testcase_count(), tree.group_count(), &tree.digest());
        Ok(tree)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(&doc)?)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(raw)?;
        Ok(Self::from_value(&doc)?)
    }
}

fn is_group(value: &Value) -> bool {
    value
        .as_object()
        .map(|map| map.contains_key("data"))
        .unwrap_or(false)
}

fn group_settings(
    map: &Map<String, Value>,
    path: &TestdataPath,
) -> std::result::Result<GraderSettings, ConfigError> {
    let direct = GraderSettings::from_map(map)?;
    match map.get("testdata.yaml") {
        None | Some(Value::Null) => Ok(direct),
        Some(Value::Object(nested)) => Ok(direct.overlay(&GraderSettings::from_map(nested)?)),
        Some(other) => Err(ConfigError::MalformedNode {
            path: path.to_string(),
            reason: format!("'testdata.yaml' must be a mapping, got {other}"),
        }),
    }
}

/// Children of a group in evaluation order, paired with the declared order.
fn declared_children<'a>(
    data: &'a Value,
    path: &TestdataPath,
) -> std::result::Result<(ChildOrder, Vec<(&'a str, &'a Value)>), ConfigError> {
    match data {
        Value::Null => Ok((ChildOrder::Unordered, Vec::new())),
        Value::Object(entries) => {
            let mut children: Vec<(&str, &Value)> =
                entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
            children.sort_by(|a, b| a.0.cmp(b.0));
            Ok((ChildOrder::Unordered, children))
        }
        Value::Array(items) => {
            let mut seen = HashSet::new();
            let mut children = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let entry = item.as_object().ok_or_else(|| ConfigError::MalformedSingleton {
                    group: path.to_string(),
                    index,
                    keys: 0,
                })?;
                let mut iter = entry.iter();
                let (Some((name, child)), None) = (iter.next(), iter.next()) else {
                    return Err(ConfigError::MalformedSingleton {
                        group: path.to_string(),
                        index,
                        keys: entry.len(),
                    });
                };
                if !seen.insert(name.as_str()) {
                    return Err(ConfigError::MalformedNode {
                        path: path.to_string(),
                        reason: format!("duplicate child '{name}'"),
                    });
                }
                children.push((name.as_str(), child));
            }
            Ok((ChildOrder::Ordered, children))
        }
        other => Err(ConfigError::MalformedNode {
            path: path.to_string(),
            reason: format!("'data' must be a mapping or a list, got {other}"),
        }),
    }
}

fn build_group(
    map: &Map<String, Value>,
    path: TestdataPath,
    parent: &GraderConfig,
    parent_generation: &GenerationDefaults,
) -> std::result::Result<TestGroup, ConfigError> {
    if let Some(key) = map
        .keys()
        .find(|k| !GROUP_KEYS.contains(&k.as_str()) && !GRADER_KEYS.contains(&k.as_str()))
    {
        return Err(ConfigError::MalformedNode {
            path: path.to_string(),
            reason: format!("unknown group key '{key}'"),
        });
    }

    let grader = parent.inherit(&group_settings(map, &path)?);
    if grader.grading == Grading::Custom && parent.grading != Grading::Custom {
        obs::emit_custom_grading(&path.to_string());
    }
    if grader.flags.ignore_sample && !path.is_root() && !parent.flags.ignore_sample {
        obs::emit_ignore_sample_below_root(&path.to_string());
    }
    let generation =
        parent_generation.overlay(&GenerationDefaults::from_map(map, &path.to_string())?);

    let (order, declared) = match map.get("data") {
        Some(data) => declared_children(data, &path)?,
        None => (ChildOrder::Unordered, Vec::new()),
    };

    let must_be_nonempty = path.is_root() || path.to_string() == "secret";
    if declared.is_empty() && must_be_nonempty {
        return Err(ConfigError::EmptyGroup {
            group: path.to_string(),
        });
    }

    let mut children = Vec::with_capacity(declared.len());
    for (name, value) in declared {
        if path.is_root() && !TOP_LEVEL_GROUPS.contains(&name) {
            return Err(ConfigError::UnexpectedTopLevelGroup {
                name: name.to_string(),
            });
        }
        let child_path = path.join(name)?;
        if is_group(value) {
            let child_map = value.as_object().ok_or_else(|| ConfigError::MalformedNode {
                path: child_path.to_string(),
                reason: "group must be an object".to_string(),
            })?;
            children.push(TestdataNode::Group(build_group(
                child_map,
                child_path,
                &grader,
                &generation,
            )?));
        } else if path.is_root() {
            return Err(ConfigError::MalformedNode {
                path: child_path.to_string(),
                reason: "top-level entries must be groups".to_string(),
            });
        } else {
            let config = TestcaseConfig::from_value(value, &child_path, &generation)?;
            children.push(TestdataNode::Testcase(Arc::new(Testcase {
                path: child_path,
                config,
            })));
        }
    }

    Ok(TestGroup {
        path,
        grader,
        order,
        children,
    })
}
