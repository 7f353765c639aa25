//! Rule document model
//!
//! A rule document is a nested mapping whose keys mirror the command
//! input structure. A value is either another mapping (descend further)
//! or a list of rule entries to apply at that field. A mapping may carry
//! the special `parent_key_rule` marker: a rule list applied against the
//! mapping's second declared key before descending, which supports
//! "array of elements, each needing evaluation" patterns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SemanticError};

/// Marker key holding a rule list for the enclosing group's sibling field
pub const PARENT_KEY_RULE: &str = "parent_key_rule";

/// One rule to evaluate at a leaf field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleEntry {
    /// Boolean expression over the field value, matched constraints, and
    /// declared dependencies
    pub rule: String,
    /// Message template with `{placeholder}` interpolation from the first
    /// matched constraint dict
    pub error: String,
    /// Names of previously evaluated fields to bind from the session store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependency_key: Option<Vec<String>>,
}

/// A node of the parsed rule tree
#[derive(Debug, Clone, PartialEq)]
pub enum RuleNode {
    /// Nested mapping: descend further
    Group(RuleGroup),
    /// Leaf rule list applied to one command field
    Leaf(Vec<RuleEntry>),
}

/// A mapping node of the rule tree, insertion order preserved
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleGroup {
    /// Rule list from the `parent_key_rule` marker, if declared
    pub parent_key_rule: Option<Vec<RuleEntry>>,
    /// The second declared key of the original mapping; the marker's rule
    /// list is applied against this sibling field
    pub parent_key_target: Option<String>,
    /// Child nodes, marker excluded, in declaration order
    pub children: Vec<(String, RuleNode)>,
}

impl RuleNode {
    /// Parse a raw document value into a rule tree.
    ///
    /// Scalars anywhere except inside rule entries make the document
    /// invalid; that is an authoring error, not a validation failure.
    pub fn from_value(value: &Value) -> Result<RuleNode> {
        match value {
            Value::Array(items) => {
                let entries = parse_entries(items)?;
                Ok(RuleNode::Leaf(entries))
            }
            Value::Object(map) => {
                let mut group = RuleGroup::default();
                let declared: Vec<&String> = map.keys().collect();
                if declared.len() > 1 {
                    group.parent_key_target = Some(declared[1].clone());
                }
                for (key, child) in map {
                    if key == PARENT_KEY_RULE {
                        let items = child.as_array().ok_or_else(|| {
                            SemanticError::authoring(
                                "parent_key_rule must hold a rule list".to_string(),
                            )
                        })?;
                        group.parent_key_rule = Some(parse_entries(items)?);
                    } else {
                        group
                            .children
                            .push((key.clone(), RuleNode::from_value(child)?));
                    }
                }
                Ok(RuleNode::Group(group))
            }
            other => Err(SemanticError::authoring(format!(
                "rule document nodes must be mappings or rule lists, found {}",
                json_type_name(other)
            ))),
        }
    }
}

fn parse_entries(items: &[Value]) -> Result<Vec<RuleEntry>> {
    items
        .iter()
        .map(|item| {
            serde_json::from_value(item.clone()).map_err(|e| {
                SemanticError::authoring(format!("invalid rule entry: {}", e))
            })
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A complete parsed rule document
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDocument {
    pub root: RuleGroup,
}

impl RuleDocument {
    /// Parse from a raw JSON value; the top level must be a mapping.
    pub fn from_value(value: &Value) -> Result<RuleDocument> {
        match RuleNode::from_value(value)? {
            RuleNode::Group(root) => Ok(RuleDocument { root }),
            RuleNode::Leaf(_) => Err(SemanticError::authoring(
                "rule document root must be a mapping".to_string(),
            )),
        }
    }

    /// Parse from JSON text
    pub fn from_json_str(text: &str) -> Result<RuleDocument> {
        let value: Value = serde_json::from_str(text)?;
        RuleDocument::from_value(&value)
    }

    /// Parse from YAML text
    pub fn from_yaml_str(text: &str) -> Result<RuleDocument> {
        let value: Value = serde_yaml::from_str(text)?;
        RuleDocument::from_value(&value)
    }
}
