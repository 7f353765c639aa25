//! Recursive rule tree validation
//!
//! The validator walks the rule document in lock-step with the command
//! input. Leaf rule lists resolve their command value through the lenient
//! path resolver and evaluate each entry; group nodes recurse, applying a
//! `parent_key_rule` list against the group's second declared key first.
//!
//! Failures accumulate across the whole walk so the caller receives a
//! complete report in one pass; only authoring errors abort. Messages
//! appear in the rule document's declaration order.

use serde_json::Value;

use crate::constraint::match_constraints;
use crate::error::{Result, SemanticError};
use crate::evaluator::evaluate_rule;
use crate::format::render;
use crate::path::{self, path_to_string, PathKey};
use crate::rules::{RuleEntry, RuleGroup, RuleNode};
use crate::session::SessionStore;

/// Walks a rule tree against one command input
pub struct TreeValidator<'a> {
    capabilities: &'a Value,
}

impl<'a> TreeValidator<'a> {
    /// Create a validator over a capabilities document
    pub fn new(capabilities: &'a Value) -> Self {
        Self { capabilities }
    }

    /// Validate `command` against `rules`, returning the ordered list of
    /// failure messages (empty when every rule passed).
    pub fn validate(
        &self,
        rules: &RuleGroup,
        command: &Value,
        store: &mut SessionStore,
    ) -> Result<Vec<String>> {
        let mut parent_path = Vec::new();
        self.walk(rules, command, &mut parent_path, store)
    }

    fn walk(
        &self,
        group: &RuleGroup,
        command: &Value,
        path: &mut Vec<PathKey>,
        store: &mut SessionStore,
    ) -> Result<Vec<String>> {
        let mut messages = Vec::new();

        for (key, node) in &group.children {
            path.push(PathKey::Key(key.clone()));
            match node {
                RuleNode::Leaf(entries) => {
                    if let Some(joined) = self.apply_entries(key, entries, command, path, store)? {
                        messages.push(joined);
                    }
                }
                RuleNode::Group(sub) => {
                    if let Some(entries) = &sub.parent_key_rule {
                        let target = sub.parent_key_target.as_ref().ok_or_else(|| {
                            SemanticError::authoring(format!(
                                "parent_key_rule at '{}' has no sibling key to target",
                                path_to_string(path)
                            ))
                        })?;
                        path.push(PathKey::Key(target.clone()));
                        if let Some(joined) =
                            self.apply_entries(target, entries, command, path, store)?
                        {
                            messages.push(joined);
                        }
                        path.pop();
                    }
                    messages.extend(self.walk(sub, command, path, store)?);
                }
            }
            path.pop();
        }

        Ok(messages)
    }

    /// Run one leaf rule list. Returns the newline-joined failure
    /// messages for this field, or `None` when the field is absent,
    /// skipped, or fully passing.
    fn apply_entries(
        &self,
        field: &str,
        entries: &[RuleEntry],
        command: &Value,
        path: &[PathKey],
        store: &mut SessionStore,
    ) -> Result<Option<String>> {
        let Some(value) = path::resolve(command, path) else {
            tracing::debug!(path = %path_to_string(path), "field absent, rules skipped");
            return Ok(None);
        };
        if !is_validatable(value) {
            return Ok(None);
        }

        let mut failures = Vec::new();
        for entry in entries {
            let matched = match_constraints(self.capabilities, Some(field), &entry.rule);
            let results = evaluate_rule(field, value, entry, &matched, store)?;
            if !results.contains(&true) {
                failures.push(render(entry, &matched)?);
            }
        }

        if failures.is_empty() {
            Ok(None)
        } else {
            Ok(Some(failures.join("\n")))
        }
    }
}

/// A field participates in validation when it is structurally present
/// (any array or object, even empty) or a truthy scalar.
fn is_validatable(value: &Value) -> bool {
    match value {
        Value::Array(_) | Value::Object(_) => true,
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleDocument;
    use serde_json::json;

    fn validate(rules: &Value, command: &Value, caps: &Value) -> Result<Vec<String>> {
        let document = RuleDocument::from_value(rules)?;
        let mut store = SessionStore::new();
        TreeValidator::new(caps).validate(&document.root, command, &mut store)
    }

    #[test]
    fn test_passing_command_has_no_messages() {
        let rules = json!({
            "dish": {
                "receptor_ids": [{
                    "rule": "0 < len(receptor_ids) <= number_ska_dishes",
                    "error": "receptor_ids are too many!Current Limit is {number_ska_dishes}"
                }]
            }
        });
        let command = json!({"dish": {"receptor_ids": ["SKA001"]}});
        let caps = json!({"number_ska_dishes": 4});
        assert_eq!(validate(&rules, &command, &caps).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_failing_command_formats_message() {
        let rules = json!({
            "dish": {
                "receptor_ids": [{
                    "rule": "0 < len(receptor_ids) <= number_ska_dishes",
                    "error": "receptor_ids are too many!Current Limit is {number_ska_dishes}"
                }]
            }
        });
        let command = json!({
            "dish": {"receptor_ids": ["SKA001", "SKA002", "SKA003", "SKA004", "SKA005"]}
        });
        let caps = json!({"number_ska_dishes": 4});
        assert_eq!(
            validate(&rules, &command, &caps).unwrap(),
            vec!["receptor_ids are too many!Current Limit is 4".to_string()]
        );
    }

    #[test]
    fn test_absent_optional_field_is_skipped() {
        let rules = json!({
            "pst": {
                "beam_ids": [{"rule": "len(beam_ids) > 0", "error": "no beams"}]
            }
        });
        let command = json!({"dish": {"receptor_ids": ["SKA001"]}});
        assert_eq!(validate(&rules, &command, &json!({})).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_empty_list_is_still_validated() {
        let rules = json!({
            "dish": {
                "receptor_ids": [{"rule": "len(receptor_ids) > 0", "error": "no receptors"}]
            }
        });
        let command = json!({"dish": {"receptor_ids": []}});
        assert_eq!(
            validate(&rules, &command, &json!({})).unwrap(),
            vec!["no receptors".to_string()]
        );
    }

    #[test]
    fn test_message_order_follows_document_order() {
        let rules = json!({
            "zebra": [{"rule": "zebra < 0", "error": "zebra failed"}],
            "alpha": [{"rule": "alpha < 0", "error": "alpha failed"}],
            "mid": [{"rule": "mid < 0", "error": "mid failed"}]
        });
        let command = json!({"zebra": 1, "alpha": 2, "mid": 3});
        assert_eq!(
            validate(&rules, &command, &json!({})).unwrap(),
            vec![
                "zebra failed".to_string(),
                "alpha failed".to_string(),
                "mid failed".to_string()
            ]
        );
    }

    #[test]
    fn test_multiple_entry_failures_join_with_newline() {
        let rules = json!({
            "receptor_ids": [
                {"rule": "len(receptor_ids) > 2", "error": "too few"},
                {"rule": "len(receptor_ids) > 3", "error": "still too few"}
            ]
        });
        let command = json!({"receptor_ids": ["SKA001"]});
        assert_eq!(
            validate(&rules, &command, &json!({})).unwrap(),
            vec!["too few\nstill too few".to_string()]
        );
    }

    #[test]
    fn test_parent_key_rule_applies_to_second_key() {
        let rules = json!({
            "pst": {
                "beams": {
                    "parent_key_rule": [{
                        "rule": "len(beam_ids) <= number_pst_beams",
                        "error": "too many beams"
                    }],
                    "beam_ids": [{"rule": "len(beam_ids) > 0", "error": "no beams"}]
                }
            }
        });
        let command = json!({"pst": {"beams": {"beam_ids": [1, 2, 3]}}});
        let caps = json!({"number_pst_beams": 2});
        assert_eq!(
            validate(&rules, &command, &caps).unwrap(),
            vec!["too many beams".to_string()]
        );
    }

    #[test]
    fn test_walk_continues_past_failures() {
        let rules = json!({
            "a": [{"rule": "a > 10", "error": "a too small"}],
            "b": [{"rule": "b > 10", "error": "b too small"}]
        });
        let command = json!({"a": 1, "b": 2});
        let messages = validate(&rules, &command, &json!({})).unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_authoring_error_aborts_walk() {
        let rules = json!({
            "a": [{"rule": "a > unknown_capability_name", "error": "bad"}]
        });
        let command = json!({"a": 1});
        assert!(matches!(
            validate(&rules, &command, &json!({})),
            Err(SemanticError::RulesetAuthoring(_))
        ));
    }
}
