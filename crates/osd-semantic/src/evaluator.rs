//! Rule evaluation against binding sets
//!
//! One rule can match several capability records (for example one per
//! receiver band). The rule is then evaluated once per record; the
//! caller flags the rule as failed when no record satisfied it.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{Result, SemanticError};
use crate::expr::{self, EvalValue};
use crate::rules::RuleEntry;
use crate::session::SessionStore;

/// Evaluate `entry` for the field `field_name` holding `command_value`.
///
/// Returns one boolean per evaluation; the caller treats the rule as
/// failed when no evaluation yielded true. Before evaluation the field
/// value is recorded in the session store so later sibling rules can
/// declare it as a dependency.
///
/// A rule expression referencing a name that is bound by neither the
/// command value, the matched constraints, nor the declared dependencies
/// is a ruleset-authoring error, not a validation failure.
pub fn evaluate_rule(
    field_name: &str,
    command_value: &Value,
    entry: &RuleEntry,
    matched: &[Map<String, Value>],
    store: &mut SessionStore,
) -> Result<Vec<bool>> {
    store.insert(field_name, command_value.clone());

    let program = expr::parse(&entry.rule)
        .map_err(|e| SemanticError::authoring(format!("rule '{}': {}", entry.rule, e)))?;

    let dependencies = resolve_dependencies(entry, store);

    tracing::debug!(
        field = %field_name,
        rule = %entry.rule,
        matched = matched.len(),
        "evaluating rule"
    );

    if matched.len() > 1 {
        // one evaluation per matched record
        let mut results = Vec::with_capacity(matched.len());
        for constraint in matched {
            let bindings = build_bindings(field_name, command_value, Some(constraint), &dependencies);
            let value = expr::evaluate(&program, &bindings).map_err(|e| {
                SemanticError::authoring(format!("rule '{}': {}", entry.rule, e))
            })?;
            results.push(value.truthy());
        }
        Ok(results)
    } else {
        let bindings = build_bindings(field_name, command_value, matched.first(), &dependencies);
        let value = expr::evaluate(&program, &bindings).map_err(|e| {
            SemanticError::authoring(format!("rule '{}': {}", entry.rule, e))
        })?;
        // a set-typed result models a collection of violations: a
        // non-empty set means the uniqueness/membership check failed
        let passed = if value.is_set() {
            !value.truthy()
        } else {
            value.truthy()
        };
        Ok(vec![passed])
    }
}

fn resolve_dependencies(entry: &RuleEntry, store: &SessionStore) -> Vec<(String, EvalValue)> {
    let Some(names) = &entry.dependency_key else {
        return Vec::new();
    };
    names
        .iter()
        .filter_map(|name| {
            store
                .get(name)
                .map(|value| (name.clone(), EvalValue::from_json(value)))
        })
        .collect()
}

fn build_bindings(
    field_name: &str,
    command_value: &Value,
    constraint: Option<&Map<String, Value>>,
    dependencies: &[(String, EvalValue)],
) -> HashMap<String, EvalValue> {
    let mut bindings = HashMap::new();
    bindings.insert(field_name.to_string(), EvalValue::from_json(command_value));
    if let Some(constraint) = constraint {
        for (key, value) in constraint {
            bindings.insert(key.clone(), EvalValue::from_json(value));
        }
    }
    for (name, value) in dependencies {
        bindings.insert(name.clone(), value.clone());
    }
    bindings
}
