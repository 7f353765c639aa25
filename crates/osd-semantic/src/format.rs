//! Error message rendering for failed rules
//!
//! A rule entry's error text is a template with `{placeholder}` fields
//! interpolated from the first matched constraint dict. A placeholder
//! with no corresponding key means the ruleset document is broken; that
//! is surfaced as an authoring error, never as a validation failure.

use serde_json::{Map, Value};

use crate::error::{Result, SemanticError};
use crate::rules::RuleEntry;

/// Render the error message for a failed rule.
///
/// With no matched constraints the template is returned verbatim (it
/// must then contain no placeholders). `{{` and `}}` escape literal
/// braces.
pub fn render(entry: &RuleEntry, matched: &[Map<String, Value>]) -> Result<String> {
    let Some(constraint) = matched.first() else {
        return Ok(entry.error.clone());
    };
    interpolate(&entry.error, constraint)
}

fn interpolate(template: &str, values: &Map<String, Value>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(SemanticError::authoring(format!(
                                "unclosed placeholder in error template '{}'",
                                template
                            )))
                        }
                    }
                }
                let value = values.get(&name).ok_or_else(|| {
                    SemanticError::authoring(format!(
                        "error template references missing key '{}'",
                        name
                    ))
                })?;
                out.push_str(&render_value(value));
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(error: &str) -> RuleEntry {
        RuleEntry {
            rule: "True".to_string(),
            error: error.to_string(),
            dependency_key: None,
        }
    }

    fn constraint(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_interpolates_first_matched_dict() {
        let matched = vec![
            constraint(&[("number_ska_dishes", json!(4))]),
            constraint(&[("number_ska_dishes", json!(8))]),
        ];
        let message = render(
            &entry("receptor_ids are too many!Current Limit is {number_ska_dishes}"),
            &matched,
        )
        .unwrap();
        assert_eq!(message, "receptor_ids are too many!Current Limit is 4");
    }

    #[test]
    fn test_verbatim_without_matches() {
        let message = render(&entry("target is mandatory"), &[]).unwrap();
        assert_eq!(message, "target is mandatory");
    }

    #[test]
    fn test_string_values_render_bare() {
        let matched = vec![constraint(&[("rx_id", json!("Band_1"))])];
        let message = render(&entry("band {rx_id} not available"), &matched).unwrap();
        assert_eq!(message, "band Band_1 not available");
    }

    #[test]
    fn test_missing_placeholder_is_authoring_error() {
        let matched = vec![constraint(&[("other", json!(1))])];
        let result = render(&entry("{undeclared_field} bad"), &matched);
        assert!(matches!(result, Err(SemanticError::RulesetAuthoring(_))));
    }

    #[test]
    fn test_escaped_braces() {
        let matched = vec![constraint(&[("n", json!(2))])];
        let message = render(&entry("literal {{braces}} and {n}"), &matched).unwrap();
        assert_eq!(message, "literal {braces} and 2");
    }
}
