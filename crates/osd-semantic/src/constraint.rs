//! Constraint matching against capability documents
//!
//! A rule expression references capability fields by name. Before a rule
//! is evaluated, the capabilities document is scanned for every key/value
//! pair whose key occurs in the rule text, and the matched constraint
//! dicts become part of the rule's binding set.
//!
//! Matching is substring containment of the key inside the rule text.
//! This can over-match short key names that happen to occur inside longer
//! unrelated tokens (a key named `n` would match almost any rule). The
//! behavior is kept for compatibility with existing ruleset documents;
//! authors are expected to use descriptive capability names.

use serde_json::{Map, Value};

/// Scan `capabilities` for constraint dicts referenced by `rule_text`.
///
/// At every object node, each `(key, value)` pair whose key is contained
/// in the rule text is collected into a working dict for that node; the
/// dict is appended to the results when non-empty. Additionally, a pair
/// whose key or string value equals `field_name` appends the entire
/// enclosing node, so rules can see the whole sibling record.
///
/// Several capability records can match one rule (for example one record
/// per receiver band); all of them are returned and the rule is evaluated
/// once per record.
pub fn match_constraints(
    capabilities: &Value,
    field_name: Option<&str>,
    rule_text: &str,
) -> Vec<Map<String, Value>> {
    let mut results = Vec::new();
    let mut stack = vec![capabilities];

    while let Some(node) = stack.pop() {
        match node {
            Value::Object(map) => {
                let mut referenced = Map::new();
                for (key, value) in map {
                    if rule_text.contains(key.as_str()) {
                        referenced.insert(key.clone(), value.clone());
                    }
                    if let Some(field) = field_name {
                        if key == field || value.as_str() == Some(field) {
                            results.push(map.clone());
                        }
                    }
                }
                if !referenced.is_empty() {
                    results.push(referenced);
                }
                // reverse push keeps document order on the LIFO stack
                for value in map.values().rev() {
                    if value.is_object() || value.is_array() {
                        stack.push(value);
                    }
                }
            }
            Value::Array(items) => {
                for item in items.iter().rev() {
                    if item.is_object() || item.is_array() {
                        stack.push(item);
                    }
                }
            }
            _ => {}
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_scalar_constraint() {
        let caps = json!({"number_ska_dishes": 4, "unrelated": 7});
        let matched = match_constraints(
            &caps,
            Some("receptor_ids"),
            "0 < len(receptor_ids) <= number_ska_dishes",
        );
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].get("number_ska_dishes"), Some(&json!(4)));
        assert!(!matched[0].contains_key("unrelated"));
    }

    #[test]
    fn test_one_dict_per_sibling_record() {
        let caps = json!({
            "receiver_information": [
                {"rx_id": "Band_1", "min_frequency_hz": 350e6},
                {"rx_id": "Band_2", "min_frequency_hz": 950e6},
                {"rx_id": "Band_5a", "min_frequency_hz": 4600e6}
            ]
        });
        let matched = match_constraints(&caps, Some("freq_min"), "freq_min >= min_frequency_hz");
        assert_eq!(matched.len(), 3);
        assert_eq!(matched[0].get("min_frequency_hz"), Some(&json!(350e6)));
        assert_eq!(matched[2].get("min_frequency_hz"), Some(&json!(4600e6)));
    }

    #[test]
    fn test_whole_node_appended_for_field_name_value() {
        let caps = json!({
            "bands": [
                {"rx_id": "receiver_band", "min_frequency_hz": 1.0}
            ]
        });
        // value equals the field name, so the whole record is carried
        let matched = match_constraints(&caps, Some("receiver_band"), "always_true == 1");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].get("rx_id"), Some(&json!("receiver_band")));
        assert_eq!(matched[0].get("min_frequency_hz"), Some(&json!(1.0)));
    }

    #[test]
    fn test_rule_mentioning_rx_id_matches_every_record() {
        let caps = json!({
            "receiver_information": [
                {"rx_id": "Band_1"},
                {"rx_id": "Band_2"},
                {"rx_id": "Band_5a"},
                {"rx_id": "Band_5b"}
            ]
        });
        let matched = match_constraints(&caps, Some("receiver_band"), "rx_id in allowed_bands");
        assert_eq!(matched.len(), 4);
    }

    #[test]
    fn test_no_reference_yields_empty() {
        let caps = json!({"number_ska_dishes": 4});
        let matched = match_constraints(&caps, Some("target"), "len(target) > 0");
        assert!(matched.is_empty());
    }

    #[test]
    fn test_traversal_order_is_document_order() {
        let caps = json!({
            "a": {"limit_one": 1},
            "b": {"limit_two": 2}
        });
        let matched = match_constraints(&caps, None, "limit_one < limit_two");
        assert_eq!(matched.len(), 2);
        assert!(matched[0].contains_key("limit_one"));
        assert!(matched[1].contains_key("limit_two"));
    }

    #[test]
    fn test_substring_over_match_sharp_edge() {
        // a short key matches inside a longer token; kept for compatibility
        let caps = json!({"max": 10});
        let matched = match_constraints(&caps, None, "freq_max_hz <= 1e9");
        assert_eq!(matched.len(), 1);
        assert!(matched[0].contains_key("max"));
    }
}
