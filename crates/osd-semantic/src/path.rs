//! Lenient path resolution over nested JSON documents
//!
//! Command inputs are arbitrarily nested and rule documents do not name
//! every intermediate container, so lookup must tolerate paths that skip
//! levels: a key absent at the current level is searched inside nested
//! objects and inside objects held by nested arrays, depth-first in
//! document order. Absence is an ordinary outcome (`None`), never an
//! error — optional command fields simply have no rules applied.

use serde_json::Value;

/// One segment of a resolution path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKey {
    /// A mapping key
    Key(String),
    /// A position inside a matched array
    Index(usize),
}

impl From<&str> for PathKey {
    fn from(key: &str) -> Self {
        PathKey::Key(key.to_string())
    }
}

impl From<String> for PathKey {
    fn from(key: String) -> Self {
        PathKey::Key(key)
    }
}

impl From<usize> for PathKey {
    fn from(index: usize) -> Self {
        PathKey::Index(index)
    }
}

impl std::fmt::Display for PathKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathKey::Key(k) => write!(f, "{}", k),
            PathKey::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Parse a dotted path such as `"dish.receptor_ids"` or `"beams.0.freq_min"`.
/// Segments that parse as unsigned integers become array indices.
pub fn parse_path(dotted: &str) -> Vec<PathKey> {
    dotted
        .split('.')
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<usize>() {
            Ok(i) => PathKey::Index(i),
            Err(_) => PathKey::Key(s.to_string()),
        })
        .collect()
}

/// Render a path for log and error messages
pub fn path_to_string(path: &[PathKey]) -> String {
    path.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Resolve `path` against `data`.
///
/// An empty path returns `data` itself. A `Key` segment matches the
/// current object directly, or the first occurrence of that key found by
/// depth-first descent through nested objects and arrays. An `Index`
/// segment selects a position inside the array the previous segment
/// matched. Returns `None` when no match exists at any depth.
pub fn resolve<'a>(data: &'a Value, path: &[PathKey]) -> Option<&'a Value> {
    let (head, rest) = match path.split_first() {
        None => return Some(data),
        Some(split) => split,
    };

    match head {
        PathKey::Index(i) => match data {
            Value::Array(items) => items.get(*i).and_then(|item| resolve(item, rest)),
            _ => None,
        },
        PathKey::Key(key) => find_key(data, key).and_then(|found| resolve(found, rest)),
    }
}

/// Depth-first, document-order search for the first mapping entry named `key`.
fn find_key<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    match data {
        Value::Object(map) => {
            if let Some(value) = map.get(key) {
                return Some(value);
            }
            map.values()
                .filter(|v| v.is_object() || v.is_array())
                .find_map(|v| find_key(v, key))
        }
        Value::Array(items) => items.iter().find_map(|item| find_key(item, key)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_path_is_identity() {
        let data = json!({"a": 1});
        assert_eq!(resolve(&data, &[]), Some(&data));
    }

    #[test]
    fn test_direct_key() {
        let data = json!({"dish": {"receptor_ids": ["SKA001"]}});
        let path = parse_path("dish.receptor_ids");
        assert_eq!(resolve(&data, &path), Some(&json!(["SKA001"])));
    }

    #[test]
    fn test_skipped_intermediate_level() {
        let data = json!({"sdp": {"execution_block": {"eb_id": "eb-001"}}});
        // "execution_block" is not named in the path
        let path = parse_path("sdp.eb_id");
        assert_eq!(resolve(&data, &path), Some(&json!("eb-001")));
    }

    #[test]
    fn test_key_inside_array_of_objects() {
        let data = json!({"beams": [{"beam_id": 1}, {"beam_id": 2}]});
        let path = parse_path("beam_id");
        // first found in traversal order
        assert_eq!(resolve(&data, &path), Some(&json!(1)));
    }

    #[test]
    fn test_index_into_matched_array() {
        let data = json!({"beams": [{"freq": 100}, {"freq": 200}]});
        let path = parse_path("beams.1.freq");
        assert_eq!(resolve(&data, &path), Some(&json!(200)));
    }

    #[test]
    fn test_missing_key_is_none() {
        let data = json!({"a": {"b": 1}});
        assert_eq!(resolve(&data, &parse_path("c")), None);
    }

    #[test]
    fn test_index_on_non_array_is_none() {
        let data = json!({"a": {"b": 1}});
        assert_eq!(resolve(&data, &[PathKey::Index(0)]), None);
    }

    #[test]
    fn test_repeated_resolution_is_stable() {
        let data = json!({"x": [{"y": {"z": 3}}, {"y": {"z": 4}}]});
        let path = parse_path("x.z");
        let first = resolve(&data, &path);
        let second = resolve(&data, &path);
        assert_eq!(first, second);
        assert_eq!(first, Some(&json!(3)));
    }

    #[test]
    fn test_path_to_string() {
        assert_eq!(path_to_string(&parse_path("a.0.b")), "a.0.b");
    }
}
