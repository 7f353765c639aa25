//! Capability data access
//!
//! Capabilities are per-telescope, per-array-assembly structured limits
//! (dish counts, bandwidths, receiver bands). Shared reference records
//! such as receiver frequency ranges live under `basic_capabilities`,
//! addressed by an identifier field instead of being duplicated per
//! array assembly. Before validation, capability leaf values naming such
//! a record are replaced with the full record so rules can reference
//! fields that only exist in `basic_capabilities`.

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{Result, SemanticError};
use crate::ruleset::Telescope;

#[cfg(test)]
use mockall::automock;

/// Source of capability documents.
///
/// The fetch happens once per validation call, up front, as a blocking
/// call; the engine carries no retry or timeout logic of its own.
#[cfg_attr(test, automock)]
pub trait CapabilityProvider: Send + Sync {
    /// Return the `(capabilities, basic_capabilities)` pair for one
    /// telescope and array assembly.
    fn fetch_capabilities(
        &self,
        telescope: Telescope,
        array_assembly: &str,
    ) -> Result<(Value, Value)>;
}

/// Provider over literal OSD documents, one per telescope.
///
/// The document shape is array-assembly keys at the top level plus a
/// `basic_capabilities` key holding the shared reference data.
#[derive(Debug, Default)]
pub struct StaticCapabilityProvider {
    documents: HashMap<Telescope, Value>,
}

impl StaticCapabilityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the OSD document for a telescope
    pub fn with_document(mut self, telescope: Telescope, document: Value) -> Self {
        self.documents.insert(telescope, document);
        self
    }
}

impl CapabilityProvider for StaticCapabilityProvider {
    fn fetch_capabilities(
        &self,
        telescope: Telescope,
        array_assembly: &str,
    ) -> Result<(Value, Value)> {
        let document = self.documents.get(&telescope).ok_or_else(|| {
            SemanticError::request_shape(format!(
                "no capability document for telescope '{}'",
                telescope
            ))
        })?;
        let capabilities = document.get(array_assembly).cloned().ok_or_else(|| {
            SemanticError::request_shape(format!(
                "unknown array assembly '{}' for telescope '{}'",
                array_assembly, telescope
            ))
        })?;
        let basic = document
            .get("basic_capabilities")
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        Ok((capabilities, basic))
    }
}

/// Replace capability leaf values that name a `basic_capabilities`
/// record with the full record.
///
/// A record is any object found inside the basic-capabilities document;
/// it is addressable by each of its string field values (for example a
/// receiver record with `rx_id: "Band_1"` is addressable as "Band_1").
/// Every string leaf in `capabilities` equal to such an identifier is
/// replaced in place, so a rule keyed on a per-assembly capability can
/// reference frequency-range fields that live only in the shared data.
pub fn link_basic_capabilities(capabilities: &mut Value, basic: &Value) {
    let mut index: HashMap<String, &Value> = HashMap::new();
    build_record_index(basic, &mut index);
    if index.is_empty() {
        return;
    }
    let replacements: HashMap<String, Value> = index
        .into_iter()
        .map(|(k, v)| (k, v.clone()))
        .collect();
    replace_leaves(capabilities, &replacements);
}

/// Index every object record in `basic` by its string field values.
/// First record wins when identifiers collide.
fn build_record_index<'a>(basic: &'a Value, index: &mut HashMap<String, &'a Value>) {
    match basic {
        Value::Object(map) => {
            let is_record = map.values().any(|v| v.is_string());
            if is_record {
                for value in map.values() {
                    if let Value::String(id) = value {
                        index.entry(id.clone()).or_insert(basic);
                    }
                }
            }
            for value in map.values() {
                build_record_index(value, index);
            }
        }
        Value::Array(items) => {
            for item in items {
                build_record_index(item, index);
            }
        }
        _ => {}
    }
}

fn replace_leaves(value: &mut Value, replacements: &HashMap<String, Value>) {
    match value {
        Value::String(s) => {
            if let Some(record) = replacements.get(s.as_str()) {
                *value = record.clone();
            }
        }
        Value::Array(items) => {
            for item in items {
                replace_leaves(item, replacements);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                replace_leaves(item, replacements);
            }
        }
        _ => {}
    }
}
