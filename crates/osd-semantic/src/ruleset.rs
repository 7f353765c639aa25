//! Ruleset access and command-kind resolution
//!
//! Rule documents are keyed by telescope and command kind. Both are
//! resolved from the command's interface URI, with the telescope also
//! available as an explicit field; resolution falls back to Mid when
//! nothing disambiguates.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SemanticError};
use crate::rules::RuleDocument;

#[cfg(test)]
use mockall::automock;

/// A telescope instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Telescope {
    Mid,
    Low,
}

impl std::fmt::Display for Telescope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Telescope::Mid => write!(f, "mid"),
            Telescope::Low => write!(f, "low"),
        }
    }
}

impl Telescope {
    /// Recognize a telescope named inside an interface URI
    pub fn from_interface(interface: &str) -> Option<Telescope> {
        if interface.contains("low") {
            Some(Telescope::Low)
        } else if interface.contains("mid") {
            Some(Telescope::Mid)
        } else {
            None
        }
    }

    /// Resolve from the command's explicit `telescope` field or the
    /// interface URI, defaulting to Mid.
    pub fn resolve(command: &Value, interface: &str) -> Telescope {
        if let Some(name) = command.get("telescope").and_then(Value::as_str) {
            if name.contains("low") {
                return Telescope::Low;
            }
            if name.contains("mid") {
                return Telescope::Mid;
            }
        }
        Telescope::from_interface(interface).unwrap_or(Telescope::Mid)
    }
}

/// The kind of observation command being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    AssignResources,
    Configure,
    SchedulingBlock,
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandKind::AssignResources => write!(f, "assign_resources"),
            CommandKind::Configure => write!(f, "configure"),
            CommandKind::SchedulingBlock => write!(f, "scheduling_block"),
        }
    }
}

impl CommandKind {
    /// Recognize the command kind named inside an interface URI
    pub fn from_interface(interface: &str) -> Option<CommandKind> {
        if interface.contains("assignresources") || interface.contains("assign-resources") {
            Some(CommandKind::AssignResources)
        } else if interface.contains("configure") {
            Some(CommandKind::Configure)
        } else if interface.contains("sbd") || interface.contains("scheduling-block") {
            Some(CommandKind::SchedulingBlock)
        } else {
            None
        }
    }
}

/// Source of rule documents
#[cfg_attr(test, automock)]
pub trait RulesetProvider: Send + Sync {
    /// Return the rule document for one command kind and telescope
    fn fetch_ruleset(&self, kind: CommandKind, telescope: Telescope) -> Result<RuleDocument>;
}

/// Provider over literal rule documents
#[derive(Debug, Default)]
pub struct StaticRulesetProvider {
    documents: HashMap<(CommandKind, Telescope), RuleDocument>,
}

impl StaticRulesetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule document, parsing it from a raw value
    pub fn with_document(
        mut self,
        kind: CommandKind,
        telescope: Telescope,
        document: &Value,
    ) -> Result<Self> {
        let parsed = RuleDocument::from_value(document)?;
        self.documents.insert((kind, telescope), parsed);
        Ok(self)
    }
}

impl RulesetProvider for StaticRulesetProvider {
    fn fetch_ruleset(&self, kind: CommandKind, telescope: Telescope) -> Result<RuleDocument> {
        self.documents
            .get(&(kind, telescope))
            .cloned()
            .ok_or_else(|| {
                SemanticError::authoring(format!(
                    "no ruleset registered for {} on telescope {}",
                    kind, telescope
                ))
            })
    }
}

/// Load a rule document from a JSON or YAML file, dispatching on the
/// file extension.
pub fn load_ruleset_file(path: &Path) -> Result<RuleDocument> {
    let text = std::fs::read_to_string(path)?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => RuleDocument::from_yaml_str(&text),
        Some("json") => RuleDocument::from_json_str(&text),
        other => Err(SemanticError::Parse(format!(
            "unsupported ruleset file extension {:?}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_telescope_from_interface() {
        assert_eq!(
            Telescope::from_interface("https://schema.skao.int/ska-low-tmc-assignresources/3.2"),
            Some(Telescope::Low)
        );
        assert_eq!(
            Telescope::from_interface("https://schema.skao.int/ska-tmc-configure/2.1"),
            None
        );
    }

    #[test]
    fn test_telescope_resolution_prefers_explicit_field() {
        let command = json!({"telescope": "ska_low"});
        let resolved =
            Telescope::resolve(&command, "https://schema.skao.int/ska-mid-tmc-configure/2.1");
        assert_eq!(resolved, Telescope::Low);
    }

    #[test]
    fn test_telescope_falls_back_to_mid() {
        let command = json!({});
        let resolved =
            Telescope::resolve(&command, "https://schema.skao.int/ska-tmc-configure/2.1");
        assert_eq!(resolved, Telescope::Mid);
    }

    #[test]
    fn test_command_kind_from_interface() {
        assert_eq!(
            CommandKind::from_interface("https://schema.skao.int/ska-tmc-assignresources/2.1"),
            Some(CommandKind::AssignResources)
        );
        assert_eq!(
            CommandKind::from_interface("https://schema.skao.int/ska-tmc-configure/2.1"),
            Some(CommandKind::Configure)
        );
        assert_eq!(
            CommandKind::from_interface("https://schema.skao.int/ska-oso-pdm-sbd/0.1"),
            Some(CommandKind::SchedulingBlock)
        );
        assert_eq!(
            CommandKind::from_interface("https://schema.skao.int/ska-tmc-release/2.1"),
            None
        );
    }

    #[test]
    fn test_static_provider_round_trip() {
        let rules = json!({
            "dish": {
                "receptor_ids": [{"rule": "len(receptor_ids) > 0", "error": "no receptors"}]
            }
        });
        let provider = StaticRulesetProvider::new()
            .with_document(CommandKind::AssignResources, Telescope::Mid, &rules)
            .unwrap();
        let document = provider
            .fetch_ruleset(CommandKind::AssignResources, Telescope::Mid)
            .unwrap();
        assert_eq!(document.root.children.len(), 1);
    }

    #[test]
    fn test_missing_ruleset_is_authoring_error() {
        let provider = StaticRulesetProvider::new();
        let result = provider.fetch_ruleset(CommandKind::Configure, Telescope::Low);
        assert!(matches!(result, Err(SemanticError::RulesetAuthoring(_))));
    }

    #[test]
    fn test_mock_provider_propagates_errors() {
        let mut mock = MockRulesetProvider::new();
        mock.expect_fetch_ruleset()
            .returning(|_, _| Err(SemanticError::authoring("ruleset store unreachable")));
        let result = mock.fetch_ruleset(CommandKind::Configure, Telescope::Mid);
        assert!(matches!(result, Err(SemanticError::RulesetAuthoring(_))));
    }

    #[test]
    fn test_load_ruleset_file_yaml() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        write!(
            file,
            "dish:\n  receptor_ids:\n    - rule: \"len(receptor_ids) > 0\"\n      error: \"no receptors\"\n"
        )
        .unwrap();
        let document = load_ruleset_file(file.path()).unwrap();
        assert_eq!(document.root.children.len(), 1);
    }

    #[test]
    fn test_load_ruleset_file_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            load_ruleset_file(file.path()),
            Err(SemanticError::Parse(_))
        ));
    }
}
