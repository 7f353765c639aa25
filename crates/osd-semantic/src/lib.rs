//! OSD Semantic Validation Engine
//!
//! Validates observation-command payloads against business rules derived
//! from Observatory Static Data (OSD) capability documents. A rule
//! document mirrors the command structure; each leaf holds rule/error
//! pairs whose expressions reference capability fields by name.
//!
//! ## Features
//!
//! - **Rule tree walking**: recursive lock-step traversal of rule and
//!   command documents, accumulating every failure in document order
//! - **Lenient path resolution**: command fields are found even when the
//!   rule document skips intermediate containers
//! - **Constraint matching**: capability fields referenced by a rule's
//!   expression text are gathered into its binding set, one dict per
//!   matching capability record
//! - **Restricted expressions**: a hand-rolled sandbox evaluates
//!   comparisons, boolean connectives, arithmetic, membership, compound
//!   literals, `len`, and `regex_match` — and nothing else
//! - **Cross-rule dependencies**: evaluated field values flow to later
//!   sibling rules through a per-call session store
//! - **Structured errors**: request-shape, semantic-failure,
//!   ruleset-authoring, and visibility errors are distinct kinds
//!
//! ## Example
//!
//! ```
//! use osd_semantic::{
//!     CommandKind, SemanticValidator, StaticCapabilityProvider,
//!     StaticRulesetProvider, Telescope, ValidationRequest,
//! };
//! use serde_json::json;
//!
//! let capabilities = StaticCapabilityProvider::new().with_document(
//!     Telescope::Mid,
//!     json!({
//!         "AA0.5": {"number_ska_dishes": 4},
//!         "basic_capabilities": {}
//!     }),
//! );
//! let rulesets = StaticRulesetProvider::new()
//!     .with_document(
//!         CommandKind::AssignResources,
//!         Telescope::Mid,
//!         &json!({
//!             "dish": {
//!                 "receptor_ids": [{
//!                     "rule": "0 < len(receptor_ids) <= number_ska_dishes",
//!                     "error": "receptor_ids are too many!Current Limit is {number_ska_dishes}"
//!                 }]
//!             }
//!         }),
//!     )
//!     .unwrap();
//!
//! let validator = SemanticValidator::new(capabilities, rulesets);
//! let request = ValidationRequest::new(json!({
//!     "interface": "https://schema.skao.int/ska-tmc-assignresources/2.1",
//!     "dish": {"receptor_ids": ["SKA001", "SKA002"]}
//! }));
//! assert!(validator.semantic_validate(&request).unwrap());
//! ```

pub mod capabilities;
pub mod constraint;
pub mod error;
pub mod evaluator;
pub mod expr;
pub mod format;
pub mod path;
pub mod rules;
pub mod ruleset;
pub mod semantic;
pub mod session;
pub mod tree;
pub mod visibility;

pub use capabilities::{link_basic_capabilities, CapabilityProvider, StaticCapabilityProvider};
pub use constraint::match_constraints;
pub use error::{Result, SemanticError};
pub use evaluator::evaluate_rule;
pub use expr::{EvalValue, ExprError};
pub use format::render;
pub use path::{parse_path, resolve, PathKey};
pub use rules::{RuleDocument, RuleEntry, RuleGroup, RuleNode, PARENT_KEY_RULE};
pub use ruleset::{
    load_ruleset_file, CommandKind, RulesetProvider, StaticRulesetProvider, Telescope,
};
pub use semantic::{SemanticValidator, ValidationRequest, DEFAULT_ARRAY_ASSEMBLY};
pub use session::SessionStore;
pub use tree::TreeValidator;
pub use visibility::{crossing_time, elevation_deg, is_visible, site, Site};

/// Engine version (from Cargo.toml)
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
