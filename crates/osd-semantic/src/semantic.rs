//! Top-level semantic validation entry point
//!
//! One validation run moves through a fixed sequence: structural
//! pre-check of the request, capability fetch (skipped when the caller
//! supplies a pre-fetched document pair), basic-capability linking,
//! ruleset selection, and the rule tree walk. Failures accumulate across
//! the whole walk and are reported together.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::capabilities::{link_basic_capabilities, CapabilityProvider};
use crate::error::{Result, SemanticError};
use crate::ruleset::{CommandKind, RulesetProvider, Telescope};
use crate::session::SessionStore;
use crate::tree::TreeValidator;

/// Default array assembly when the request names none
pub const DEFAULT_ARRAY_ASSEMBLY: &str = "AA0.5";

fn interface_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^https://schema\.skao\.int/[a-z0-9-]+/\d+(\.\d+)*$")
            .expect("interface pattern is valid")
    })
}

/// One validation request
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    /// The user-submitted observation command
    pub observing_command_input: Value,
    /// Interface URI override; taken from the command's `interface`
    /// field when absent
    pub interface: Option<String>,
    /// Array assembly whose capabilities apply
    pub array_assembly: String,
    /// Raise a semantic failure as an error (true) or return false
    pub raise_semantic: bool,
    /// Pre-fetched `(capabilities, basic_capabilities)` pair; skips the
    /// provider call entirely
    pub capabilities_override: Option<(Value, Value)>,
}

impl ValidationRequest {
    /// Create a request with the default array assembly and raising
    /// behavior
    pub fn new(observing_command_input: Value) -> Self {
        Self {
            observing_command_input,
            interface: None,
            array_assembly: DEFAULT_ARRAY_ASSEMBLY.to_string(),
            raise_semantic: true,
            capabilities_override: None,
        }
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interface = Some(interface.into());
        self
    }

    pub fn with_array_assembly(mut self, array_assembly: impl Into<String>) -> Self {
        self.array_assembly = array_assembly.into();
        self
    }

    pub fn with_raise_semantic(mut self, raise_semantic: bool) -> Self {
        self.raise_semantic = raise_semantic;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Value, basic_capabilities: Value) -> Self {
        self.capabilities_override = Some((capabilities, basic_capabilities));
        self
    }
}

/// The semantic validation engine
pub struct SemanticValidator<C, R> {
    capabilities: C,
    rulesets: R,
}

impl<C: CapabilityProvider, R: RulesetProvider> SemanticValidator<C, R> {
    /// Create a validator over the two data providers
    pub fn new(capabilities: C, rulesets: R) -> Self {
        Self {
            capabilities,
            rulesets,
        }
    }

    /// Validate one observation command against the applicable ruleset.
    ///
    /// Returns `Ok(true)` when every rule passed. On rule failures,
    /// raises [`SemanticError::SemanticFailure`] carrying the ordered
    /// message list, or returns `Ok(false)` when the request opted out
    /// of raising. Request-shape, ruleset-authoring, and provider errors
    /// propagate regardless of `raise_semantic`.
    pub fn semantic_validate(&self, request: &ValidationRequest) -> Result<bool> {
        let interface = self.precheck(request)?;
        let command = &request.observing_command_input;

        let telescope = Telescope::resolve(command, &interface);
        let kind = CommandKind::from_interface(&interface).ok_or_else(|| {
            SemanticError::request_shape(format!(
                "interface '{}' does not identify a supported command kind",
                interface
            ))
        })?;

        tracing::info!(
            %telescope,
            command_kind = %kind,
            array_assembly = %request.array_assembly,
            "starting semantic validation"
        );

        let (mut capabilities, basic) = match &request.capabilities_override {
            Some((capabilities, basic)) => (capabilities.clone(), basic.clone()),
            None => self
                .capabilities
                .fetch_capabilities(telescope, &request.array_assembly)?,
        };
        link_basic_capabilities(&mut capabilities, &basic);

        let ruleset = self.rulesets.fetch_ruleset(kind, telescope)?;

        let mut store = SessionStore::new();
        let validator = TreeValidator::new(&capabilities);
        let messages = validator.validate(&ruleset.root, command, &mut store)?;
        let messages: Vec<String> = messages.into_iter().filter(|m| !m.is_empty()).collect();

        if messages.is_empty() {
            tracing::info!("semantic validation passed");
            return Ok(true);
        }

        tracing::warn!(failures = messages.len(), "semantic validation failed");
        if request.raise_semantic {
            Err(SemanticError::semantic_failure(messages))
        } else {
            Ok(false)
        }
    }

    /// Structural pre-check of the request. Failures here are
    /// request-shape errors and short-circuit before any capability or
    /// ruleset access.
    fn precheck(&self, request: &ValidationRequest) -> Result<String> {
        let command = &request.observing_command_input;
        if !command.is_object() {
            return Err(SemanticError::request_shape(
                "observing_command_input must be a JSON object",
            ));
        }

        let interface = request
            .interface
            .clone()
            .or_else(|| {
                command
                    .get("interface")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .ok_or_else(|| {
                SemanticError::request_shape(
                    "missing interface URI: not supplied and not present in the command",
                )
            })?;

        if !interface_pattern().is_match(&interface) {
            return Err(SemanticError::request_shape(format!(
                "malformed interface URI '{}'",
                interface
            )));
        }

        Ok(interface)
    }
}
