//! Error types for the semantic validation engine
//!
//! The error taxonomy distinguishes request-shape problems, genuine
//! semantic rule failures, broken ruleset documents, and visibility
//! calculation errors so callers can branch on kind without inspecting
//! message strings.

use thiserror::Error;

/// Main error type for semantic validation operations
#[derive(Error, Debug)]
pub enum SemanticError {
    /// The top-level request is malformed (missing field, bad interface URI)
    #[error("Invalid request: {0}")]
    RequestShape(String),

    /// One or more rules evaluated false against legitimate input
    #[error("Semantic validation failed:\n{}", .messages.join("\n"))]
    SemanticFailure {
        /// Formatted rule failure messages, in ruleset document order
        messages: Vec<String>,
    },

    /// The ruleset document itself is broken (unbound name, bad template key)
    #[error("Invalid rule or error key: {0}")]
    RulesetAuthoring(String),

    /// Target visibility calculation failed
    #[error("Visibility error: {0}")]
    Visibility(String),

    /// Document deserialization error
    #[error("Parse error: {0}")]
    Parse(String),

    /// File access or I/O error
    #[error("File error: {0}")]
    Io(String),
}

impl SemanticError {
    /// Create a request-shape error
    pub fn request_shape(msg: impl Into<String>) -> Self {
        SemanticError::RequestShape(msg.into())
    }

    /// Create a ruleset-authoring error
    pub fn authoring(msg: impl Into<String>) -> Self {
        SemanticError::RulesetAuthoring(msg.into())
    }

    /// Create a visibility error
    pub fn visibility(msg: impl Into<String>) -> Self {
        SemanticError::Visibility(msg.into())
    }

    /// Create a semantic-failure error from accumulated messages
    pub fn semantic_failure(messages: Vec<String>) -> Self {
        SemanticError::SemanticFailure { messages }
    }

    /// The accumulated failure messages, if this is a semantic failure
    pub fn messages(&self) -> Option<&[String]> {
        match self {
            SemanticError::SemanticFailure { messages } => Some(messages),
            _ => None,
        }
    }

    /// Check if this error is caused by the submitted command (vs the
    /// ruleset document or the host system)
    pub fn is_command_error(&self) -> bool {
        matches!(
            self,
            SemanticError::RequestShape(_) | SemanticError::SemanticFailure { .. }
        )
    }
}

impl From<serde_json::Error> for SemanticError {
    fn from(err: serde_json::Error) -> Self {
        SemanticError::Parse(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for SemanticError {
    fn from(err: serde_yaml::Error) -> Self {
        SemanticError::Parse(format!("YAML error: {}", err))
    }
}

impl From<std::io::Error> for SemanticError {
    fn from(err: std::io::Error) -> Self {
        SemanticError::Io(err.to_string())
    }
}

/// Result type alias for semantic validation operations
pub type Result<T> = std::result::Result<T, SemanticError>;
