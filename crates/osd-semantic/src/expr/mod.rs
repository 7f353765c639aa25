//! Restricted expression sandbox for rule evaluation
//!
//! Rule expressions come from ruleset documents and must never become a
//! code-execution vector, so this module implements a small hand-rolled
//! lexer, parser, and tree-walking evaluator instead of delegating to any
//! general-purpose interpreter.
//!
//! # Grammar (lowest to highest precedence)
//!
//! 1. **Logical OR**: `or`
//! 2. **Logical AND**: `and`
//! 3. **Logical NOT**: `not`
//! 4. **Comparison chains**: `<`, `<=`, `>`, `>=`, `==`, `!=`, `in`,
//!    `not in` — chains evaluate pairwise, so `0 < len(x) <= n` holds
//!    when both adjacent comparisons hold
//! 5. **Addition/Subtraction**: `+`, `-` (minus is difference on sets)
//! 6. **Multiplication/Division**: `*`, `/`, `%`
//! 7. **Unary**: `-`
//! 8. **Postfix**: indexing `value[index]`
//! 9. **Primary**: literals (`42`, `1.5`, `"text"`, `True`, `False`,
//!    `None`), identifiers, parentheses, list `[...]`, tuple `(...,)`,
//!    set `{a, b}`, and dict `{k: v}` literals
//!
//! The only callables are `len` and `regex_match`. Attribute access,
//! assignment, and unknown function names are rejected. Unbound
//! identifiers are evaluation errors; the rule evaluator surfaces them as
//! ruleset-authoring errors, not command-validation failures.

pub mod ast;
pub mod eval;
pub mod parser;
pub mod token;
pub mod value;

pub use ast::{BinaryOp, BoolOp, CmpOp, Expr, UnaryOp};
pub use eval::evaluate;
pub use parser::parse;
pub use value::EvalValue;

use thiserror::Error;

/// Errors raised while lexing, parsing, or evaluating a rule expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExprError {
    /// Lexical or grammatical error in the expression text
    #[error("syntax error: {0}")]
    Syntax(String),

    /// An identifier has no binding
    #[error("unbound name '{0}'")]
    UnboundName(String),

    /// A call names a function outside the sandbox
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// Operand types do not support the requested operation
    #[error("type error: {0}")]
    Type(String),

    /// The pattern argument of `regex_match` failed to compile
    #[error("invalid regex: {0}")]
    InvalidRegex(String),
}

/// Parse and evaluate `source` against `bindings` in one step.
pub fn eval_str(
    source: &str,
    bindings: &std::collections::HashMap<String, EvalValue>,
) -> Result<EvalValue, ExprError> {
    let expr = parse(source)?;
    evaluate(&expr, bindings)
}
