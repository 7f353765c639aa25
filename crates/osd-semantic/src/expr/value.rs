//! Value domain for rule expression evaluation
//!
//! Rule expressions follow the conventions of the documents they are
//! authored in: numbers mix int and float freely, truthiness is
//! container-emptiness, and equality coerces across numeric variants.

use serde_json::Value;

/// A value produced or consumed by the expression evaluator
#[derive(Debug, Clone)]
pub enum EvalValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<EvalValue>),
    Tuple(Vec<EvalValue>),
    /// Insertion-ordered, deduplicated
    Set(Vec<EvalValue>),
    Dict(Vec<(String, EvalValue)>),
}

impl EvalValue {
    /// Total conversion from a JSON document value.
    pub fn from_json(value: &Value) -> EvalValue {
        match value {
            Value::Null => EvalValue::None,
            Value::Bool(b) => EvalValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => EvalValue::Int(i),
                None => EvalValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => EvalValue::Str(s.clone()),
            Value::Array(items) => {
                EvalValue::List(items.iter().map(EvalValue::from_json).collect())
            }
            Value::Object(map) => EvalValue::Dict(
                map.iter()
                    .map(|(k, v)| (k.clone(), EvalValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Truthiness: `None` and `False` are false, numbers are false at
    /// zero, strings and containers are false when empty.
    pub fn truthy(&self) -> bool {
        match self {
            EvalValue::None => false,
            EvalValue::Bool(b) => *b,
            EvalValue::Int(i) => *i != 0,
            EvalValue::Float(f) => *f != 0.0,
            EvalValue::Str(s) => !s.is_empty(),
            EvalValue::List(items) | EvalValue::Tuple(items) | EvalValue::Set(items) => {
                !items.is_empty()
            }
            EvalValue::Dict(pairs) => !pairs.is_empty(),
        }
    }

    /// Element count for sized values
    pub fn length(&self) -> Option<usize> {
        match self {
            EvalValue::Str(s) => Some(s.chars().count()),
            EvalValue::List(items) | EvalValue::Tuple(items) | EvalValue::Set(items) => {
                Some(items.len())
            }
            EvalValue::Dict(pairs) => Some(pairs.len()),
            _ => None,
        }
    }

    /// Numeric view for arithmetic and ordering
    pub fn as_number(&self) -> Option<f64> {
        match self {
            EvalValue::Int(i) => Some(*i as f64),
            EvalValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_set(&self) -> bool {
        matches!(self, EvalValue::Set(_))
    }

    /// Short type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            EvalValue::None => "None",
            EvalValue::Bool(_) => "bool",
            EvalValue::Int(_) => "int",
            EvalValue::Float(_) => "float",
            EvalValue::Str(_) => "str",
            EvalValue::List(_) => "list",
            EvalValue::Tuple(_) => "tuple",
            EvalValue::Set(_) => "set",
            EvalValue::Dict(_) => "dict",
        }
    }

    /// Build a set, deduplicating while preserving first-seen order.
    pub fn set_from(items: Vec<EvalValue>) -> EvalValue {
        let mut unique: Vec<EvalValue> = Vec::with_capacity(items.len());
        for item in items {
            if !unique.iter().any(|existing| existing == &item) {
                unique.push(item);
            }
        }
        EvalValue::Set(unique)
    }
}

impl PartialEq for EvalValue {
    /// Equality with numeric coercion: `1 == 1.0` holds, mirroring how
    /// capability documents mix integer and float literals.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EvalValue::None, EvalValue::None) => true,
            (EvalValue::Bool(a), EvalValue::Bool(b)) => a == b,
            (EvalValue::Str(a), EvalValue::Str(b)) => a == b,
            (EvalValue::List(a), EvalValue::List(b))
            | (EvalValue::Tuple(a), EvalValue::Tuple(b)) => a == b,
            (EvalValue::Set(a), EvalValue::Set(b)) => {
                a.len() == b.len() && a.iter().all(|item| b.contains(item))
            }
            (EvalValue::Dict(a), EvalValue::Dict(b)) => a == b,
            (left, right) => match (left.as_number(), right.as_number()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl std::fmt::Display for EvalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalValue::None => write!(f, "None"),
            EvalValue::Bool(true) => write!(f, "True"),
            EvalValue::Bool(false) => write!(f, "False"),
            EvalValue::Int(i) => write!(f, "{}", i),
            EvalValue::Float(x) => write!(f, "{}", x),
            EvalValue::Str(s) => write!(f, "{}", s),
            EvalValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            EvalValue::Tuple(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            EvalValue::Set(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            EvalValue::Dict(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}
