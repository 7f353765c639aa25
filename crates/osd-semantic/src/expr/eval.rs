//! Tree-walking evaluator for rule expressions

use std::collections::HashMap;

use super::ast::{BinaryOp, BoolOp, CmpOp, Expr, UnaryOp};
use super::value::EvalValue;
use super::ExprError;

/// Evaluate a parsed expression against a binding set.
///
/// `and`/`or` short-circuit and yield the deciding operand value, so a
/// set-typed subexpression keeps its type through boolean connectives.
pub fn evaluate(
    expr: &Expr,
    bindings: &HashMap<String, EvalValue>,
) -> Result<EvalValue, ExprError> {
    match expr {
        Expr::Int(i) => Ok(EvalValue::Int(*i)),
        Expr::Float(f) => Ok(EvalValue::Float(*f)),
        Expr::Str(s) => Ok(EvalValue::Str(s.clone())),
        Expr::Bool(b) => Ok(EvalValue::Bool(*b)),
        Expr::None => Ok(EvalValue::None),

        Expr::Ident(name) => bindings
            .get(name)
            .cloned()
            .ok_or_else(|| ExprError::UnboundName(name.clone())),

        Expr::Logic { op, left, right } => {
            let left_value = evaluate(left, bindings)?;
            match op {
                BoolOp::And if !left_value.truthy() => Ok(left_value),
                BoolOp::Or if left_value.truthy() => Ok(left_value),
                _ => evaluate(right, bindings),
            }
        }

        Expr::Compare { first, rest } => {
            let mut left = evaluate(first, bindings)?;
            for (op, right_expr) in rest {
                let right = evaluate(right_expr, bindings)?;
                if !compare(*op, &left, &right)? {
                    return Ok(EvalValue::Bool(false));
                }
                left = right;
            }
            Ok(EvalValue::Bool(true))
        }

        Expr::Binary { op, left, right } => {
            let a = evaluate(left, bindings)?;
            let b = evaluate(right, bindings)?;
            binary(*op, a, b)
        }

        Expr::Unary { op, operand } => {
            let value = evaluate(operand, bindings)?;
            match op {
                UnaryOp::Not => Ok(EvalValue::Bool(!value.truthy())),
                UnaryOp::Neg => match value {
                    EvalValue::Int(i) => Ok(EvalValue::Int(-i)),
                    EvalValue::Float(f) => Ok(EvalValue::Float(-f)),
                    other => Err(ExprError::Type(format!(
                        "cannot negate {}",
                        other.type_name()
                    ))),
                },
            }
        }

        Expr::Call { function, args } => call(function, args, bindings),

        Expr::Index { value, index } => {
            let container = evaluate(value, bindings)?;
            let key = evaluate(index, bindings)?;
            index_value(&container, &key)
        }

        Expr::List(items) => Ok(EvalValue::List(eval_all(items, bindings)?)),
        Expr::Tuple(items) => Ok(EvalValue::Tuple(eval_all(items, bindings)?)),
        Expr::Set(items) => Ok(EvalValue::set_from(eval_all(items, bindings)?)),
        Expr::Dict(pairs) => {
            let mut out = Vec::with_capacity(pairs.len());
            for (key_expr, value_expr) in pairs {
                let key = match evaluate(key_expr, bindings)? {
                    EvalValue::Str(s) => s,
                    other => {
                        return Err(ExprError::Type(format!(
                            "dict keys must be strings, found {}",
                            other.type_name()
                        )))
                    }
                };
                out.push((key, evaluate(value_expr, bindings)?));
            }
            Ok(EvalValue::Dict(out))
        }
    }
}

fn eval_all(
    items: &[Expr],
    bindings: &HashMap<String, EvalValue>,
) -> Result<Vec<EvalValue>, ExprError> {
    items.iter().map(|item| evaluate(item, bindings)).collect()
}

fn compare(op: CmpOp, left: &EvalValue, right: &EvalValue) -> Result<bool, ExprError> {
    match op {
        CmpOp::Eq => Ok(left == right),
        CmpOp::Ne => Ok(left != right),
        CmpOp::In => contains(right, left),
        CmpOp::NotIn => contains(right, left).map(|found| !found),
        CmpOp::Lt | CmpOp::Le | CmpOp::Gt | CmpOp::Ge => {
            let ordering = order(left, right)?;
            Ok(match op {
                CmpOp::Lt => ordering == std::cmp::Ordering::Less,
                CmpOp::Le => ordering != std::cmp::Ordering::Greater,
                CmpOp::Gt => ordering == std::cmp::Ordering::Greater,
                CmpOp::Ge => ordering != std::cmp::Ordering::Less,
                _ => unreachable!(),
            })
        }
    }
}

fn order(left: &EvalValue, right: &EvalValue) -> Result<std::cmp::Ordering, ExprError> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return a.partial_cmp(&b).ok_or_else(|| {
            ExprError::Type("cannot order NaN".to_string())
        });
    }
    if let (EvalValue::Str(a), EvalValue::Str(b)) = (left, right) {
        return Ok(a.cmp(b));
    }
    Err(ExprError::Type(format!(
        "cannot order {} and {}",
        left.type_name(),
        right.type_name()
    )))
}

fn contains(container: &EvalValue, item: &EvalValue) -> Result<bool, ExprError> {
    match container {
        EvalValue::List(items) | EvalValue::Tuple(items) | EvalValue::Set(items) => {
            Ok(items.contains(item))
        }
        EvalValue::Dict(pairs) => match item {
            EvalValue::Str(key) => Ok(pairs.iter().any(|(k, _)| k == key)),
            other => Err(ExprError::Type(format!(
                "dict membership requires a string, found {}",
                other.type_name()
            ))),
        },
        EvalValue::Str(haystack) => match item {
            EvalValue::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(ExprError::Type(format!(
                "string membership requires a string, found {}",
                other.type_name()
            ))),
        },
        other => Err(ExprError::Type(format!(
            "{} is not a container",
            other.type_name()
        ))),
    }
}

fn binary(op: BinaryOp, left: EvalValue, right: EvalValue) -> Result<EvalValue, ExprError> {
    match op {
        BinaryOp::Add => match (&left, &right) {
            (EvalValue::Str(a), EvalValue::Str(b)) => {
                Ok(EvalValue::Str(format!("{}{}", a, b)))
            }
            (EvalValue::List(a), EvalValue::List(b)) => {
                let mut out = a.clone();
                out.extend(b.iter().cloned());
                Ok(EvalValue::List(out))
            }
            _ => numeric(op, &left, &right),
        },
        BinaryOp::Sub => match (&left, &right) {
            (EvalValue::Set(a), EvalValue::Set(b)) => {
                let difference = a
                    .iter()
                    .filter(|item| !b.contains(item))
                    .cloned()
                    .collect();
                Ok(EvalValue::Set(difference))
            }
            _ => numeric(op, &left, &right),
        },
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => numeric(op, &left, &right),
    }
}

fn numeric(op: BinaryOp, left: &EvalValue, right: &EvalValue) -> Result<EvalValue, ExprError> {
    let type_error = || {
        ExprError::Type(format!(
            "unsupported operand types {} and {}",
            left.type_name(),
            right.type_name()
        ))
    };

    // int op int stays int, except true division
    if let (EvalValue::Int(a), EvalValue::Int(b)) = (left, right) {
        return match op {
            BinaryOp::Add => Ok(EvalValue::Int(a + b)),
            BinaryOp::Sub => Ok(EvalValue::Int(a - b)),
            BinaryOp::Mul => Ok(EvalValue::Int(a * b)),
            BinaryOp::Div => {
                if *b == 0 {
                    Err(ExprError::Type("division by zero".to_string()))
                } else {
                    Ok(EvalValue::Float(*a as f64 / *b as f64))
                }
            }
            BinaryOp::Mod => {
                if *b == 0 {
                    Err(ExprError::Type("division by zero".to_string()))
                } else {
                    Ok(EvalValue::Int(a.rem_euclid(*b)))
                }
            }
        };
    }

    let a = left.as_number().ok_or_else(type_error)?;
    let b = right.as_number().ok_or_else(type_error)?;
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ExprError::Type("division by zero".to_string()));
            }
            a / b
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(ExprError::Type("division by zero".to_string()));
            }
            a.rem_euclid(b)
        }
    };
    Ok(EvalValue::Float(result))
}

fn index_value(container: &EvalValue, key: &EvalValue) -> Result<EvalValue, ExprError> {
    match (container, key) {
        (EvalValue::List(items), EvalValue::Int(i))
        | (EvalValue::Tuple(items), EvalValue::Int(i)) => {
            let index = normalize_index(*i, items.len())?;
            Ok(items[index].clone())
        }
        (EvalValue::Str(s), EvalValue::Int(i)) => {
            let chars: Vec<char> = s.chars().collect();
            let index = normalize_index(*i, chars.len())?;
            Ok(EvalValue::Str(chars[index].to_string()))
        }
        (EvalValue::Dict(pairs), EvalValue::Str(key)) => pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| ExprError::Type(format!("missing dict key '{}'", key))),
        (container, key) => Err(ExprError::Type(format!(
            "cannot index {} with {}",
            container.type_name(),
            key.type_name()
        ))),
    }
}

fn normalize_index(i: i64, len: usize) -> Result<usize, ExprError> {
    let index = if i < 0 { i + len as i64 } else { i };
    if index < 0 || index as usize >= len {
        Err(ExprError::Type(format!("index {} out of range", i)))
    } else {
        Ok(index as usize)
    }
}

fn call(
    function: &str,
    args: &[Expr],
    bindings: &HashMap<String, EvalValue>,
) -> Result<EvalValue, ExprError> {
    match function {
        "len" => {
            let [arg] = args else {
                return Err(ExprError::Type(format!(
                    "len expects 1 argument, got {}",
                    args.len()
                )));
            };
            let value = evaluate(arg, bindings)?;
            value
                .length()
                .map(|n| EvalValue::Int(n as i64))
                .ok_or_else(|| {
                    ExprError::Type(format!("{} has no length", value.type_name()))
                })
        }
        "regex_match" => {
            let [pattern_expr, subject_expr] = args else {
                return Err(ExprError::Type(format!(
                    "regex_match expects 2 arguments, got {}",
                    args.len()
                )));
            };
            let pattern = match evaluate(pattern_expr, bindings)? {
                EvalValue::Str(s) => s,
                other => {
                    return Err(ExprError::Type(format!(
                        "regex_match pattern must be a string, found {}",
                        other.type_name()
                    )))
                }
            };
            let subject = match evaluate(subject_expr, bindings)? {
                EvalValue::Str(s) => s,
                other => {
                    return Err(ExprError::Type(format!(
                        "regex_match subject must be a string, found {}",
                        other.type_name()
                    )))
                }
            };
            let re = regex::Regex::new(&pattern)
                .map_err(|e| ExprError::InvalidRegex(e.to_string()))?;
            // anchored at the start, like a match (vs search) primitive
            let matched = re
                .find(&subject)
                .is_some_and(|m| m.start() == 0);
            Ok(EvalValue::Bool(matched))
        }
        other => Err(ExprError::UnknownFunction(other.to_string())),
    }
}
