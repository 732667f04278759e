//! Predicate evaluation over JSON snapshots.

use std::cmp::Ordering;

use metaspn_gates_types::{ComparisonOp, Predicate};
use serde_json::Value;

use crate::error::Incomparable;
use crate::path::resolve;

/// Whether `predicate` holds against `source`.
///
/// Presence operators look only at whether the path resolves. Every other
/// operator fails on an unresolved path and otherwise compares the resolved
/// value with the predicate's operand.
pub fn predicate_holds(source: &Value, predicate: &Predicate) -> Result<bool, Incomparable> {
    let actual = resolve(source, &predicate.field);
    match predicate.op {
        ComparisonOp::Exists => Ok(actual.is_some()),
        ComparisonOp::NotExists => Ok(actual.is_none()),
        op => match actual {
            None => Ok(false),
            Some(actual) => compare(op, actual, predicate.value.as_ref().unwrap_or(&Value::Null))
                .map_err(|mismatch| mismatch.at(&predicate.field)),
        },
    }
}

/// Operand types an operator could not handle; the field is filled in by the
/// caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub op: ComparisonOp,
    pub actual: &'static str,
    pub expected: &'static str,
}

impl Mismatch {
    fn at(self, field: &str) -> Incomparable {
        Incomparable {
            op: self.op,
            field: field.to_string(),
            actual: self.actual,
            expected: self.expected,
        }
    }
}

/// Apply a non-presence operator.
pub fn compare(op: ComparisonOp, actual: &Value, expected: &Value) -> Result<bool, Mismatch> {
    let mismatch = || Mismatch {
        op,
        actual: kind(actual),
        expected: kind(expected),
    };

    match op {
        ComparisonOp::Eq => Ok(json_eq(actual, expected)),
        ComparisonOp::Ne => Ok(!json_eq(actual, expected)),
        ComparisonOp::Gt => order(actual, expected).map(Ordering::is_gt).ok_or_else(mismatch),
        ComparisonOp::Gte => order(actual, expected).map(Ordering::is_ge).ok_or_else(mismatch),
        ComparisonOp::Lt => order(actual, expected).map(Ordering::is_lt).ok_or_else(mismatch),
        ComparisonOp::Lte => order(actual, expected).map(Ordering::is_le).ok_or_else(mismatch),
        ComparisonOp::In => contains(expected, actual).ok_or_else(mismatch),
        ComparisonOp::NotIn => contains(expected, actual).map(|found| !found).ok_or_else(mismatch),
        // Presence checks never reach a value comparison.
        ComparisonOp::Exists => Ok(true),
        ComparisonOp::NotExists => Ok(false),
    }
}

/// JSON equality where numbers compare by value, so `1 == 1.0`.
pub fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => number_order(a, b) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| json_eq(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| json_eq(x, y)))
        }
        _ => a == b,
    }
}

/// Total order within one JSON kind; `None` across kinds.
fn order(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(_), Value::Number(_)) => number_order(a, b),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Array(xs), Value::Array(ys)) => {
            for (x, y) in xs.iter().zip(ys) {
                if json_eq(x, y) {
                    continue;
                }
                return order(x, y);
            }
            Some(xs.len().cmp(&ys.len()))
        }
        _ => None,
    }
}

fn number_order(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Membership of `needle` in `haystack`.
fn contains(haystack: &Value, needle: &Value) -> Option<bool> {
    match (haystack, needle) {
        (Value::Array(items), _) => Some(items.iter().any(|item| json_eq(item, needle))),
        (Value::String(text), Value::String(part)) => Some(text.contains(part.as_str())),
        (Value::Object(map), Value::String(key)) => Some(map.contains_key(key)),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
