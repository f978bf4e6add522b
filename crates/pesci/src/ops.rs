//! Operator semantics: the numeric tower, comparisons, membership,
//! subscripting, and iteration.
//!
//! Every supported operand combination is spelled out here rather than
//! leaning on host operator overloading, so the promotion rules (int↔float,
//! bool-as-int) are explicit and auditable.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::{
    errors::{RunError, RunResult},
    expressions::{CmpOperator, Operator, UnaryOperator},
    value::Value,
};

/// Applies a binary arithmetic or bitwise operator.
pub(crate) fn binary_op(op: Operator, left: Value, right: Value) -> RunResult<Value> {
    match op {
        Operator::Add => add(left, right),
        Operator::Sub => {
            numeric_binary(Operator::Sub, left, right, |a, b| a - b, |a, b| Ok(a - b))
        }
        Operator::Mult => mult(left, right),
        Operator::Div => div(left, right),
        Operator::Mod => modulo(left, right),
        Operator::Pow => pow(left, right),
        Operator::FloorDiv => floor_div(left, right),
        Operator::LShift | Operator::RShift => shift(op, left, right),
        Operator::BitOr | Operator::BitXor | Operator::BitAnd => bitwise(op, left, right),
    }
}

/// Applies a unary operator.
pub(crate) fn unary_op(op: UnaryOperator, operand: Value) -> RunResult<Value> {
    match op {
        UnaryOperator::Not => Ok(Value::Bool(!operand.is_truthy())),
        UnaryOperator::Invert => match as_int(&operand) {
            Some(i) => Ok(Value::Int(-(i + 1_i32))),
            None => Err(unsupported_unary("~", &operand)),
        },
    }
}

/// Applies one comparison operator to a pair of operands.
pub(crate) fn compare_op(op: CmpOperator, left: &Value, right: &Value) -> RunResult<bool> {
    match op {
        CmpOperator::Eq => Ok(left.py_eq(right)),
        CmpOperator::NotEq => Ok(!left.py_eq(right)),
        CmpOperator::Is => Ok(left.py_is(right)),
        CmpOperator::IsNot => Ok(!left.py_is(right)),
        CmpOperator::In => membership(left, right),
        CmpOperator::NotIn => Ok(!membership(left, right)?),
        CmpOperator::Lt => Ok(ordering(left, right)? == Some(Ordering::Less)),
        CmpOperator::LtE => Ok(matches!(
            ordering(left, right)?,
            Some(Ordering::Less | Ordering::Equal)
        )),
        CmpOperator::Gt => Ok(ordering(left, right)? == Some(Ordering::Greater)),
        CmpOperator::GtE => Ok(matches!(
            ordering(left, right)?,
            Some(Ordering::Greater | Ordering::Equal)
        )),
    }
}

/// Orders two values, returning `None` for unordered pairs (NaN).
///
/// Numbers order across int/float/bool; strings lexicographically; lists and
/// tuples elementwise. Anything else is an unsupported combination.
pub(crate) fn ordering(left: &Value, right: &Value) -> RunResult<Option<Ordering>> {
    if let (Some(int_left), Some(int_right)) = (as_int(left), as_int(right)) {
        return Ok(Some(int_left.cmp(&int_right)));
    }
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        let (Some(a), Some(b)) = (a.to_f64(), b.to_f64()) else {
            return Ok(None);
        };
        return Ok(a.partial_cmp(&b));
    }
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
            for (x, y) in a.iter().zip(b) {
                match ordering(x, y)? {
                    Some(Ordering::Equal) => {}
                    other => return Ok(other),
                }
            }
            Ok(Some(a.len().cmp(&b.len())))
        }
        _ => Err(RunError::runtime(format!(
            "unsupported comparison between '{}' and '{}'",
            left.type_name(),
            right.type_name()
        ))),
    }
}

/// Membership test: `item in container`.
fn membership(item: &Value, container: &Value) -> RunResult<bool> {
    match container {
        Value::List(items) | Value::Tuple(items) => Ok(items.iter().any(|v| v.py_eq(item))),
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(RunError::runtime(format!(
                "'in <str>' requires string as left operand, not '{}'",
                other.type_name()
            ))),
        },
        Value::Dict(d) => d.contains(item),
        other => Err(RunError::runtime(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

/// Materializes an iterable as its element sequence.
///
/// Lists and tuples yield their items, strings their characters, dicts
/// their keys (in insertion order). Everything else is not iterable.
pub(crate) fn iter_elements(value: &Value) -> RunResult<Vec<Value>> {
    match value {
        Value::List(items) | Value::Tuple(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Dict(d) => Ok(d.keys()),
        other => Err(RunError::runtime(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

/// Looks up `base[index]` for a single (non-slice) index.
pub(crate) fn subscript_index(base: &Value, index: &Value) -> RunResult<Value> {
    match base {
        Value::List(items) | Value::Tuple(items) => {
            let i = sequence_index(index, items.len(), base.type_name())?;
            Ok(items[i].clone())
        }
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let i = sequence_index(index, chars.len(), "str")?;
            Ok(Value::Str(chars[i].to_string()))
        }
        Value::Dict(d) => match d.get(index)? {
            Some(value) => Ok(value.clone()),
            None => Err(RunError::runtime(format!("key error: {}", index.py_repr()))),
        },
        other => Err(RunError::runtime(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Computes `base[lower:upper:step]`.
///
/// Absent bounds default to the whole sequence in the direction of travel;
/// an absent step defaults to 1.
pub(crate) fn subscript_slice(
    base: &Value,
    lower: Option<&Value>,
    upper: Option<&Value>,
    step: Option<&Value>,
) -> RunResult<Value> {
    let step = match step {
        Some(v) => index_int(v, "slice step")?,
        None => 1,
    };
    if step == 0 {
        return Err(RunError::runtime("slice step cannot be zero"));
    }
    let lower = lower.map(|v| index_int(v, "slice bound")).transpose()?;
    let upper = upper.map(|v| index_int(v, "slice bound")).transpose()?;

    match base {
        Value::List(items) => Ok(Value::List(slice_items(items, lower, upper, step))),
        Value::Tuple(items) => Ok(Value::Tuple(slice_items(items, lower, upper, step))),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            let sliced: Vec<char> = slice_items(&chars, lower, upper, step);
            Ok(Value::Str(sliced.into_iter().collect()))
        }
        other => Err(RunError::runtime(format!(
            "'{}' object cannot be sliced",
            other.type_name()
        ))),
    }
}

/// Reads an int-valued slice bound or step out of a value (bools coerce).
///
/// Integers beyond the i64 range saturate rather than fail: slicing clamps
/// bounds into range anyway, so a huge bound just means "the whole way".
fn index_int(value: &Value, what: &str) -> RunResult<i64> {
    let Some(i) = as_int(value) else {
        return Err(RunError::runtime(format!(
            "{what} must be an integer, not '{}'",
            value.type_name()
        )));
    };
    Ok(i.to_i64()
        .unwrap_or(if i.is_negative() { i64::MIN } else { i64::MAX }))
}

/// Resolves a single index against a sequence length, wrapping negatives.
///
/// The check happens on the full-precision value, so an index beyond the
/// i64 range is an ordinary out-of-range error, not a type fault.
fn sequence_index(index: &Value, len: usize, type_name: &str) -> RunResult<usize> {
    let Some(i) = as_int(index) else {
        return Err(RunError::runtime(format!(
            "sequence index must be an integer, not '{}'",
            index.type_name()
        )));
    };
    let len = BigInt::from(len);
    let wrapped = if i.is_negative() { &i + &len } else { i.clone() };
    if !wrapped.is_negative() && wrapped < len {
        Ok(wrapped.to_usize().expect("index is within sequence bounds"))
    } else {
        Err(RunError::runtime(format!("{type_name} index out of range: {i}")))
    }
}

/// Collects the elements selected by a normalized slice.
fn slice_items<T: Clone>(items: &[T], lower: Option<i64>, upper: Option<i64>, step: i64) -> Vec<T> {
    let len = items.len() as i64;
    let clamp = |i: i64, max: i64| -> i64 {
        let wrapped = if i < 0 { i + len } else { i };
        wrapped.clamp(if step < 0 { -1 } else { 0 }, max)
    };

    let (start, stop) = if step > 0 {
        (
            clamp(lower.unwrap_or(0), len),
            clamp(upper.unwrap_or(len), len),
        )
    } else {
        (
            lower.map_or(len - 1, |i| clamp(i, len - 1)),
            upper.map_or(-1, |i| clamp(i, len - 1)),
        )
    };

    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        if (0..len).contains(&i) {
            out.push(items[i as usize].clone());
        }
        let Some(next) = i.checked_add(step) else { break };
        i = next;
    }
    out
}

/// Views bool/int operands as integers; floats and everything else give `None`.
fn as_int(value: &Value) -> Option<BigInt> {
    match value {
        Value::Bool(b) => Some(BigInt::from(i64::from(*b))),
        Value::Int(i) => Some(i.clone()),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    value.as_number().and_then(|n| n.to_f64())
}

fn add(left: Value, right: Value) -> RunResult<Value> {
    match (&left, &right) {
        (Value::Str(a), Value::Str(b)) => {
            let mut out = a.clone();
            out.push_str(b);
            Ok(Value::Str(out))
        }
        (Value::List(a), Value::List(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Ok(Value::List(out))
        }
        (Value::Tuple(a), Value::Tuple(b)) => {
            let mut out = a.clone();
            out.extend(b.iter().cloned());
            Ok(Value::Tuple(out))
        }
        _ => numeric_binary(Operator::Add, left, right, |a, b| a + b, |a, b| Ok(a + b)),
    }
}

fn mult(left: Value, right: Value) -> RunResult<Value> {
    let repeat = |items: &Value, count: &Value| -> Option<RunResult<Value>> {
        let count = as_int(count)?;
        let count = match count.to_i64() {
            Some(c) => c.max(0) as usize,
            // A huge negative count is just an empty result; a huge
            // positive one could never be materialized.
            None if count.is_negative() => 0,
            None => return Some(Err(RunError::runtime("repetition count too large"))),
        };
        Some(match items {
            Value::Str(s) => Ok(Value::Str(s.repeat(count))),
            Value::List(v) => Ok(Value::List(repeat_items(v, count))),
            Value::Tuple(v) => Ok(Value::Tuple(repeat_items(v, count))),
            _ => return None,
        })
    };
    if matches!(left, Value::Str(_) | Value::List(_) | Value::Tuple(_)) {
        if let Some(result) = repeat(&left, &right) {
            return result;
        }
    }
    if matches!(right, Value::Str(_) | Value::List(_) | Value::Tuple(_)) {
        if let Some(result) = repeat(&right, &left) {
            return result;
        }
    }
    numeric_binary(Operator::Mult, left, right, |a, b| a * b, |a, b| Ok(a * b))
}

fn repeat_items(items: &[Value], count: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(items.len() * count);
    for _ in 0..count {
        out.extend(items.iter().cloned());
    }
    out
}

/// True division: always yields a float, even for two ints.
fn div(left: Value, right: Value) -> RunResult<Value> {
    let (Some(a), Some(b)) = (as_f64(&left), as_f64(&right)) else {
        return Err(unsupported_binary(Operator::Div, &left, &right));
    };
    if b == 0.0 {
        return Err(RunError::runtime("division by zero"));
    }
    Ok(Value::Float(a / b))
}

fn floor_div(left: Value, right: Value) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (as_int(&left), as_int(&right)) {
        if b.is_zero() {
            return Err(RunError::runtime("division by zero"));
        }
        return Ok(Value::Int(a.div_floor(&b)));
    }
    let (Some(a), Some(b)) = (as_f64(&left), as_f64(&right)) else {
        return Err(unsupported_binary(Operator::FloorDiv, &left, &right));
    };
    if b == 0.0 {
        return Err(RunError::runtime("division by zero"));
    }
    Ok(Value::Float((a / b).floor()))
}

/// Remainder with the sign of the divisor.
fn modulo(left: Value, right: Value) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (as_int(&left), as_int(&right)) {
        if b.is_zero() {
            return Err(RunError::runtime("division by zero"));
        }
        return Ok(Value::Int(a.mod_floor(&b)));
    }
    let (Some(a), Some(b)) = (as_f64(&left), as_f64(&right)) else {
        return Err(unsupported_binary(Operator::Mod, &left, &right));
    };
    if b == 0.0 {
        return Err(RunError::runtime("division by zero"));
    }
    Ok(Value::Float(a - b * (a / b).floor()))
}

fn pow(left: Value, right: Value) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (as_int(&left), as_int(&right)) {
        if b.is_negative() {
            let (Some(a), Some(b)) = (a.to_f64(), b.to_f64()) else {
                return Err(unsupported_binary(Operator::Pow, &left, &right));
            };
            return Ok(Value::Float(a.powf(b)));
        }
        let Some(exp) = b.to_u32() else {
            return Err(RunError::runtime("exponent too large"));
        };
        return Ok(Value::Int(a.pow(exp)));
    }
    let (Some(a), Some(b)) = (as_f64(&left), as_f64(&right)) else {
        return Err(unsupported_binary(Operator::Pow, &left, &right));
    };
    Ok(Value::Float(a.powf(b)))
}

fn shift(op: Operator, left: Value, right: Value) -> RunResult<Value> {
    let (Some(a), Some(b)) = (as_int(&left), as_int(&right)) else {
        return Err(unsupported_binary(op, &left, &right));
    };
    if b.is_negative() {
        return Err(RunError::runtime("negative shift count"));
    }
    let Some(amount) = b.to_u64().and_then(|v| usize::try_from(v).ok()) else {
        return Err(RunError::runtime("shift count too large"));
    };
    if matches!(op, Operator::LShift) && amount > 1 << 20 {
        return Err(RunError::runtime("shift count too large"));
    }
    Ok(Value::Int(match op {
        Operator::LShift => a << amount,
        _ => a >> amount,
    }))
}

fn bitwise(op: Operator, left: Value, right: Value) -> RunResult<Value> {
    let (Some(a), Some(b)) = (as_int(&left), as_int(&right)) else {
        return Err(unsupported_binary(op, &left, &right));
    };
    Ok(Value::Int(match op {
        Operator::BitOr => a | b,
        Operator::BitXor => a ^ b,
        _ => a & b,
    }))
}

/// Shared int/float promotion path for the plain arithmetic operators.
fn numeric_binary(
    op: Operator,
    left: Value,
    right: Value,
    int_op: impl Fn(BigInt, BigInt) -> BigInt,
    float_op: impl Fn(f64, f64) -> RunResult<f64>,
) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (as_int(&left), as_int(&right)) {
        return Ok(Value::Int(int_op(a, b)));
    }
    let (Some(a), Some(b)) = (as_f64(&left), as_f64(&right)) else {
        return Err(unsupported_binary(op, &left, &right));
    };
    Ok(Value::Float(float_op(a, b)?))
}

fn unsupported_binary(op: Operator, left: &Value, right: &Value) -> RunError {
    RunError::runtime(format!(
        "unsupported operand types for {op}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

fn unsupported_unary(op: &str, operand: &Value) -> RunError {
    RunError::runtime(format!(
        "bad operand type for unary {op}: '{}'",
        operand.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> Value {
        Value::int(v)
    }

    #[test]
    fn int_division_is_true_division() {
        let result = binary_op(Operator::Div, int(7), int(2)).unwrap();
        assert!(result.py_eq(&Value::Float(3.5)));
    }

    #[test]
    fn floor_division_of_ints_stays_int() {
        let result = binary_op(Operator::FloorDiv, int(-7), int(2)).unwrap();
        assert!(result.py_eq(&int(-4)));
    }

    #[test]
    fn modulo_follows_divisor_sign() {
        assert!(binary_op(Operator::Mod, int(-7), int(3)).unwrap().py_eq(&int(2)));
        assert!(binary_op(Operator::Mod, int(7), int(-3)).unwrap().py_eq(&int(-2)));
    }

    #[test]
    fn mixing_int_and_float_promotes() {
        let result = binary_op(Operator::Add, int(1), Value::Float(0.5)).unwrap();
        assert!(result.py_eq(&Value::Float(1.5)));
    }

    #[test]
    fn bool_coerces_to_int_in_arithmetic() {
        let result = binary_op(Operator::Add, Value::Bool(true), int(2)).unwrap();
        assert!(result.py_eq(&int(3)));
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        assert!(binary_op(Operator::Div, int(1), int(0)).is_err());
        assert!(binary_op(Operator::Mod, int(1), int(0)).is_err());
    }

    #[test]
    fn string_repetition_and_concat() {
        let result = binary_op(Operator::Mult, Value::Str("ab".into()), int(3)).unwrap();
        assert!(result.py_eq(&Value::Str("ababab".into())));
        let result = binary_op(Operator::Add, Value::Str("a".into()), Value::Str("b".into())).unwrap();
        assert!(result.py_eq(&Value::Str("ab".into())));
    }

    #[test]
    fn invert_negates_and_decrements() {
        let result = unary_op(UnaryOperator::Invert, int(5)).unwrap();
        assert!(result.py_eq(&int(-6)));
    }

    #[test]
    fn slices_follow_direction_of_travel() {
        let items = Value::List((0..5).map(int).collect());
        let forward = subscript_slice(&items, Some(&int(1)), Some(&int(4)), None).unwrap();
        assert!(forward.py_eq(&Value::List(vec![int(1), int(2), int(3)])));
        let reversed = subscript_slice(&items, None, None, Some(&int(-1))).unwrap();
        assert!(reversed.py_eq(&Value::List(vec![int(4), int(3), int(2), int(1), int(0)])));
    }

    #[test]
    fn negative_indices_wrap() {
        let items = Value::List(vec![int(10), int(20), int(30)]);
        let result = subscript_index(&items, &int(-1)).unwrap();
        assert!(result.py_eq(&int(30)));
    }

    #[test]
    fn oversized_index_is_out_of_range_not_a_type_error() {
        let items = Value::List(vec![int(10)]);
        let huge = Value::Int(BigInt::from(10).pow(30));
        let err = subscript_index(&items, &huge).unwrap_err();
        assert!(
            matches!(&err, RunError::Runtime(msg) if msg.contains("out of range")),
            "got: {err:?}"
        );
        let neg_huge = Value::Int(-BigInt::from(10).pow(30));
        let err = subscript_index(&items, &neg_huge).unwrap_err();
        assert!(
            matches!(&err, RunError::Runtime(msg) if msg.contains("out of range")),
            "got: {err:?}"
        );
    }

    #[test]
    fn oversized_slice_bounds_clamp_into_range() {
        let items = Value::List((0..3).map(int).collect());
        let huge = Value::Int(BigInt::from(10).pow(30));
        let result = subscript_slice(&items, Some(&int(1)), Some(&huge), None).unwrap();
        assert!(result.py_eq(&Value::List(vec![int(1), int(2)])));
        let neg_huge = Value::Int(-BigInt::from(10).pow(30));
        let result = subscript_slice(&items, Some(&neg_huge), None, None).unwrap();
        assert!(result.py_eq(&Value::List(vec![int(0), int(1), int(2)])));
    }

    #[test]
    fn oversized_slice_step_takes_one_element() {
        let items = Value::List((0..5).map(int).collect());
        let huge = Value::Int(BigInt::from(10).pow(30));
        let result = subscript_slice(&items, None, None, Some(&huge)).unwrap();
        assert!(result.py_eq(&Value::List(vec![int(0)])));
    }

    #[test]
    fn chained_ordering_supports_sequences() {
        let a = Value::List(vec![int(1), int(2)]);
        let b = Value::List(vec![int(1), int(3)]);
        assert_eq!(ordering(&a, &b).unwrap(), Some(Ordering::Less));
    }
}
