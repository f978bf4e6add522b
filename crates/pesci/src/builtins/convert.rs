//! Conversion and introspection built-ins.

use num_bigint::{BigInt, Sign};
use num_traits::{FromPrimitive, Signed, ToPrimitive, Zero};

use crate::{
    attrs,
    builtins::{get_one, get_one_two, get_zero_one},
    errors::{RunError, RunResult},
    value::{Value, key_hash},
};

pub(super) fn bool_(args: Vec<Value>) -> RunResult<Value> {
    let value = get_zero_one("bool", args)?;
    Ok(Value::Bool(value.is_some_and(|v| v.is_truthy())))
}

pub(super) fn int(args: Vec<Value>) -> RunResult<Value> {
    if args.is_empty() {
        return Ok(Value::int(0));
    }
    let (value, base) = get_one_two("int", args)?;
    match (value, base) {
        (Value::Int(i), None) => Ok(Value::Int(i)),
        (Value::Bool(b), None) => Ok(Value::int(i64::from(b))),
        (Value::Float(f), None) => BigInt::from_f64(f.trunc())
            .map(Value::Int)
            .ok_or_else(|| RunError::runtime("cannot convert float to integer")),
        (value, Some(_)) if !matches!(value, Value::Str(_)) => Err(RunError::runtime(
            "int() can't convert non-string with explicit base",
        )),
        (Value::Str(s), base) => {
            let radix = match base {
                None => 10,
                Some(Value::Int(b)) => b
                    .to_u32()
                    .filter(|b| (2..=36).contains(b))
                    .ok_or_else(|| RunError::runtime("int() base must be >= 2 and <= 36"))?,
                Some(other) => {
                    return Err(RunError::runtime(format!(
                        "int() base must be an integer, not '{}'",
                        other.type_name()
                    )));
                }
            };
            let trimmed = s.trim();
            let (sign, digits) = match trimmed.strip_prefix('-') {
                Some(rest) => (Sign::Minus, rest),
                None => (Sign::Plus, trimmed.strip_prefix('+').unwrap_or(trimmed)),
            };
            match BigInt::parse_bytes(digits.as_bytes(), radix) {
                Some(magnitude) => Ok(Value::Int(if sign == Sign::Minus { -magnitude } else { magnitude })),
                None => Err(RunError::runtime(format!(
                    "invalid literal for int() with base {radix}: '{s}'"
                ))),
            }
        }
        (other, _) => Err(RunError::runtime(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

pub(super) fn float(args: Vec<Value>) -> RunResult<Value> {
    let Some(value) = get_zero_one("float", args)? else {
        return Ok(Value::Float(0.0));
    };
    match value {
        Value::Float(f) => Ok(Value::Float(f)),
        Value::Int(i) => Ok(Value::Float(i.to_f64().unwrap_or(f64::INFINITY))),
        Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| RunError::runtime(format!("could not convert string to float: '{s}'"))),
        other => Err(RunError::runtime(format!(
            "float() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

pub(super) fn str_(args: Vec<Value>) -> RunResult<Value> {
    let value = get_zero_one("str", args)?;
    Ok(Value::Str(value.map(|v| v.py_str()).unwrap_or_default()))
}

pub(super) fn bin(args: Vec<Value>) -> RunResult<Value> {
    let i = int_arg("bin", args)?;
    Ok(Value::Str(radix_string(&i, "0b", |m| format!("{m:b}"))))
}

pub(super) fn hex(args: Vec<Value>) -> RunResult<Value> {
    let i = int_arg("hex", args)?;
    Ok(Value::Str(radix_string(&i, "0x", |m| format!("{m:x}"))))
}

/// Octal rendering with a bare `0` prefix (`oct(8)` is `'010'`, `oct(0)` is `'0'`).
pub(super) fn oct(args: Vec<Value>) -> RunResult<Value> {
    let i = int_arg("oct", args)?;
    if i.is_zero() {
        return Ok(Value::Str("0".to_owned()));
    }
    Ok(Value::Str(radix_string(&i, "0", |m| format!("{m:o}"))))
}

fn radix_string(i: &BigInt, prefix: &str, render: impl Fn(&BigInt) -> String) -> String {
    let magnitude = render(&i.abs());
    if i.is_negative() {
        format!("-{prefix}{magnitude}")
    } else {
        format!("{prefix}{magnitude}")
    }
}

fn int_arg(name: &str, args: Vec<Value>) -> RunResult<BigInt> {
    match get_one(name, args)? {
        Value::Int(i) => Ok(i),
        Value::Bool(b) => Ok(BigInt::from(i64::from(b))),
        other => Err(RunError::runtime(format!(
            "{name}() argument must be an integer, not '{}'",
            other.type_name()
        ))),
    }
}

pub(super) fn ord(args: Vec<Value>) -> RunResult<Value> {
    match get_one("ord", args)? {
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::int(i64::from(u32::from(c)))),
                _ => Err(RunError::runtime(format!(
                    "ord() expected a character, but string of length {} found",
                    s.chars().count()
                ))),
            }
        }
        other => Err(RunError::runtime(format!(
            "ord() expected a string, not '{}'",
            other.type_name()
        ))),
    }
}

pub(super) fn format(args: Vec<Value>) -> RunResult<Value> {
    let (value, spec) = get_one_two("format", args)?;
    match spec {
        None => Ok(Value::Str(value.py_str())),
        Some(Value::Str(spec)) if spec.is_empty() => Ok(Value::Str(value.py_str())),
        Some(Value::Str(_)) => Err(RunError::runtime("format specifications are not supported")),
        Some(other) => Err(RunError::runtime(format!(
            "format spec must be a string, not '{}'",
            other.type_name()
        ))),
    }
}

pub(super) fn type_(args: Vec<Value>) -> RunResult<Value> {
    let value = get_one("type", args)?;
    Ok(Value::Str(format!("<type '{}'>", value.type_name())))
}

pub(super) fn hash(args: Vec<Value>) -> RunResult<Value> {
    let value = get_one("hash", args)?;
    Ok(Value::int(key_hash(&value)?))
}

pub(super) fn hasattr(args: Vec<Value>) -> RunResult<Value> {
    let (value, name) = crate::builtins::get_two("hasattr", args)?;
    let Value::Str(name) = name else {
        return Err(RunError::runtime("hasattr() attribute name must be a string"));
    };
    Ok(Value::Bool(attrs::lookup(&value, &name).is_ok()))
}
