//! Numeric built-ins.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::{
    builtins::{arg_count_error, get_one, get_one_two, get_two},
    errors::{RunError, RunResult},
    expressions::Operator,
    ops,
    value::Value,
};

pub(super) fn abs(args: Vec<Value>) -> RunResult<Value> {
    match get_one("abs", args)? {
        Value::Int(i) => Ok(Value::Int(i.abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        Value::Bool(b) => Ok(Value::int(i64::from(b))),
        other => Err(RunError::runtime(format!(
            "bad operand type for abs(): '{}'",
            other.type_name()
        ))),
    }
}

/// Three-way comparison: `-1`, `0`, or `1`.
pub(super) fn cmp(args: Vec<Value>) -> RunResult<Value> {
    let (a, b) = get_two("cmp", args)?;
    let result = match ops::ordering(&a, &b)? {
        Some(Ordering::Less) => -1,
        Some(Ordering::Equal) | None => 0,
        Some(Ordering::Greater) => 1,
    };
    Ok(Value::int(result))
}

pub(super) fn pow(args: Vec<Value>) -> RunResult<Value> {
    match args.len() {
        2 => {
            let mut args = args.into_iter();
            let (base, exp) = (args.next().unwrap(), args.next().unwrap());
            ops::binary_op(Operator::Pow, base, exp)
        }
        3 => {
            let mut args = args.into_iter();
            let (base, exp, modulus) = (
                args.next().unwrap(),
                args.next().unwrap(),
                args.next().unwrap(),
            );
            let (Some(base), Some(exp), Some(modulus)) =
                (to_bigint(&base), to_bigint(&exp), to_bigint(&modulus))
            else {
                return Err(RunError::runtime(
                    "pow() with a modulus requires integer arguments",
                ));
            };
            if exp.is_negative() {
                return Err(RunError::runtime(
                    "pow() with a modulus requires a non-negative exponent",
                ));
            }
            if modulus.is_zero() {
                return Err(RunError::runtime("pow() modulus cannot be zero"));
            }
            Ok(Value::Int(base.modpow(&exp, &modulus)))
        }
        got => Err(arg_count_error("pow", "2 or 3", got)),
    }
}

/// Rounds half away from zero and always yields a float.
pub(super) fn round(args: Vec<Value>) -> RunResult<Value> {
    let (value, digits) = get_one_two("round", args)?;
    let Some(value) = value.as_number().and_then(|n| n.to_f64()) else {
        return Err(RunError::runtime(format!(
            "a number is required for round(), not '{}'",
            value.type_name()
        )));
    };
    let digits = match digits {
        None => 0,
        Some(d) => match to_bigint(&d).and_then(|d| d.to_i32()) {
            Some(d) => d,
            None => {
                return Err(RunError::runtime(format!(
                    "round() digit count must be an integer, not '{}'",
                    d.type_name()
                )));
            }
        },
    };
    let factor = 10f64.powi(digits);
    Ok(Value::Float((value * factor).round() / factor))
}

fn to_bigint(value: &Value) -> Option<BigInt> {
    match value {
        Value::Int(i) => Some(i.clone()),
        Value::Bool(b) => Some(BigInt::from(i64::from(*b))),
        _ => None,
    }
}
