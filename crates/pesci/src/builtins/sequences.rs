//! Sequence and mapping built-ins.

use std::cmp::Ordering;

use num_traits::ToPrimitive;

use crate::{
    builtins::{arg_count_error, call_callable_simple, get_one, get_one_two, get_zero_one},
    errors::{RunError, RunResult},
    ops,
    value::{Dict, Value},
};

/// Hard cap on materialized ranges; the sandbox has no resource tracker, so
/// this bounds the damage a `range(10**12)` can do.
const MAX_RANGE_ITEMS: i64 = 10_000_000;

pub(super) fn len(args: Vec<Value>) -> RunResult<Value> {
    let value = get_one("len", args)?;
    let length = match &value {
        Value::Str(s) => s.chars().count(),
        Value::List(items) | Value::Tuple(items) => items.len(),
        Value::Dict(d) => d.len(),
        other => {
            return Err(RunError::runtime(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    Ok(Value::int(length as i64))
}

pub(super) fn list(args: Vec<Value>) -> RunResult<Value> {
    match get_zero_one("list", args)? {
        None => Ok(Value::List(Vec::new())),
        Some(value) => Ok(Value::List(ops::iter_elements(&value)?)),
    }
}

pub(super) fn tuple(args: Vec<Value>) -> RunResult<Value> {
    match get_zero_one("tuple", args)? {
        None => Ok(Value::Tuple(Vec::new())),
        Some(value) => Ok(Value::Tuple(ops::iter_elements(&value)?)),
    }
}

pub(super) fn dict(args: Vec<Value>) -> RunResult<Value> {
    match get_zero_one("dict", args)? {
        None => Ok(Value::Dict(Dict::new())),
        Some(Value::Dict(d)) => Ok(Value::Dict(d)),
        Some(value) => {
            let mut out = Dict::new();
            for pair in ops::iter_elements(&value)? {
                match pair {
                    Value::Tuple(kv) | Value::List(kv) if kv.len() == 2 => {
                        let mut kv = kv.into_iter();
                        out.insert(kv.next().unwrap(), kv.next().unwrap())?;
                    }
                    other => {
                        return Err(RunError::runtime(format!(
                            "cannot convert dictionary entry of type '{}'",
                            other.type_name()
                        )));
                    }
                }
            }
            Ok(Value::Dict(out))
        }
    }
}

pub(super) fn range(args: Vec<Value>) -> RunResult<Value> {
    let int_arg = |value: &Value| -> RunResult<i64> {
        match value {
            Value::Int(i) => i
                .to_i64()
                .ok_or_else(|| RunError::runtime("range() argument out of range")),
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(RunError::runtime(format!(
                "range() integer argument expected, got '{}'",
                other.type_name()
            ))),
        }
    };
    let (start, stop, step) = match args.len() {
        1 => (0, int_arg(&args[0])?, 1),
        2 => (int_arg(&args[0])?, int_arg(&args[1])?, 1),
        3 => (int_arg(&args[0])?, int_arg(&args[1])?, int_arg(&args[2])?),
        got => return Err(arg_count_error("range", "1 to 3", got)),
    };
    if step == 0 {
        return Err(RunError::runtime("range() step argument must not be zero"));
    }
    let span = if step > 0 {
        stop.saturating_sub(start)
    } else {
        start.saturating_sub(stop)
    };
    if span / step.abs() >= MAX_RANGE_ITEMS {
        return Err(RunError::runtime("range() result has too many items"));
    }
    let mut items = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        items.push(Value::int(i));
        let Some(next) = i.checked_add(step) else { break };
        i = next;
    }
    Ok(Value::List(items))
}

pub(super) fn enumerate(args: Vec<Value>) -> RunResult<Value> {
    let (value, start) = get_one_two("enumerate", args)?;
    let start = match start {
        None => 0,
        Some(Value::Int(i)) => i
            .to_i64()
            .ok_or_else(|| RunError::runtime("enumerate() start out of range"))?,
        Some(other) => {
            return Err(RunError::runtime(format!(
                "enumerate() start must be an integer, not '{}'",
                other.type_name()
            )));
        }
    };
    let items = ops::iter_elements(&value)?
        .into_iter()
        .enumerate()
        .map(|(i, v)| Value::Tuple(vec![Value::int(start + i as i64), v]))
        .collect();
    Ok(Value::List(items))
}

pub(super) fn zip(args: Vec<Value>) -> RunResult<Value> {
    let mut sequences = Vec::with_capacity(args.len());
    for arg in &args {
        sequences.push(ops::iter_elements(arg)?);
    }
    let shortest = sequences.iter().map(Vec::len).min().unwrap_or(0);
    let mut items = Vec::with_capacity(shortest);
    for i in 0..shortest {
        items.push(Value::Tuple(sequences.iter().map(|seq| seq[i].clone()).collect()));
    }
    Ok(Value::List(items))
}

pub(super) fn sorted(args: Vec<Value>) -> RunResult<Value> {
    let value = get_one("sorted", args)?;
    let mut items = ops::iter_elements(&value)?;
    let mut error = None;
    items.sort_by(|a, b| match ops::ordering(a, b) {
        Ok(Some(order)) => order,
        Ok(None) => Ordering::Equal,
        Err(e) => {
            error.get_or_insert(e);
            Ordering::Equal
        }
    });
    match error {
        Some(error) => Err(error),
        None => Ok(Value::List(items)),
    }
}

pub(super) fn reversed(args: Vec<Value>) -> RunResult<Value> {
    let value = get_one("reversed", args)?;
    let mut items = ops::iter_elements(&value)?;
    items.reverse();
    Ok(Value::List(items))
}

pub(super) fn sum(args: Vec<Value>) -> RunResult<Value> {
    let (value, start) = get_one_two("sum", args)?;
    let start = match start {
        Some(Value::Str(_)) => {
            return Err(RunError::runtime("sum() can't sum strings"));
        }
        Some(v) => v,
        None => Value::int(0),
    };
    let mut accumulator = start;
    for item in ops::iter_elements(&value)? {
        accumulator = ops::binary_op(crate::expressions::Operator::Add, accumulator, item)?;
    }
    Ok(accumulator)
}

pub(super) fn min(args: Vec<Value>) -> RunResult<Value> {
    extremum("min", args, Ordering::Less)
}

pub(super) fn max(args: Vec<Value>) -> RunResult<Value> {
    extremum("max", args, Ordering::Greater)
}

fn extremum(name: &str, args: Vec<Value>, keep: Ordering) -> RunResult<Value> {
    let items = match args.len() {
        0 => return Err(arg_count_error(name, "at least 1", 0)),
        1 => ops::iter_elements(&args[0])?,
        _ => args,
    };
    let mut items = items.into_iter();
    let Some(mut best) = items.next() else {
        return Err(RunError::runtime(format!("{name}() arg is an empty sequence")));
    };
    for item in items {
        if ops::ordering(&item, &best)? == Some(keep) {
            best = item;
        }
    }
    Ok(best)
}

pub(super) fn all(args: Vec<Value>) -> RunResult<Value> {
    let value = get_one("all", args)?;
    Ok(Value::Bool(
        ops::iter_elements(&value)?.iter().all(Value::is_truthy),
    ))
}

pub(super) fn any(args: Vec<Value>) -> RunResult<Value> {
    let value = get_one("any", args)?;
    Ok(Value::Bool(
        ops::iter_elements(&value)?.iter().any(Value::is_truthy),
    ))
}

/// Builds a `(lower, upper, step)` triple; the sandbox has no first-class
/// slice object, so the triple stands in for one.
pub(super) fn slice(args: Vec<Value>) -> RunResult<Value> {
    match args.len() {
        1 => {
            let mut args = args.into_iter();
            Ok(Value::Tuple(vec![Value::None, args.next().unwrap(), Value::None]))
        }
        2 | 3 => {
            let mut args = args.into_iter();
            let lower = args.next().unwrap();
            let upper = args.next().unwrap();
            let step = args.next().unwrap_or(Value::None);
            Ok(Value::Tuple(vec![lower, upper, step]))
        }
        got => Err(arg_count_error("slice", "1 to 3", got)),
    }
}

pub(super) fn map(args: Vec<Value>) -> RunResult<Value> {
    if args.len() < 2 {
        return Err(arg_count_error("map", "at least 2", args.len()));
    }
    let mut args = args.into_iter();
    let callee = args.next().unwrap();
    let mut sequences = Vec::new();
    for arg in args {
        sequences.push(ops::iter_elements(&arg)?);
    }
    let longest = sequences.iter().map(Vec::len).max().unwrap_or(0);
    let mut items = Vec::with_capacity(longest);
    for i in 0..longest {
        let row: Vec<Value> = sequences
            .iter()
            .map(|seq| seq.get(i).cloned().unwrap_or(Value::None))
            .collect();
        if matches!(callee, Value::None) {
            // map(None, ...) pairs the sequences up.
            if sequences.len() == 1 {
                items.push(row.into_iter().next().unwrap());
            } else {
                items.push(Value::Tuple(row));
            }
        } else {
            items.push(call_callable_simple(&callee, row)?);
        }
    }
    Ok(Value::List(items))
}

pub(super) fn filter(args: Vec<Value>) -> RunResult<Value> {
    let (callee, value) = crate::builtins::get_two("filter", args)?;
    let mut items = Vec::new();
    for item in ops::iter_elements(&value)? {
        let keep = if matches!(callee, Value::None) {
            item.is_truthy()
        } else {
            call_callable_simple(&callee, vec![item.clone()])?.is_truthy()
        };
        if keep {
            items.push(item);
        }
    }
    Ok(Value::List(items))
}

pub(super) fn reduce(args: Vec<Value>) -> RunResult<Value> {
    if !(2..=3).contains(&args.len()) {
        return Err(arg_count_error("reduce", "2 or 3", args.len()));
    }
    let mut args = args.into_iter();
    let callee = args.next().unwrap();
    let value = args.next().unwrap();
    let initial = args.next();

    let mut items = ops::iter_elements(&value)?.into_iter();
    let mut accumulator = match initial {
        Some(init) => init,
        None => items
            .next()
            .ok_or_else(|| RunError::runtime("reduce() of empty sequence with no initial value"))?,
    };
    for item in items {
        accumulator = call_callable_simple(&callee, vec![accumulator, item])?;
    }
    Ok(accumulator)
}
