//! Read-only attribute access and the curated native method set.
//!
//! Attribute access on a guest value never reaches host reflection: the
//! attribute name is matched against a closed set of methods valid for the
//! receiver's type, and the result is a bound method value. Underscore
//! attributes are rejected before lookup.

use std::str::FromStr;

use crate::{
    errors::{RunError, RunResult},
    value::{Dict, Value},
};

/// The closed set of native methods reachable through attribute access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
pub(crate) enum MethodKind {
    #[strum(serialize = "keys")]
    Keys,
    #[strum(serialize = "values")]
    Values,
    #[strum(serialize = "items")]
    Items,
    #[strum(serialize = "get")]
    Get,
    #[strum(serialize = "has_key")]
    HasKey,
    #[strum(serialize = "index")]
    Index,
    #[strum(serialize = "count")]
    Count,
    #[strum(serialize = "upper")]
    Upper,
    #[strum(serialize = "lower")]
    Lower,
    #[strum(serialize = "strip")]
    Strip,
    #[strum(serialize = "lstrip")]
    Lstrip,
    #[strum(serialize = "rstrip")]
    Rstrip,
    #[strum(serialize = "split")]
    Split,
    #[strum(serialize = "join")]
    Join,
    #[strum(serialize = "replace")]
    Replace,
    #[strum(serialize = "startswith")]
    StartsWith,
    #[strum(serialize = "endswith")]
    EndsWith,
    #[strum(serialize = "find")]
    Find,
}

impl MethodKind {
    /// Whether this method exists on the given receiver type.
    fn valid_for(self, recv: &Value) -> bool {
        match recv {
            Value::Dict(_) => matches!(
                self,
                Self::Keys | Self::Values | Self::Items | Self::Get | Self::HasKey
            ),
            Value::List(_) | Value::Tuple(_) => matches!(self, Self::Index | Self::Count),
            Value::Str(_) => matches!(
                self,
                Self::Upper
                    | Self::Lower
                    | Self::Strip
                    | Self::Lstrip
                    | Self::Rstrip
                    | Self::Split
                    | Self::Join
                    | Self::Replace
                    | Self::StartsWith
                    | Self::EndsWith
                    | Self::Find
                    | Self::Index
                    | Self::Count
            ),
            _ => false,
        }
    }
}

/// A receiver paired with a native method, produced by attribute access.
#[derive(Debug, Clone)]
pub struct BoundMethod {
    pub(crate) recv: Value,
    pub(crate) kind: MethodKind,
}

/// Resolves `base.attr` to a bound method value.
///
/// Underscore attributes fail with invalid-attribute; unknown attributes
/// are a runtime error.
pub(crate) fn lookup(base: &Value, attr: &str) -> RunResult<Value> {
    if attr.starts_with('_') {
        return Err(RunError::InvalidAttribute { attr: attr.to_owned() });
    }
    let kind = MethodKind::from_str(attr).ok().filter(|kind| kind.valid_for(base));
    match kind {
        Some(kind) => Ok(Value::Method(Box::new(BoundMethod {
            recv: base.clone(),
            kind,
        }))),
        None => Err(RunError::runtime(format!(
            "'{}' object has no attribute '{attr}'",
            base.type_name()
        ))),
    }
}

/// Invokes a bound method with the given positional arguments.
pub(crate) fn call_method(method: &BoundMethod, args: Vec<Value>) -> RunResult<Value> {
    match &method.recv {
        Value::Dict(dict) => call_dict_method(dict, method.kind, args),
        Value::List(items) | Value::Tuple(items) => call_sequence_method(items, method.kind, args, &method.recv),
        Value::Str(s) => call_str_method(s, method.kind, args),
        other => Err(RunError::runtime(format!(
            "'{}' object has no callable attributes",
            other.type_name()
        ))),
    }
}

fn call_dict_method(dict: &Dict, kind: MethodKind, mut args: Vec<Value>) -> RunResult<Value> {
    match kind {
        MethodKind::Keys => {
            expect_args("dict.keys", &args, 0, 0)?;
            Ok(Value::List(dict.keys()))
        }
        MethodKind::Values => {
            expect_args("dict.values", &args, 0, 0)?;
            Ok(Value::List(dict.values()))
        }
        MethodKind::Items => {
            expect_args("dict.items", &args, 0, 0)?;
            Ok(Value::List(
                dict.iter()
                    .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
                    .collect(),
            ))
        }
        MethodKind::Get => {
            expect_args("dict.get", &args, 1, 2)?;
            let default = if args.len() == 2 { args.pop().unwrap() } else { Value::None };
            let key = args.pop().unwrap();
            Ok(dict.get(&key)?.cloned().unwrap_or(default))
        }
        MethodKind::HasKey => {
            expect_args("dict.has_key", &args, 1, 1)?;
            Ok(Value::Bool(dict.contains(&args[0])?))
        }
        _ => unreachable!("method validated against receiver type"),
    }
}

fn call_sequence_method(items: &[Value], kind: MethodKind, args: Vec<Value>, recv: &Value) -> RunResult<Value> {
    let type_name = recv.type_name();
    match kind {
        MethodKind::Index => {
            expect_args("index", &args, 1, 1)?;
            match items.iter().position(|v| v.py_eq(&args[0])) {
                Some(pos) => Ok(Value::int(pos as i64)),
                None => Err(RunError::runtime(format!(
                    "{} is not in {type_name}",
                    args[0].py_repr()
                ))),
            }
        }
        MethodKind::Count => {
            expect_args("count", &args, 1, 1)?;
            let count = items.iter().filter(|v| v.py_eq(&args[0])).count();
            Ok(Value::int(count as i64))
        }
        _ => unreachable!("method validated against receiver type"),
    }
}

fn call_str_method(s: &str, kind: MethodKind, args: Vec<Value>) -> RunResult<Value> {
    match kind {
        MethodKind::Upper => {
            expect_args("str.upper", &args, 0, 0)?;
            Ok(Value::Str(s.to_uppercase()))
        }
        MethodKind::Lower => {
            expect_args("str.lower", &args, 0, 0)?;
            Ok(Value::Str(s.to_lowercase()))
        }
        MethodKind::Strip | MethodKind::Lstrip | MethodKind::Rstrip => {
            expect_args("str.strip", &args, 0, 1)?;
            let chars: Option<Vec<char>> = match args.first() {
                Some(Value::Str(set)) => Some(set.chars().collect()),
                Some(other) => {
                    return Err(RunError::runtime(format!(
                        "strip arg must be a string, not '{}'",
                        other.type_name()
                    )));
                }
                None => None,
            };
            let matches = |c: char| chars.as_ref().map_or_else(|| c.is_whitespace(), |set| set.contains(&c));
            let stripped = match kind {
                MethodKind::Strip => s.trim_matches(matches),
                MethodKind::Lstrip => s.trim_start_matches(matches),
                _ => s.trim_end_matches(matches),
            };
            Ok(Value::Str(stripped.to_owned()))
        }
        MethodKind::Split => {
            expect_args("str.split", &args, 0, 1)?;
            let parts: Vec<Value> = match args.first() {
                None => s.split_whitespace().map(|p| Value::Str(p.to_owned())).collect(),
                Some(Value::Str(sep)) if !sep.is_empty() => {
                    s.split(sep.as_str()).map(|p| Value::Str(p.to_owned())).collect()
                }
                Some(Value::Str(_)) => return Err(RunError::runtime("empty separator")),
                Some(other) => {
                    return Err(RunError::runtime(format!(
                        "split separator must be a string, not '{}'",
                        other.type_name()
                    )));
                }
            };
            Ok(Value::List(parts))
        }
        MethodKind::Join => {
            expect_args("str.join", &args, 1, 1)?;
            let elements = crate::ops::iter_elements(&args[0])?;
            let mut parts = Vec::with_capacity(elements.len());
            for element in elements {
                match element {
                    Value::Str(part) => parts.push(part),
                    other => {
                        return Err(RunError::runtime(format!(
                            "sequence item for join must be a string, not '{}'",
                            other.type_name()
                        )));
                    }
                }
            }
            Ok(Value::Str(parts.join(s)))
        }
        MethodKind::Replace => {
            expect_args("str.replace", &args, 2, 2)?;
            match (&args[0], &args[1]) {
                (Value::Str(old), Value::Str(new)) => Ok(Value::Str(s.replace(old.as_str(), new))),
                _ => Err(RunError::runtime("replace arguments must be strings")),
            }
        }
        MethodKind::StartsWith | MethodKind::EndsWith => {
            expect_args("str.startswith", &args, 1, 1)?;
            match &args[0] {
                Value::Str(affix) => Ok(Value::Bool(if kind == MethodKind::StartsWith {
                    s.starts_with(affix.as_str())
                } else {
                    s.ends_with(affix.as_str())
                })),
                other => Err(RunError::runtime(format!(
                    "startswith/endswith arg must be a string, not '{}'",
                    other.type_name()
                ))),
            }
        }
        MethodKind::Find | MethodKind::Index => {
            expect_args("str.find", &args, 1, 1)?;
            let Value::Str(needle) = &args[0] else {
                return Err(RunError::runtime("find arg must be a string"));
            };
            let position = s.find(needle.as_str()).map(|byte| s[..byte].chars().count() as i64);
            match (position, kind) {
                (Some(i), _) => Ok(Value::int(i)),
                (None, MethodKind::Find) => Ok(Value::int(-1)),
                (None, _) => Err(RunError::runtime("substring not found")),
            }
        }
        MethodKind::Count => {
            expect_args("str.count", &args, 1, 1)?;
            let Value::Str(needle) = &args[0] else {
                return Err(RunError::runtime("count arg must be a string"));
            };
            if needle.is_empty() {
                return Ok(Value::int(s.chars().count() as i64 + 1));
            }
            Ok(Value::int(s.matches(needle.as_str()).count() as i64))
        }
        _ => unreachable!("method validated against receiver type"),
    }
}

fn expect_args(name: &str, args: &[Value], min: usize, max: usize) -> RunResult<()> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(RunError::bad_call(
            name,
            format!("takes {min} to {max} arguments ({} given)", args.len()),
        ))
    }
}
