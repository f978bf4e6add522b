use std::{fmt::Write as _, hash::Hash, rc::Rc};

use indexmap::IndexMap;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};

use crate::{
    attrs::BoundMethod,
    builtins::{BuiltinFunction, ExternalFn},
    errors::{RunError, RunResult},
    expressions::Operator,
    function::Func,
    py_hash::{hash_float, hash_int, hash_str},
};

/// Insertion-ordered map using the crate's host-side hasher.
///
/// Used for every host-side name→value map (scopes, the built-ins table,
/// call keyword arguments). Guest dict keys hash through `py_hash` instead;
/// only the bucket hasher differs here.
pub type AIndexMap<K, V> = IndexMap<K, V, ahash::RandomState>;

/// Primary value type manipulated by the evaluator.
///
/// Small values are stored inline; sequences and mappings own their elements
/// (the accepted language subset has no aliasing-observable mutation, so
/// containers are plain value types). Function values share their AST body
/// through an `Rc` handle so they survive the program object that defined
/// them, which is what keeps functions alive across REPL inputs.
#[derive(Debug, Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(BigInt),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Dict(Dict),
    /// A user-defined function closure.
    Func(Rc<Func>),
    /// A host-provided callable, optionally annotated.
    HostFn(HostFn),
    /// A receiver paired with a curated native method, produced by
    /// attribute access (e.g. `d.keys`).
    Method(Box<BoundMethod>),
    /// Transient operator wrapper travelling on the evaluation stack while
    /// a binary operation evaluates its operands.
    OpToken(Operator),
}

impl Value {
    /// Builds an integer value from a machine integer.
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::Int(BigInt::from(value))
    }

    /// The language-level truthiness of this value.
    ///
    /// Empty string/list/tuple/dict, `0`, `0.0`, `False`, and `None` are
    /// falsy; everything else is truthy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::None => false,
            Self::Bool(b) => *b,
            Self::Int(i) => !i.is_zero(),
            Self::Float(f) => *f != 0.0,
            Self::Str(s) => !s.is_empty(),
            Self::List(items) | Self::Tuple(items) => !items.is_empty(),
            Self::Dict(d) => !d.is_empty(),
            Self::Func(_) | Self::HostFn(_) | Self::Method(_) | Self::OpToken(_) => true,
        }
    }

    /// The guest-visible type name of this value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "str",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Func(_) => "function",
            Self::HostFn(_) | Self::Method(_) => "builtin_function_or_method",
            Self::OpToken(_) => "operator",
        }
    }

    /// Language-rule equality.
    ///
    /// Numeric values compare across int/float/bool; containers compare
    /// elementwise but only against the same container kind; functions
    /// compare by identity.
    #[must_use]
    pub fn py_eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return a.eq_number(&b);
        }
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) | (Self::Tuple(a), Self::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
            }
            (Self::Dict(a), Self::Dict(b)) => a.py_eq(b),
            (Self::Func(a), Self::Func(b)) => Rc::ptr_eq(a, b),
            (Self::HostFn(a), Self::HostFn(b)) => a.kind == b.kind,
            (Self::Method(a), Self::Method(b)) => a.kind == b.kind && a.recv.py_eq(&b.recv),
            (Self::OpToken(a), Self::OpToken(b)) => a == b,
            _ => false,
        }
    }

    /// Identity (`is` / `is not`).
    ///
    /// Primitive values are identical when equal (mirroring small-value
    /// caching in the modeled language); functions are identical only when
    /// they are the same closure; containers are never identical unless
    /// they are the same empty-class primitive.
    #[must_use]
    pub fn py_is(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Func(a), Self::Func(b)) => Rc::ptr_eq(a, b),
            (Self::HostFn(a), Self::HostFn(b)) => a.kind == b.kind,
            _ => false,
        }
    }

    /// Views a numeric value (bool/int/float) uniformly, or `None` for
    /// non-numeric values.
    pub(crate) fn as_number(&self) -> Option<Number<'_>> {
        match self {
            Self::Bool(b) => Some(Number::Small(i64::from(*b))),
            Self::Int(i) => Some(Number::Big(i)),
            Self::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Formats the value the way `print` and `str()` render it.
    #[must_use]
    pub fn py_str(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            other => other.py_repr(),
        }
    }

    /// Formats the value the way containers render their elements.
    #[must_use]
    pub fn py_repr(&self) -> String {
        let mut out = String::new();
        self.repr_fmt(&mut out);
        out
    }

    fn repr_fmt(&self, out: &mut String) {
        match self {
            Self::None => out.push_str("None"),
            Self::Bool(true) => out.push_str("True"),
            Self::Bool(false) => out.push_str("False"),
            Self::Int(i) => {
                let _ = write!(out, "{i}");
            }
            Self::Float(f) => out.push_str(&format_float(*f)),
            Self::Str(s) => string_repr_fmt(s, out),
            Self::List(items) => {
                out.push('[');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_fmt(out);
                }
                out.push(']');
            }
            Self::Tuple(items) => {
                out.push('(');
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    item.repr_fmt(out);
                }
                if items.len() == 1 {
                    out.push(',');
                }
                out.push(')');
            }
            Self::Dict(d) => {
                out.push('{');
                for (i, (key, value)) in d.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    key.repr_fmt(out);
                    out.push_str(": ");
                    value.repr_fmt(out);
                }
                out.push('}');
            }
            Self::Func(func) => {
                let _ = write!(out, "<function {}>", func.name);
            }
            Self::HostFn(host_fn) => {
                let _ = write!(out, "<built-in function {}>", host_fn.name());
            }
            Self::Method(method) => {
                let _ = write!(out, "<built-in method {}>", method.kind);
            }
            Self::OpToken(op) => {
                let _ = write!(out, "<operator '{op}'>");
            }
        }
    }
}

/// Uniform view over the numeric types for mixed-mode comparisons.
pub(crate) enum Number<'a> {
    Small(i64),
    Big(&'a BigInt),
    Float(f64),
}

impl Number<'_> {
    pub(crate) fn eq_number(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Small(a), Self::Small(b)) => a == b,
            (Self::Small(a), Self::Big(b)) => &BigInt::from(*a) == *b,
            (Self::Big(a), Self::Small(b)) => **a == BigInt::from(*b),
            (Self::Big(a), Self::Big(b)) => a == b,
            (Self::Small(a), Self::Float(b)) | (Self::Float(b), Self::Small(a)) => (*a as f64) == *b,
            (Self::Big(a), Self::Float(b)) | (Self::Float(b), Self::Big(a)) => {
                a.to_f64().is_some_and(|a| a == *b)
            }
            (Self::Float(a), Self::Float(b)) => a == b,
        }
    }

    pub(crate) fn to_f64(&self) -> Option<f64> {
        match self {
            Self::Small(v) => Some(*v as f64),
            Self::Big(v) => v.to_f64(),
            Self::Float(v) => Some(*v),
        }
    }
}

/// A host-provided callable exposed through the built-ins table.
#[derive(Debug, Clone)]
pub struct HostFn {
    pub(crate) kind: HostFnKind,
    /// Annotated host functions receive the interpreter handle and the
    /// current environment at call time.
    pub(crate) annotated: bool,
}

impl HostFn {
    /// Wraps an interpreter-native built-in.
    #[must_use]
    pub fn builtin(kind: BuiltinFunction) -> Self {
        Self {
            kind: HostFnKind::Builtin(kind),
            annotated: false,
        }
    }

    /// Wraps an external host function.
    #[must_use]
    pub fn external(name: &'static str, func: ExternalFn) -> Self {
        Self {
            kind: HostFnKind::External { name, func },
            annotated: false,
        }
    }

    /// Marks this callable as wanting the interpreter and environment.
    #[must_use]
    pub fn annotated(mut self) -> Self {
        self.annotated = true;
        self
    }

    /// The callable's guest-visible name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match &self.kind {
            HostFnKind::Builtin(kind) => (*kind).into(),
            HostFnKind::External { name, .. } => name,
        }
    }
}

/// The two flavors of host callables.
#[derive(Debug, Clone)]
pub(crate) enum HostFnKind {
    Builtin(BuiltinFunction),
    External { name: &'static str, func: ExternalFn },
}

impl PartialEq for HostFnKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Builtin(a), Self::Builtin(b)) => a == b,
            (Self::External { name: a, .. }, Self::External { name: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// Insertion-ordered mapping with language-rule key equality.
///
/// Keys must be hashable values (None, bool, int, float, str, tuple of
/// hashable); cross-type numeric equality holds for keys, so `d[1.0]`
/// finds an entry stored under `1`.
#[derive(Debug, Clone, Default)]
pub struct Dict {
    entries: IndexMap<DictKey, Value>,
}

impl Dict {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a key/value pair, replacing the value of an equal key while
    /// keeping its original position.
    pub fn insert(&mut self, key: Value, value: Value) -> RunResult<()> {
        let key = DictKey::new(key)?;
        self.entries.insert(key, value);
        Ok(())
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &Value) -> RunResult<Option<&Value>> {
        let key = DictKey::new(key.clone())?;
        Ok(self.entries.get(&key))
    }

    /// Whether an equal key is present.
    pub fn contains(&self, key: &Value) -> RunResult<bool> {
        let key = DictKey::new(key.clone())?;
        Ok(self.entries.contains_key(&key))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (&k.value, v))
    }

    /// The keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<Value> {
        self.entries.keys().map(|k| k.value.clone()).collect()
    }

    /// The values in insertion order.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.entries.values().cloned().collect()
    }

    fn py_eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.entries.iter().all(|(key, value)| {
            other
                .entries
                .get(key)
                .is_some_and(|other_value| value.py_eq(other_value))
        })
    }
}

/// A dict key: the value plus its precomputed language-rule hash.
#[derive(Debug, Clone)]
struct DictKey {
    value: Value,
    hash: i64,
}

impl DictKey {
    fn new(value: Value) -> RunResult<Self> {
        let hash = key_hash(&value)?;
        Ok(Self { value, hash })
    }
}

impl Hash for DictKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_i64(self.hash);
    }
}

impl PartialEq for DictKey {
    fn eq(&self, other: &Self) -> bool {
        self.value.py_eq(&other.value)
    }
}

impl Eq for DictKey {}

/// Computes the language-rule hash of a value, or rejects unhashable values.
pub(crate) fn key_hash(value: &Value) -> RunResult<i64> {
    match value {
        Value::None => Ok(0),
        Value::Bool(b) => Ok(hash_int(&BigInt::from(i64::from(*b)))),
        Value::Int(i) => Ok(hash_int(i)),
        Value::Float(f) => Ok(hash_float(*f)),
        Value::Str(s) => Ok(hash_str(s)),
        Value::Tuple(items) => {
            // Elementwise combining with per-position multiplier updates.
            let mut x: i64 = 0x34_5678;
            let mut mult: i64 = 1_000_003;
            let mut remaining = items.len() as i64;
            for item in items {
                let h = key_hash(item)?;
                x = (x ^ h).wrapping_mul(mult);
                remaining -= 1;
                mult = mult.wrapping_add(82_520 + 2 * remaining);
            }
            x = x.wrapping_add(97_531);
            Ok(if x == -1 { -2 } else { x })
        }
        other => Err(RunError::runtime(format!(
            "unhashable type: '{}'",
            other.type_name()
        ))),
    }
}

/// Formats a float the way the guest language renders it: integral values
/// keep a trailing `.0`, very large magnitudes switch to exponent notation.
#[must_use]
pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf".to_owned() } else { "-inf".to_owned() };
    }
    if value == value.trunc() && value.abs() < 1e16 {
        return format!("{value:.1}");
    }
    // Exponent form only for large/small magnitudes; the default shortest
    // form already reads naturally in between.
    if value != 0.0 && !(1e-4..1e16).contains(&value.abs()) {
        let formatted = format!("{value:e}");
        if let Some(pos) = formatted.find('e') {
            let (mantissa, exponent) = formatted.split_at(pos);
            let exponent = &exponent[1..];
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ("-", digits),
                None => ("+", exponent),
            };
            let padded = if digits.len() < 2 {
                format!("0{digits}")
            } else {
                digits.to_owned()
            };
            return format!("{mantissa}e{sign}{padded}");
        }
    }
    format!("{value}")
}

/// Writes a quoted, escaped string literal the way `repr()` renders it.
fn string_repr_fmt(s: &str, out: &mut String) {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_language_rules() {
        assert!(!Value::None.is_truthy());
        assert!(!Value::int(0).is_truthy());
        assert!(!Value::Float(0.0).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(!Value::List(vec![]).is_truthy());
        assert!(Value::int(-1).is_truthy());
        assert!(Value::Str(" ".to_owned()).is_truthy());
    }

    #[test]
    fn numeric_equality_crosses_types() {
        assert!(Value::int(1).py_eq(&Value::Float(1.0)));
        assert!(Value::Bool(true).py_eq(&Value::int(1)));
        assert!(!Value::int(1).py_eq(&Value::Float(1.5)));
    }

    #[test]
    fn dict_finds_cross_type_numeric_keys() {
        let mut d = Dict::new();
        d.insert(Value::int(1), Value::Str("one".to_owned())).unwrap();
        let found = d.get(&Value::Float(1.0)).unwrap().unwrap();
        assert!(found.py_eq(&Value::Str("one".to_owned())));
    }

    #[test]
    fn nan_keys_never_match() {
        let mut d = Dict::new();
        d.insert(Value::Float(f64::NAN), Value::int(1)).unwrap();
        assert!(d.get(&Value::Float(f64::NAN)).unwrap().is_none());
    }

    #[test]
    fn list_keys_are_rejected() {
        let mut d = Dict::new();
        let err = d.insert(Value::List(vec![]), Value::None).unwrap_err();
        assert!(matches!(err, RunError::Runtime(_)));
    }

    #[test]
    fn repr_quotes_strings_inside_containers() {
        let value = Value::Tuple(vec![Value::int(6), Value::List(vec![Value::Str("a".to_owned())])]);
        assert_eq!(value.py_str(), "(6, ['a'])");
    }

    #[test]
    fn float_formatting_keeps_trailing_zero() {
        assert_eq!(format_float(4.0), "4.0");
        assert_eq!(format_float(4.5), "4.5");
        assert_eq!(format_float(-0.75), "-0.75");
    }
}
