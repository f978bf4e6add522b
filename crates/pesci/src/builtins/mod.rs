//! The curated set of host functions exposed to the guest.
//!
//! Each built-in is a variant of [`BuiltinFunction`]; the [`Builtins`] table
//! maps guest-visible names to values and is owned by the interpreter. The
//! evaluator treats the table as read-only; hosts may register additional
//! entries (including annotated external functions) before running code.

mod convert;
mod numeric;
mod sequences;

use strum::IntoEnumIterator;

use crate::{
    attrs,
    environment::Env,
    errors::{RunError, RunResult},
    interpreter::Interpreter,
    io::PrintWriter,
    value::{AIndexMap, HostFn, Value},
};

/// Well-known keyword name under which annotated host functions receive the
/// interpreter handle.
pub const KEY_INTERPRETER: &str = "__pesci_interpreter";
/// Well-known keyword name under which annotated host functions receive the
/// current environment.
pub const KEY_ENV: &str = "__pesci_env";

/// Enumerates every interpreter-native built-in function.
///
/// The strum derives give the lowercase guest-visible name for each variant
/// (`Len` -> "len"), used both to populate the table and in error messages.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum BuiltinFunction {
    Len,
    Abs,
    All,
    Any,
    Bin,
    Bool,
    Cmp,
    Complex,
    Dict,
    Enumerate,
    Filter,
    Float,
    Format,
    Hasattr,
    Hash,
    Hex,
    Int,
    List,
    Map,
    Max,
    Min,
    Oct,
    Ord,
    Pow,
    Range,
    Reduce,
    Reversed,
    Round,
    Slice,
    Sorted,
    Str,
    Sum,
    Type,
    Tuple,
    Zip,
}

impl BuiltinFunction {
    /// Calls this built-in with positional arguments.
    ///
    /// None of the native built-ins accept keyword arguments; the call site
    /// rejects kwargs before dispatching here.
    pub(crate) fn call(self, args: Vec<Value>) -> RunResult<Value> {
        match self {
            Self::Len => sequences::len(args),
            Self::Abs => numeric::abs(args),
            Self::All => sequences::all(args),
            Self::Any => sequences::any(args),
            Self::Bin => convert::bin(args),
            Self::Bool => convert::bool_(args),
            Self::Cmp => numeric::cmp(args),
            Self::Complex => Err(RunError::runtime(
                "complex numbers are not supported in the sandbox",
            )),
            Self::Dict => sequences::dict(args),
            Self::Enumerate => sequences::enumerate(args),
            Self::Filter => sequences::filter(args),
            Self::Float => convert::float(args),
            Self::Format => convert::format(args),
            Self::Hasattr => convert::hasattr(args),
            Self::Hash => convert::hash(args),
            Self::Hex => convert::hex(args),
            Self::Int => convert::int(args),
            Self::List => sequences::list(args),
            Self::Map => sequences::map(args),
            Self::Max => sequences::max(args),
            Self::Min => sequences::min(args),
            Self::Oct => convert::oct(args),
            Self::Ord => convert::ord(args),
            Self::Pow => numeric::pow(args),
            Self::Range => sequences::range(args),
            Self::Reduce => sequences::reduce(args),
            Self::Reversed => sequences::reversed(args),
            Self::Round => numeric::round(args),
            Self::Slice => sequences::slice(args),
            Self::Sorted => sequences::sorted(args),
            Self::Str => convert::str_(args),
            Self::Sum => sequences::sum(args),
            Self::Type => convert::type_(args),
            Self::Tuple => sequences::tuple(args),
            Self::Zip => sequences::zip(args),
        }
    }
}

/// The call context handed to external host functions.
///
/// `interp` and `env` are populated only for annotated functions; they are
/// the typed realization of the well-known keyword names [`KEY_INTERPRETER`]
/// and [`KEY_ENV`] (host references cannot travel inside guest values).
pub struct HostCall<'a> {
    /// Positional arguments in call order.
    pub args: Vec<Value>,
    /// Keyword arguments in call order, splat-mapping entries merged in.
    pub kwargs: AIndexMap<String, Value>,
    /// The interpreter handle; `Some` only for annotated functions.
    pub interp: Option<&'a Interpreter>,
    /// The current environment; `Some` only for annotated functions.
    pub env: Option<&'a mut Env>,
    /// Output writer for anything the host function wants to print.
    pub print: &'a mut dyn PrintWriter,
}

/// Signature of an external host function.
pub type ExternalFn = fn(&mut HostCall<'_>) -> RunResult<Value>;

/// The built-ins table: guest name → value.
#[derive(Debug, Clone)]
pub struct Builtins {
    table: AIndexMap<String, Value>,
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

impl Builtins {
    /// Builds the reference table: every [`BuiltinFunction`] plus the null
    /// literal bound under the name `None`.
    #[must_use]
    pub fn new() -> Self {
        let mut table = AIndexMap::default();
        for kind in BuiltinFunction::iter() {
            table.insert(kind.to_string(), Value::HostFn(HostFn::builtin(kind)));
        }
        table.insert("None".to_owned(), Value::None);
        Self { table }
    }

    /// Looks up an entry by guest-visible name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.table.get(name)
    }

    /// Registers (or replaces) a host-provided entry.
    pub fn register(&mut self, name: impl Into<String>, value: Value) {
        self.table.insert(name.into(), value);
    }
}

/// Calls a host-side callable (built-in, external, or bound method) from
/// inside another built-in, where no interpreter context is available.
///
/// User-defined functions cannot be re-entered from native code and are
/// rejected, as are external functions (they need their call context).
pub(crate) fn call_callable_simple(callee: &Value, args: Vec<Value>) -> RunResult<Value> {
    match callee {
        Value::HostFn(host_fn) => match &host_fn.kind {
            crate::value::HostFnKind::Builtin(kind) => kind.call(args),
            crate::value::HostFnKind::External { name, .. } => Err(RunError::runtime(format!(
                "external function '{name}' cannot be called from a built-in"
            ))),
        },
        Value::Method(method) => attrs::call_method(method, args),
        Value::Func(func) => Err(RunError::runtime(format!(
            "user function '{}' cannot be called from a built-in",
            func.name
        ))),
        other => Err(RunError::runtime(format!(
            "'{}' object is not callable",
            other.type_name()
        ))),
    }
}

// --- shared argument helpers -------------------------------------------------

pub(crate) fn get_one(name: &str, args: Vec<Value>) -> RunResult<Value> {
    let count = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(value), None) => Ok(value),
        _ => Err(arg_count_error(name, "exactly 1", count)),
    }
}

pub(crate) fn get_two(name: &str, args: Vec<Value>) -> RunResult<(Value, Value)> {
    let count = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next()) {
        (Some(a), Some(b), None) => Ok((a, b)),
        _ => Err(arg_count_error(name, "exactly 2", count)),
    }
}

pub(crate) fn get_one_two(name: &str, args: Vec<Value>) -> RunResult<(Value, Option<Value>)> {
    let count = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next(), args.next()) {
        (Some(a), b, None) => Ok((a, b)),
        _ => Err(arg_count_error(name, "1 or 2", count)),
    }
}

pub(crate) fn get_zero_one(name: &str, args: Vec<Value>) -> RunResult<Option<Value>> {
    let count = args.len();
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (value, None) => Ok(value),
        _ => Err(arg_count_error(name, "at most 1", count)),
    }
}

pub(crate) fn arg_count_error(name: &str, expected: &str, got: usize) -> RunError {
    RunError::bad_call(name, format!("takes {expected} arguments ({got} given)"))
}
