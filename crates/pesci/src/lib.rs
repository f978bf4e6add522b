#![doc = include_str!("../../../README.md")]

mod attrs;
mod builtins;
mod environment;
mod errors;
mod expressions;
mod function;
mod interpreter;
mod io;
mod ops;
mod parse;
mod py_hash;
mod repl;
mod value;

pub use crate::{
    attrs::BoundMethod,
    builtins::{BuiltinFunction, Builtins, ExternalFn, HostCall, KEY_ENV, KEY_INTERPRETER},
    environment::Env,
    errors::{Error, ParseError, RunError, RunResult},
    expressions::{
        BoolOperator, CallTarget, CmpOperator, Code, Expr, ExprId, ExprNode, Index, Loc, Operator, Stmt, StmtId,
        StmtNode, Target, UnaryOperator,
    },
    function::Func,
    interpreter::{Interpreter, StepInfo, StepProgress, Stepper},
    io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint},
    parse::parse_source,
    repl::{InputBuffer, InputEvent, ReplSession},
    value::{AIndexMap, Dict, HostFn, Value},
};
