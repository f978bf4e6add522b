use std::rc::Rc;

use crate::{
    environment::Env,
    errors::{RunError, RunResult},
    expressions::{Code, StmtId},
    value::{AIndexMap, Value},
};

/// A user-defined function.
///
/// Pure data built by the function-definition rule and immutable afterwards.
/// The body is a statement-id list into the program that defined the
/// function; the shared `code` handle keeps those nodes alive even after
/// the defining program is gone (a later REPL input, for instance).
#[derive(Debug)]
pub struct Func {
    pub name: String,
    /// Positional parameter names in declaration order.
    pub params: Vec<String>,
    /// Default values for the last `defaults.len()` positional parameters,
    /// evaluated at definition time.
    pub defaults: Vec<Value>,
    /// Rest-positional parameter name (`*args`), if declared.
    pub var_args: Option<String>,
    /// Rest-keyword parameter name (`**kwargs`), if declared.
    pub var_kwargs: Option<String>,
    pub body: Vec<StmtId>,
    pub code: Rc<Code>,
}

/// Binds call arguments into a fresh scope already pushed onto `env`.
///
/// Implements the resolution order of the call rule: defaults first (for
/// the trailing parameters), then positional actuals, then keyword actuals
/// with double-assignment and unknown-keyword checks, then the rest
/// parameters. Excess positionals beyond the formals become the
/// rest-positional tail (and are dropped when no rest parameter is
/// declared). A non-empty set of still-unbound formals at the end is a
/// bad-function-call.
///
/// On error the scope pushed for the call is popped again, so a failed
/// bind leaves the environment as it was.
pub(crate) fn bind_arguments(
    env: &mut Env,
    func: &Func,
    args: Vec<Value>,
    kwargs: AIndexMap<String, Value>,
) -> RunResult<()> {
    env.push_scope();
    if let Err(error) = bind_into_scope(env, func, args, kwargs) {
        let _ = env.pop_scope();
        return Err(error);
    }
    Ok(())
}

fn bind_into_scope(
    env: &mut Env,
    func: &Func,
    args: Vec<Value>,
    kwargs: AIndexMap<String, Value>,
) -> RunResult<()> {
    let n = func.params.len();
    let k = func.defaults.len();
    let mut remaining: Vec<&str> = func.params.iter().map(String::as_str).collect();
    let mut was_default: Vec<&str> = Vec::with_capacity(k);

    // Defaults bind the last k positional parameters.
    for (param, default) in func.params[n - k..].iter().zip(&func.defaults) {
        env.set_var(param, default.clone())?;
        remaining.retain(|name| *name != param.as_str());
        was_default.push(param.as_str());
    }

    // Positional actuals bind in order; the excess becomes the rest tail.
    let mut args = args.into_iter();
    for param in &func.params {
        let Some(value) = args.next() else { break };
        env.set_var(param, value)?;
        remaining.retain(|name| *name != param.as_str());
    }
    let rest: Vec<Value> = args.collect();

    // Keyword actuals.
    let mut rest_kwargs = crate::value::Dict::new();
    for (name, value) in kwargs {
        if func.params.iter().any(|p| *p == name) {
            let still_open = remaining.iter().any(|r| *r == name);
            let had_default = was_default.iter().any(|d| *d == name);
            if !still_open && !had_default {
                return Err(RunError::bad_call(
                    &func.name,
                    format!("got multiple values for argument '{name}'"),
                ));
            }
            env.set_var(&name, value)?;
            remaining.retain(|r| *r != name);
        } else if func.var_kwargs.is_some() {
            rest_kwargs.insert(Value::Str(name), value)?;
        } else {
            return Err(RunError::bad_call(
                &func.name,
                format!("got an unexpected keyword argument '{name}'"),
            ));
        }
    }

    if let Some(var_args) = &func.var_args {
        env.set_var(var_args, Value::List(rest))?;
    }
    if let Some(var_kwargs) = &func.var_kwargs {
        env.set_var(var_kwargs, Value::Dict(rest_kwargs))?;
    }

    if !remaining.is_empty() {
        return Err(RunError::bad_call(
            &func.name,
            format!("missing required arguments: {}", remaining.join(", ")),
        ));
    }
    Ok(())
}
