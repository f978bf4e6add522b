use std::fmt::Write as _;

use crate::{
    builtins::Builtins,
    errors::{RunError, RunResult},
    value::{AIndexMap, Value},
};

/// One lexical scope: a name→value mapping plus the names declared `global`
/// while this scope was current.
#[derive(Debug, Default)]
pub(crate) struct Scope {
    vars: AIndexMap<String, Value>,
    globals: Vec<String>,
}

impl Scope {
    fn declares_global(&self, name: &str) -> bool {
        self.globals.iter().any(|g| g == name)
    }
}

/// All evaluation state of one guest program run.
///
/// The environment owns the scope stack (index 0 is the global scope, which
/// is never popped) and the evaluation stack of intermediate values. The
/// built-ins table is deliberately *not* stored here: it belongs to the
/// interpreter and is passed into lookups, so an environment is plain data
/// that a host can keep, inspect, or drop between steps.
#[derive(Debug)]
pub struct Env {
    scopes: Vec<Scope>,
    stack: Vec<Value>,
    /// Monotonic step counter; incremented once per observable step.
    pub ip: u64,
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Env {
    /// Creates an environment with a fresh global scope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            stack: Vec::new(),
            ip: 0,
        }
    }

    /// Drops all scopes and the evaluation stack, restoring a fresh global
    /// scope.
    pub fn reset(&mut self) {
        self.scopes.clear();
        self.scopes.push(Scope::default());
        self.stack.clear();
        self.ip = 0;
    }

    /// Prepares the environment for a new run: the step counter restarts
    /// and any stale evaluation-stack values are discarded. Scopes persist,
    /// which is what keeps REPL state alive across inputs.
    pub fn setup(&mut self) {
        self.ip = 0;
        self.stack.clear();
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub(crate) fn pop_scope(&mut self) -> RunResult<()> {
        if self.scopes.len() <= 1 {
            return Err(RunError::ContextsEmpty);
        }
        self.scopes.pop();
        Ok(())
    }

    /// Binds a name in the current scope, or in the global scope if the
    /// name was declared `global` here. Underscore-prefixed names are
    /// reserved and rejected.
    pub fn set_var(&mut self, name: &str, value: Value) -> RunResult<()> {
        if name.starts_with('_') {
            return Err(RunError::BadSymbolName { name: name.to_owned() });
        }
        let scope = if self.current_scope().declares_global(name) {
            &mut self.scopes[0]
        } else {
            self.scopes.last_mut().expect("scope stack is never empty")
        };
        scope.vars.insert(name.to_owned(), value);
        Ok(())
    }

    /// Looks a name up through the scope stack (innermost first), falling
    /// back to the built-ins table.
    pub fn get_var(&self, name: &str, builtins: &Builtins) -> RunResult<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.vars.get(name) {
                return Ok(value.clone());
            }
        }
        if let Some(value) = builtins.get(name) {
            return Ok(value.clone());
        }
        Err(RunError::SymbolNotFound { name: name.to_owned() })
    }

    /// Records a `global` declaration for the current scope.
    pub(crate) fn add_global(&mut self, name: &str) {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        if !scope.declares_global(name) {
            scope.globals.push(name.to_owned());
        }
    }

    pub(crate) fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub(crate) fn pop(&mut self) -> Option<Value> {
        self.stack.pop()
    }

    pub(crate) fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Discards evaluation-stack entries down to `mark`.
    pub(crate) fn truncate_stack(&mut self, mark: usize) {
        self.stack.truncate(mark);
    }

    /// Number of scopes on the stack (the global scope counts).
    pub(crate) fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    fn current_scope(&self) -> &Scope {
        self.scopes.last().expect("scope stack is never empty")
    }

    /// The union of all scope mappings, innermost wins, with internal
    /// (underscore-prefixed) keys excluded.
    #[must_use]
    pub fn visible_context(&self) -> AIndexMap<String, Value> {
        let mut ctx = AIndexMap::default();
        for scope in &self.scopes {
            for (name, value) in &scope.vars {
                if !name.starts_with('_') {
                    ctx.insert(name.clone(), value.clone());
                }
            }
        }
        ctx
    }

    /// Renders the visible context for the debug dump and the `dir()`
    /// helper: an `ENV :<ip>:` header and sorted `name: value` lines
    /// between dashed rules.
    #[must_use]
    pub fn describe(&self) -> String {
        let ctx = self.visible_context();
        let mut names: Vec<&String> = ctx.keys().collect();
        names.sort();
        let mut out = String::new();
        let _ = writeln!(out, "ENV :{}:", self.ip);
        let _ = writeln!(out, "{}", "-".repeat(10));
        for name in names {
            let _ = writeln!(out, "{name}: {}", ctx[name.as_str()].py_str());
        }
        let _ = write!(out, "{}", "-".repeat(10));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_scope_cannot_be_popped() {
        let mut env = Env::new();
        assert_eq!(env.pop_scope(), Err(RunError::ContextsEmpty));
        env.push_scope();
        assert!(env.pop_scope().is_ok());
        assert_eq!(env.pop_scope(), Err(RunError::ContextsEmpty));
    }

    #[test]
    fn underscore_names_cannot_be_bound() {
        let mut env = Env::new();
        let err = env.set_var("_secret", Value::None).unwrap_err();
        assert!(matches!(err, RunError::BadSymbolName { .. }));
    }

    #[test]
    fn global_declaration_routes_writes_to_global_scope() {
        let builtins = Builtins::new();
        let mut env = Env::new();
        env.set_var("x", Value::int(0)).unwrap();
        env.push_scope();
        env.add_global("x");
        env.set_var("x", Value::int(5)).unwrap();
        env.pop_scope().unwrap();
        assert!(env.get_var("x", &builtins).unwrap().py_eq(&Value::int(5)));
    }

    #[test]
    fn without_declaration_writes_stay_local() {
        let builtins = Builtins::new();
        let mut env = Env::new();
        env.set_var("x", Value::int(0)).unwrap();
        env.push_scope();
        env.set_var("x", Value::int(5)).unwrap();
        env.pop_scope().unwrap();
        assert!(env.get_var("x", &builtins).unwrap().py_eq(&Value::int(0)));
    }

    #[test]
    fn lookup_falls_back_to_builtins() {
        let builtins = Builtins::new();
        let env = Env::new();
        assert!(env.get_var("len", &builtins).is_ok());
        assert!(matches!(
            env.get_var("missing", &builtins),
            Err(RunError::SymbolNotFound { .. })
        ));
    }
}
