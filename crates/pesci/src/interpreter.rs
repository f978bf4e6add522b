//! The stepwise evaluator.
//!
//! Evaluation is driven by an activation stack of explicit state-machine
//! frames instead of host recursion: `step()` pops the top frame, advances
//! it one sub-step, and pushes child frames for sub-expressions. A parent
//! that needs a child's value lets the child run to completion and then
//! consumes one entry from the environment's evaluation stack ("drive the
//! child, then pop"). One observable step is reported per composite AST
//! node completing evaluation; base values (literals, names, `pass`)
//! complete silently. This keeps the host able to single-step arbitrary
//! guest code while holding no native stack frames between steps.

use std::rc::Rc;

use crate::{
    attrs,
    builtins::{Builtins, HostCall},
    environment::Env,
    errors::{RunError, RunResult},
    expressions::{BoolOperator, CallTarget, Code, Expr, ExprId, Index, Loc, Stmt, StmtId, Target},
    function::{Func, bind_arguments},
    io::PrintWriter,
    ops,
    value::{AIndexMap, HostFn, HostFnKind, Value},
};

/// Result of one `step()` call: an observable step, or execution-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepProgress {
    /// One AST node completed evaluation; `ip` was incremented.
    Step(StepInfo),
    /// The top-level statement sequence is exhausted. Not a failure.
    Ended,
}

/// The AST node an observable step corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepInfo {
    pub loc: Loc,
    /// Node kind name, e.g. `"BinOp"`.
    pub kind: &'static str,
}

/// Pending loop control transfer raised by `break` / `continue`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopSignal {
    Break,
    Continue,
}

/// The interpreter: owns the built-ins table and the interactive flag.
///
/// All evaluation state lives in the [`Env`] and the [`Stepper`]; the
/// interpreter itself is immutable during a run and can drive any number of
/// environments.
#[derive(Debug, Default)]
pub struct Interpreter {
    builtins: Builtins,
    interactive: bool,
}

impl Interpreter {
    /// Creates an interpreter with the reference built-ins table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builtins: Builtins::new(),
            interactive: false,
        }
    }

    /// Creates an interpreter in interactive mode: residual values of bare
    /// expression statements are printed when non-None.
    #[must_use]
    pub fn new_interactive() -> Self {
        Self {
            builtins: Builtins::new(),
            interactive: true,
        }
    }

    #[must_use]
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.interactive = interactive;
    }

    #[must_use]
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Registers a host-provided entry in the built-ins table.
    pub fn register(&mut self, name: impl Into<String>, value: Value) {
        self.builtins.register(name, value);
    }

    /// Creates a fresh environment for this interpreter.
    #[must_use]
    pub fn create_env(&self) -> Env {
        Env::new()
    }

    /// Binds a program to a new stepper. The environment's step counter is
    /// not touched; call [`Env::setup`] to restart it.
    #[must_use]
    pub fn stepper(&self, code: &Rc<Code>, env: &Env) -> Stepper {
        Stepper {
            frames: vec![Frame {
                code: code.clone(),
                kind: FrameKind::Program { index: 0 },
            }],
            signal: None,
            base_scopes: env.scope_depth(),
        }
    }

    /// Advances execution by exactly one observable step.
    ///
    /// On error the stepper is unwound, scopes pushed during this run are
    /// popped, and the current top-level statement is abandoned.
    pub fn step(
        &self,
        env: &mut Env,
        stepper: &mut Stepper,
        print: &mut dyn PrintWriter,
    ) -> RunResult<StepProgress> {
        loop {
            let Some(mut frame) = stepper.frames.pop() else {
                return Ok(StepProgress::Ended);
            };

            let result = if let Some(signal) = stepper.signal {
                frame.handle_signal(signal, stepper)
            } else {
                self.advance(&mut frame, env, print)
            };

            match result {
                Ok(Control::Next(child)) => {
                    stepper.frames.push(frame);
                    if let Some(child) = child {
                        stepper.frames.push(child);
                    }
                }
                Ok(Control::Done(info)) => {
                    env.ip += 1;
                    return Ok(StepProgress::Step(info));
                }
                Ok(Control::DoneQuiet) => {}
                Ok(Control::Signal(signal, info)) => {
                    stepper.signal = Some(signal);
                    env.ip += 1;
                    return Ok(StepProgress::Step(info));
                }
                Err(error) => {
                    stepper.frames.clear();
                    stepper.signal = None;
                    while env.scope_depth() > stepper.base_scopes {
                        let _ = env.pop_scope();
                    }
                    return Err(error);
                }
            }
        }
    }

    /// Runs a program to completion.
    pub fn run(&self, env: &mut Env, code: &Rc<Code>, print: &mut dyn PrintWriter) -> RunResult<()> {
        env.setup();
        let mut stepper = self.stepper(code, env);
        loop {
            match self.step(env, &mut stepper, print)? {
                StepProgress::Step(_) => {}
                StepProgress::Ended => return Ok(()),
            }
        }
    }

    /// Evaluates a base expression immediately, or builds the frame that
    /// will evaluate a composite one.
    ///
    /// This is the only entry point for sub-expression evaluation: base
    /// values push their result with no observable step, composite nodes
    /// get a frame and report a step when they complete.
    fn eval_or_frame(&self, code: &Rc<Code>, id: ExprId, env: &mut Env) -> RunResult<Option<Frame>> {
        let node = code.expr(id);
        let value = match &node.expr {
            Expr::Int(i) => Value::Int(i.clone()),
            Expr::Float(f) => Value::Float(*f),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::Bool(b) => Value::Bool(*b),
            Expr::NoneLit => Value::None,
            Expr::Name(name) => env.get_var(name, &self.builtins)?,
            Expr::ListComp | Expr::DictComp | Expr::IfExp => {
                return Err(RunError::runtime(format!(
                    "no evaluation rule for '{}'",
                    node.expr.kind_name()
                )));
            }
            _ => return Ok(Some(Frame::for_expr(code.clone(), id, &node.expr))),
        };
        env.push(value);
        Ok(None)
    }

    fn advance(&self, frame: &mut Frame, env: &mut Env, print: &mut dyn PrintWriter) -> RunResult<Control> {
        let Frame { code, kind } = frame;
        match kind {
            FrameKind::Program { index } => {
                // Top-level statement boundary: a residual value is echoed
                // in interactive mode (when non-None), then the evaluation
                // stack is drained either way.
                if let Some(value) = env.pop() {
                    if self.interactive && !matches!(value, Value::None) {
                        print.print_line(&value.py_str());
                    }
                    env.truncate_stack(0);
                }
                let body = code.body();
                if *index < body.len() {
                    let stmt = body[*index];
                    *index += 1;
                    Ok(Control::Next(Some(Frame::for_stmt(code.clone(), stmt))))
                } else {
                    Ok(Control::DoneQuiet)
                }
            }
            FrameKind::Block { stmts, index } => {
                if *index < stmts.len() {
                    let stmt = stmts[*index];
                    *index += 1;
                    Ok(Control::Next(Some(Frame::for_stmt(code.clone(), stmt))))
                } else {
                    Ok(Control::DoneQuiet)
                }
            }
            FrameKind::Pass => Ok(Control::DoneQuiet),
            FrameKind::ExprStmt { expr, state } => {
                if *state == 0 {
                    *state = 1;
                    let child = self.eval_or_frame(code, *expr, env)?;
                    Ok(Control::Next(child))
                } else {
                    // The expression's value stays on the stack for the
                    // top-level boundary to consume.
                    Ok(Control::DoneQuiet)
                }
            }
            FrameKind::Assign { stmt, state } => {
                let Stmt::Assign { target, value } = &code.stmt(*stmt).stmt else {
                    unreachable!("frame constructed from Assign");
                };
                if *state == 0 {
                    *state = 1;
                    let child = self.eval_or_frame(code, *value, env)?;
                    return Ok(Control::Next(child));
                }
                let value = pop(env)?;
                bind_target(env, target, value)?;
                Ok(Control::Done(step_info_stmt(code, *stmt)))
            }
            FrameKind::AugAssign { stmt, state } => {
                let Stmt::AugAssign { target, op, value } = &code.stmt(*stmt).stmt else {
                    unreachable!("frame constructed from AugAssign");
                };
                if *state == 0 {
                    *state = 1;
                    let child = self.eval_or_frame(code, *value, env)?;
                    return Ok(Control::Next(child));
                }
                let rhs = pop(env)?;
                let current = env.get_var(target, &self.builtins)?;
                let updated = ops::binary_op(*op, current, rhs)?;
                env.set_var(target, updated)?;
                Ok(Control::Done(step_info_stmt(code, *stmt)))
            }
            FrameKind::Print {
                stmt,
                index,
                out,
                needs_space,
            } => {
                let Stmt::Print { values } = &code.stmt(*stmt).stmt else {
                    unreachable!("frame constructed from Print");
                };
                if *index > 0 {
                    // Consume the value evaluated by the previous sub-step.
                    let value = pop(env)?;
                    if *needs_space {
                        out.push(' ');
                    } else {
                        *needs_space = true;
                    }
                    // A string already ending in a newline suppresses the
                    // following separator, preserving manual line control.
                    match value {
                        Value::Str(s) => {
                            if s.ends_with('\n') {
                                *needs_space = false;
                            }
                            out.push_str(&s);
                        }
                        other => out.push_str(&other.py_str()),
                    }
                }
                if *index < values.len() {
                    let value = values[*index];
                    *index += 1;
                    let child = self.eval_or_frame(code, value, env)?;
                    Ok(Control::Next(child))
                } else {
                    print.print_line(out);
                    Ok(Control::Done(step_info_stmt(code, *stmt)))
                }
            }
            FrameKind::If { stmt, state } => {
                let Stmt::If { test, body, or_else } = &code.stmt(*stmt).stmt else {
                    unreachable!("frame constructed from If");
                };
                match *state {
                    0 => {
                        *state = 1;
                        let child = self.eval_or_frame(code, *test, env)?;
                        Ok(Control::Next(child))
                    }
                    1 => {
                        *state = 2;
                        let branch = if pop(env)?.is_truthy() { body } else { or_else };
                        Ok(Control::Next(Some(Frame::block(code.clone(), branch.clone()))))
                    }
                    _ => Ok(Control::Done(step_info_stmt(code, *stmt))),
                }
            }
            FrameKind::While { stmt, state } => {
                let Stmt::While { test, body, or_else } = &code.stmt(*stmt).stmt else {
                    unreachable!("frame constructed from While");
                };
                match *state {
                    0 => {
                        *state = 1;
                        let child = self.eval_or_frame(code, *test, env)?;
                        Ok(Control::Next(child))
                    }
                    1 => {
                        if pop(env)?.is_truthy() {
                            // Re-test after the body completes.
                            *state = 0;
                            Ok(Control::Next(Some(Frame::block(code.clone(), body.clone()))))
                        } else {
                            *state = 2;
                            Ok(Control::Next(Some(Frame::block(code.clone(), or_else.clone()))))
                        }
                    }
                    _ => Ok(Control::Done(step_info_stmt(code, *stmt))),
                }
            }
            FrameKind::For {
                stmt,
                state,
                elements,
                index,
            } => {
                let Stmt::For {
                    target,
                    iter,
                    body,
                    or_else,
                } = &code.stmt(*stmt).stmt
                else {
                    unreachable!("frame constructed from For");
                };
                match *state {
                    0 => {
                        *state = 1;
                        let child = self.eval_or_frame(code, *iter, env)?;
                        Ok(Control::Next(child))
                    }
                    1 => {
                        let iterable = pop(env)?;
                        *elements = ops::iter_elements(&iterable)?;
                        *state = 2;
                        Ok(Control::Next(None))
                    }
                    2 => {
                        if *index < elements.len() {
                            let element = elements[*index].clone();
                            *index += 1;
                            bind_loop_target(env, target, element)?;
                            Ok(Control::Next(Some(Frame::block(code.clone(), body.clone()))))
                        } else {
                            *state = 3;
                            Ok(Control::Next(Some(Frame::block(code.clone(), or_else.clone()))))
                        }
                    }
                    _ => Ok(Control::Done(step_info_stmt(code, *stmt))),
                }
            }
            FrameKind::FunctionDef {
                stmt,
                index,
                defaults,
            } => {
                let Stmt::FunctionDef {
                    name,
                    params,
                    defaults: default_exprs,
                    var_args,
                    var_kwargs,
                    body,
                } = &code.stmt(*stmt).stmt
                else {
                    unreachable!("frame constructed from FunctionDef");
                };
                if *index > 0 {
                    defaults.push(pop(env)?);
                }
                if *index < default_exprs.len() {
                    let expr = default_exprs[*index];
                    *index += 1;
                    let child = self.eval_or_frame(code, expr, env)?;
                    return Ok(Control::Next(child));
                }
                let func = Func {
                    name: name.clone(),
                    params: params.clone(),
                    defaults: std::mem::take(defaults),
                    var_args: var_args.clone(),
                    var_kwargs: var_kwargs.clone(),
                    body: body.clone(),
                    code: code.clone(),
                };
                env.set_var(name, Value::Func(Rc::new(func)))?;
                Ok(Control::Done(step_info_stmt(code, *stmt)))
            }
            FrameKind::Return { stmt, state } => {
                let Stmt::Return { value } = &code.stmt(*stmt).stmt else {
                    unreachable!("frame constructed from Return");
                };
                if *state == 0 {
                    *state = 1;
                    return match value {
                        Some(expr) => {
                            let child = self.eval_or_frame(code, *expr, env)?;
                            Ok(Control::Next(child))
                        }
                        None => {
                            env.push(Value::None);
                            Ok(Control::Next(None))
                        }
                    };
                }
                // The return value stays on the stack; the call frame that
                // drove this body consumes it after the body completes.
                Ok(Control::Done(step_info_stmt(code, *stmt)))
            }
            FrameKind::Global { stmt } => {
                let Stmt::Global { names } = &code.stmt(*stmt).stmt else {
                    unreachable!("frame constructed from Global");
                };
                for name in names {
                    env.add_global(name);
                }
                Ok(Control::Done(step_info_stmt(code, *stmt)))
            }
            FrameKind::LoopJump { stmt, signal } => Ok(Control::Signal(*signal, step_info_stmt(code, *stmt))),
            FrameKind::Eval { expr, state } => self.advance_expr(code, *expr, state, env, print),
        }
    }

    fn advance_expr(
        &self,
        code: &Rc<Code>,
        id: ExprId,
        state: &mut EvalState,
        env: &mut Env,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Control> {
        match state {
            EvalState::BinOp(step) => {
                let Expr::BinOp { left, op, right } = &code.expr(id).expr else {
                    unreachable!("frame constructed from BinOp");
                };
                match *step {
                    0 => {
                        *step = 1;
                        let child = self.eval_or_frame(code, *left, env)?;
                        Ok(Control::Next(child))
                    }
                    1 => {
                        *step = 2;
                        // The operator itself travels over the stack as a
                        // transient token, like any other child result.
                        env.push(Value::OpToken(*op));
                        let child = self.eval_or_frame(code, *right, env)?;
                        Ok(Control::Next(child))
                    }
                    _ => {
                        let right = pop(env)?;
                        let Value::OpToken(op) = pop(env)? else {
                            return Err(RunError::runtime("operator token missing from evaluation stack"));
                        };
                        let left = pop(env)?;
                        env.push(ops::binary_op(op, left, right)?);
                        Ok(Control::Done(step_info_expr(code, id)))
                    }
                }
            }
            EvalState::BoolOp { index } => {
                let Expr::BoolOp { op, values } = &code.expr(id).expr else {
                    unreachable!("frame constructed from BoolOp");
                };
                if *index == 0 {
                    *index = 1;
                    let child = self.eval_or_frame(code, values[0], env)?;
                    return Ok(Control::Next(child));
                }
                let value = pop(env)?;
                let decisive = match op {
                    BoolOperator::Or => value.is_truthy(),
                    BoolOperator::And => !value.is_truthy(),
                };
                if decisive || *index == values.len() {
                    env.push(value);
                    return Ok(Control::Done(step_info_expr(code, id)));
                }
                let next = values[*index];
                *index += 1;
                let child = self.eval_or_frame(code, next, env)?;
                Ok(Control::Next(child))
            }
            EvalState::UnaryOp(step) => {
                let Expr::UnaryOp { op, operand } = &code.expr(id).expr else {
                    unreachable!("frame constructed from UnaryOp");
                };
                if *step == 0 {
                    *step = 1;
                    let child = self.eval_or_frame(code, *operand, env)?;
                    return Ok(Control::Next(child));
                }
                let operand = pop(env)?;
                env.push(ops::unary_op(*op, operand)?);
                Ok(Control::Done(step_info_expr(code, id)))
            }
            EvalState::Compare { index } => {
                let Expr::Compare { left, ops: cmp_ops, comparators } = &code.expr(id).expr else {
                    unreachable!("frame constructed from Compare");
                };
                let n = comparators.len();
                if *index < n {
                    // All comparators evaluate before the left operand; the
                    // chain is strict, with every relation applied at the end.
                    let next = comparators[*index];
                    *index += 1;
                    let child = self.eval_or_frame(code, next, env)?;
                    return Ok(Control::Next(child));
                }
                if *index == n {
                    *index += 1;
                    let child = self.eval_or_frame(code, *left, env)?;
                    return Ok(Control::Next(child));
                }
                let mut operands = vec![pop(env)?];
                for _ in 0..n {
                    operands.push(pop(env)?);
                }
                // Stack order was [c1..cn, left]; popping gives
                // [left, cn..c1], so reverse the comparator tail.
                operands[1..].reverse();
                let mut result = true;
                for (i, op) in cmp_ops.iter().enumerate() {
                    let relation = ops::compare_op(*op, &operands[i], &operands[i + 1])?;
                    result = result && relation;
                }
                env.push(Value::Bool(result));
                Ok(Control::Done(step_info_expr(code, id)))
            }
            EvalState::Call(call) => self.advance_call(code, id, call, env, print),
            EvalState::Dict { index } => {
                let Expr::Dict { keys, values } = &code.expr(id).expr else {
                    unreachable!("frame constructed from Dict");
                };
                let n = keys.len();
                if *index < n {
                    // Values evaluate before keys.
                    let next = values[*index];
                    *index += 1;
                    let child = self.eval_or_frame(code, next, env)?;
                    return Ok(Control::Next(child));
                }
                if *index < 2 * n {
                    let next = keys[*index - n];
                    *index += 1;
                    let child = self.eval_or_frame(code, next, env)?;
                    return Ok(Control::Next(child));
                }
                let mut key_values = Vec::with_capacity(n);
                for _ in 0..n {
                    key_values.push(pop(env)?);
                }
                key_values.reverse();
                let mut item_values = Vec::with_capacity(n);
                for _ in 0..n {
                    item_values.push(pop(env)?);
                }
                item_values.reverse();
                let mut dict = crate::value::Dict::new();
                for (key, value) in key_values.into_iter().zip(item_values) {
                    dict.insert(key, value)?;
                }
                env.push(Value::Dict(dict));
                Ok(Control::Done(step_info_expr(code, id)))
            }
            EvalState::Sequence { index, tuple } => {
                let elts = match &code.expr(id).expr {
                    Expr::Tuple { elts } | Expr::List { elts } => elts,
                    _ => unreachable!("frame constructed from Tuple or List"),
                };
                if *index < elts.len() {
                    let next = elts[*index];
                    *index += 1;
                    let child = self.eval_or_frame(code, next, env)?;
                    return Ok(Control::Next(child));
                }
                let mut items = Vec::with_capacity(elts.len());
                for _ in 0..elts.len() {
                    items.push(pop(env)?);
                }
                items.reverse();
                env.push(if *tuple { Value::Tuple(items) } else { Value::List(items) });
                Ok(Control::Done(step_info_expr(code, id)))
            }
            EvalState::Attribute(step) => {
                let Expr::Attribute { value, attr } = &code.expr(id).expr else {
                    unreachable!("frame constructed from Attribute");
                };
                if *step == 0 {
                    *step = 1;
                    let child = self.eval_or_frame(code, *value, env)?;
                    return Ok(Control::Next(child));
                }
                let base = pop(env)?;
                env.push(attrs::lookup(&base, attr)?);
                Ok(Control::Done(step_info_expr(code, id)))
            }
            EvalState::Subscript { step } => {
                let Expr::Subscript { value, index } = &code.expr(id).expr else {
                    unreachable!("frame constructed from Subscript");
                };
                if *step == 0 {
                    *step = 1;
                    let child = self.eval_or_frame(code, *value, env)?;
                    return Ok(Control::Next(child));
                }
                match index {
                    Index::Single(single) => {
                        if *step == 1 {
                            *step = 2;
                            let child = self.eval_or_frame(code, *single, env)?;
                            return Ok(Control::Next(child));
                        }
                        let key = pop(env)?;
                        let base = pop(env)?;
                        env.push(ops::subscript_index(&base, &key)?);
                        Ok(Control::Done(step_info_expr(code, id)))
                    }
                    Index::Slice { lower, upper, step: stride } => {
                        let parts: Vec<ExprId> = [lower, upper, stride].into_iter().flatten().copied().collect();
                        let evaluated = usize::from(*step) - 1;
                        if evaluated < parts.len() {
                            *step += 1;
                            let child = self.eval_or_frame(code, parts[evaluated], env)?;
                            return Ok(Control::Next(child));
                        }
                        let mut values = Vec::with_capacity(parts.len());
                        for _ in 0..parts.len() {
                            values.push(pop(env)?);
                        }
                        values.reverse();
                        let base = pop(env)?;
                        let mut values = values.into_iter();
                        let lower_value = lower.map(|_| values.next().expect("slice part evaluated"));
                        let upper_value = upper.map(|_| values.next().expect("slice part evaluated"));
                        let stride_value = stride.map(|_| values.next().expect("slice part evaluated"));
                        env.push(ops::subscript_slice(
                            &base,
                            lower_value.as_ref(),
                            upper_value.as_ref(),
                            stride_value.as_ref(),
                        )?);
                        Ok(Control::Done(step_info_expr(code, id)))
                    }
                }
            }
        }
    }

    fn advance_call(
        &self,
        code: &Rc<Code>,
        id: ExprId,
        call: &mut CallState,
        env: &mut Env,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Control> {
        let Expr::Call {
            func,
            args,
            keywords,
            star,
            kstar,
        } = &code.expr(id).expr
        else {
            unreachable!("frame constructed from Call");
        };
        match &mut call.stage {
            CallStage::Args { index } => {
                if *index > 0 {
                    let value = pop(env)?;
                    call.args.push(value);
                }
                if *index < args.len() {
                    let next = args[*index];
                    *index += 1;
                    let child = self.eval_or_frame(code, next, env)?;
                    return Ok(Control::Next(child));
                }
                call.stage = CallStage::Kwargs { index: 0 };
                Ok(Control::Next(None))
            }
            CallStage::Kwargs { index } => {
                if *index > 0 {
                    let value = pop(env)?;
                    call.kwargs.insert(keywords[*index - 1].0.clone(), value);
                }
                if *index < keywords.len() {
                    let next = keywords[*index].1;
                    *index += 1;
                    let child = self.eval_or_frame(code, next, env)?;
                    return Ok(Control::Next(child));
                }
                // Splat arguments are fetched by name, not evaluated.
                if let Some(star) = star {
                    let splat = env.get_var(star, &self.builtins)?;
                    call.args.extend(ops::iter_elements(&splat)?);
                }
                if let Some(kstar) = kstar {
                    let splat = env.get_var(kstar, &self.builtins)?;
                    let Value::Dict(mapping) = splat else {
                        return Err(RunError::runtime(format!(
                            "** argument must be a mapping, not '{}'",
                            splat.type_name()
                        )));
                    };
                    for (key, value) in mapping.iter() {
                        let Value::Str(key) = key else {
                            return Err(RunError::runtime("keywords must be strings"));
                        };
                        call.kwargs.insert(key.clone(), value.clone());
                    }
                }
                call.stage = CallStage::Callee;
                Ok(Control::Next(None))
            }
            CallStage::Callee => match func {
                CallTarget::Name(name) => {
                    call.callee = Some(env.get_var(name, &self.builtins)?);
                    call.stage = CallStage::Enter;
                    Ok(Control::Next(None))
                }
                CallTarget::Expr(expr) => {
                    call.stage = CallStage::CalleePop;
                    let child = self.eval_or_frame(code, *expr, env)?;
                    Ok(Control::Next(child))
                }
            },
            CallStage::CalleePop => {
                call.callee = Some(pop(env)?);
                call.stage = CallStage::Enter;
                Ok(Control::Next(None))
            }
            CallStage::Enter => {
                let callee = call.callee.take().expect("callee resolved before entry");
                let args = std::mem::take(&mut call.args);
                let kwargs = std::mem::take(&mut call.kwargs);
                match callee {
                    Value::HostFn(host_fn) => {
                        let result = self.call_host_fn(&host_fn, args, kwargs, env, print)?;
                        env.push(result);
                        Ok(Control::Done(step_info_expr(code, id)))
                    }
                    Value::Method(method) => {
                        if !kwargs.is_empty() {
                            return Err(RunError::bad_call(
                                method.kind.to_string(),
                                "takes no keyword arguments",
                            ));
                        }
                        let result = attrs::call_method(&method, args)?;
                        env.push(result);
                        Ok(Control::Done(step_info_expr(code, id)))
                    }
                    Value::Func(func) => {
                        bind_arguments(env, &func, args, kwargs)?;
                        call.stack_mark = env.stack_len();
                        let body_frame = Frame {
                            code: func.code.clone(),
                            kind: FrameKind::Block {
                                stmts: func.body.clone(),
                                index: 0,
                            },
                        };
                        call.stage = CallStage::Exit;
                        Ok(Control::Next(Some(body_frame)))
                    }
                    other => Err(RunError::runtime(format!(
                        "'{}' object is not callable",
                        other.type_name()
                    ))),
                }
            }
            CallStage::Exit => {
                // The body left at most its return value above the mark; any
                // extra residue from multiple returns is discarded.
                let result = if env.stack_len() > call.stack_mark {
                    let value = pop(env)?;
                    env.truncate_stack(call.stack_mark);
                    value
                } else {
                    Value::None
                };
                env.pop_scope()?;
                env.push(result);
                Ok(Control::Done(step_info_expr(code, id)))
            }
        }
    }

    /// Dispatches a host callable: native built-ins take the positional
    /// list directly; external functions receive a [`HostCall`], with the
    /// interpreter and environment injected when the function is annotated.
    fn call_host_fn(
        &self,
        host_fn: &HostFn,
        args: Vec<Value>,
        kwargs: AIndexMap<String, Value>,
        env: &mut Env,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Value> {
        match &host_fn.kind {
            HostFnKind::Builtin(kind) => {
                if !kwargs.is_empty() {
                    return Err(RunError::bad_call(
                        host_fn.name(),
                        "takes no keyword arguments",
                    ));
                }
                kind.call(args)
            }
            HostFnKind::External { func, .. } => {
                let annotated = host_fn.annotated;
                let mut call = HostCall {
                    args,
                    kwargs,
                    interp: annotated.then_some(self),
                    env: annotated.then_some(env),
                    print,
                };
                func(&mut call)
            }
        }
    }
}

/// The resumable activation stack for one program run.
///
/// Owned by the caller rather than the environment so a host can abandon it
/// between steps without leaking guest state: scopes and the evaluation
/// stack are plain data in the [`Env`].
#[derive(Debug)]
pub struct Stepper {
    frames: Vec<Frame>,
    signal: Option<LoopSignal>,
    /// Scope depth at creation; errors unwind back to this depth.
    base_scopes: usize,
}

/// What a frame's sub-step decided.
enum Control {
    /// The frame continues; optionally a child frame runs first.
    Next(Option<Frame>),
    /// The frame completed and reports an observable step.
    Done(StepInfo),
    /// The frame completed silently.
    DoneQuiet,
    /// The frame completed and raises a loop control signal.
    Signal(LoopSignal, StepInfo),
}

/// One activation record: the node being evaluated plus its progress.
#[derive(Debug)]
struct Frame {
    code: Rc<Code>,
    kind: FrameKind,
}

#[derive(Debug)]
enum FrameKind {
    Program {
        index: usize,
    },
    Block {
        stmts: Vec<StmtId>,
        index: usize,
    },
    Pass,
    ExprStmt {
        expr: ExprId,
        state: u8,
    },
    Assign {
        stmt: StmtId,
        state: u8,
    },
    AugAssign {
        stmt: StmtId,
        state: u8,
    },
    Print {
        stmt: StmtId,
        index: usize,
        out: String,
        needs_space: bool,
    },
    If {
        stmt: StmtId,
        state: u8,
    },
    While {
        stmt: StmtId,
        state: u8,
    },
    For {
        stmt: StmtId,
        state: u8,
        elements: Vec<Value>,
        index: usize,
    },
    FunctionDef {
        stmt: StmtId,
        index: usize,
        defaults: Vec<Value>,
    },
    Return {
        stmt: StmtId,
        state: u8,
    },
    Global {
        stmt: StmtId,
    },
    LoopJump {
        stmt: StmtId,
        signal: LoopSignal,
    },
    Eval {
        expr: ExprId,
        state: EvalState,
    },
}

/// Progress of a composite expression evaluation.
#[derive(Debug)]
enum EvalState {
    BinOp(u8),
    BoolOp { index: usize },
    UnaryOp(u8),
    Compare { index: usize },
    Call(CallState),
    Dict { index: usize },
    Sequence { index: usize, tuple: bool },
    Attribute(u8),
    Subscript { step: u8 },
}

/// Progress of a function-call evaluation.
#[derive(Debug)]
struct CallState {
    stage: CallStage,
    args: Vec<Value>,
    kwargs: AIndexMap<String, Value>,
    callee: Option<Value>,
    stack_mark: usize,
}

#[derive(Debug)]
enum CallStage {
    Args { index: usize },
    Kwargs { index: usize },
    Callee,
    CalleePop,
    Enter,
    Exit,
}

impl Frame {
    fn block(code: Rc<Code>, stmts: Vec<StmtId>) -> Self {
        Self {
            code,
            kind: FrameKind::Block { stmts, index: 0 },
        }
    }

    fn for_stmt(code: Rc<Code>, id: StmtId) -> Self {
        let kind = match &code.stmt(id).stmt {
            Stmt::Pass => FrameKind::Pass,
            Stmt::Expr(expr) => FrameKind::ExprStmt { expr: *expr, state: 0 },
            Stmt::Assign { .. } => FrameKind::Assign { stmt: id, state: 0 },
            Stmt::AugAssign { .. } => FrameKind::AugAssign { stmt: id, state: 0 },
            Stmt::Print { .. } => FrameKind::Print {
                stmt: id,
                index: 0,
                out: String::new(),
                needs_space: false,
            },
            Stmt::If { .. } => FrameKind::If { stmt: id, state: 0 },
            Stmt::While { .. } => FrameKind::While { stmt: id, state: 0 },
            Stmt::For { .. } => FrameKind::For {
                stmt: id,
                state: 0,
                elements: Vec::new(),
                index: 0,
            },
            Stmt::FunctionDef { .. } => FrameKind::FunctionDef {
                stmt: id,
                index: 0,
                defaults: Vec::new(),
            },
            Stmt::Return { .. } => FrameKind::Return { stmt: id, state: 0 },
            Stmt::Global { .. } => FrameKind::Global { stmt: id },
            Stmt::Break => FrameKind::LoopJump {
                stmt: id,
                signal: LoopSignal::Break,
            },
            Stmt::Continue => FrameKind::LoopJump {
                stmt: id,
                signal: LoopSignal::Continue,
            },
        };
        Self { code, kind }
    }

    fn for_expr(code: Rc<Code>, id: ExprId, expr: &Expr) -> Self {
        let state = match expr {
            Expr::BinOp { .. } => EvalState::BinOp(0),
            Expr::BoolOp { .. } => EvalState::BoolOp { index: 0 },
            Expr::UnaryOp { .. } => EvalState::UnaryOp(0),
            Expr::Compare { .. } => EvalState::Compare { index: 0 },
            Expr::Call { .. } => EvalState::Call(CallState {
                stage: CallStage::Args { index: 0 },
                args: Vec::new(),
                kwargs: AIndexMap::default(),
                callee: None,
                stack_mark: 0,
            }),
            Expr::Dict { .. } => EvalState::Dict { index: 0 },
            Expr::Tuple { .. } => EvalState::Sequence { index: 0, tuple: true },
            Expr::List { .. } => EvalState::Sequence { index: 0, tuple: false },
            Expr::Attribute { .. } => EvalState::Attribute(0),
            Expr::Subscript { .. } => EvalState::Subscript { step: 0 },
            _ => unreachable!("base expressions are evaluated inline"),
        };
        Self {
            code,
            kind: FrameKind::Eval { expr: id, state },
        }
    }

    /// Reacts to a pending break/continue signal travelling up the stack.
    ///
    /// Plain body frames unwind; loop frames absorb the signal; function
    /// and top-level boundaries reject it.
    fn handle_signal(&mut self, signal: LoopSignal, stepper: &mut Stepper) -> RunResult<Control> {
        match &mut self.kind {
            FrameKind::While { state, .. } => {
                stepper.signal = None;
                match signal {
                    // Break skips the loop's else-branch entirely.
                    LoopSignal::Break => Ok(Control::DoneQuiet),
                    LoopSignal::Continue => {
                        *state = 0;
                        Ok(Control::Next(None))
                    }
                }
            }
            FrameKind::For { .. } => {
                stepper.signal = None;
                match signal {
                    LoopSignal::Break => Ok(Control::DoneQuiet),
                    // The For frame is parked at its element loop; advancing
                    // it picks up the next element.
                    LoopSignal::Continue => Ok(Control::Next(None)),
                }
            }
            FrameKind::Program { .. } => Err(outside_loop_error(signal)),
            FrameKind::Eval {
                state: EvalState::Call(call),
                ..
            } if matches!(call.stage, CallStage::Exit) => Err(outside_loop_error(signal)),
            _ => Ok(Control::DoneQuiet),
        }
    }
}

fn outside_loop_error(signal: LoopSignal) -> RunError {
    let keyword = match signal {
        LoopSignal::Break => "break",
        LoopSignal::Continue => "continue",
    };
    RunError::runtime(format!("'{keyword}' outside loop"))
}

fn pop(env: &mut Env) -> RunResult<Value> {
    env.pop()
        .ok_or_else(|| RunError::runtime("evaluation stack underflow"))
}

fn bind_target(env: &mut Env, target: &Target, value: Value) -> RunResult<()> {
    match target {
        Target::Name(name) => env.set_var(name, value),
        Target::Tuple(names) => {
            let items = match value {
                Value::List(items) | Value::Tuple(items) => items,
                other => {
                    return Err(RunError::runtime(format!(
                        "cannot unpack '{}' into {} names",
                        other.type_name(),
                        names.len()
                    )));
                }
            };
            if items.len() != names.len() {
                return Err(RunError::runtime(format!(
                    "cannot unpack {} values into {} names",
                    items.len(),
                    names.len()
                )));
            }
            for (name, item) in names.iter().zip(items) {
                env.set_var(name, item)?;
            }
            Ok(())
        }
    }
}

/// Binds a loop target; tuple targets require each element to be a
/// sequence of matching length.
fn bind_loop_target(env: &mut Env, target: &Target, element: Value) -> RunResult<()> {
    match target {
        Target::Name(name) => env.set_var(name, element),
        Target::Tuple(_) => {
            let items = ops::iter_elements(&element)?;
            bind_target(env, target, Value::List(items))
        }
    }
}

fn step_info_stmt(code: &Rc<Code>, id: StmtId) -> StepInfo {
    let node = code.stmt(id);
    StepInfo {
        loc: node.loc,
        kind: node.stmt.kind_name(),
    }
}

fn step_info_expr(code: &Rc<Code>, id: ExprId) -> StepInfo {
    let node = code.expr(id);
    StepInfo {
        loc: node.loc,
        kind: node.expr.kind_name(),
    }
}
