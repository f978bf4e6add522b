//! End-to-end interpreter tests: the evaluator is driven over complete
//! programs and asserted through collected print output.

use std::{cell::Cell, cell::RefCell, rc::Rc};

use pesci::{
    CollectStringPrint, HostCall, HostFn, Interpreter, RunError, RunResult, StepProgress, Value, parse_source,
};
use pretty_assertions::assert_eq;

/// Parses and runs a program, returning everything it printed.
fn run_program(source: &str) -> String {
    let code = Rc::new(parse_source(source).expect("program should parse"));
    let interp = Interpreter::new();
    let mut env = interp.create_env();
    let mut print = CollectStringPrint::new();
    interp.run(&mut env, &code, &mut print).expect("program should run");
    print.into_output()
}

/// Parses and runs a program expected to fail, returning the error.
fn run_error(source: &str) -> RunError {
    let code = Rc::new(parse_source(source).expect("program should parse"));
    let interp = Interpreter::new();
    let mut env = interp.create_env();
    let mut print = CollectStringPrint::new();
    interp
        .run(&mut env, &code, &mut print)
        .expect_err("program should fail")
}

// =============================================================================
// Arithmetic and expressions
// =============================================================================

#[test]
fn arithmetic_with_precedence() {
    assert_eq!(run_program("a = 3\nb = 4\nprint(a + b * 2)"), "11\n");
}

#[test]
fn division_yields_float_floor_div_stays_int() {
    assert_eq!(run_program("print(7 / 2, 7 // 2, 7 % 3, 2 ** 10)"), "3.5 3 1 1024\n");
}

#[test]
fn mixed_int_float_promotes() {
    assert_eq!(run_program("print(1 + 0.5, 2 * 2.0)"), "1.5 4.0\n");
}

#[test]
fn big_integers_do_not_overflow() {
    assert_eq!(
        run_program("print(2 ** 100)"),
        "1267650600228229401496703205376\n"
    );
}

#[test]
fn bitwise_and_shifts() {
    assert_eq!(run_program("print(6 & 3, 6 | 3, 6 ^ 3, 1 << 10, ~5)"), "2 7 5 1024 -6\n");
}

#[test]
fn chained_comparisons_are_conjunctions() {
    assert_eq!(
        run_program("print(1 < 2 < 3, 3 < 2 < 1, (1 < 2) < 3)"),
        "True False True\n"
    );
}

#[test]
fn equality_chains() {
    assert_eq!(run_program("a = 2\nprint(a == 2 == 2, a == 2 == 3)"), "True False\n");
}

#[test]
fn membership_and_identity() {
    assert_eq!(
        run_program("print(2 in [1, 2], 5 not in (1, 2), 'el' in 'hello', None is None)"),
        "True True True True\n"
    );
}

// =============================================================================
// Assignment
// =============================================================================

#[test]
fn augmented_assignment() {
    assert_eq!(run_program("x = 1\nx += 4\nx *= 2\nprint(x)"), "10\n");
}

#[test]
fn destructuring_assignment_binds_positionally() {
    assert_eq!(run_program("a, b = [1, 2]\nprint(a, b)"), "1 2\n");
    assert_eq!(run_program("c, d = (3, 4)\nprint(c, d)"), "3 4\n");
}

#[test]
fn destructuring_length_mismatch_fails() {
    let error = run_error("a, b = [1, 2, 3]");
    assert!(matches!(error, RunError::Runtime(_)), "got: {error:?}");
}

// =============================================================================
// Control flow
// =============================================================================

#[test]
fn nested_loops_with_conditional() {
    assert_eq!(
        run_program("for i in range(3):\n    for j in range(3):\n        if i == j: print(i, j)"),
        "0 0\n1 1\n2 2\n"
    );
}

#[test]
fn while_else_runs_once_after_loop() {
    assert_eq!(
        run_program("i = 0\nwhile i < 3:\n    i = i + 1\nelse:\n    print('done')\nprint(i)"),
        "done\n3\n"
    );
}

#[test]
fn while_condition_uses_truthiness() {
    // A falsy non-bool condition must not enter the body.
    assert_eq!(
        run_program("while '':\n    print('never')\nelse:\n    print('skipped')"),
        "skipped\n"
    );
}

#[test]
fn break_exits_loop_and_skips_else() {
    assert_eq!(
        run_program("while True:\n    break\nelse:\n    print('no')\nprint('out')"),
        "out\n"
    );
}

#[test]
fn continue_skips_to_next_iteration() {
    assert_eq!(
        run_program("total = 0\nfor i in range(5):\n    if i == 2: continue\n    total += i\nprint(total)"),
        "8\n"
    );
}

#[test]
fn break_outside_loop_is_an_error() {
    let error = run_error("break");
    assert!(matches!(error, RunError::Runtime(_)), "got: {error:?}");
}

#[test]
fn for_loop_destructures_tuple_targets() {
    assert_eq!(
        run_program("for k, v in [(1, 'a'), (2, 'b')]:\n    print(k, v)"),
        "1 a\n2 b\n"
    );
}

#[test]
fn for_loop_iterates_strings_and_dict_keys() {
    assert_eq!(run_program("for c in 'ab':\n    print(c)"), "a\nb\n");
    assert_eq!(run_program("d = {'x': 1}\nfor k in d:\n    print(k)"), "x\n");
}

#[test]
fn for_else_runs_after_normal_completion() {
    assert_eq!(
        run_program("for i in range(2):\n    pass\nelse:\n    print('finished')"),
        "finished\n"
    );
}

// =============================================================================
// Functions
// =============================================================================

#[test]
fn defaults_bind_the_trailing_parameters() {
    assert_eq!(
        run_program("def f(x, y=10):\n    return x - y\nprint(f(3), f(3, 1))"),
        "-7 2\n"
    );
}

#[test]
fn variadic_and_keyword_rest_parameters() {
    assert_eq!(
        run_program("def g(*xs, **kw):\n    return (sum(xs), sorted(kw.keys()))\nprint(g(1, 2, 3, a=1, b=2))"),
        "(6, ['a', 'b'])\n"
    );
}

#[test]
fn global_declaration_writes_the_global_scope() {
    assert_eq!(
        run_program("x = 0\ndef h():\n    global x\n    x = 5\nh()\nprint(x)"),
        "5\n"
    );
}

#[test]
fn without_global_assignment_stays_local() {
    assert_eq!(
        run_program("x = 0\ndef h():\n    x = 5\n    return x\nprint(h(), x)"),
        "5 0\n"
    );
}

#[test]
fn star_argument_is_fetched_by_name() {
    assert_eq!(
        run_program("def add(a, b, c):\n    return a + b + c\nxs = [1, 2, 3]\nprint(add(*xs))"),
        "6\n"
    );
}

#[test]
fn double_star_argument_merges_keywords() {
    assert_eq!(
        run_program("def f(a, b):\n    return a - b\nkw = {'a': 9, 'b': 4}\nprint(f(**kw))"),
        "5\n"
    );
}

#[test]
fn keyword_overrides_default_but_not_positional() {
    assert_eq!(
        run_program("def f(x, y=10, z=20):\n    return (x, y, z)\nprint(f(1, z=2))"),
        "(1, 10, 2)\n"
    );
}

#[test]
fn missing_argument_is_a_bad_function_call() {
    let error = run_error("def f(x):\n    return x\nf()");
    assert!(matches!(error, RunError::BadFunctionCall { .. }), "got: {error:?}");
}

#[test]
fn double_assignment_is_a_bad_function_call() {
    let error = run_error("def f(x):\n    return x\nf(1, x=2)");
    assert!(matches!(error, RunError::BadFunctionCall { .. }), "got: {error:?}");
}

#[test]
fn unknown_keyword_without_rest_is_a_bad_function_call() {
    let error = run_error("def f(x):\n    return x\nf(1, q=2)");
    assert!(matches!(error, RunError::BadFunctionCall { .. }), "got: {error:?}");
}

#[test]
fn recursion_through_branches() {
    assert_eq!(
        run_program(
            "def fact(n):\n    if n < 2:\n        return 1\n    else:\n        return n * fact(n - 1)\nprint(fact(10))"
        ),
        "3628800\n"
    );
}

#[test]
fn function_with_no_return_yields_none() {
    assert_eq!(run_program("def f():\n    pass\nprint(f())"), "None\n");
}

#[test]
fn functions_are_first_class_values() {
    assert_eq!(
        run_program("def f(x):\n    return x + 1\ng = f\nprint(g(41))"),
        "42\n"
    );
}

#[test]
fn scope_is_restored_after_a_call() {
    let code = Rc::new(
        parse_source("x = 1\ndef f():\n    y = 2\n    return y\nr = f()").expect("program should parse"),
    );
    let interp = Interpreter::new();
    let mut env = interp.create_env();
    let mut print = CollectStringPrint::new();
    interp.run(&mut env, &code, &mut print).expect("program should run");
    let visible = env.visible_context();
    assert!(visible.contains_key("x"));
    assert!(visible.contains_key("f"));
    assert!(visible.contains_key("r"));
    assert!(!visible.contains_key("y"), "callee locals must not leak");
}

// =============================================================================
// Containers, attributes, subscripts
// =============================================================================

#[test]
fn dict_literal_lookup_and_methods() {
    assert_eq!(
        run_program("d = {'a': 1, 'b': 2}\nprint(d['a'], d.get('c', 9), len(d), d.has_key('b'))"),
        "1 9 2 True\n"
    );
}

#[test]
fn dict_items_preserve_insertion_order() {
    assert_eq!(
        run_program("d = {'b': 2, 'a': 1}\nprint(d.items())"),
        "[('b', 2), ('a', 1)]\n"
    );
}

#[test]
fn slicing_with_defaults_and_steps() {
    assert_eq!(
        run_program("l = range(10)\nprint(l[2:5], l[::2][0:3], 'hello'[1:4], l[-2:])"),
        "[2, 3, 4] [0, 2, 4] ell [8, 9]\n"
    );
}

#[test]
fn negative_indexing_wraps() {
    assert_eq!(run_program("l = [10, 20, 30]\nprint(l[-1], 'abc'[-2])"), "30 b\n");
}

#[test]
fn oversized_index_reports_out_of_range() {
    let error = run_error("l = [1]\nl[10 ** 30]");
    assert!(
        matches!(&error, RunError::Runtime(msg) if msg.contains("out of range")),
        "got: {error:?}"
    );
    assert_eq!(run_program("l = [1, 2, 3]\nprint(l[1:10 ** 30])"), "[2, 3]\n");
}

#[test]
fn string_methods() {
    assert_eq!(
        run_program("print('a,b,c'.split(','), ' x '.strip(), '-'.join(['a', 'b']), 'ab'.upper())"),
        "['a', 'b', 'c'] x a-b AB\n"
    );
}

#[test]
fn underscore_attribute_is_invalid() {
    let error = run_error("d = {'a': 1}\nd._hidden");
    assert!(matches!(error, RunError::InvalidAttribute { .. }), "got: {error:?}");
}

#[test]
fn underscore_binding_is_a_bad_symbol_name() {
    let error = run_error("_x = 1");
    assert!(matches!(error, RunError::BadSymbolName { .. }), "got: {error:?}");
}

#[test]
fn unknown_name_is_symbol_not_found() {
    let error = run_error("print(nope)");
    assert!(matches!(error, RunError::SymbolNotFound { .. }), "got: {error:?}");
}

// =============================================================================
// Built-ins
// =============================================================================

#[test]
fn numeric_builtins() {
    assert_eq!(
        run_program("print(min(3, 1, 2), max([1, 5]), abs(-3), sum([1, 2, 3], 10), round(2.5))"),
        "1 5 3 16 3.0\n"
    );
}

#[test]
fn conversion_builtins() {
    assert_eq!(
        run_program("print(int('42'), float('2.5'), str(7), bool([]), bin(5), hex(255), oct(8))"),
        "42 2.5 7 False 0b101 0xff 010\n"
    );
}

#[test]
fn sequence_builtins() {
    assert_eq!(
        run_program("print(sorted([3, 1, 2]), reversed([1, 2]), zip([1, 2], ['a', 'b']))"),
        "[1, 2, 3] [2, 1] [(1, 'a'), (2, 'b')]\n"
    );
}

#[test]
fn map_and_filter_with_builtin_callables() {
    assert_eq!(
        run_program("print(map(str, [1, 2]), filter(None, [0, 1, '', 'a']))"),
        "['1', '2'] [1, 'a']\n"
    );
}

#[test]
fn reduce_folds_left() {
    assert_eq!(run_program("print(reduce(max, [3, 1, 4, 1, 5]))"), "5\n");
}

#[test]
fn enumerate_pairs_indices() {
    assert_eq!(run_program("print(enumerate(['a', 'b']))"), "[(0, 'a'), (1, 'b')]\n");
}

#[test]
fn type_and_hash_builtins() {
    assert_eq!(run_program("print(type(3), type('s'))"), "<type 'int'> <type 'str'>\n");
    assert_eq!(run_program("print(hash(1) == hash(1.0) == hash(True))"), "True\n");
}

#[test]
fn none_resolves_through_the_builtins_table() {
    assert_eq!(run_program("x = None\nprint(x is None)"), "True\n");
}

#[test]
fn complex_is_present_but_rejected() {
    let error = run_error("complex(1, 2)");
    assert!(matches!(error, RunError::Runtime(_)), "got: {error:?}");
}

// =============================================================================
// Print statement semantics
// =============================================================================

#[test]
fn print_separates_values_with_single_spaces() {
    assert_eq!(run_program("print(1, 'a', 2.5)"), "1 a 2.5\n");
}

#[test]
fn trailing_newline_string_suppresses_separator() {
    assert_eq!(run_program("print('line\\n', 'next')"), "line\nnext\n");
}

#[test]
fn empty_print_emits_a_blank_line() {
    assert_eq!(run_program("print()"), "\n");
}

// =============================================================================
// Step contract
// =============================================================================

#[test]
fn each_step_increments_ip_by_one() {
    let code = Rc::new(parse_source("a = 1 + 2\nprint(a)").expect("program should parse"));
    let interp = Interpreter::new();
    let mut env = interp.create_env();
    env.setup();
    let mut stepper = interp.stepper(&code, &env);
    let mut print = CollectStringPrint::new();

    let mut steps = 0;
    loop {
        match interp.step(&mut env, &mut stepper, &mut print).expect("step should run") {
            StepProgress::Step(_) => {
                steps += 1;
                assert_eq!(env.ip, steps, "ip must advance once per step");
            }
            StepProgress::Ended => break,
        }
    }
    // BinOp, Assign, Print.
    assert_eq!(steps, 3);
    assert_eq!(print.output(), "3\n");
}

#[test]
fn ended_is_terminal_and_repeatable() {
    let code = Rc::new(parse_source("x = 1").expect("program should parse"));
    let interp = Interpreter::new();
    let mut env = interp.create_env();
    env.setup();
    let mut stepper = interp.stepper(&code, &env);
    let mut print = CollectStringPrint::new();
    loop {
        if matches!(
            interp.step(&mut env, &mut stepper, &mut print).expect("step should run"),
            StepProgress::Ended
        ) {
            break;
        }
    }
    assert!(matches!(
        interp.step(&mut env, &mut stepper, &mut print).expect("step should run"),
        StepProgress::Ended
    ));
}

#[test]
fn repeated_runs_are_deterministic() {
    let source = "d = {'b': 2, 'a': 1}\nfor k in d:\n    print(k, d[k], hash(k))";
    assert_eq!(run_program(source), run_program(source));
}

// =============================================================================
// Host function conventions
// =============================================================================

thread_local! {
    static TICKS: Cell<u32> = const { Cell::new(0) };
    static EVAL_ORDER: RefCell<Vec<&'static str>> = const { RefCell::new(Vec::new()) };
}

fn tick(_call: &mut HostCall<'_>) -> RunResult<Value> {
    TICKS.with(|c| c.set(c.get() + 1));
    Ok(Value::int(1))
}

fn log_left(_call: &mut HostCall<'_>) -> RunResult<Value> {
    EVAL_ORDER.with(|order| order.borrow_mut().push("left"));
    Ok(Value::int(1))
}

fn log_right(_call: &mut HostCall<'_>) -> RunResult<Value> {
    EVAL_ORDER.with(|order| order.borrow_mut().push("right"));
    Ok(Value::int(2))
}

fn probe(call: &mut HostCall<'_>) -> RunResult<Value> {
    let interp = call.interp.expect("annotated call injects the interpreter");
    let env = call.env.as_deref().expect("annotated call injects the environment");
    env.get_var("x", interp.builtins())
}

#[test]
fn boolean_operators_short_circuit() {
    TICKS.with(|c| c.set(0));
    let mut interp = Interpreter::new();
    interp.register("tick", Value::HostFn(HostFn::external("tick", tick)));
    let code = Rc::new(parse_source("a = tick() or tick()\nb = 0 and tick()").expect("program should parse"));
    let mut env = interp.create_env();
    let mut print = CollectStringPrint::new();
    interp.run(&mut env, &code, &mut print).expect("program should run");
    assert_eq!(TICKS.with(Cell::get), 1, "only the decisive operand may evaluate");
}

#[test]
fn comparators_evaluate_before_the_left_operand() {
    EVAL_ORDER.with(|order| order.borrow_mut().clear());
    let mut interp = Interpreter::new();
    interp.register("left", Value::HostFn(HostFn::external("left", log_left)));
    interp.register("right", Value::HostFn(HostFn::external("right", log_right)));
    let code = Rc::new(parse_source("left() < right()").expect("program should parse"));
    let mut env = interp.create_env();
    let mut print = CollectStringPrint::new();
    interp.run(&mut env, &code, &mut print).expect("program should run");
    EVAL_ORDER.with(|order| assert_eq!(*order.borrow(), vec!["right", "left"]));
}

#[test]
fn annotated_host_functions_receive_interpreter_and_env() {
    let mut interp = Interpreter::new();
    interp.register("probe", Value::HostFn(HostFn::external("probe", probe).annotated()));
    let code = Rc::new(parse_source("x = 7\nprint(probe())").expect("program should parse"));
    let mut env = interp.create_env();
    let mut print = CollectStringPrint::new();
    interp.run(&mut env, &code, &mut print).expect("program should run");
    assert_eq!(print.output(), "7\n");
}
