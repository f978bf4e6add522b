//! Subset validation tests: out-of-subset node kinds and invalid syntax
//! must surface as parse errors carrying the node kind and line:column.

use std::rc::Rc;

use pesci::{CollectStringPrint, Interpreter, ParseError, RunError, parse_source};
use pretty_assertions::assert_eq;

fn unsupported_node(source: &str) -> (String, u32, u32) {
    match parse_source(source).expect_err("source should be rejected") {
        ParseError::UnsupportedNode { node, line, column } => (node, line, column),
        other => panic!("expected an unsupported-node error, got: {other:?}"),
    }
}

#[test]
fn import_is_outside_the_subset() {
    let (node, line, _) = unsupported_node("import os");
    assert_eq!(node, "Import");
    assert_eq!(line, 1);
}

#[test]
fn class_definitions_are_outside_the_subset() {
    let (node, _, _) = unsupported_node("class A:\n    pass");
    assert_eq!(node, "ClassDef");
}

#[test]
fn try_except_is_outside_the_subset() {
    let (node, _, _) = unsupported_node("try:\n    pass\nexcept:\n    pass");
    assert_eq!(node, "Try");
}

#[test]
fn lambda_is_outside_the_subset() {
    let (node, _, _) = unsupported_node("f = lambda x: x");
    assert_eq!(node, "Lambda");
}

#[test]
fn yield_is_outside_the_subset() {
    let (node, _, _) = unsupported_node("def f():\n    yield 1");
    assert_eq!(node, "Yield");
}

#[test]
fn matrix_multiply_is_outside_the_subset() {
    let (node, _, _) = unsupported_node("a = b @ c");
    assert_eq!(node, "MatMult");
}

#[test]
fn decorators_are_outside_the_subset() {
    let (node, _, _) = unsupported_node("@wrapper\ndef f():\n    pass");
    assert_eq!(node, "Decorator");
}

#[test]
fn fstrings_are_outside_the_subset() {
    let (node, _, _) = unsupported_node("x = f'{1}'");
    assert_eq!(node, "FString");
}

#[test]
fn error_location_points_at_the_offending_line() {
    let (node, line, column) = unsupported_node("x = 1\nimport os");
    assert_eq!(node, "Import");
    assert_eq!(line, 2);
    assert_eq!(column, 0);
}

#[test]
fn invalid_syntax_is_a_syntax_error() {
    let error = parse_source("def f(:").expect_err("source should be rejected");
    assert!(matches!(error, ParseError::Syntax { .. }), "got: {error:?}");
}

#[test]
fn error_messages_name_the_node_and_position() {
    let error = parse_source("import os").expect_err("source should be rejected");
    assert_eq!(error.to_string(), "bad syntax at line 1:0: node 'Import'");
}

#[test]
fn comprehensions_parse_but_do_not_evaluate() {
    // ListComp is in the accepted subset, but the evaluator has no rule
    // for it; the failure is a runtime error, not a parse error.
    let code = Rc::new(parse_source("x = [i for i in range(3)]").expect("comprehensions are accepted"));
    let interp = Interpreter::new();
    let mut env = interp.create_env();
    let mut print = CollectStringPrint::new();
    let error = interp
        .run(&mut env, &code, &mut print)
        .expect_err("evaluation should fail");
    assert!(matches!(error, RunError::Runtime(_)), "got: {error:?}");
}

#[test]
fn negative_literals_fold_through_unary_minus() {
    let code = Rc::new(parse_source("print(-1, -2.5)").expect("negative literals are accepted"));
    let interp = Interpreter::new();
    let mut env = interp.create_env();
    let mut print = CollectStringPrint::new();
    interp.run(&mut env, &code, &mut print).expect("program should run");
    assert_eq!(print.output(), "-1 -2.5\n");
}

#[test]
fn general_unary_minus_stays_outside_the_subset() {
    let (node, _, _) = unsupported_node("x = 1\ny = -x");
    assert_eq!(node, "USub");
}
