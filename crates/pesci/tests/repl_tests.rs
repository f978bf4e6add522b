//! REPL behavior tests: session persistence, value echo, and the
//! line-accumulation protocol.

use pesci::{CollectStringPrint, Error, InputBuffer, InputEvent, ReplSession, RunError};
use pretty_assertions::assert_eq;

fn execute(session: &mut ReplSession, source: &str) -> String {
    let mut print = CollectStringPrint::new();
    session.execute(source, &mut print).expect("input should run");
    print.into_output()
}

// =============================================================================
// Session behavior
// =============================================================================

#[test]
fn bare_expressions_echo_their_value() {
    let mut session = ReplSession::new();
    assert_eq!(execute(&mut session, "1 + 2"), "3\n");
}

#[test]
fn assignments_echo_nothing() {
    let mut session = ReplSession::new();
    assert_eq!(execute(&mut session, "x = 42"), "");
}

#[test]
fn none_values_are_not_echoed() {
    let mut session = ReplSession::new();
    assert_eq!(execute(&mut session, "None"), "");
}

#[test]
fn variables_persist_across_inputs() {
    let mut session = ReplSession::new();
    execute(&mut session, "x = 42");
    assert_eq!(execute(&mut session, "x + 1"), "43\n");
}

#[test]
fn functions_persist_across_inputs() {
    let mut session = ReplSession::new();
    execute(&mut session, "def double(n):\n    return n * 2\n");
    assert_eq!(execute(&mut session, "double(21)"), "42\n");
}

#[test]
fn echo_uses_the_str_form() {
    let mut session = ReplSession::new();
    assert_eq!(execute(&mut session, "'hi'"), "hi\n");
    assert_eq!(execute(&mut session, "['hi']"), "['hi']\n");
}

#[test]
fn global_declarations_persist_within_functions() {
    let mut session = ReplSession::new();
    execute(&mut session, "x = 0");
    execute(&mut session, "def bump():\n    global x\n    x = x + 1\n");
    execute(&mut session, "bump()");
    execute(&mut session, "bump()");
    assert_eq!(execute(&mut session, "x"), "2\n");
}

#[test]
fn errors_leave_the_session_usable() {
    let mut session = ReplSession::new();
    let mut print = CollectStringPrint::new();
    let error = session
        .execute("print(nope)", &mut print)
        .expect_err("unknown name should fail");
    assert!(matches!(error, Error::Run(RunError::SymbolNotFound { .. })));
    assert_eq!(execute(&mut session, "1 + 1"), "2\n");
}

#[test]
fn underscore_binding_error_surfaces_through_the_session() {
    let mut session = ReplSession::new();
    let mut print = CollectStringPrint::new();
    let error = session
        .execute("_x = 1", &mut print)
        .expect_err("underscore names are reserved");
    assert!(matches!(error, Error::Run(RunError::BadSymbolName { .. })));
}

#[test]
fn parse_errors_surface_through_the_session() {
    let mut session = ReplSession::new();
    let mut print = CollectStringPrint::new();
    let error = session
        .execute("import os", &mut print)
        .expect_err("imports are outside the subset");
    assert!(matches!(error, Error::Parse(_)));
}

#[test]
fn banner_names_the_version() {
    assert!(ReplSession::banner().contains(env!("CARGO_PKG_VERSION")));
}

// =============================================================================
// Input accumulation protocol
// =============================================================================

#[test]
fn simple_lines_are_ready_immediately() {
    let mut buffer = InputBuffer::new();
    assert_eq!(buffer.prompt(), ">>> ");
    assert_eq!(buffer.push_line("x = 1"), InputEvent::Ready("x = 1".to_owned()));
}

#[test]
fn colon_lines_open_a_block() {
    let mut buffer = InputBuffer::new();
    assert_eq!(buffer.push_line("def f():"), InputEvent::Incomplete);
    assert_eq!(buffer.prompt(), "... ");
    assert_eq!(buffer.push_line("    return 1"), InputEvent::Incomplete);
    let ready = buffer.push_line("");
    assert_eq!(ready, InputEvent::Ready("def f():\n    return 1\n".to_owned()));
    assert_eq!(buffer.prompt(), ">>> ");
}

#[test]
fn nested_blocks_keep_accumulating() {
    let mut buffer = InputBuffer::new();
    assert_eq!(buffer.push_line("for i in range(3):"), InputEvent::Incomplete);
    assert_eq!(buffer.push_line("    if i == 1:"), InputEvent::Incomplete);
    assert_eq!(buffer.push_line("        print(i)"), InputEvent::Incomplete);
    assert!(matches!(buffer.push_line(""), InputEvent::Ready(_)));
}

#[test]
fn exit_ends_the_session() {
    let mut buffer = InputBuffer::new();
    assert_eq!(buffer.push_line("exit"), InputEvent::Exit);
}

#[test]
fn exit_inside_a_block_is_just_a_line() {
    let mut buffer = InputBuffer::new();
    assert_eq!(buffer.push_line("if x:"), InputEvent::Incomplete);
    assert_eq!(buffer.push_line("exit"), InputEvent::Incomplete);
}

#[test]
fn interrupt_clears_pending_input() {
    let mut buffer = InputBuffer::new();
    assert_eq!(buffer.push_line("while True:"), InputEvent::Incomplete);
    buffer.interrupt();
    assert_eq!(buffer.prompt(), ">>> ");
    assert_eq!(buffer.push_line("1"), InputEvent::Ready("1".to_owned()));
}

#[test]
fn blank_lines_at_the_prompt_are_ignored() {
    let mut buffer = InputBuffer::new();
    assert_eq!(buffer.push_line(""), InputEvent::Incomplete);
    assert_eq!(buffer.prompt(), ">>> ");
}

#[test]
fn accumulated_blocks_execute_in_a_session() {
    let mut buffer = InputBuffer::new();
    let mut session = ReplSession::new();
    let mut output = String::new();
    for line in ["def triple(n):", "    return n * 3", "", "triple(14)"] {
        if let InputEvent::Ready(input) = buffer.push_line(line) {
            output.push_str(&execute(&mut session, &input));
        }
    }
    assert_eq!(output, "42\n");
}
