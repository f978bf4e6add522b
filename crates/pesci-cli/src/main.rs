use std::{
    env, fs,
    io::{self, Write as _},
    process::ExitCode,
    rc::Rc,
};

use pesci::{
    HostCall, HostFn, InputBuffer, InputEvent, Interpreter, ReplSession, RunError, RunResult, StdPrint, Value,
    parse_source,
};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    if args.len() > 2 {
        eprintln!("Usage: {} [+][source file]", args[0]);
        eprintln!("NB: the plus sign enables debug mode");
        return ExitCode::FAILURE;
    }

    if args.len() == 1 {
        return run_interactive();
    }

    let (path, debug) = match args[1].strip_prefix('+') {
        Some(path) => (path, true),
        None => (args[1].as_str(), false),
    };
    run_file(path, debug)
}

fn run_file(path: &str, debug: bool) -> ExitCode {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error reading {path}: {err}");
            return ExitCode::FAILURE;
        }
    };

    let code = match parse_source(&source) {
        Ok(code) => Rc::new(code),
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    };

    if debug {
        println!("{}", code.source_listing());
        println!("{}", code.dump_tree());
        println!("{}", "*".repeat(20));
    }

    let interp = Interpreter::new();
    let mut env = interp.create_env();
    if let Err(err) = interp.run(&mut env, &code, &mut StdPrint) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    if debug {
        println!("{}", env.describe());
    }
    ExitCode::SUCCESS
}

fn run_interactive() -> ExitCode {
    let mut interp = Interpreter::new_interactive();
    interp.register("help", Value::HostFn(HostFn::external("help", pesci_help).annotated()));
    interp.register("dir", Value::HostFn(HostFn::external("dir", pesci_dir).annotated()));
    let mut session = ReplSession::with_interpreter(interp);

    print!("{}", ReplSession::banner());
    let mut buffer = InputBuffer::new();
    loop {
        let Some(line) = read_line(buffer.prompt()) else {
            println!();
            break;
        };
        match buffer.push_line(&line) {
            InputEvent::Incomplete => {}
            InputEvent::Exit => break,
            InputEvent::Ready(input) => {
                if let Err(err) = session.execute(&input, &mut StdPrint) {
                    eprintln!("{err}");
                }
            }
        }
    }
    ExitCode::SUCCESS
}

/// Prints a short usage hint.
fn pesci_help(call: &mut HostCall<'_>) -> RunResult<Value> {
    call.print.print_line("No help available. Try with 'dir()'.");
    Ok(Value::None)
}

/// Prints the visible environment through the injected env handle.
fn pesci_dir(call: &mut HostCall<'_>) -> RunResult<Value> {
    let Some(env) = call.env.as_deref() else {
        return Err(RunError::Runtime("dir() needs the environment handle".to_owned()));
    };
    let description = env.describe();
    call.print.print_line(&description);
    Ok(Value::None)
}

/// Reads one line from stdin after printing a prompt.
///
/// Returns `None` on EOF (Ctrl+D).
fn read_line(prompt: &str) -> Option<String> {
    print!("{prompt}");
    if io::stdout().flush().is_err() {
        return None;
    }
    let mut input = String::new();
    let read = io::stdin().read_line(&mut input).ok()?;
    if read == 0 {
        return None;
    }
    Some(input.trim_end_matches(['\r', '\n']).to_owned())
}
