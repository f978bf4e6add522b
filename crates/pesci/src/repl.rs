//! Persistent REPL session support.
//!
//! [`ReplSession`] keeps interpreter state across `execute()` calls so
//! interactive snippets share variables and functions. [`InputBuffer`]
//! implements the line protocol: a line ending in a colon opens a compound
//! statement, further lines accumulate until an empty line completes the
//! block, and the literal command `exit` ends the session.

use std::rc::Rc;

use crate::{
    environment::Env,
    errors::Error,
    interpreter::Interpreter,
    io::PrintWriter,
    parse::parse_source,
};

/// A persistent interactive session: one interpreter plus one environment.
#[derive(Debug)]
pub struct ReplSession {
    interp: Interpreter,
    env: Env,
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplSession {
    /// Creates a session with an interactive interpreter: non-None values
    /// of bare expression statements are echoed to the print writer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new_interactive())
    }

    /// Creates a session around a pre-configured interpreter (for hosts
    /// that register extra built-ins first).
    #[must_use]
    pub fn with_interpreter(interp: Interpreter) -> Self {
        let env = interp.create_env();
        Self { interp, env }
    }

    #[must_use]
    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interp
    }

    #[must_use]
    pub fn env(&self) -> &Env {
        &self.env
    }

    /// Parses and runs one complete input. Variables, functions, and
    /// global declarations persist to the next call; the evaluation stack
    /// is drained regardless of outcome.
    pub fn execute(&mut self, source: &str, print: &mut dyn PrintWriter) -> Result<(), Error> {
        let code = Rc::new(parse_source(source)?);
        self.interp.run(&mut self.env, &code, print)?;
        Ok(())
    }

    /// The session start-up banner.
    #[must_use]
    pub fn banner() -> String {
        format!(
            "Pesci {} sandboxed interpreter\nType 'exit' to end interactive mode\n",
            env!("CARGO_PKG_VERSION")
        )
    }
}

/// Outcome of feeding one line to the [`InputBuffer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// More lines are needed (or the line was empty noise).
    Incomplete,
    /// A complete input is ready to parse and run.
    Ready(String),
    /// The user asked to leave the session.
    Exit,
}

/// Accumulates prompt lines into complete inputs.
#[derive(Debug, Default)]
pub struct InputBuffer {
    partial: String,
}

impl InputBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The prompt to display: `>>> ` normally, `... ` while a compound
    /// statement is pending.
    #[must_use]
    pub fn prompt(&self) -> &'static str {
        if self.partial.is_empty() { ">>> " } else { "... " }
    }

    /// Feeds one input line and reports whether a complete input is ready.
    pub fn push_line(&mut self, line: &str) -> InputEvent {
        let trimmed = line.trim();
        if trimmed.ends_with(':') {
            self.partial.push_str(line);
            self.partial.push('\n');
            return InputEvent::Incomplete;
        }
        if !self.partial.is_empty() {
            if trimmed.is_empty() {
                // An empty line completes the pending block.
                return InputEvent::Ready(std::mem::take(&mut self.partial));
            }
            self.partial.push_str(line);
            self.partial.push('\n');
            return InputEvent::Incomplete;
        }
        if trimmed == "exit" {
            return InputEvent::Exit;
        }
        if trimmed.is_empty() {
            return InputEvent::Incomplete;
        }
        InputEvent::Ready(line.to_owned())
    }

    /// Drops any pending partial input (interrupt handling).
    pub fn interrupt(&mut self) {
        self.partial.clear();
    }
}
