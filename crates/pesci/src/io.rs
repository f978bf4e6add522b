use std::io::{self, Write as _};

/// Trait for handling output produced by the guest `print` statement.
///
/// Implement this trait to capture or redirect output from sandboxed code.
/// The evaluator never writes to stdout directly; everything a program
/// prints (including REPL echo of bare expression values) goes through the
/// writer passed into `step`/`run`.
pub trait PrintWriter {
    /// Called once per printed line, without a trailing newline.
    fn print_line(&mut self, line: &str);
}

/// Default `PrintWriter` that writes to stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn print_line(&mut self, line: &str) {
        let mut stdout = io::stdout();
        let _ = writeln!(stdout, "{line}");
        let _ = stdout.flush();
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing print output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    /// Creates a new empty `CollectStringPrint`.
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Returns the collected output as a string slice.
    #[must_use]
    pub fn output(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn print_line(&mut self, line: &str) {
        self.0.push_str(line);
        self.0.push('\n');
    }
}

/// `PrintWriter` that ignores all output.
///
/// Useful for suppressing print output during testing.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn print_line(&mut self, _line: &str) {}
}
