use std::fmt;

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Source rejected by the parser front-end or the subset validator.
///
/// Both syntactically invalid input and AST node kinds outside the accepted
/// subset surface as this error, carrying the offending location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The parser could not produce an AST at all.
    Syntax {
        message: String,
        line: u32,
        column: u32,
    },
    /// The AST contains a node kind the interpreter does not accept.
    UnsupportedNode {
        node: String,
        line: u32,
        column: u32,
    },
}

impl ParseError {
    pub(crate) fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        Self::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    pub(crate) fn unsupported(node: impl Into<String>, line: u32, column: u32) -> Self {
        Self::UnsupportedNode {
            node: node.into(),
            line,
            column,
        }
    }

    /// Line of the offending token or node (1-based).
    #[must_use]
    pub fn line(&self) -> u32 {
        match self {
            Self::Syntax { line, .. } | Self::UnsupportedNode { line, .. } => *line,
        }
    }

    /// Column of the offending token or node (0-based).
    #[must_use]
    pub fn column(&self) -> u32 {
        match self {
            Self::Syntax { column, .. } | Self::UnsupportedNode { column, .. } => *column,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax { message, line, column } => {
                write!(f, "bad syntax at line {line}:{column}: {message}")
            }
            Self::UnsupportedNode { node, line, column } => {
                write!(f, "bad syntax at line {line}:{column}: node '{node}'")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Faults detected while evaluating validated code.
///
/// `RunError` deliberately stays a closed taxonomy: the REPL and the CLI
/// match on it for user feedback, and tests assert on specific variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// Name lookup failed in every scope and in the built-ins table.
    SymbolNotFound { name: String },
    /// Attempt to bind a name starting with an underscore.
    BadSymbolName { name: String },
    /// Arity mismatch, double assignment, or unknown keyword during call binding.
    BadFunctionCall { func: String, reason: String },
    /// Attribute access where the attribute name starts with an underscore.
    InvalidAttribute { attr: String },
    /// Attempt to pop the global scope.
    ContextsEmpty,
    /// Any other evaluator-detected fault.
    Runtime(String),
}

impl RunError {
    pub(crate) fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime(message.into())
    }

    pub(crate) fn bad_call(func: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadFunctionCall {
            func: func.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SymbolNotFound { name } => write!(f, "symbol '{name}' not found in environment"),
            Self::BadSymbolName { name } => write!(f, "bad symbol name: '{name}'"),
            Self::BadFunctionCall { func, reason } => write!(f, "bad function call: '{func}': {reason}"),
            Self::InvalidAttribute { attr } => write!(f, "invalid attribute '{attr}'"),
            Self::ContextsEmpty => write!(f, "no context left in environment"),
            Self::Runtime(cause) => write!(f, "runtime error: {cause}"),
        }
    }
}

impl std::error::Error for RunError {}

/// Error type spanning the whole pipeline, separating failures by stage.
///
/// Keeping parse and runtime failures distinct lets callers handle user
/// feedback and recovery accurately without string matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Parsing or subset validation failed before evaluation.
    Parse(ParseError),
    /// The evaluator raised an error while running.
    Run(RunError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(error) => write!(f, "{error}"),
            Self::Run(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Self::Parse(error)
    }
}

impl From<RunError> for Error {
    fn from(error: RunError) -> Self {
        Self::Run(error)
    }
}
