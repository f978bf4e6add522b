use std::fmt::Write as _;

use num_bigint::BigInt;

/// Source position of a node: 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loc {
    pub line: u32,
    pub column: u32,
}

impl Loc {
    pub(crate) fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Index of an expression node in the [`Code`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(u32);

/// Index of a statement node in the [`Code`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StmtId(u32);

/// Binary operators for arithmetic and bitwise operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Operator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mult,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "%")]
    Mod,
    #[strum(serialize = "**")]
    Pow,
    #[strum(serialize = "<<")]
    LShift,
    #[strum(serialize = ">>")]
    RShift,
    #[strum(serialize = "|")]
    BitOr,
    #[strum(serialize = "^")]
    BitXor,
    #[strum(serialize = "&")]
    BitAnd,
    #[strum(serialize = "//")]
    FloorDiv,
}

/// Short-circuit boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BoolOperator {
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
}

/// Unary operators in the accepted subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum UnaryOperator {
    #[strum(serialize = "not")]
    Not,
    #[strum(serialize = "~")]
    Invert,
}

/// Comparison operators; these always produce a bool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum CmpOperator {
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "<")]
    Lt,
    #[strum(serialize = "<=")]
    LtE,
    #[strum(serialize = ">")]
    Gt,
    #[strum(serialize = ">=")]
    GtE,
    #[strum(serialize = "is")]
    Is,
    #[strum(serialize = "is not")]
    IsNot,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "not in")]
    NotIn,
}

/// Target of a function call: a plain name (the common case, resolved in the
/// environment at call time) or an arbitrary callee expression.
#[derive(Debug, Clone, PartialEq)]
pub enum CallTarget {
    Name(String),
    Expr(ExprId),
}

/// Subscript index: a single expression or a lower/upper/step slice.
///
/// Absent slice components fall back to 0, the sequence length, and 1.
#[derive(Debug, Clone, PartialEq)]
pub enum Index {
    Single(ExprId),
    Slice {
        lower: Option<ExprId>,
        upper: Option<ExprId>,
        step: Option<ExprId>,
    },
}

/// An expression in the accepted subset.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(BigInt),
    Float(f64),
    Str(String),
    Bool(bool),
    NoneLit,
    Name(String),
    BinOp {
        left: ExprId,
        op: Operator,
        right: ExprId,
    },
    BoolOp {
        op: BoolOperator,
        values: Vec<ExprId>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: ExprId,
    },
    /// Chained comparison: a left operand and `(op, comparator)` pairs.
    ///
    /// All comparators are evaluated before the left operand and the chain
    /// is strict (no short-circuit), matching the stepwise evaluation order
    /// the interpreter exposes to single-stepping hosts.
    Compare {
        left: ExprId,
        ops: Vec<CmpOperator>,
        comparators: Vec<ExprId>,
    },
    Call {
        func: CallTarget,
        args: Vec<ExprId>,
        keywords: Vec<(String, ExprId)>,
        /// Splat list argument; fetched from the environment by name.
        star: Option<String>,
        /// Splat mapping argument; fetched from the environment by name.
        kstar: Option<String>,
    },
    Dict {
        keys: Vec<ExprId>,
        values: Vec<ExprId>,
    },
    Tuple {
        elts: Vec<ExprId>,
    },
    List {
        elts: Vec<ExprId>,
    },
    /// Read-only attribute access; underscore attributes are rejected.
    Attribute {
        value: ExprId,
        attr: String,
    },
    Subscript {
        value: ExprId,
        index: Index,
    },
    /// Accepted by the validator but carrying no evaluation rule.
    ListComp,
    /// Accepted by the validator but carrying no evaluation rule.
    DictComp,
    /// Accepted by the validator but carrying no evaluation rule.
    IfExp,
}

impl Expr {
    /// Node kind name used in step reporting and the debug tree dump.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "Num",
            Self::Float(_) => "Float",
            Self::Str(_) => "Str",
            Self::Bool(_) => "Bool",
            Self::NoneLit => "None",
            Self::Name(_) => "Name",
            Self::BinOp { .. } => "BinOp",
            Self::BoolOp { .. } => "BoolOp",
            Self::UnaryOp { .. } => "UnaryOp",
            Self::Compare { .. } => "Compare",
            Self::Call { .. } => "Call",
            Self::Dict { .. } => "Dict",
            Self::Tuple { .. } => "Tuple",
            Self::List { .. } => "List",
            Self::Attribute { .. } => "Attribute",
            Self::Subscript { .. } => "Subscript",
            Self::ListComp => "ListComp",
            Self::DictComp => "DictComp",
            Self::IfExp => "IfExp",
        }
    }
}

/// An expression with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub loc: Loc,
    pub expr: Expr,
}

/// Assignment or loop target: a single name or a flat pattern of names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Name(String),
    /// A list- or tuple-pattern of names, bound positionally.
    Tuple(Vec<String>),
}

/// A statement in the accepted subset.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Pass,
    Expr(ExprId),
    Assign {
        target: Target,
        value: ExprId,
    },
    AugAssign {
        target: String,
        op: Operator,
        value: ExprId,
    },
    /// Print statement: values joined by single spaces, except after a
    /// string value that already ends in a newline.
    Print {
        values: Vec<ExprId>,
    },
    If {
        test: ExprId,
        body: Vec<StmtId>,
        or_else: Vec<StmtId>,
    },
    While {
        test: ExprId,
        body: Vec<StmtId>,
        or_else: Vec<StmtId>,
    },
    For {
        target: Target,
        iter: ExprId,
        body: Vec<StmtId>,
        or_else: Vec<StmtId>,
    },
    FunctionDef {
        name: String,
        /// Positional parameter names in declaration order.
        params: Vec<String>,
        /// Default expressions for the last `defaults.len()` parameters.
        defaults: Vec<ExprId>,
        var_args: Option<String>,
        var_kwargs: Option<String>,
        body: Vec<StmtId>,
    },
    Return {
        value: Option<ExprId>,
    },
    Global {
        names: Vec<String>,
    },
    Break,
    Continue,
}

impl Stmt {
    /// Node kind name used in step reporting and the debug tree dump.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Pass => "Pass",
            Self::Expr(_) => "Expr",
            Self::Assign { .. } => "Assign",
            Self::AugAssign { .. } => "AugAssign",
            Self::Print { .. } => "Print",
            Self::If { .. } => "If",
            Self::While { .. } => "While",
            Self::For { .. } => "For",
            Self::FunctionDef { .. } => "FunctionDef",
            Self::Return { .. } => "Return",
            Self::Global { .. } => "Global",
            Self::Break => "Break",
            Self::Continue => "Continue",
        }
    }
}

/// A statement with its source location.
#[derive(Debug, Clone, PartialEq)]
pub struct StmtNode {
    pub loc: Loc,
    pub stmt: Stmt,
}

/// A validated program: node arenas plus the ordered top-level statements.
///
/// Statements and expressions live in flat arenas referenced by [`StmtId`] /
/// [`ExprId`]. The stepper's activation frames hold ids rather than
/// references, so a shared `Rc<Code>` handle is all that function values and
/// suspended steppers need to keep a program's nodes alive.
#[derive(Debug, Default)]
pub struct Code {
    exprs: Vec<ExprNode>,
    stmts: Vec<StmtNode>,
    body: Vec<StmtId>,
    source: String,
}

impl Code {
    pub(crate) fn new(source: String) -> Self {
        Self {
            exprs: Vec::new(),
            stmts: Vec::new(),
            body: Vec::new(),
            source,
        }
    }

    pub(crate) fn add_expr(&mut self, node: ExprNode) -> ExprId {
        let id = ExprId(u32::try_from(self.exprs.len()).expect("expression arena overflow"));
        self.exprs.push(node);
        id
    }

    pub(crate) fn add_stmt(&mut self, node: StmtNode) -> StmtId {
        let id = StmtId(u32::try_from(self.stmts.len()).expect("statement arena overflow"));
        self.stmts.push(node);
        id
    }

    pub(crate) fn set_body(&mut self, body: Vec<StmtId>) {
        self.body = body;
    }

    /// Looks up an expression node by id.
    #[must_use]
    pub fn expr(&self, id: ExprId) -> &ExprNode {
        &self.exprs[id.0 as usize]
    }

    /// Looks up a statement node by id.
    #[must_use]
    pub fn stmt(&self, id: StmtId) -> &StmtNode {
        &self.stmts[id.0 as usize]
    }

    /// The top-level statements in source order.
    #[must_use]
    pub fn body(&self) -> &[StmtId] {
        &self.body
    }

    /// The source text this program was parsed from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Renders the source with three-digit line numbers, one line per row.
    #[must_use]
    pub fn source_listing(&self) -> String {
        let mut out = String::new();
        for (number, line) in self.source.lines().enumerate() {
            let _ = writeln!(out, "{number:03}| {line}");
        }
        out
    }

    /// Renders the node tree, one node per line, indented by depth and
    /// annotated with the node's source line:column.
    #[must_use]
    pub fn dump_tree(&self) -> String {
        let mut out = String::new();
        for id in &self.body {
            self.dump_stmt(*id, 0, &mut out);
        }
        out
    }

    fn dump_stmt(&self, id: StmtId, indent: usize, out: &mut String) {
        let node = self.stmt(id);
        let _ = writeln!(
            out,
            "{:indent$}{} at {}:{}",
            "",
            node.stmt.kind_name(),
            node.loc.line,
            node.loc.column,
        );
        let child_indent = indent + 4;
        match &node.stmt {
            Stmt::Pass | Stmt::Global { .. } | Stmt::Break | Stmt::Continue | Stmt::Return { value: None } => {}
            Stmt::Expr(expr) | Stmt::Return { value: Some(expr) } => {
                self.dump_expr(*expr, child_indent, out);
            }
            Stmt::Assign { value, .. } | Stmt::AugAssign { value, .. } => {
                self.dump_expr(*value, child_indent, out);
            }
            Stmt::Print { values } => {
                for value in values {
                    self.dump_expr(*value, child_indent, out);
                }
            }
            Stmt::If { test, body, or_else } | Stmt::While { test, body, or_else } => {
                self.dump_expr(*test, child_indent, out);
                for child in body.iter().chain(or_else) {
                    self.dump_stmt(*child, child_indent, out);
                }
            }
            Stmt::For {
                iter, body, or_else, ..
            } => {
                self.dump_expr(*iter, child_indent, out);
                for child in body.iter().chain(or_else) {
                    self.dump_stmt(*child, child_indent, out);
                }
            }
            Stmt::FunctionDef { defaults, body, .. } => {
                for default in defaults {
                    self.dump_expr(*default, child_indent, out);
                }
                for child in body {
                    self.dump_stmt(*child, child_indent, out);
                }
            }
        }
    }

    fn dump_expr(&self, id: ExprId, indent: usize, out: &mut String) {
        let node = self.expr(id);
        let _ = writeln!(
            out,
            "{:indent$}{} at {}:{}",
            "",
            node.expr.kind_name(),
            node.loc.line,
            node.loc.column,
        );
        let child_indent = indent + 4;
        match &node.expr {
            Expr::Int(_)
            | Expr::Float(_)
            | Expr::Str(_)
            | Expr::Bool(_)
            | Expr::NoneLit
            | Expr::Name(_)
            | Expr::ListComp
            | Expr::DictComp
            | Expr::IfExp => {}
            Expr::BinOp { left, right, .. } => {
                self.dump_expr(*left, child_indent, out);
                self.dump_expr(*right, child_indent, out);
            }
            Expr::BoolOp { values, .. } => {
                for value in values {
                    self.dump_expr(*value, child_indent, out);
                }
            }
            Expr::UnaryOp { operand, .. } => self.dump_expr(*operand, child_indent, out),
            Expr::Compare { left, comparators, .. } => {
                self.dump_expr(*left, child_indent, out);
                for comparator in comparators {
                    self.dump_expr(*comparator, child_indent, out);
                }
            }
            Expr::Call {
                func, args, keywords, ..
            } => {
                if let CallTarget::Expr(callee) = func {
                    self.dump_expr(*callee, child_indent, out);
                }
                for arg in args {
                    self.dump_expr(*arg, child_indent, out);
                }
                for (_, value) in keywords {
                    self.dump_expr(*value, child_indent, out);
                }
            }
            Expr::Dict { keys, values } => {
                for child in keys.iter().chain(values) {
                    self.dump_expr(*child, child_indent, out);
                }
            }
            Expr::Tuple { elts } | Expr::List { elts } => {
                for elt in elts {
                    self.dump_expr(*elt, child_indent, out);
                }
            }
            Expr::Attribute { value, .. } => self.dump_expr(*value, child_indent, out),
            Expr::Subscript { value, index } => {
                self.dump_expr(*value, child_indent, out);
                match index {
                    Index::Single(expr) => self.dump_expr(*expr, child_indent, out),
                    Index::Slice { lower, upper, step } => {
                        for part in [lower, upper, step].into_iter().flatten() {
                            self.dump_expr(*part, child_indent, out);
                        }
                    }
                }
            }
        }
    }
}
