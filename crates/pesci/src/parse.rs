//! Parser front-end: source text → ruff AST → subset validation → [`Code`].
//!
//! The external parser produces a full-language AST; lowering doubles as the
//! subset validator. Any node kind without a lowering rule is rejected with
//! a subset-syntax-error naming the node kind and its source line:column, so
//! the evaluator only ever sees validated nodes.

use num_bigint::BigInt;
use ruff_python_ast::{self as ast, Expr as AstExpr, Number, Stmt as AstStmt};
use ruff_python_parser::parse_module;
use ruff_text_size::{Ranged, TextRange};

use crate::{
    errors::ParseError,
    expressions::{
        BoolOperator, CallTarget, CmpOperator, Code, Expr, ExprId, ExprNode, Index, Loc, Operator, Stmt, StmtId,
        StmtNode, Target, UnaryOperator,
    },
};

/// Parses and validates a source snippet, producing an executable [`Code`].
pub fn parse_source(source: &str) -> Result<Code, ParseError> {
    let mut lowerer = Lowerer::new(source);
    let parsed = parse_module(source).map_err(|e| {
        let loc = lowerer.loc(e.range());
        ParseError::syntax(e.to_string(), loc.line, loc.column)
    })?;
    let module = parsed.into_syntax();
    let body = lowerer.lower_block(module.body)?;
    lowerer.code.set_body(body);
    Ok(lowerer.code)
}

struct Lowerer {
    code: Code,
    /// Byte offsets of every newline, for offset→line:column conversion.
    line_ends: Vec<usize>,
}

impl Lowerer {
    fn new(source: &str) -> Self {
        let line_ends = source
            .bytes()
            .enumerate()
            .filter_map(|(i, b)| (b == b'\n').then_some(i))
            .collect();
        Self {
            code: Code::new(source.to_owned()),
            line_ends,
        }
    }

    /// Converts a byte range into a 1-based line and 0-based column.
    fn loc(&self, range: TextRange) -> Loc {
        let start: usize = range.start().into();
        let line = self.line_ends.partition_point(|end| *end < start);
        let line_start = if line == 0 { 0 } else { self.line_ends[line - 1] + 1 };
        Loc::new(line as u32 + 1, (start - line_start) as u32)
    }

    fn unsupported(&self, kind: &str, range: TextRange) -> ParseError {
        let loc = self.loc(range);
        ParseError::unsupported(kind, loc.line, loc.column)
    }

    fn syntax(&self, message: impl Into<String>, range: TextRange) -> ParseError {
        let loc = self.loc(range);
        ParseError::syntax(message, loc.line, loc.column)
    }

    fn lower_block(&mut self, statements: Vec<AstStmt>) -> Result<Vec<StmtId>, ParseError> {
        statements.into_iter().map(|s| self.lower_stmt(s)).collect()
    }

    fn add_stmt(&mut self, range: TextRange, stmt: Stmt) -> StmtId {
        let loc = self.loc(range);
        self.code.add_stmt(StmtNode { loc, stmt })
    }

    fn add_expr(&mut self, range: TextRange, expr: Expr) -> ExprId {
        let loc = self.loc(range);
        self.code.add_expr(ExprNode { loc, expr })
    }

    fn lower_stmt(&mut self, statement: AstStmt) -> Result<StmtId, ParseError> {
        match statement {
            AstStmt::Pass(ast::StmtPass { range, .. }) => Ok(self.add_stmt(range, Stmt::Pass)),
            AstStmt::Break(ast::StmtBreak { range, .. }) => Ok(self.add_stmt(range, Stmt::Break)),
            AstStmt::Continue(ast::StmtContinue { range, .. }) => Ok(self.add_stmt(range, Stmt::Continue)),
            AstStmt::Expr(ast::StmtExpr { value, range, .. }) => {
                // A bare call of the name `print` is the print statement.
                if let Some(values) = self.try_lower_print(&value)? {
                    return Ok(self.add_stmt(range, Stmt::Print { values }));
                }
                let value = self.lower_expr(*value)?;
                Ok(self.add_stmt(range, Stmt::Expr(value)))
            }
            AstStmt::Assign(ast::StmtAssign { targets, value, range, .. }) => {
                if targets.len() != 1 {
                    return Err(self.syntax("only one assignment target is supported", range));
                }
                let target = self.lower_target(&targets[0])?;
                let value = self.lower_expr(*value)?;
                Ok(self.add_stmt(range, Stmt::Assign { target, value }))
            }
            AstStmt::AugAssign(ast::StmtAugAssign {
                target, op, value, range, ..
            }) => {
                let AstExpr::Name(name) = target.as_ref() else {
                    return Err(self.syntax("augmented assignment target must be a name", range));
                };
                let op = self.lower_operator(op, range)?;
                let value = self.lower_expr(*value)?;
                Ok(self.add_stmt(
                    range,
                    Stmt::AugAssign {
                        target: name.id.to_string(),
                        op,
                        value,
                    },
                ))
            }
            AstStmt::If(ast::StmtIf {
                test,
                body,
                elif_else_clauses,
                range,
                ..
            }) => {
                let test = self.lower_expr(*test)?;
                let body = self.lower_block(body)?;
                let or_else = self.lower_elif_else(elif_else_clauses)?;
                Ok(self.add_stmt(range, Stmt::If { test, body, or_else }))
            }
            AstStmt::While(ast::StmtWhile {
                test, body, orelse, range, ..
            }) => {
                let test = self.lower_expr(*test)?;
                let body = self.lower_block(body)?;
                let or_else = self.lower_block(orelse)?;
                Ok(self.add_stmt(range, Stmt::While { test, body, or_else }))
            }
            AstStmt::For(for_stmt) => {
                if for_stmt.is_async {
                    return Err(self.unsupported("AsyncFor", for_stmt.range));
                }
                let target = self.lower_target(&for_stmt.target)?;
                let iter = self.lower_expr(*for_stmt.iter)?;
                let body = self.lower_block(for_stmt.body)?;
                let or_else = self.lower_block(for_stmt.orelse)?;
                Ok(self.add_stmt(
                    for_stmt.range,
                    Stmt::For {
                        target,
                        iter,
                        body,
                        or_else,
                    },
                ))
            }
            AstStmt::FunctionDef(function) => self.lower_function_def(function),
            AstStmt::Return(ast::StmtReturn { value, range, .. }) => {
                let value = value.map(|v| self.lower_expr(*v)).transpose()?;
                Ok(self.add_stmt(range, Stmt::Return { value }))
            }
            AstStmt::Global(ast::StmtGlobal { names, range, .. }) => {
                let names = names.iter().map(|n| n.id.to_string()).collect();
                Ok(self.add_stmt(range, Stmt::Global { names }))
            }
            other => Err(self.unsupported(stmt_kind(&other), other.range())),
        }
    }

    /// Recognizes `print(...)` expression statements as the print statement.
    ///
    /// Only plain positional arguments qualify; anything fancier falls
    /// through to normal expression lowering.
    fn try_lower_print(&mut self, value: &AstExpr) -> Result<Option<Vec<ExprId>>, ParseError> {
        let AstExpr::Call(ast::ExprCall { func, arguments, .. }) = value else {
            return Ok(None);
        };
        let AstExpr::Name(name) = func.as_ref() else {
            return Ok(None);
        };
        if name.id.as_str() != "print" || !arguments.keywords.is_empty() {
            return Ok(None);
        }
        if arguments.args.iter().any(|a| matches!(a, AstExpr::Starred(_))) {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(arguments.args.len());
        for arg in &arguments.args {
            values.push(self.lower_expr(arg.clone())?);
        }
        Ok(Some(values))
    }

    /// Rebuilds an elif/else chain as nested `If` statements.
    fn lower_elif_else(&mut self, clauses: Vec<ast::ElifElseClause>) -> Result<Vec<StmtId>, ParseError> {
        let mut tail: Vec<StmtId> = Vec::new();
        for clause in clauses.into_iter().rev() {
            match clause.test {
                Some(test) => {
                    let test = self.lower_expr(test)?;
                    let body = self.lower_block(clause.body)?;
                    let nested = self.add_stmt(clause.range, Stmt::If { test, body, or_else: tail });
                    tail = vec![nested];
                }
                None => {
                    tail = self.lower_block(clause.body)?;
                }
            }
        }
        Ok(tail)
    }

    fn lower_function_def(&mut self, function: ast::StmtFunctionDef) -> Result<StmtId, ParseError> {
        let range = function.range;
        if function.is_async {
            return Err(self.unsupported("AsyncFunctionDef", range));
        }
        if !function.decorator_list.is_empty() {
            return Err(self.unsupported("Decorator", range));
        }
        if function.type_params.is_some() {
            return Err(self.unsupported("TypeParams", range));
        }
        let params = &function.parameters;
        if !params.posonlyargs.is_empty() {
            return Err(self.unsupported("PosOnlyParams", range));
        }
        if !params.kwonlyargs.is_empty() {
            return Err(self.unsupported("KwOnlyParams", range));
        }

        let mut names = Vec::with_capacity(params.args.len());
        let mut defaults = Vec::new();
        for param in &params.args {
            names.push(param.parameter.name.id.to_string());
            if let Some(default) = &param.default {
                defaults.push(self.lower_expr((**default).clone())?);
            }
        }
        let var_args = params.vararg.as_ref().map(|p| p.name.id.to_string());
        let var_kwargs = params.kwarg.as_ref().map(|p| p.name.id.to_string());

        let body = self.lower_block(function.body)?;
        Ok(self.add_stmt(
            range,
            Stmt::FunctionDef {
                name: function.name.id.to_string(),
                params: names,
                defaults,
                var_args,
                var_kwargs,
                body,
            },
        ))
    }

    /// Lowers an assignment or loop target: a name, or a flat list/tuple
    /// pattern of names.
    fn lower_target(&mut self, target: &AstExpr) -> Result<Target, ParseError> {
        match target {
            AstExpr::Name(name) => Ok(Target::Name(name.id.to_string())),
            AstExpr::Tuple(ast::ExprTuple { elts, range, .. }) | AstExpr::List(ast::ExprList { elts, range, .. }) => {
                let mut names = Vec::with_capacity(elts.len());
                for elt in elts {
                    match elt {
                        AstExpr::Name(name) => names.push(name.id.to_string()),
                        other => {
                            return Err(self.syntax(
                                format!("only names can appear in an unpacking target, found '{}'", expr_kind(other)),
                                *range,
                            ));
                        }
                    }
                }
                Ok(Target::Tuple(names))
            }
            other => Err(self.unsupported(expr_kind(other), other.range())),
        }
    }

    fn lower_operator(&self, op: ast::Operator, range: TextRange) -> Result<Operator, ParseError> {
        match op {
            ast::Operator::Add => Ok(Operator::Add),
            ast::Operator::Sub => Ok(Operator::Sub),
            ast::Operator::Mult => Ok(Operator::Mult),
            ast::Operator::Div => Ok(Operator::Div),
            ast::Operator::Mod => Ok(Operator::Mod),
            ast::Operator::Pow => Ok(Operator::Pow),
            ast::Operator::LShift => Ok(Operator::LShift),
            ast::Operator::RShift => Ok(Operator::RShift),
            ast::Operator::BitOr => Ok(Operator::BitOr),
            ast::Operator::BitXor => Ok(Operator::BitXor),
            ast::Operator::BitAnd => Ok(Operator::BitAnd),
            ast::Operator::FloorDiv => Ok(Operator::FloorDiv),
            ast::Operator::MatMult => Err(self.unsupported("MatMult", range)),
        }
    }

    fn lower_cmp_operator(&self, op: ast::CmpOp) -> CmpOperator {
        match op {
            ast::CmpOp::Eq => CmpOperator::Eq,
            ast::CmpOp::NotEq => CmpOperator::NotEq,
            ast::CmpOp::Lt => CmpOperator::Lt,
            ast::CmpOp::LtE => CmpOperator::LtE,
            ast::CmpOp::Gt => CmpOperator::Gt,
            ast::CmpOp::GtE => CmpOperator::GtE,
            ast::CmpOp::Is => CmpOperator::Is,
            ast::CmpOp::IsNot => CmpOperator::IsNot,
            ast::CmpOp::In => CmpOperator::In,
            ast::CmpOp::NotIn => CmpOperator::NotIn,
        }
    }

    fn lower_expr(&mut self, expression: AstExpr) -> Result<ExprId, ParseError> {
        match expression {
            AstExpr::NumberLiteral(ast::ExprNumberLiteral { value, range, .. }) => match value {
                Number::Int(i) => {
                    let value = match i.as_i64() {
                        Some(i) => BigInt::from(i),
                        None => parse_int_literal(&i.to_string())
                            .ok_or_else(|| self.syntax(format!("invalid integer literal: {i}"), range))?,
                    };
                    Ok(self.add_expr(range, Expr::Int(value)))
                }
                Number::Float(f) => Ok(self.add_expr(range, Expr::Float(f))),
                Number::Complex { .. } => Err(self.unsupported("Complex", range)),
            },
            AstExpr::StringLiteral(ast::ExprStringLiteral { value, range, .. }) => {
                let value = value.to_string();
                Ok(self.add_expr(range, Expr::Str(value)))
            }
            AstExpr::BooleanLiteral(ast::ExprBooleanLiteral { value, range, .. }) => {
                Ok(self.add_expr(range, Expr::Bool(value)))
            }
            AstExpr::NoneLiteral(ast::ExprNoneLiteral { range, .. }) => Ok(self.add_expr(range, Expr::NoneLit)),
            AstExpr::Name(ast::ExprName { id, range, .. }) => {
                Ok(self.add_expr(range, Expr::Name(id.to_string())))
            }
            AstExpr::BinOp(ast::ExprBinOp {
                left, op, right, range, ..
            }) => {
                let op = self.lower_operator(op, range)?;
                let left = self.lower_expr(*left)?;
                let right = self.lower_expr(*right)?;
                Ok(self.add_expr(range, Expr::BinOp { left, op, right }))
            }
            AstExpr::BoolOp(ast::ExprBoolOp { op, values, range, .. }) => {
                let op = match op {
                    ast::BoolOp::And => BoolOperator::And,
                    ast::BoolOp::Or => BoolOperator::Or,
                };
                let values = values
                    .into_iter()
                    .map(|v| self.lower_expr(v))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.add_expr(range, Expr::BoolOp { op, values }))
            }
            AstExpr::UnaryOp(ast::ExprUnaryOp {
                op, operand, range, ..
            }) => {
                // Negative literals arrive as unary minus over a number;
                // fold them so the subset can stay without unary arithmetic.
                if matches!(op, ast::UnaryOp::USub)
                    && let AstExpr::NumberLiteral(ast::ExprNumberLiteral { value, .. }) = operand.as_ref()
                {
                    match value {
                        Number::Int(i) => {
                            let value = match i.as_i64() {
                                Some(i) => BigInt::from(i),
                                None => parse_int_literal(&i.to_string())
                                    .ok_or_else(|| self.syntax(format!("invalid integer literal: {i}"), range))?,
                            };
                            return Ok(self.add_expr(range, Expr::Int(-value)));
                        }
                        Number::Float(f) => return Ok(self.add_expr(range, Expr::Float(-f))),
                        Number::Complex { .. } => return Err(self.unsupported("Complex", range)),
                    }
                }
                let op = match op {
                    ast::UnaryOp::Not => UnaryOperator::Not,
                    ast::UnaryOp::Invert => UnaryOperator::Invert,
                    ast::UnaryOp::UAdd => return Err(self.unsupported("UAdd", range)),
                    ast::UnaryOp::USub => return Err(self.unsupported("USub", range)),
                };
                let operand = self.lower_expr(*operand)?;
                Ok(self.add_expr(range, Expr::UnaryOp { op, operand }))
            }
            AstExpr::Compare(ast::ExprCompare {
                left,
                ops,
                comparators,
                range,
                ..
            }) => {
                let left = self.lower_expr(*left)?;
                let ops = ops.iter().map(|op| self.lower_cmp_operator(*op)).collect();
                let comparators = comparators
                    .into_vec()
                    .into_iter()
                    .map(|c| self.lower_expr(c))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(self.add_expr(range, Expr::Compare { left, ops, comparators }))
            }
            AstExpr::Call(call) => self.lower_call(call),
            AstExpr::Dict(ast::ExprDict { items, range, .. }) => {
                let mut keys = Vec::with_capacity(items.len());
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    let Some(key) = item.key else {
                        return Err(self.unsupported("DictUnpack", range));
                    };
                    keys.push(self.lower_expr(key)?);
                    values.push(self.lower_expr(item.value)?);
                }
                Ok(self.add_expr(range, Expr::Dict { keys, values }))
            }
            AstExpr::Tuple(ast::ExprTuple { elts, range, .. }) => {
                let elts = self.lower_elements(elts, range)?;
                Ok(self.add_expr(range, Expr::Tuple { elts }))
            }
            AstExpr::List(ast::ExprList { elts, range, .. }) => {
                let elts = self.lower_elements(elts, range)?;
                Ok(self.add_expr(range, Expr::List { elts }))
            }
            AstExpr::Attribute(ast::ExprAttribute { value, attr, range, .. }) => {
                let value = self.lower_expr(*value)?;
                Ok(self.add_expr(
                    range,
                    Expr::Attribute {
                        value,
                        attr: attr.id.to_string(),
                    },
                ))
            }
            AstExpr::Subscript(ast::ExprSubscript { value, slice, range, .. }) => {
                let value = self.lower_expr(*value)?;
                let index = match *slice {
                    AstExpr::Slice(ast::ExprSlice {
                        lower, upper, step, ..
                    }) => Index::Slice {
                        lower: lower.map(|e| self.lower_expr(*e)).transpose()?,
                        upper: upper.map(|e| self.lower_expr(*e)).transpose()?,
                        step: step.map(|e| self.lower_expr(*e)).transpose()?,
                    },
                    single => Index::Single(self.lower_expr(single)?),
                };
                Ok(self.add_expr(range, Expr::Subscript { value, index }))
            }
            AstExpr::ListComp(ast::ExprListComp { range, .. }) => Ok(self.add_expr(range, Expr::ListComp)),
            AstExpr::DictComp(ast::ExprDictComp { range, .. }) => Ok(self.add_expr(range, Expr::DictComp)),
            AstExpr::If(ast::ExprIf { range, .. }) => Ok(self.add_expr(range, Expr::IfExp)),
            other => Err(self.unsupported(expr_kind(&other), other.range())),
        }
    }

    fn lower_elements(&mut self, elts: Vec<AstExpr>, range: TextRange) -> Result<Vec<ExprId>, ParseError> {
        if elts.iter().any(|e| matches!(e, AstExpr::Starred(_))) {
            return Err(self.unsupported("Starred", range));
        }
        elts.into_iter().map(|e| self.lower_expr(e)).collect()
    }

    fn lower_call(&mut self, call: ast::ExprCall) -> Result<ExprId, ParseError> {
        let ast::ExprCall {
            func, arguments, range, ..
        } = call;

        let mut args = Vec::new();
        let mut star = None;
        for arg in arguments.args.into_vec() {
            match arg {
                AstExpr::Starred(ast::ExprStarred { value, range, .. }) => {
                    if star.is_some() {
                        return Err(self.syntax("only one * argument is supported", range));
                    }
                    let AstExpr::Name(name) = value.as_ref() else {
                        return Err(self.syntax("the * argument must be a name", range));
                    };
                    star = Some(name.id.to_string());
                }
                other => {
                    if star.is_some() {
                        return Err(self.syntax("positional argument follows * argument", other.range()));
                    }
                    args.push(self.lower_expr(other)?);
                }
            }
        }

        let mut keywords = Vec::new();
        let mut kstar = None;
        for keyword in arguments.keywords.into_vec() {
            match keyword.arg {
                Some(name) => {
                    let value = self.lower_expr(keyword.value)?;
                    keywords.push((name.id.to_string(), value));
                }
                None => {
                    if kstar.is_some() {
                        return Err(self.syntax("only one ** argument is supported", keyword.range));
                    }
                    let AstExpr::Name(name) = &keyword.value else {
                        return Err(self.syntax("the ** argument must be a name", keyword.range));
                    };
                    kstar = Some(name.id.to_string());
                }
            }
        }

        let func = match *func {
            AstExpr::Name(ast::ExprName { id, .. }) => CallTarget::Name(id.to_string()),
            other => CallTarget::Expr(self.lower_expr(other)?),
        };

        Ok(self.add_expr(
            range,
            Expr::Call {
                func,
                args,
                keywords,
                star,
                kstar,
            },
        ))
    }
}

/// Parses an integer literal string into a `BigInt`, handling radix
/// prefixes and underscores.
fn parse_int_literal(s: &str) -> Option<BigInt> {
    let cleaned: String = s.chars().filter(|c| *c != '_').collect();
    if cleaned.len() >= 2 {
        let (prefix, digits) = cleaned.split_at(2);
        match prefix.to_ascii_lowercase().as_str() {
            "0x" => return BigInt::parse_bytes(digits.as_bytes(), 16),
            "0o" => return BigInt::parse_bytes(digits.as_bytes(), 8),
            "0b" => return BigInt::parse_bytes(digits.as_bytes(), 2),
            _ => {}
        }
    }
    cleaned.parse::<BigInt>().ok()
}

/// Node kind names for out-of-subset statements.
fn stmt_kind(statement: &AstStmt) -> &'static str {
    match statement {
        AstStmt::ClassDef(_) => "ClassDef",
        AstStmt::Import(_) => "Import",
        AstStmt::ImportFrom(_) => "ImportFrom",
        AstStmt::Try(_) => "Try",
        AstStmt::Raise(_) => "Raise",
        AstStmt::With(_) => "With",
        AstStmt::Match(_) => "Match",
        AstStmt::Assert(_) => "Assert",
        AstStmt::Delete(_) => "Delete",
        AstStmt::AnnAssign(_) => "AnnAssign",
        AstStmt::TypeAlias(_) => "TypeAlias",
        AstStmt::Nonlocal(_) => "Nonlocal",
        _ => "Statement",
    }
}

/// Node kind names for out-of-subset expressions.
fn expr_kind(expression: &AstExpr) -> &'static str {
    match expression {
        AstExpr::Lambda(_) => "Lambda",
        AstExpr::Await(_) => "Await",
        AstExpr::Yield(_) => "Yield",
        AstExpr::YieldFrom(_) => "YieldFrom",
        AstExpr::Set(_) => "Set",
        AstExpr::SetComp(_) => "SetComp",
        AstExpr::Generator(_) => "GeneratorExp",
        AstExpr::Starred(_) => "Starred",
        AstExpr::Named(_) => "NamedExpr",
        AstExpr::FString(_) => "FString",
        AstExpr::BytesLiteral(_) => "Bytes",
        AstExpr::EllipsisLiteral(_) => "Ellipsis",
        AstExpr::Slice(_) => "Slice",
        AstExpr::Subscript(_) => "Subscript",
        AstExpr::Attribute(_) => "Attribute",
        _ => "Expression",
    }
}
