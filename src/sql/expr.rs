//! Expression AST - the selectable and predicate nodes of a statement.
//!
//! This module provides a strongly-typed AST for SQL expressions
//! with exhaustive pattern matching enforced by the compiler.

use uuid::Uuid;

use super::dialect::Dialect;
use super::token::{Token, TokenStream};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens_for_dialect()` - the compiler
/// enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: `alias.column`.
    ///
    /// When `table` names a derived table this is a subquery reference to
    /// one of its exposed columns.
    Column {
        table: Option<String>,
        column: String,
    },

    /// Typed constant.
    Constant(Constant),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// Unary operation: op expr
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },

    /// Aggregate call; `arg: None` renders as `*`.
    Aggregate {
        function: AggregateFunction,
        arg: Option<Box<Expr>>,
    },

    /// LIKE with ESCAPE: expr LIKE pattern ESCAPE escape_char
    LikeEscape {
        expr: Box<Expr>,
        pattern: Box<Expr>,
        escape_char: char,
    },

    /// Searched CASE: CASE WHEN .. THEN .. ELSE .. END
    Case {
        when_clauses: Vec<(Expr, Expr)>,
        else_clause: Option<Box<Expr>>,
    },

    /// Wildcard: * or alias.*
    Star { table: Option<String> },
}

/// A literal with the SQL type it was converted to, when one is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub value: Literal,
    pub sql_type: Option<&'static str>,
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Guid(Uuid),
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    // Logical
    And,
    Or,
    // Arithmetic
    Plus,
    Minus,
    Mul,
    Div,
    Mod,
    // String
    Like,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
}

/// Aggregate functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFunction {
    Sum,
    Count,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Sum => "sum",
            AggregateFunction::Count => "count",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }
}

// =============================================================================
// Inspection
// =============================================================================

impl Expr {
    /// Column name when this is a plain column reference.
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Expr::Column { column, .. } => Some(column),
            _ => None,
        }
    }

    /// Whether the expression renders as a compound that needs parentheses
    /// when used as an operand.
    fn is_compound(&self) -> bool {
        matches!(
            self,
            Expr::BinaryOp { .. }
                | Expr::UnaryOp {
                    op: UnaryOperator::Not,
                    ..
                }
                | Expr::IsNull { .. }
                | Expr::LikeEscape { .. }
        )
    }
}

// =============================================================================
// Expression to Tokens
// =============================================================================

impl Expr {
    /// Convert this expression to a token stream (default dialect).
    pub fn to_tokens(&self) -> TokenStream {
        self.to_tokens_for_dialect(Dialect::default())
    }

    /// Convert this expression to a token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Alias(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Constant(constant) => {
                ts.push(match &constant.value {
                    Literal::Int(n) => Token::LitInt(*n),
                    Literal::Float(f) => Token::LitFloat(*f),
                    Literal::String(s) => Token::LitString(s.clone()),
                    Literal::Bool(b) => Token::LitBool(*b),
                    Literal::Guid(g) => Token::LitString(g.to_string()),
                    Literal::Null => Token::LitNull,
                });
            }

            Expr::BinaryOp { left, op, right } => {
                emit_operand(&mut ts, left, dialect);
                ts.space();
                ts.push(binary_op_to_token(*op));
                ts.space();
                emit_operand(&mut ts, right, dialect);
            }

            Expr::UnaryOp { op, expr } => match op {
                UnaryOperator::Not => {
                    ts.push(Token::Not).space();
                    emit_operand(&mut ts, expr, dialect);
                }
                UnaryOperator::Minus => {
                    ts.push(Token::Minus);
                    emit_operand(&mut ts, expr, dialect);
                }
            },

            Expr::IsNull { expr, negated } => {
                emit_operand(&mut ts, expr, dialect);
                ts.space();
                ts.push(if *negated {
                    Token::IsNotNull
                } else {
                    Token::IsNull
                });
            }

            Expr::Aggregate { function, arg } => {
                ts.push(Token::FunctionName(function.name().into()));
                ts.lparen();
                match arg {
                    Some(arg) => {
                        ts.append(&arg.to_tokens_for_dialect(dialect));
                    }
                    None => {
                        ts.push(Token::Star);
                    }
                }
                ts.rparen();
            }

            Expr::LikeEscape {
                expr,
                pattern,
                escape_char,
            } => {
                emit_operand(&mut ts, expr, dialect);
                ts.space()
                    .push(Token::Like)
                    .space()
                    .append(&pattern.to_tokens_for_dialect(dialect))
                    .space()
                    .push(Token::Escape)
                    .space()
                    .push(Token::LitString(escape_char.to_string()));
            }

            Expr::Case {
                when_clauses,
                else_clause,
            } => {
                ts.push(Token::Case);
                for (when, then) in when_clauses {
                    ts.space().push(Token::When).space();
                    ts.append(&when.to_tokens_for_dialect(dialect));
                    ts.space().push(Token::Then).space();
                    ts.append(&then.to_tokens_for_dialect(dialect));
                }
                if let Some(else_expr) = else_clause {
                    ts.space().push(Token::Else).space();
                    ts.append(&else_expr.to_tokens_for_dialect(dialect));
                }
                ts.space().push(Token::End);
            }

            Expr::Star { table } => {
                if let Some(t) = table {
                    ts.push(Token::Alias(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Star);
            }
        }

        ts
    }
}

fn emit_operand(ts: &mut TokenStream, expr: &Expr, dialect: Dialect) {
    if expr.is_compound() {
        ts.lparen();
        ts.append(&expr.to_tokens_for_dialect(dialect));
        ts.rparen();
    } else {
        ts.append(&expr.to_tokens_for_dialect(dialect));
    }
}

fn binary_op_to_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Ne => Token::Ne,
        BinaryOperator::Lt => Token::Lt,
        BinaryOperator::Gt => Token::Gt,
        BinaryOperator::Lte => Token::Lte,
        BinaryOperator::Gte => Token::Gte,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
        BinaryOperator::Plus => Token::Plus,
        BinaryOperator::Minus => Token::Minus,
        BinaryOperator::Mul => Token::Mul,
        BinaryOperator::Div => Token::Div,
        BinaryOperator::Mod => Token::Mod,
        BinaryOperator::Like => Token::Like,
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a qualified column reference (alias.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

/// Create an untyped constant.
pub fn lit(value: Literal) -> Expr {
    Expr::Constant(Constant {
        value,
        sql_type: None,
    })
}

/// Create an integer literal.
pub fn lit_int(n: i64) -> Expr {
    Expr::Constant(Constant {
        value: Literal::Int(n),
        sql_type: Some("int"),
    })
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Constant(Constant {
        value: Literal::String(s.into()),
        sql_type: Some("nvarchar"),
    })
}

/// `alias.*`
pub fn table_star(table: &str) -> Expr {
    Expr::Star {
        table: Some(table.into()),
    }
}

pub fn sum(expr: Expr) -> Expr {
    Expr::Aggregate {
        function: AggregateFunction::Sum,
        arg: Some(Box::new(expr)),
    }
}

/// `count(*)`
pub fn count_star() -> Expr {
    Expr::Aggregate {
        function: AggregateFunction::Count,
        arg: None,
    }
}

/// `case when cond then 1 else 0 end` - a predicate as a countable value.
pub fn case_flag(cond: Expr) -> Expr {
    Expr::Case {
        when_clauses: vec![(cond, lit_int(1))],
        else_clause: Some(Box::new(lit_int(0))),
    }
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn binary(self, op: BinaryOperator, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op,
            right: Box::new(other.into()),
        }
    }

    // Comparison operators
    fn eq(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Eq, other)
    }

    fn ne(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Ne, other)
    }

    fn gt(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Gt, other)
    }

    fn lt(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Lt, other)
    }

    // Logical operators
    fn and(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::And, other)
    }

    fn or(self, other: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Or, other)
    }

    fn not(self) -> Expr {
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: Box::new(self.into_expr()),
        }
    }

    // String operators
    fn like(self, pattern: impl Into<Expr>) -> Expr {
        self.binary(BinaryOperator::Like, pattern)
    }

    /// LIKE with ESCAPE clause for matching literal `%` and `_` characters.
    fn like_escape(self, pattern: impl Into<Expr>, escape_char: char) -> Expr {
        Expr::LikeEscape {
            expr: Box::new(self.into_expr()),
            pattern: Box::new(pattern.into()),
            escape_char,
        }
    }

    // NULL checks
    #[allow(clippy::wrong_self_convention)]
    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: false,
        }
    }

    #[allow(clippy::wrong_self_convention)]
    fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: true,
        }
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit_int(n)
    }
}

impl From<i32> for Expr {
    fn from(n: i32) -> Self {
        lit_int(n as i64)
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit_str(s)
    }
}
