//! SQL generation module.
//!
//! This module provides the statement model translation builds and renders
//! to multi-dialect SQL. It includes:
//!
//! - [`query`] - SELECT statement, sources, joins
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations
//! - [`types`] - Host type to SQL type conversion

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;
pub mod types;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    case_flag, count_star, lit, lit_int, lit_str, sum, table_col, table_star, AggregateFunction, BinaryOperator, Constant, Expr, ExprExt, Literal,
    UnaryOperator,
};
pub use query::{
    Join, JoinKind, LimitOffset, OrderByExpr, Select, SelectItem, SortDir, Source, TableRef,
};
pub use token::{Token, TokenStream};
pub use types::convert_type;
