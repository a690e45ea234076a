//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - Boolean is TINYINT(1), returns 1/0
//! - Backslash is an escape inside string literals, so LIKE patterns
//!   escape with `!` instead
//! - LIMIT is mandatory before OFFSET

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;
use crate::tree::ValueType;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_required_limit(limit, offset, i64::MAX)
    }

    fn like_escape_char(&self) -> Option<char> {
        Some('!')
    }

    fn map_type(&self, ty: &ValueType) -> Option<&'static str> {
        helpers::map_type_mysql(ty)
    }
}
