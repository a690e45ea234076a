//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL has significant differences from ANSI:
//! - Square bracket identifier quoting (`[name]`)
//! - No native boolean literal (1/0)
//! - OFFSET FETCH for pagination (requires ORDER BY)
//! - N'...' prefix for Unicode strings
//! - LIKE wildcards escape as character classes (`[%]`), no ESCAPE clause

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;
use crate::tree::ValueType;

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        // Non-ASCII text needs the N prefix to survive varchar coercion
        if !s.is_ascii() {
            helpers::quote_string_unicode(s)
        } else {
            helpers::quote_string_single(s)
        }
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_tsql(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn like_escape_char(&self) -> Option<char> {
        None
    }

    fn escape_like_pattern(&self, s: &str) -> String {
        helpers::escape_like_bracket(s)
    }

    fn map_type(&self, ty: &ValueType) -> Option<&'static str> {
        helpers::map_type_tsql(ty)
    }
}
