//! SQLite dialect.
//!
//! - Identifiers left bare when they are plain words
//! - Booleans are integers (1/0)
//! - `LIMIT -1` stands in for "no limit" when only OFFSET is given

use super::helpers;
use super::SqlDialect;
use crate::sql::token::TokenStream;

/// SQLite dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_if_needed(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_required_limit(limit, offset, -1)
    }
}
