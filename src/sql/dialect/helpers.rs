//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use crate::tree::ValueType;

use super::super::token::{Token, TokenStream};

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// Quote identifier with square brackets.
/// Used by: T-SQL
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

/// Leave plain identifiers bare, double-quote anything else.
/// Used by: SQLite
pub fn quote_if_needed(ident: &str) -> String {
    let plain = ident
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && ident.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if plain {
        ident.to_string()
    } else {
        quote_double(ident)
    }
}

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: All dialects
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with single quotes, doubling backslashes as well.
/// Used by: MySQL, where backslash escapes inside literals
pub fn quote_string_backslash(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "''"))
}

/// Quote string with N prefix for Unicode (T-SQL).
/// Used by: T-SQL for non-ASCII strings
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Boolean Formatting
// =============================================================================

/// Format boolean as literal true/false.
/// Used by: Postgres
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format boolean as numeric 1/0.
/// Used by: T-SQL, MySQL, SQLite
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

// =============================================================================
// LIKE Patterns
// =============================================================================

/// Escape `%`, `_` and the escape character itself by prefixing `escape`.
/// Used by: SQLite, Postgres (`\`), MySQL (`!`)
pub fn escape_like_with_char(s: &str, escape: char) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '%' || c == '_' || c == escape {
            out.push(escape);
        }
        out.push(c);
    }
    out
}

/// Escape wildcards by wrapping them in a character class: `[%]`, `[_]`, `[[]`.
/// Used by: T-SQL, which needs no ESCAPE clause for this form
pub fn escape_like_bracket(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' | '_' | '[' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            other => out.push(other),
        }
    }
    out
}

// =============================================================================
// Pagination
// =============================================================================

/// Row counts beyond `i64::MAX` render as `i64::MAX`.
fn row_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Emit LIMIT ... OFFSET ... (standard SQL).
/// Used by: Postgres
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    if let Some(lim) = limit {
        ts.push(Token::Limit)
            .space()
            .push(Token::LitInt(row_count(lim)));
    }

    if let Some(off) = offset {
        if limit.is_some() {
            ts.space();
        }
        ts.push(Token::Offset)
            .space()
            .push(Token::LitInt(row_count(off)));
    }

    ts
}

/// Emit LIMIT ... OFFSET ..., using `unbounded` as the limit when only
/// an offset is present (the grammar requires LIMIT before OFFSET).
/// Used by: SQLite (`-1`), MySQL (`i64::MAX`)
pub fn emit_limit_offset_required_limit(
    limit: Option<u64>,
    offset: Option<u64>,
    unbounded: i64,
) -> TokenStream {
    match (limit, offset) {
        (None, Some(off)) => {
            let mut ts = TokenStream::new();
            ts.push(Token::Limit)
                .space()
                .push(Token::LitInt(unbounded))
                .space()
                .push(Token::Offset)
                .space()
                .push(Token::LitInt(row_count(off)));
            ts
        }
        _ => emit_limit_offset_standard(limit, offset),
    }
}

/// Emit OFFSET ... ROWS FETCH NEXT ... ROWS ONLY (T-SQL style).
/// Used by: T-SQL
/// Note: Requires ORDER BY clause in T-SQL
pub fn emit_limit_offset_tsql(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    let off = offset.unwrap_or(0);
    ts.push(Token::Offset)
        .space()
        .push(Token::LitInt(row_count(off)))
        .space()
        .push(Token::Rows);

    if let Some(lim) = limit {
        ts.space()
            .push(Token::Fetch)
            .space()
            .push(Token::Next)
            .space()
            .push(Token::LitInt(row_count(lim)))
            .space()
            .push(Token::Rows)
            .space()
            .push(Token::Only);
    }

    ts
}

// =============================================================================
// Type Mapping
// =============================================================================

/// Base type table shared by every dialect. `ty` must already be unwrapped.
pub fn map_type_base(ty: &ValueType) -> Option<&'static str> {
    match ty {
        ValueType::Byte | ValueType::Short | ValueType::Int | ValueType::Long => Some("int"),
        ValueType::String => Some("nvarchar"),
        ValueType::Float | ValueType::Double | ValueType::Decimal => Some("decimal"),
        ValueType::Guid => Some("uniqueidentifier"),
        _ => None,
    }
}

/// T-SQL extensions: `bit`, `datetime2`.
pub fn map_type_tsql(ty: &ValueType) -> Option<&'static str> {
    match ty {
        ValueType::Bool => Some("bit"),
        ValueType::DateTime => Some("datetime2"),
        other => map_type_base(other),
    }
}

/// MySQL extensions: `tinyint`, `datetime`.
pub fn map_type_mysql(ty: &ValueType) -> Option<&'static str> {
    match ty {
        ValueType::Bool => Some("tinyint"),
        ValueType::DateTime => Some("datetime"),
        other => map_type_base(other),
    }
}

/// Postgres extensions: `boolean`, `timestamp`.
pub fn map_type_postgres(ty: &ValueType) -> Option<&'static str> {
    match ty {
        ValueType::Bool => Some("boolean"),
        ValueType::DateTime => Some("timestamp"),
        other => map_type_base(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_if_needed() {
        assert_eq!(quote_if_needed("Blogs"), "Blogs");
        assert_eq!(quote_if_needed("_row"), "_row");
        assert_eq!(quote_if_needed("Blog Posts"), "\"Blog Posts\"");
        assert_eq!(quote_if_needed("1st"), "\"1st\"");
    }

    #[test]
    fn test_quote_string_backslash() {
        assert_eq!(quote_string_backslash("it's"), "'it''s'");
        assert_eq!(quote_string_backslash("x\\' or 1=1"), "'x\\\\'' or 1=1'");
        assert_eq!(quote_string_single("x\\"), "'x\\'");
    }

    #[test]
    fn test_escape_like_with_char() {
        assert_eq!(escape_like_with_char("100%", '\\'), "100\\%");
        assert_eq!(escape_like_with_char("a_b", '!'), "a!_b");
        assert_eq!(escape_like_with_char("wow!", '!'), "wow!!");
        assert_eq!(escape_like_with_char("Ethan", '\\'), "Ethan");
    }

    #[test]
    fn test_escape_like_bracket() {
        assert_eq!(escape_like_bracket("100%"), "100[%]");
        assert_eq!(escape_like_bracket("[a]_b"), "[[]a][_]b");
    }

    #[test]
    fn test_emit_limit_offset_required_limit() {
        use crate::sql::dialect::Dialect;

        let ts = emit_limit_offset_required_limit(None, Some(5), -1);
        assert_eq!(ts.serialize(Dialect::Sqlite), "limit -1 offset 5");

        let ts = emit_limit_offset_required_limit(Some(10), Some(5), -1);
        assert_eq!(ts.serialize(Dialect::Sqlite), "limit 10 offset 5");

        let ts = emit_limit_offset_standard(None, Some(u64::MAX));
        assert_eq!(ts.serialize(Dialect::Postgres), format!("offset {}", i64::MAX));
    }

    #[test]
    fn test_map_type_base() {
        assert_eq!(map_type_base(&ValueType::Long), Some("int"));
        assert_eq!(map_type_base(&ValueType::Double), Some("decimal"));
        assert_eq!(map_type_base(&ValueType::Bool), None);
        assert_eq!(map_type_tsql(&ValueType::Bool), Some("bit"));
    }
}
