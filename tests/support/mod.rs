//! Helpers shared by the integration test targets.

#![allow(dead_code)]

use chainsql::prelude::*;
use sqlparser::dialect::{MsSqlDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

/// The blogging fixture schema.
pub fn blogging() -> Schema {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/blogging.toml");
    Schema::from_file(path).expect("fixture schema loads")
}

/// Translate and render, collapsing whitespace to single spaces.
pub fn sql(query: &QueryExpr, dialect: Dialect) -> String {
    let schema = blogging();
    let rendered = translate_to_sql(query, &schema, dialect).expect("query translates");
    validate(&rendered, dialect);
    flatten(&rendered)
}

pub fn error(query: &QueryExpr) -> TranslationError {
    translate(query, &blogging(), Dialect::Sqlite).expect_err("query should fail")
}

pub fn flatten(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Assert `sql` parses for `dialect`.
pub fn validate(sql: &str, dialect: Dialect) {
    let parser_dialect: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::Sqlite => Box::new(SQLiteDialect {}),
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::TSql => Box::new(MsSqlDialect {}),
    };
    if let Err(e) = Parser::parse_sql(&*parser_dialect, sql) {
        panic!("invalid SQL for {}: {}\n{}", dialect, e, sql);
    }
}
