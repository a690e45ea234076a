//! Take/Skip windows and how paging forces derived tables.

#[path = "../support/mod.rs"]
mod support;

use chainsql::prelude::*;
use chainsql::tree::{self, lambda, param};
use support::sql;

#[test]
fn test_skip_only_per_dialect() {
    let query = tree::source("Blog").skip(5);

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.* from Blogs b0 limit -1 offset 5"
    );
    assert_eq!(
        sql(&query, Dialect::MySql),
        format!("select b0.* from `Blogs` b0 limit {} offset 5", i64::MAX)
    );
    assert_eq!(
        sql(&query, Dialect::Postgres),
        "select b0.* from \"Blogs\" b0 offset 5"
    );
}

#[test]
fn test_tsql_paging_without_order_uses_placeholder() {
    let query = tree::source("Blog").take(10);

    assert_eq!(
        sql(&query, Dialect::TSql),
        "select b0.* from [Blogs] b0 order by (select null) offset 0 rows fetch next 10 rows only"
    );
}

#[test]
fn test_tsql_paging_with_order() {
    let query = tree::source("Blog")
        .order_by(lambda("b", param("b").member("Rating")))
        .skip(5)
        .take(10);

    assert_eq!(
        sql(&query, Dialect::TSql),
        "select b0.* from [Blogs] b0 order by b0.[Rating] offset 5 rows fetch next 10 rows only"
    );
}

#[test]
fn test_take_then_skip_narrows_window() {
    let query = tree::source("Blog").take(3).skip(1);

    assert_eq!(
        sql(&query, Dialect::Postgres),
        "select b0.* from \"Blogs\" b0 limit 2 offset 1"
    );
}

#[test]
fn test_order_after_take_wraps_and_keeps_inner_order() {
    let query = tree::source("Blog")
        .order_by(lambda("b", param("b").member("Rating")))
        .take(5)
        .order_by(lambda("b", param("b").member("Url")))
        .select(lambda("b", param("b").member("Url")));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select sq0.Url from ( select b0.BlogId, b0.Url from Blogs b0 order by b0.Rating \
         limit 5 ) sq0 order by sq0.Url"
    );
}

#[test]
fn test_distinct_after_take_wraps() {
    let query = tree::source("Blog")
        .select(lambda("b", param("b").member("Url")))
        .take(10)
        .distinct();

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select distinct sq0.Url from ( select b0.Url from Blogs b0 limit 10 ) sq0"
    );
}

#[test]
fn test_take_after_distinct_folds() {
    let query = tree::source("Blog")
        .select(lambda("b", param("b").member("Url")))
        .distinct()
        .take(10);

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select distinct b0.Url from Blogs b0 limit 10"
    );
}

#[test]
fn test_empty_window_on_tsql_skips_fetch() {
    let query = tree::source("Blog").take(3).skip(5);

    assert_eq!(
        sql(&query, Dialect::TSql),
        "select b0.* from [Blogs] b0 where 1 = 0 order by (select null) offset 5 rows"
    );
}
