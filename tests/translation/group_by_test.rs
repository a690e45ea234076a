//! Grouping, aggregates and HAVING.

#[path = "../support/mod.rs"]
mod support;

use chainsql::prelude::*;
use chainsql::tree::{self, lambda, new_object, param};
use support::{error, sql};

fn sum_of(group: &str, column: &str) -> QueryExpr {
    param(group).call("Sum", vec![lambda("x", param("x").member(column))])
}

#[test]
fn test_group_by_scalar_key_with_sums() {
    let query = tree::source("Statistic")
        .group_by(lambda("s", param("s").member("BlogId")))
        .select(lambda(
            "g",
            new_object([
                ("BId", param("g").member("Key")),
                ("FloatVal", sum_of("g", "FloatVal")),
                ("DecimalVal", sum_of("g", "DecimalVal")),
                ("DoubleVal", sum_of("g", "DoubleVal")),
            ]),
        ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select s0.BlogId as BId, sum(s0.FloatVal) as FloatVal, sum(s0.DecimalVal) as DecimalVal, \
         sum(s0.DoubleVal) as DoubleVal from Statistics s0 group by s0.BlogId"
    );
}

#[test]
fn test_group_by_on_schema_qualified_table() {
    let query = tree::source("Item")
        .group_by(lambda("i", param("i").member("CategoryId")))
        .select(lambda(
            "g",
            new_object([
                ("CategoryId", param("g").member("Key")),
                ("Sum", sum_of("g", "Value")),
            ]),
        ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select i0.CategoryId, sum(i0.Value) as Sum from fin.Item i0 group by i0.CategoryId"
    );
}

#[test]
fn test_where_after_group_by_becomes_having() {
    let query = tree::source("Blog")
        .group_by(lambda("b", param("b").member("UserId")))
        .filter(lambda("g", param("g").call("Count", vec![]).gt(tree::int(2))))
        .select(lambda(
            "g",
            new_object([
                ("UserId", param("g").member("Key")),
                ("N", param("g").call("Count", vec![])),
            ]),
        ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.UserId, count(*) as N from Blogs b0 group by b0.UserId having count(*) > 2"
    );
}

#[test]
fn test_conditional_count() {
    let query = tree::source("Blog")
        .group_by(lambda("b", param("b").member("UserId")))
        .select(lambda(
            "g",
            new_object([
                ("UserId", param("g").member("Key")),
                (
                    "Rated",
                    param("g").call(
                        "Count",
                        vec![lambda("b", param("b").member("Rating").gt(tree::int(3)))],
                    ),
                ),
            ]),
        ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.UserId, sum(case when b0.Rating > 3 then 1 else 0 end) as Rated \
         from Blogs b0 group by b0.UserId"
    );
}

#[test]
fn test_group_by_navigation_entity() {
    let query = tree::source("Post")
        .group_by(lambda("p", param("p").member("Blog")))
        .select(lambda(
            "g",
            new_object([
                ("Url", param("g").member("Key").member("Url")),
                ("N", param("g").call("Count", vec![])),
            ]),
        ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.Url, count(*) as N from Posts p0 left outer join Blogs b0 \
         on p0.BlogId = b0.BlogId group by b0.BlogId, b0.Url"
    );
}

#[test]
fn test_group_by_projected_entities_wraps() {
    let query = tree::source("Post")
        .select(lambda(
            "p",
            new_object([
                ("Blog", param("p").member("Blog")),
                ("User", param("p").member("User")),
            ]),
        ))
        .group_by(lambda("x", param("x").member("Blog")))
        .select(lambda(
            "g",
            new_object([
                ("BlogId", param("g").member("Key").member("BlogId")),
                ("Url", param("g").member("Key").member("Url")),
                (
                    "UserName",
                    param("g").member("Key").member("User").member("UserName"),
                ),
                ("PostCount", param("g").call("Count", vec![])),
            ]),
        ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select sq0.BlogId, sq0.Url, u1.UserName, count(*) as PostCount \
         from ( select b0.BlogId, u0.UserId, b0.Url, b0.UserId as UserId_jk0 \
         from Posts p0 left outer join Blogs b0 on p0.BlogId = b0.BlogId \
         left outer join Users u0 on p0.UserId = u0.UserId ) sq0 \
         left outer join Users u1 on sq0.UserId_jk0 = u1.UserId \
         group by sq0.BlogId, sq0.Url, u1.UserName"
    );
}

#[test]
fn test_count_over_distinct_query_wraps() {
    let query = tree::source("Blog")
        .select(lambda("b", param("b").member("Url")))
        .distinct()
        .call("Count", vec![]);

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select count(*) from ( select distinct b0.Url from Blogs b0 ) sq0"
    );
}

#[test]
fn test_average_over_whole_query() {
    let query = tree::source("Blog").call(
        "Average",
        vec![lambda("b", param("b").member("Rating"))],
    );

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select avg(b0.Rating) from Blogs b0"
    );
}

#[test]
fn test_non_key_column_is_rejected() {
    let query = tree::source("Blog")
        .group_by(lambda("b", param("b").member("UserId")))
        .select(lambda("g", new_object([("Url", param("g").member("Url"))])));

    assert!(matches!(
        error(&query),
        TranslationError::MalformedProjection(_)
    ));
}

#[test]
fn test_selecting_the_grouping_is_rejected() {
    let query = tree::source("Blog").group_by(lambda("b", param("b").member("UserId")));

    assert!(matches!(
        error(&query),
        TranslationError::MalformedProjection(_)
    ));
}

#[test]
fn test_aggregate_outside_grouping_is_rejected() {
    let query = tree::source("Blog").select(lambda(
        "b",
        param("b").member("Rating").call("Sum", vec![]),
    ));

    assert!(matches!(error(&query), TranslationError::InvalidQuery(_)));
}

#[test]
fn test_having_on_non_key_column_is_rejected() {
    let query = tree::source("Blog")
        .group_by(lambda("b", param("b").member("UserId")))
        .filter(lambda("g", param("g").member("Url").eq(tree::string("x"))))
        .select(lambda("g", new_object([("U", param("g").member("Key"))])));

    assert!(matches!(
        error(&query),
        TranslationError::MalformedProjection(ref m) if m.contains("b0.Url")
    ));
}
