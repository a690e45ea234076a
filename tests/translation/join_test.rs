//! Navigation joins and explicit `Join` calls.

#[path = "../support/mod.rs"]
mod support;

use chainsql::prelude::*;
use chainsql::tree::{self, lambda, lambda_n, new_object, param, string};
use support::sql;

fn blog_rating_above(n: i64) -> QueryExpr {
    param("p").member("Blog").member("Rating").gt(tree::int(n))
}

#[test]
fn test_required_navigation_in_conjunction_is_inner() {
    let query = tree::source("Post").filter(lambda(
        "p",
        blog_rating_above(3).and(param("p").member("Title").eq(string("x"))),
    ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select p0.* from Posts p0 inner join Blogs b0 on p0.BlogId = b0.BlogId \
         where (b0.Rating > 3) and (p0.Title = 'x')"
    );
}

#[test]
fn test_required_navigation_in_disjunction_is_left_outer() {
    let query = tree::source("Post").filter(lambda(
        "p",
        blog_rating_above(3).or(param("p").member("Title").eq(string("x"))),
    ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select p0.* from Posts p0 left outer join Blogs b0 on p0.BlogId = b0.BlogId \
         where (b0.Rating > 3) or (p0.Title = 'x')"
    );
}

#[test]
fn test_optional_navigation_is_left_outer() {
    let query = tree::source("Post").filter(lambda(
        "p",
        param("p").member("User").member("UserName").eq(string("ann")),
    ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select p0.* from Posts p0 left outer join Users u0 on p0.UserId = u0.UserId \
         where u0.UserName = 'ann'"
    );
}

#[test]
fn test_repeated_navigation_reuses_join() {
    let query = tree::source("Post")
        .filter(lambda("p", blog_rating_above(3)))
        .filter(lambda("p", param("p").member("Blog").member("Url").ne(tree::null())));

    let sql = sql(&query, Dialect::Sqlite);
    assert_eq!(sql.matches(" join ").count(), 1, "{}", sql);
    assert!(sql.ends_with("where (b0.Rating > 3) and (b0.Url is not null)"));
}

#[test]
fn test_chained_navigation() {
    let query = tree::source("Post").filter(lambda(
        "p",
        param("p")
            .member("Blog")
            .member("User")
            .member("UserName")
            .ne(tree::null()),
    ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select p0.* from Posts p0 inner join Blogs b0 on p0.BlogId = b0.BlogId \
         left outer join Users u0 on b0.UserId = u0.UserId where u0.UserName is not null"
    );
}

#[test]
fn test_navigation_in_projection_keeps_rows() {
    let query = tree::source("Post").select(lambda(
        "p",
        new_object([
            ("Title", param("p").member("Title")),
            ("Url", param("p").member("Blog").member("Url")),
        ]),
    ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select p0.Title, b0.Url from Posts p0 left outer join Blogs b0 on p0.BlogId = b0.BlogId"
    );
}

#[test]
fn test_explicit_join_to_table() {
    let query = tree::source("Post").call(
        "Join",
        vec![
            tree::source("Blog"),
            lambda("p", param("p").member("BlogId")),
            lambda("b", param("b").member("BlogId")),
            lambda_n(
                &["p", "b"],
                new_object([
                    ("Title", param("p").member("Title")),
                    ("Url", param("b").member("Url")),
                ]),
            ),
        ],
    );

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select p0.Title, b0.Url from Posts p0 inner join Blogs b0 on p0.BlogId = b0.BlogId"
    );
}

#[test]
fn test_explicit_join_to_filtered_query() {
    let inner = tree::source("Blog").filter(lambda("b", param("b").member("Rating").gt(tree::int(3))));
    let query = tree::source("Post").call(
        "Join",
        vec![
            inner,
            lambda("p", param("p").member("BlogId")),
            lambda("b", param("b").member("BlogId")),
            lambda_n(
                &["p", "b"],
                new_object([
                    ("Title", param("p").member("Title")),
                    ("Url", param("b").member("Url")),
                ]),
            ),
        ],
    );

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select p0.Title, sq0.Url from Posts p0 inner join ( select b0.BlogId, b0.Url \
         from Blogs b0 where b0.Rating > 3 ) sq0 on p0.BlogId = sq0.BlogId"
    );
}

#[test]
fn test_entity_equality_compares_keys() {
    let query = tree::source("Post").filter(lambda(
        "p",
        param("p").member("Blog").eq(param("p").member("Blog")),
    ));

    assert!(sql(&query, Dialect::Sqlite).ends_with("where b0.BlogId = b0.BlogId"));
}

#[test]
fn test_navigation_or_own_column() {
    let query = tree::source("Post").filter(lambda(
        "p",
        param("p")
            .member("User")
            .member("UserName")
            .ne(tree::null())
            .or(param("p").member("Content").ne(tree::null())),
    ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select p0.* from Posts p0 left outer join Users u0 on p0.UserId = u0.UserId \
         where (u0.UserName is not null) or (p0.Content is not null)"
    );
}

#[test]
fn test_explicit_join_after_outer_key_navigation() {
    let query = tree::source("Post").call(
        "Join",
        vec![
            tree::source("User"),
            lambda("p", param("p").member("Blog").member("UserId")),
            lambda("u", param("u").member("UserId")),
            lambda_n(
                &["p", "u"],
                new_object([
                    ("Title", param("p").member("Title")),
                    ("UserName", param("u").member("UserName")),
                ]),
            ),
        ],
    );

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select p0.Title, u0.UserName from Posts p0 \
         inner join Blogs b0 on p0.BlogId = b0.BlogId \
         inner join Users u0 on b0.UserId = u0.UserId"
    );
}

#[test]
fn test_explicit_join_before_inner_key_navigation() {
    let query = tree::source("Blog").call(
        "Join",
        vec![
            tree::source("Post"),
            lambda("b", param("b").member("BlogId")),
            lambda("p", param("p").member("Blog").member("BlogId")),
            lambda_n(
                &["b", "p"],
                new_object([
                    ("Url", param("b").member("Url")),
                    ("Title", param("p").member("Title")),
                ]),
            ),
        ],
    );

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.Url, p0.Title from Blogs b0 inner join Posts p0 on 1 = 1 \
         inner join Blogs b1 on p0.BlogId = b1.BlogId where b0.BlogId = b1.BlogId"
    );
}
