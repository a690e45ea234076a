//! Filtering, projection and ordering over single tables.

#[path = "../support/mod.rs"]
mod support;

use chainsql::prelude::*;
use chainsql::tree::{self, lambda, new_object, param, string};
use support::{error, sql};

#[test]
fn test_select_whole_entity() {
    assert_eq!(
        sql(&tree::source("Blog"), Dialect::Sqlite),
        "select b0.* from Blogs b0"
    );
}

#[test]
fn test_filter_with_null_check_like_and_disjunction() {
    let query = tree::source("Blog").filter(lambda(
        "b",
        param("b")
            .member("Url")
            .ne(tree::null())
            .and(param("b").member("Name").call("StartsWith", vec![string("Ethan")]))
            .and(
                param("b")
                    .member("UserId")
                    .gt(tree::int(1))
                    .or(param("b").member("UserId").lt(tree::int(100))),
            ),
    ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.* from Blogs b0 where ((b0.Url is not null) and (b0.Name like 'Ethan%')) \
         and ((b0.UserId > 1) or (b0.UserId < 100))"
    );
}

#[test]
fn test_consecutive_filters_are_anded() {
    let query = tree::source("Blog")
        .filter(lambda("b", param("b").member("Rating").gte(tree::int(3))))
        .filter(lambda("b", param("b").member("Url").eq(tree::null())));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.* from Blogs b0 where (b0.Rating >= 3) and (b0.Url is null)"
    );
}

#[test]
fn test_record_projection_names_fields() {
    let query = tree::source("Blog").select(lambda(
        "b",
        new_object([
            ("BlogId", param("b").member("BlogId")),
            ("Address", param("b").member("Url")),
        ]),
    ));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.BlogId, b0.Url as Address from Blogs b0"
    );
}

#[test]
fn test_scalar_projection_with_ordering() {
    let query = tree::source("Blog")
        .order_by_desc(lambda("b", param("b").member("Rating")))
        .then_by(lambda("b", param("b").member("Name")))
        .select(lambda("b", param("b").member("Url")));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.Url from Blogs b0 order by b0.Rating desc, b0.Name"
    );
}

#[test]
fn test_identifiers_are_quoted_per_dialect() {
    let query = tree::source("Item").filter(lambda("i", param("i").member("Value").gt(tree::int(0))));

    assert_eq!(
        sql(&query, Dialect::TSql),
        "select i0.* from [fin].[Item] i0 where i0.[Value] > 0"
    );
    assert_eq!(
        sql(&query, Dialect::Postgres),
        "select i0.* from \"fin\".\"Item\" i0 where i0.\"Value\" > 0"
    );
}

#[test]
fn test_ends_with_uses_bracket_escapes_on_tsql() {
    let query = tree::source("Blog").filter(lambda(
        "b",
        param("b").member("Name").call("EndsWith", vec![string("_x")]),
    ));

    assert_eq!(
        sql(&query, Dialect::TSql),
        "select b0.* from [Blogs] b0 where b0.[Name] like '%[_]x'"
    );
}

#[test]
fn test_unknown_member_is_reported() {
    let query = tree::source("Blog").filter(lambda("b", param("b").member("Title").eq(string("x"))));

    match error(&query) {
        TranslationError::UnresolvedMember { entity, member } => {
            assert_eq!(entity, "Blog");
            assert_eq!(member, "Title");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_query_tree_from_json() {
    let json = r#"{
        "kind": "call",
        "operator": "Where",
        "receiver": { "kind": "source", "entity": "Blog" },
        "args": [{
            "kind": "lambda",
            "params": ["b"],
            "body": {
                "kind": "binary",
                "op": "greater_than",
                "left": {
                    "kind": "member",
                    "receiver": { "kind": "parameter", "name": "b" },
                    "member": "CommentCount"
                },
                "right": { "kind": "constant", "value": 10, "ty": "int" }
            }
        }]
    }"#;

    let query: QueryExpr = serde_json::from_str(json).unwrap();
    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.* from Blogs b0 where b0.CommentCount > 10"
    );
}

#[test]
fn test_pass_through_projections_collapse() {
    let query = tree::source("Blog")
        .select(lambda("x", param("x")))
        .select(lambda("x", new_object([("K", param("x").member("BlogId"))])));

    assert_eq!(
        sql(&query, Dialect::Sqlite),
        "select b0.BlogId as K from Blogs b0"
    );
}

#[test]
fn test_constant_without_sql_type_is_rejected() {
    let query = tree::source("Blog").filter(lambda(
        "b",
        param("b")
            .member("Rating")
            .gt(tree::int(1))
            .and(tree::boolean(true).eq(tree::boolean(true))),
    ));

    assert_eq!(error(&query), TranslationError::UnsupportedType("bool".into()));
}

#[test]
fn test_boolean_constant_on_dialect_with_boolean_type() {
    let query = tree::source("Blog").filter(lambda(
        "b",
        param("b").member("Rating").gt(tree::int(1)).and(tree::boolean(true).eq(tree::boolean(true))),
    ));

    assert_eq!(
        sql(&query, Dialect::Postgres),
        "select b0.* from \"Blogs\" b0 where (b0.\"Rating\" > 1) and (true = true)"
    );
}

#[test]
fn test_mysql_string_literal_escapes_backslash() {
    let query = tree::source("Blog").filter(lambda(
        "b",
        param("b").member("Name").eq(string("x\\' or 1=1 -- ")),
    ));

    let rendered = translate_to_sql(&query, &support::blogging(), Dialect::MySql).unwrap();
    assert_eq!(
        support::flatten(&rendered),
        "select b0.* from `Blogs` b0 where b0.`Name` = 'x\\\\'' or 1=1 -- '"
    );
}
