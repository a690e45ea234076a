//! Loading and validating schema files.

#[path = "../support/mod.rs"]
mod support;

use chainsql::prelude::*;
use support::blogging;

#[test]
fn test_fixture_loads() {
    let schema = blogging();
    assert_eq!(schema.entities.len(), 6);

    let item = schema.resolve_entity("Item").unwrap();
    assert_eq!(item.schema.as_deref(), Some("fin"));
    assert_eq!(item.alias_seed(), "i");
}

#[test]
fn test_nullable_columns() {
    let schema = blogging();
    let blog = schema.resolve_entity("Blogs").unwrap();

    let user_id = blog.column("UserId").unwrap();
    assert!(user_id.is_nullable());
    assert_eq!(user_id.ty.underlying(), &ValueType::Int);
    assert!(blog.column("Url").unwrap().is_nullable());
    assert!(!blog.column("BlogId").unwrap().is_nullable());
}

#[test]
fn test_relationships() {
    let schema = blogging();
    let post = schema.resolve_entity("Post").unwrap();

    match schema.resolve_member(post, "Blog") {
        Some(Member::Relationship(rel)) => {
            assert_eq!(rel.cardinality, Cardinality::ManyToOne);
            assert!(!rel.may_be_absent());
            assert_eq!(
                rel.keys,
                vec![JoinKey {
                    local: "BlogId".into(),
                    remote: "BlogId".into()
                }]
            );
        }
        other => panic!("expected a relationship, got {:?}", other),
    }

    let blog = schema.resolve_entity("Blog").unwrap();
    assert!(blog.relationship("Posts").unwrap().may_be_absent());
    assert!(blog.relationship("User").unwrap().may_be_absent());
}

#[test]
fn test_bad_primary_key_is_rejected() {
    let toml = r#"
[[entities]]
name = "Blog"
table = "Blogs"
primary_key = ["Id"]
columns = [{ name = "BlogId", ty = "int" }]
"#;
    let err = Schema::from_toml_str(toml).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidConfig(ref m) if m.contains("Id")));
}

#[test]
fn test_unknown_join_column_is_rejected() {
    let toml = r#"
[[entities]]
name = "Post"
table = "Posts"
columns = [{ name = "PostId", ty = "int" }]

[[entities.relationships]]
name = "Blog"
target = "Blog"
cardinality = "many_to_one"
keys = [{ local = "BlogId", remote = "BlogId" }]

[[entities]]
name = "Blog"
table = "Blogs"
columns = [{ name = "BlogId", ty = "int" }]
"#;
    let err = Schema::from_toml_str(toml).unwrap_err();
    assert!(matches!(err, SettingsError::InvalidConfig(ref m) if m.contains("unknown columns")));
}

#[test]
fn test_unknown_value_type_is_a_parse_error() {
    let toml = r#"
[[entities]]
name = "Blog"
table = "Blogs"
columns = [{ name = "BlogId", ty = "integer128" }]
"#;
    assert!(matches!(
        Schema::from_toml_str(toml).unwrap_err(),
        SettingsError::ParseError(_)
    ));
}

#[test]
fn test_settings_feed_translation_options() {
    let settings = Settings::from_toml_str(
        r#"
[translation]
dialect = "postgres"
derived_table_prefix = "dt"
"#,
    )
    .unwrap();

    assert_eq!(settings.translation.dialect, Dialect::Postgres);
    let options = TranslateOptions::from(&settings.translation);
    assert_eq!(options.derived_table_prefix, "dt");
    assert_eq!(options.carrier_suffix, "_jk");
}
