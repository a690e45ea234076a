//! Entity definitions: tables, columns, relationships.

use serde::{Deserialize, Serialize};

use crate::tree::ValueType;

/// A mapped entity: one table plus its navigations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type name (`Blog`), used as the type hint in query trees.
    pub name: String,
    /// Table name (`Blogs`).
    pub table: String,
    /// Optional database schema (`fin`).
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl Entity {
    pub fn new(name: &str, table: &str) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            schema: None,
            columns: vec![],
            primary_key: vec![],
            relationships: vec![],
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_column(mut self, name: &str, ty: ValueType) -> Self {
        self.columns.push(Column {
            name: name.into(),
            ty,
            nullable: false,
        });
        self
    }

    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    /// Resolve a member name to a column or a relationship.
    pub fn member(&self, name: &str) -> Option<Member<'_>> {
        self.column(name)
            .map(Member::Column)
            .or_else(|| self.relationship(name).map(Member::Relationship))
    }

    /// Columns identifying a row: the primary key, or every column when
    /// there is none.
    pub fn key_columns(&self) -> Vec<&Column> {
        if self.primary_key.is_empty() {
            self.columns.iter().collect()
        } else {
            self.primary_key.iter().filter_map(|k| self.column(k)).collect()
        }
    }

    /// Seed for generated table aliases: first letter of the table, lowercased.
    pub fn alias_seed(&self) -> String {
        self.table
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_lowercase().to_string())
            .unwrap_or_else(|| "t".to_string())
    }
}

/// A mapped column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ValueType,
    #[serde(default)]
    pub nullable: bool,
}

impl Column {
    pub fn is_nullable(&self) -> bool {
        self.nullable || self.ty.is_nullable()
    }
}

/// Cardinality of a navigation, seen from the declaring entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    OneToOne,
    ManyToOne,
    OneToMany,
}

/// A navigation from one entity to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Navigation name (`Blog` on `Post`).
    pub name: String,
    /// Target entity name.
    pub target: String,
    /// Equality pairs, local column to target column.
    pub keys: Vec<JoinKey>,
    pub cardinality: Cardinality,
    /// Whether the navigation may be absent (nullable foreign key).
    #[serde(default)]
    pub optional: bool,
}

impl Relationship {
    pub fn new(name: &str, target: &str, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            keys: vec![],
            cardinality,
            optional: false,
        }
    }

    pub fn on(mut self, local: &str, remote: &str) -> Self {
        self.keys.push(JoinKey {
            local: local.into(),
            remote: remote.into(),
        });
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Whether following the navigation can fail to find a row.
    pub fn may_be_absent(&self) -> bool {
        self.optional || self.cardinality == Cardinality::OneToMany
    }
}

/// One column pair of a relationship's join condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinKey {
    pub local: String,
    pub remote: String,
}

/// A resolved member of an entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Member<'a> {
    Column(&'a Column),
    Relationship(&'a Relationship),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog() -> Entity {
        Entity::new("Blog", "Blogs")
            .with_column("BlogId", ValueType::Int)
            .with_column("Url", ValueType::String.nullable())
            .with_column("UserId", ValueType::Int)
            .with_primary_key(&["BlogId"])
            .with_relationship(
                Relationship::new("User", "User", Cardinality::ManyToOne)
                    .on("UserId", "UserId")
                    .optional(),
            )
    }

    #[test]
    fn test_member_resolution() {
        let blog = blog();
        assert!(matches!(blog.member("Url"), Some(Member::Column(c)) if c.is_nullable()));
        assert!(matches!(blog.member("User"), Some(Member::Relationship(r)) if r.target == "User"));
        assert!(blog.member("Missing").is_none());
    }

    #[test]
    fn test_key_columns() {
        let names = |e: &Entity| -> Vec<String> {
            e.key_columns().into_iter().map(|c| c.name.clone()).collect()
        };
        assert_eq!(names(&blog()), vec!["BlogId"]);

        let keyless = Entity::new("Log", "Logs")
            .with_column("At", ValueType::DateTime)
            .with_column("Line", ValueType::String);
        assert_eq!(names(&keyless), vec!["At", "Line"]);
    }

    #[test]
    fn test_alias_seed() {
        assert_eq!(blog().alias_seed(), "b");
        assert_eq!(Entity::new("Statistic", "Statistics").alias_seed(), "s");
    }

    #[test]
    fn test_may_be_absent() {
        let required = Relationship::new("Blog", "Blog", Cardinality::ManyToOne);
        let many = Relationship::new("Posts", "Post", Cardinality::OneToMany);
        assert!(!required.may_be_absent());
        assert!(many.may_be_absent());
        assert!(required.optional().may_be_absent());
    }
}
