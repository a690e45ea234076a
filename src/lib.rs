//! # chainsql
//!
//! Translates chained query-operator trees into multi-dialect SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Query Tree (tree::QueryExpr)                  │
//! │  Source(Blog).Where(b => ..).GroupBy(..).Select(..)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [translation - walker + registry]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Statement Model (sql::Select, sql::Expr)             │
//! │     joins resolved via schema::SchemaProvider            │
//! │     derived tables planned by the unwrapper              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [tokens + dialect]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SQL text (SQLite, T-SQL, MySQL, PostgreSQL)       │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use chainsql::prelude::*;
//! use chainsql::tree::{self, param};
//!
//! let schema = Schema::new().with_entity(
//!     Entity::new("Blog", "Blogs")
//!         .with_column("BlogId", ValueType::Int)
//!         .with_column("CommentCount", ValueType::Int)
//!         .with_primary_key(&["BlogId"]),
//! );
//!
//! let query = tree::source("Blog")
//!     .filter(tree::lambda("b", param("b").member("CommentCount").gt(tree::int(10))));
//!
//! let sql = translate(&query, &schema, Dialect::Sqlite).unwrap().to_sql(Dialect::Sqlite);
//! assert!(sql.contains("where b0.CommentCount > 10"));
//! ```

pub mod config;
pub mod schema;
pub mod sql;
pub mod translation;
pub mod tree;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{Settings, SettingsError, TranslationSettings};
    pub use crate::schema::{
        Cardinality, Column, Entity, JoinKey, Member, Relationship, Schema, SchemaProvider,
    };
    pub use crate::sql::{Dialect, Select, SqlDialect};
    pub use crate::translation::{
        translate, translate_to_sql, translate_with, TranslateOptions, TranslationError,
        TranslationResult,
    };
    pub use crate::tree::{ConstValue, QueryExpr, ValueType};
}

// Also export at crate root for convenience
pub use sql::{Dialect, Select};
pub use translation::{translate, translate_to_sql, translate_with, TranslationError};
pub use tree::QueryExpr;
