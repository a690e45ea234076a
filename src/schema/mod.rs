//! Schema model - the metadata translation resolves members against.
//!
//! Translation only sees the [`SchemaProvider`] trait. [`Schema`] is the
//! in-memory implementation, loadable from a TOML file:
//!
//! ```toml
//! [[entities]]
//! name = "Blog"
//! table = "Blogs"
//! primary_key = ["BlogId"]
//! columns = [
//!     { name = "BlogId", ty = "int" },
//!     { name = "Url", ty = "string", nullable = true },
//! ]
//!
//! [[entities.relationships]]
//! name = "User"
//! target = "User"
//! cardinality = "many_to_one"
//! optional = true
//! keys = [{ local = "UserId", remote = "UserId" }]
//! ```

mod entity;

pub use entity::{Cardinality, Column, Entity, JoinKey, Member, Relationship};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::SettingsError;

/// Read-only access to entity metadata.
///
/// Implementations must be deterministic; translation may run on several
/// threads against one provider.
pub trait SchemaProvider: Send + Sync {
    /// Find the entity for a type hint (entity name or table name).
    fn resolve_entity(&self, hint: &str) -> Option<&Entity>;

    /// Resolve a member of `entity` to a column or relationship.
    fn resolve_member<'a>(&'a self, entity: &'a Entity, name: &str) -> Option<Member<'a>> {
        entity.member(name)
    }
}

/// In-memory schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Parse and validate a schema from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let schema: Schema = toml::from_str(content)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load and validate a schema from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check that keys and relationships refer to declared columns and entities.
    pub fn validate(&self) -> Result<(), SettingsError> {
        for entity in &self.entities {
            for key in &entity.primary_key {
                if entity.column(key).is_none() {
                    return Err(SettingsError::InvalidConfig(format!(
                        "primary key column '{}' is not a column of '{}'",
                        key, entity.name
                    )));
                }
            }

            for rel in &entity.relationships {
                let target = self.resolve_entity(&rel.target).ok_or_else(|| {
                    SettingsError::InvalidConfig(format!(
                        "relationship '{}.{}' targets unknown entity '{}'",
                        entity.name, rel.name, rel.target
                    ))
                })?;

                if rel.keys.is_empty() {
                    return Err(SettingsError::InvalidConfig(format!(
                        "relationship '{}.{}' has no join keys",
                        entity.name, rel.name
                    )));
                }

                for key in &rel.keys {
                    if entity.column(&key.local).is_none() || target.column(&key.remote).is_none()
                    {
                        return Err(SettingsError::InvalidConfig(format!(
                            "relationship '{}.{}' joins on unknown columns {} = {}",
                            entity.name, rel.name, key.local, key.remote
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

impl SchemaProvider for Schema {
    fn resolve_entity(&self, hint: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.name == hint || e.table == hint)
            .or_else(|| {
                self.entities
                    .iter()
                    .find(|e| e.name.eq_ignore_ascii_case(hint))
            })
    }
}
