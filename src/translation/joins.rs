//! Join resolution for relationship navigation.
//!
//! Each statement keeps a cache from navigation path (`p0.Blog.User`) to
//! join alias, so a relationship touched several times is joined once.

use tracing::debug;

use crate::schema::Relationship;
use crate::sql::{table_col, Expr, ExprExt, Join, JoinKind, Source, TableRef};

use super::error::{TranslationError, TranslationResult};
use super::state::{EntityRef, Origin, TranslationState};

impl<'a> TranslationState<'a> {
    /// Follow `rel` from `from`, joining its target into the current
    /// statement unless the same path is already joined.
    pub fn navigate(
        &mut self,
        from: &EntityRef<'a>,
        rel: &'a Relationship,
    ) -> TranslationResult<EntityRef<'a>> {
        let target = self.entity(&rel.target)?;
        let path = format!("{}.{}", from.path, rel.name);
        let left_outer = rel.may_be_absent()
            || self.in_disjunction()
            || self.in_projection()
            || from.nullable;

        let cached = self.scope()?.joins.get(&path).cloned();
        let alias = match cached {
            Some(alias) => {
                if left_outer {
                    self.upgrade_to_left_outer(&path)?;
                }
                alias
            }
            None => {
                // Local key columns are read before the join exists so that
                // carrier exposure into derived tables happens first
                let mut locals = Vec::with_capacity(rel.keys.len());
                for key in &rel.keys {
                    let local = match from.origin {
                        Origin::Table { .. } => self.column_expr(from, &key.local)?,
                        Origin::Derived { .. } => self.carrier_expr(from, &key.local)?,
                    };
                    locals.push(local);
                }

                let alias = self.names.next(&target.alias_seed());
                let remotes = rel
                    .keys
                    .iter()
                    .map(|key| table_col(&alias, &key.remote))
                    .collect();
                let on = key_equality(locals, remotes).ok_or_else(|| {
                    TranslationError::InvalidQuery(format!(
                        "relationship '{}' has no join keys",
                        rel.name
                    ))
                })?;

                let kind = if left_outer {
                    JoinKind::LeftOuter
                } else {
                    JoinKind::Inner
                };
                let table = TableRef::new(&target.table, &alias)
                    .with_schema(target.schema.as_deref());

                debug!(path = %path, alias = %alias, ?kind, "joining relationship");
                let scope = self.scope_mut()?;
                scope.select.joins.push(Join {
                    kind,
                    source: Source::Table(table),
                    on,
                });
                scope.joins.insert(path.clone(), alias.clone());
                alias
            }
        };

        let nullable = self
            .scope_mut()?
            .select
            .join_mut(&alias)
            .is_some_and(|j| j.kind == JoinKind::LeftOuter);

        Ok(EntityRef {
            entity: target,
            origin: Origin::Table { alias },
            path,
            keyed: from.keyed,
            nullable,
        })
    }

    /// Make the join for `path` and every join reached through it left outer.
    fn upgrade_to_left_outer(&mut self, path: &str) -> TranslationResult<()> {
        let scope = self.scope_mut()?;
        let nested = format!("{}.", path);
        let aliases: Vec<String> = scope
            .joins
            .iter()
            .filter(|(p, _)| p.as_str() == path || p.starts_with(&nested))
            .map(|(_, alias)| alias.clone())
            .collect();

        for alias in aliases {
            if let Some(join) = scope.select.join_mut(&alias) {
                if join.kind != JoinKind::LeftOuter {
                    debug!(alias = %alias, "upgrading join to left outer");
                    join.kind = JoinKind::LeftOuter;
                }
            }
        }
        Ok(())
    }
}

/// Pairwise equality of two key lists, ANDed. None when there are no keys.
pub fn key_equality(left: Vec<Expr>, right: Vec<Expr>) -> Option<Expr> {
    left.into_iter()
        .zip(right)
        .map(|(l, r)| l.eq(r))
        .reduce(|acc, term| acc.and(term))
}
