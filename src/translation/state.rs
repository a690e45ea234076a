//! Per-run translation state: result stack, statement scopes, bindings.

use std::collections::HashMap;

use crate::config::TranslationSettings;
use crate::schema::{Entity, Member, SchemaProvider};
use crate::sql::{Dialect, Expr, Select, Source, TableRef};

use super::error::{TranslationError, TranslationResult};
use super::names::UniqueNameGenerator;

/// Naming options for generated derived tables and carrier columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateOptions {
    /// Alias seed for derived tables.
    pub derived_table_prefix: String,
    /// Infix for join-key carrier columns.
    pub carrier_suffix: String,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            derived_table_prefix: "sq".to_string(),
            carrier_suffix: "_jk".to_string(),
        }
    }
}

impl From<&TranslationSettings> for TranslateOptions {
    fn from(settings: &TranslationSettings) -> Self {
        Self {
            derived_table_prefix: settings.derived_table_prefix.clone(),
            carrier_suffix: settings.carrier_suffix.clone(),
        }
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// Where the columns of an entity can be read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin<'a> {
    /// A base table joined (or selected) under `alias`.
    Table { alias: String },
    /// An entity living inside the derived table `alias`; `inner` is how
    /// the derived statement itself refers to it.
    Derived {
        alias: String,
        inner: Box<EntityRef<'a>>,
    },
}

/// A symbolic reference to one entity row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRef<'a> {
    pub entity: &'a Entity,
    pub origin: Origin<'a>,
    /// Navigation path from the statement source, the join cache key.
    pub path: String,
    /// Part of a group key: columns read through it are grouped on.
    pub keyed: bool,
    /// Reached through a left outer join.
    pub nullable: bool,
}

impl<'a> EntityRef<'a> {
    /// Entity read straight from a table alias.
    pub fn table(entity: &'a Entity, alias: &str) -> Self {
        Self {
            entity,
            origin: Origin::Table {
                alias: alias.to_string(),
            },
            path: alias.to_string(),
            keyed: false,
            nullable: false,
        }
    }

    /// The same entity, seen from outside the derived table `alias`.
    pub fn derived(inner: EntityRef<'a>, alias: &str) -> Self {
        Self {
            entity: inner.entity,
            path: format!("{}/{}", alias, inner.path),
            keyed: false,
            nullable: inner.nullable,
            origin: Origin::Derived {
                alias: alias.to_string(),
                inner: Box::new(inner),
            },
        }
    }
}

/// A value on the translation stack.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    /// A scalar SQL expression.
    Value(Expr),
    /// An entity row (expands to columns on demand).
    Entity(EntityRef<'a>),
    /// An anonymous object: named fields in declaration order.
    Record(Vec<(String, Node<'a>)>),
    /// A grouping: the key and the shape of the grouped elements.
    Group {
        key: Box<Node<'a>>,
        element: Box<Node<'a>>,
    },
}

impl<'a> Node<'a> {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Value(_) => "value",
            Node::Entity(_) => "entity",
            Node::Record(_) => "record",
            Node::Group { .. } => "grouping",
        }
    }

    /// Unwrap a scalar, failing with `InvalidQuery` for anything else.
    pub fn into_value(self, context: &str) -> TranslationResult<Expr> {
        match self {
            Node::Value(expr) => Ok(expr),
            other => Err(TranslationError::InvalidQuery(format!(
                "{} must be a scalar, got {}",
                context,
                other.kind_name()
            ))),
        }
    }

    /// Whether a record (at any depth) carries entity-valued fields.
    pub fn projects_entities(&self) -> bool {
        match self {
            Node::Record(fields) => fields.iter().any(|(_, node)| {
                matches!(node, Node::Entity(_)) || node.projects_entities()
            }),
            _ => false,
        }
    }

    /// Mark every entity in this node as part of a group key.
    pub fn into_keyed(self) -> Self {
        match self {
            Node::Entity(mut eref) => {
                eref.keyed = true;
                Node::Entity(eref)
            }
            Node::Record(fields) => Node::Record(
                fields
                    .into_iter()
                    .map(|(name, node)| (name, node.into_keyed()))
                    .collect(),
            ),
            other => other,
        }
    }
}

// ============================================================================
// Scopes
// ============================================================================

/// One statement under construction.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    pub select: Select,
    /// Symbolic description of one row of `select`.
    pub shape: Node<'a>,
    /// Navigation path to join alias; a path is joined at most once.
    pub joins: HashMap<String, String>,
}

impl<'a> Scope<'a> {
    pub fn new(select: Select, shape: Node<'a>) -> Self {
        Self {
            select,
            shape,
            joins: HashMap::new(),
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Everything one translation run mutates.
pub struct TranslationState<'a> {
    stack: Vec<Node<'a>>,
    pub(super) scopes: Vec<Scope<'a>>,
    bindings: Vec<(String, Node<'a>)>,
    or_depth: usize,
    projection_depth: usize,
    pub names: UniqueNameGenerator,
    pub schema: &'a dyn SchemaProvider,
    pub dialect: Dialect,
    pub options: TranslateOptions,
}

impl<'a> TranslationState<'a> {
    pub fn new(schema: &'a dyn SchemaProvider, dialect: Dialect, options: TranslateOptions) -> Self {
        Self {
            stack: vec![],
            scopes: vec![],
            bindings: vec![],
            or_depth: 0,
            projection_depth: 0,
            names: UniqueNameGenerator::new(),
            schema,
            dialect,
            options,
        }
    }

    // === Stack ===

    pub fn push(&mut self, node: Node<'a>) {
        self.stack.push(node);
    }

    pub fn pop(&mut self) -> TranslationResult<Node<'a>> {
        self.stack.pop().ok_or_else(|| {
            TranslationError::InternalStackInvariantViolation("pop from empty stack".into())
        })
    }

    /// Pop a scalar.
    pub fn pop_value(&mut self, context: &str) -> TranslationResult<Expr> {
        self.pop()?.into_value(context)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Check the stack holds exactly `expected` nodes after `context` ran.
    pub fn expect_depth(&self, expected: usize, context: &str) -> TranslationResult<()> {
        if self.stack.len() == expected {
            Ok(())
        } else {
            Err(TranslationError::InternalStackInvariantViolation(format!(
                "{} left {} nodes on the stack, expected {}",
                context,
                self.stack.len(),
                expected
            )))
        }
    }

    // === Scopes ===

    /// Start a statement selecting from `entity`'s table.
    pub fn open_scope(&mut self, entity: &'a Entity) {
        let alias = self.names.next(&entity.alias_seed());
        let table = TableRef::new(&entity.table, &alias).with_schema(entity.schema.as_deref());
        let shape = Node::Entity(EntityRef::table(entity, &alias));
        self.scopes
            .push(Scope::new(Select::new(Source::Table(table)), shape));
    }

    pub fn push_scope(&mut self, scope: Scope<'a>) {
        self.scopes.push(scope);
    }

    pub fn close_scope(&mut self) -> TranslationResult<Scope<'a>> {
        self.scopes
            .pop()
            .ok_or_else(|| TranslationError::InvalidQuery("query has no data source".into()))
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    pub fn scope(&self) -> TranslationResult<&Scope<'a>> {
        self.scopes
            .last()
            .ok_or_else(|| TranslationError::InvalidQuery("query has no data source".into()))
    }

    pub fn scope_mut(&mut self) -> TranslationResult<&mut Scope<'a>> {
        self.scopes
            .last_mut()
            .ok_or_else(|| TranslationError::InvalidQuery("query has no data source".into()))
    }

    // === Lambda bindings ===

    /// Bind lambda parameters to nodes; returns the binding depth to restore.
    pub fn bind(&mut self, params: &[String], args: Vec<Node<'a>>) -> TranslationResult<usize> {
        if params.len() != args.len() {
            return Err(TranslationError::InvalidQuery(format!(
                "lambda takes {} parameters, operator supplies {}",
                params.len(),
                args.len()
            )));
        }
        let mark = self.bindings.len();
        self.bindings
            .extend(params.iter().cloned().zip(args));
        Ok(mark)
    }

    pub fn unbind(&mut self, mark: usize) {
        self.bindings.truncate(mark);
    }

    pub fn in_lambda(&self) -> bool {
        !self.bindings.is_empty()
    }

    /// Innermost binding of `name`.
    pub fn lookup(&self, name: &str) -> TranslationResult<Node<'a>> {
        self.bindings
            .iter()
            .rev()
            .find(|(param, _)| param == name)
            .map(|(_, node)| node.clone())
            .ok_or_else(|| TranslationError::UnboundParameter(name.to_string()))
    }

    // === Context counters ===

    pub fn enter_disjunction(&mut self) {
        self.or_depth += 1;
    }

    pub fn exit_disjunction(&mut self) {
        self.or_depth = self.or_depth.saturating_sub(1);
    }

    pub fn in_disjunction(&self) -> bool {
        self.or_depth > 0
    }

    pub fn enter_projection(&mut self) {
        self.projection_depth += 1;
    }

    pub fn exit_projection(&mut self) {
        self.projection_depth = self.projection_depth.saturating_sub(1);
    }

    pub fn in_projection(&self) -> bool {
        self.projection_depth > 0
    }

    // === Schema ===

    pub fn entity(&self, hint: &str) -> TranslationResult<&'a Entity> {
        self.schema
            .resolve_entity(hint)
            .ok_or_else(|| TranslationError::UnknownEntity(hint.to_string()))
    }

    pub fn member(&self, entity: &'a Entity, name: &str) -> TranslationResult<Member<'a>> {
        self.schema
            .resolve_member(entity, name)
            .ok_or_else(|| TranslationError::UnresolvedMember {
                entity: entity.name.clone(),
                member: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::sql::table_col;
    use crate::tree::ValueType;

    fn schema() -> Schema {
        Schema::new().with_entity(
            Entity::new("Blog", "Blogs")
                .with_column("BlogId", ValueType::Int)
                .with_primary_key(&["BlogId"]),
        )
    }

    #[test]
    fn test_pop_empty_stack_is_invariant_violation() {
        let schema = schema();
        let mut state = TranslationState::new(&schema, Dialect::Sqlite, TranslateOptions::default());
        assert!(matches!(
            state.pop(),
            Err(TranslationError::InternalStackInvariantViolation(_))
        ));
    }

    #[test]
    fn test_expect_depth() {
        let schema = schema();
        let mut state = TranslationState::new(&schema, Dialect::Sqlite, TranslateOptions::default());
        state.push(Node::Value(table_col("b0", "BlogId")));
        assert!(state.expect_depth(1, "test").is_ok());
        assert!(state.expect_depth(0, "test").is_err());
    }

    #[test]
    fn test_bindings_shadow_and_restore() {
        let schema = schema();
        let mut state = TranslationState::new(&schema, Dialect::Sqlite, TranslateOptions::default());
        let outer = state
            .bind(&["x".into()], vec![Node::Value(table_col("a", "A"))])
            .unwrap();
        let inner = state
            .bind(&["x".into()], vec![Node::Value(table_col("b", "B"))])
            .unwrap();
        assert_eq!(state.lookup("x").unwrap(), Node::Value(table_col("b", "B")));
        state.unbind(inner);
        assert_eq!(state.lookup("x").unwrap(), Node::Value(table_col("a", "A")));
        state.unbind(outer);
        assert!(matches!(
            state.lookup("x"),
            Err(TranslationError::UnboundParameter(_))
        ));
    }

    #[test]
    fn test_bind_arity_mismatch() {
        let schema = schema();
        let mut state = TranslationState::new(&schema, Dialect::Sqlite, TranslateOptions::default());
        let err = state.bind(&["a".into(), "b".into()], vec![]).unwrap_err();
        assert!(matches!(err, TranslationError::InvalidQuery(_)));
    }

    #[test]
    fn test_open_scope_aliases_table() {
        let schema = schema();
        let mut state = TranslationState::new(&schema, Dialect::Sqlite, TranslateOptions::default());
        let blog = state.entity("Blog").unwrap();
        state.open_scope(blog);

        let scope = state.scope().unwrap();
        assert_eq!(scope.select.from.alias(), "b0");
        assert!(matches!(&scope.shape, Node::Entity(e) if e.path == "b0"));
    }

    #[test]
    fn test_projects_entities() {
        let schema = schema();
        let blog = schema.entities.first().unwrap();
        let record = Node::Record(vec![
            ("Blog".into(), Node::Entity(EntityRef::table(blog, "b0"))),
            ("Id".into(), Node::Value(table_col("b0", "BlogId"))),
        ]);
        assert!(record.projects_entities());
        assert!(!Node::Entity(EntityRef::table(blog, "b0")).projects_entities());
    }
}
