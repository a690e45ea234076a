//! Query unwrapping: decide whether an operator folds into the current
//! statement or whether the statement must first become a derived table.
//!
//! ```text
//! Blogs.Take(10).Where(b => b.Rank > 3)
//!
//! select sq0.BlogId, ...
//! from (select b0.BlogId, ... from Blogs b0 limit 10) sq0
//! where sq0.Rank > 3
//! ```
//!
//! Columns of a derived table are exposed on demand: the first read of an
//! inner column adds it to the inner select list, later reads reuse it.

use tracing::debug;

use crate::sql::{table_col, table_star, Dialect, Expr, Select, SelectItem, Source};

use super::error::{TranslationError, TranslationResult};
use super::names::UniqueNameGenerator;
use super::state::{EntityRef, Node, Origin, Scope, TranslationState};

/// The statement-level operation about to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Where,
    Select,
    GroupBy,
    OrderBy,
    Distinct,
    Join,
    Take,
    Skip,
    Aggregate,
}

/// Outcome of planning one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Apply to the current statement.
    Fold,
    /// Wrap the current statement as a derived table first.
    Wrap,
}

/// Decide how `step` applies to a statement with row shape `shape`.
pub fn plan(select: &Select, shape: &Node<'_>, step: Step) -> Plan {
    let paged = select.is_paged();
    let wrap = match step {
        // Window arithmetic keeps paging in one statement
        Step::Take | Step::Skip => false,
        Step::Select => select.distinct,
        Step::Where | Step::OrderBy | Step::Distinct => paged,
        Step::GroupBy => {
            paged || select.distinct || select.is_grouped() || shape.projects_entities()
        }
        Step::Join | Step::Aggregate => paged || select.distinct || select.is_grouped(),
    };
    if wrap {
        Plan::Wrap
    } else {
        Plan::Fold
    }
}

impl<'a> TranslationState<'a> {
    /// Make the current statement ready for `step`, wrapping it if needed.
    pub fn prepare(&mut self, step: Step) -> TranslationResult<()> {
        let scope = self.scope()?;
        if plan(&scope.select, &scope.shape, step) == Plan::Wrap {
            debug!(?step, "operator cannot fold into current statement");
            self.wrap()?;
        }
        Ok(())
    }

    /// Replace the current statement by one selecting from it.
    pub fn wrap(&mut self) -> TranslationResult<()> {
        let scope = self.close_scope()?;
        let (source, shape) = self.derive(scope)?;
        self.push_scope(Scope::new(Select::new(source), shape));
        Ok(())
    }

    /// Finalize `scope` as a derived table. Returns the source and the row
    /// shape as seen from the enclosing statement.
    pub fn derive(&mut self, scope: Scope<'a>) -> TranslationResult<(Source, Node<'a>)> {
        let Scope {
            mut select, shape, ..
        } = scope;
        let alias = self.names.next(&self.options.derived_table_prefix);

        let outer = expose_shape(&mut select, shape, &alias, &mut self.names)?;
        if select.items.is_empty() {
            return Err(TranslationError::MalformedProjection(format!(
                "derived table {} selects nothing",
                alias
            )));
        }
        // Row order of a derived table only matters when it is paged
        if !select.is_paged() {
            select.order_by.clear();
        }
        check_grouping(&select)?;

        debug!(alias = %alias, items = select.items.len(), "wrapped statement as derived table");
        Ok((
            Source::Derived {
                select: Box::new(select),
                alias,
            },
            outer,
        ))
    }

    /// SQL expression for `column` of `eref` in the current statement.
    ///
    /// Entities inside derived tables get the column exposed through every
    /// level of nesting.
    pub fn column_expr(&mut self, eref: &EntityRef<'a>, column: &str) -> TranslationResult<Expr> {
        self.exposed_column(eref, column, None)
    }

    /// Like [`column_expr`](Self::column_expr), but a column newly exposed
    /// from a derived table is named as a join-key carrier.
    pub fn carrier_expr(&mut self, eref: &EntityRef<'a>, column: &str) -> TranslationResult<Expr> {
        let seed = format!("{}{}", column, self.options.carrier_suffix);
        self.exposed_column(eref, column, Some(&seed))
    }

    /// Read a column as a value. Reads through a group-key entity in a
    /// grouped statement become group keys themselves.
    pub fn read_column(&mut self, eref: &EntityRef<'a>, column: &str) -> TranslationResult<Expr> {
        let expr = self.column_expr(eref, column)?;
        let select = &mut self.scope_mut()?.select;
        if eref.keyed && select.is_grouped() {
            select.add_group_key(expr.clone());
        }
        Ok(expr)
    }

    fn exposed_column(
        &mut self,
        eref: &EntityRef<'a>,
        column: &str,
        carrier: Option<&str>,
    ) -> TranslationResult<Expr> {
        match &eref.origin {
            Origin::Table { alias } => Ok(table_col(alias, column)),
            Origin::Derived { alias, inner } => {
                let scope = self.scopes.last_mut().ok_or_else(no_source)?;
                let derived = scope
                    .select
                    .derived_mut(alias)
                    .ok_or_else(|| missing_derived(alias))?;
                let name = expose_column(derived, inner, column, carrier, &mut self.names)?;
                Ok(table_col(alias, &name))
            }
        }
    }

    /// Close the current statement, turning its row shape into select items.
    pub fn finalize(&mut self) -> TranslationResult<Select> {
        let scope = self.scope()?;
        if scope.select.items.is_empty() {
            let shape = scope.shape.clone();
            self.project(shape, None)?;
        }
        let scope = self.close_scope()?;
        check_grouping(&scope.select)?;
        Ok(scope.select)
    }

    fn project(&mut self, node: Node<'a>, name: Option<&str>) -> TranslationResult<()> {
        match node {
            Node::Value(expr) => {
                let scope = self.scopes.last_mut().ok_or_else(no_source)?;
                match name {
                    Some(name) => push_named(&mut scope.select, expr, name, &mut self.names),
                    None => scope.select.items.push(SelectItem::new(expr)),
                }
            }
            Node::Entity(eref) => {
                let grouped = self.scope()?.select.is_grouped();
                match &eref.origin {
                    Origin::Table { alias } if !grouped => {
                        let star = table_star(alias);
                        self.scope_mut()?.select.items.push(star.into());
                    }
                    _ => {
                        for column in &eref.entity.columns {
                            let expr = self.read_column(&eref, &column.name)?;
                            let scope = self.scopes.last_mut().ok_or_else(no_source)?;
                            push_named(&mut scope.select, expr, &column.name, &mut self.names);
                        }
                    }
                }
            }
            Node::Record(fields) => {
                if fields.is_empty() {
                    return Err(TranslationError::MalformedProjection(
                        "projection has no fields".into(),
                    ));
                }
                for (field, node) in fields {
                    self.project(node, Some(&field))?;
                }
            }
            Node::Group { .. } => {
                return Err(TranslationError::MalformedProjection(
                    "a grouping cannot be selected; project its key or aggregates".into(),
                ))
            }
        }
        Ok(())
    }
}

fn no_source() -> TranslationError {
    TranslationError::InvalidQuery("query has no data source".into())
}

fn missing_derived(alias: &str) -> TranslationError {
    TranslationError::InvalidQuery(format!("derived table '{}' is not in scope", alias))
}

/// Expose `column` of `eref` from `select`; returns its output name.
fn expose_column(
    select: &mut Select,
    eref: &EntityRef<'_>,
    column: &str,
    carrier: Option<&str>,
    names: &mut UniqueNameGenerator,
) -> TranslationResult<String> {
    let expr = match &eref.origin {
        Origin::Table { alias } => table_col(alias, column),
        Origin::Derived { alias, inner } => {
            let derived = select
                .derived_mut(alias)
                .ok_or_else(|| missing_derived(alias))?;
            let name = expose_column(derived, inner, column, None, names)?;
            table_col(alias, &name)
        }
    };
    if eref.keyed && select.is_grouped() {
        select.add_group_key(expr.clone());
    }
    Ok(match carrier {
        Some(seed) => expose_value(select, expr, seed, true, names),
        None => expose_value(select, expr, column, false, names),
    })
}

/// Add `expr` to the select list unless already there; returns the output name.
fn expose_value(
    select: &mut Select,
    expr: Expr,
    name: &str,
    numbered: bool,
    names: &mut UniqueNameGenerator,
) -> String {
    if let Some(existing) = select.find_output(&expr) {
        return existing.to_string();
    }
    let mut exposed = if numbered {
        names.next(name)
    } else {
        name.to_string()
    };
    while select.has_output_name(&exposed) {
        exposed = names.next(name);
    }
    select.push_item(expr, &exposed);
    exposed
}

fn push_named(select: &mut Select, expr: Expr, name: &str, names: &mut UniqueNameGenerator) {
    let mut output = name.to_string();
    while select.has_output_name(&output) {
        output = names.next(name);
    }
    select.push_item(expr, &output);
}

/// Expose a row shape from the inner statement of derived table `alias`.
fn expose_shape<'a>(
    select: &mut Select,
    shape: Node<'a>,
    alias: &str,
    names: &mut UniqueNameGenerator,
) -> TranslationResult<Node<'a>> {
    match shape {
        Node::Value(expr) => {
            let name = expr.column_name().unwrap_or("Value").to_string();
            let exposed = expose_value(select, expr, &name, false, names);
            Ok(Node::Value(table_col(alias, &exposed)))
        }
        Node::Record(fields) => {
            let mut outer = Vec::with_capacity(fields.len());
            for (name, node) in fields {
                let node = match node {
                    Node::Value(expr) => {
                        let exposed = expose_value(select, expr, &name, false, names);
                        Node::Value(table_col(alias, &exposed))
                    }
                    other => expose_shape(select, other, alias, names)?,
                };
                outer.push((name, node));
            }
            Ok(Node::Record(outer))
        }
        Node::Entity(eref) => {
            let entity = eref.entity;
            // Distinct rows are identified by every column
            let eager: Vec<&str> = if select.distinct {
                entity.columns.iter().map(|c| c.name.as_str()).collect()
            } else {
                entity.key_columns().into_iter().map(|c| c.name.as_str()).collect()
            };
            for column in eager {
                expose_column(select, &eref, column, None, names)?;
            }
            Ok(Node::Entity(EntityRef::derived(eref, alias)))
        }
        Node::Group { key, .. } => {
            let key = expose_shape(select, *key, alias, names)?;
            Ok(Node::Group {
                key: Box::new(key),
                element: Box::new(Node::Record(vec![])),
            })
        }
    }
}

/// Every selectable, `having` predicate and sort key of a grouped statement
/// must be a key, an aggregate or built from them. Derived tables are checked recursively.
pub fn check_grouping(select: &Select) -> TranslationResult<()> {
    if select.is_grouped() {
        let offending = select
            .items
            .iter()
            .map(|item| &item.expr)
            .chain(select.having.iter())
            .chain(select.order_by.iter().map(|o| &o.expr))
            .find(|expr| !is_grouping_safe(expr, &select.group_by));
        if let Some(expr) = offending {
            return Err(TranslationError::MalformedProjection(format!(
                "'{}' is neither a group key nor an aggregate",
                expr.to_tokens().serialize(Dialect::default())
            )));
        }
    }

    let derived = std::iter::once(&select.from).chain(select.joins.iter().map(|j| &j.source));
    for source in derived {
        if let Source::Derived { select, .. } = source {
            check_grouping(select)?;
        }
    }
    Ok(())
}

fn is_grouping_safe(expr: &Expr, keys: &[Expr]) -> bool {
    if keys.contains(expr) {
        return true;
    }
    match expr {
        Expr::Aggregate { .. } | Expr::Constant(_) => true,
        Expr::Column { .. } | Expr::Star { .. } => false,
        Expr::BinaryOp { left, right, .. } => {
            is_grouping_safe(left, keys) && is_grouping_safe(right, keys)
        }
        Expr::UnaryOp { expr, .. } | Expr::IsNull { expr, .. } => is_grouping_safe(expr, keys),
        Expr::LikeEscape { expr, pattern, .. } => {
            is_grouping_safe(expr, keys) && is_grouping_safe(pattern, keys)
        }
        Expr::Case {
            when_clauses,
            else_clause,
        } => {
            when_clauses
                .iter()
                .all(|(w, t)| is_grouping_safe(w, keys) && is_grouping_safe(t, keys))
                && else_clause
                    .as_ref()
                    .map_or(true, |e| is_grouping_safe(e, keys))
        }
    }
}
