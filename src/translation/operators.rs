//! Statement operator translators.
//!
//! Each handler receives the walker with the receiver's statement as the
//! current scope, consults the planner, evaluates its lambdas against the
//! current row shape and leaves the stack as it found it.

use tracing::debug;

use crate::sql::{
    lit, lit_int, ExprExt, Join, JoinKind, LimitOffset, Literal, OrderByExpr, Select, Source,
    TableRef,
};
use crate::tree::{ConstValue, QueryExpr};

use super::error::{TranslationError, TranslationResult};
use super::joins::key_equality;
use super::registry::OperatorCall;
use super::state::{EntityRef, Node};
use super::unwrap::Step;
use super::walker::{is_query, ExpressionWalker};

// ============================================================================
// Filtering and projection
// ============================================================================

/// `Where(x => predicate)`: ANDed into `where`, or `having` once grouped.
pub fn where_op(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    walker.state.prepare(Step::Where)?;
    let shape = walker.state.scope()?.shape.clone();
    let predicate = walker
        .visit_lambda(call.arg(0)?, vec![shape])?
        .into_value("where predicate")?;

    let select = &mut walker.state.scope_mut()?.select;
    if select.is_grouped() {
        select.and_having(predicate);
    } else {
        select.and_where(predicate);
    }
    Ok(())
}

/// `Select(x => projection)`: the projection becomes the row shape.
pub fn select_op(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    walker.state.prepare(Step::Select)?;
    let shape = walker.state.scope()?.shape.clone();
    let projection = walker.visit_projection(call.arg(0)?, vec![shape])?;
    walker.state.scope_mut()?.shape = projection;
    Ok(())
}

// ============================================================================
// Grouping
// ============================================================================

/// `GroupBy(x => key [, x => element])`.
pub fn group_by_op(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    walker.state.prepare(Step::GroupBy)?;
    let shape = walker.state.scope()?.shape.clone();

    let key = walker
        .visit_projection(call.arg(0)?, vec![shape.clone()])?
        .into_keyed();
    let element = match call.args.get(1) {
        Some(selector) => walker.visit_projection(selector, vec![shape])?,
        None => shape,
    };

    let keys = walker.key_exprs(key.clone(), "a group key")?;
    if keys.is_empty() {
        return Err(TranslationError::InvalidQuery(
            "group key selects no columns".into(),
        ));
    }

    let scope = walker.state.scope_mut()?;
    for key in keys {
        scope.select.add_group_key(key);
    }
    debug!(keys = scope.select.group_by.len(), "grouping statement");
    scope.shape = Node::Group {
        key: Box::new(key),
        element: Box::new(element),
    };
    Ok(())
}

// ============================================================================
// Ordering
// ============================================================================

pub fn order_by_op(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    order(walker, call, false, false)
}

pub fn order_by_desc_op(
    walker: &mut ExpressionWalker<'_>,
    call: &OperatorCall<'_>,
) -> TranslationResult<()> {
    order(walker, call, true, false)
}

pub fn then_by_op(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    order(walker, call, false, true)
}

pub fn then_by_desc_op(
    walker: &mut ExpressionWalker<'_>,
    call: &OperatorCall<'_>,
) -> TranslationResult<()> {
    order(walker, call, true, true)
}

fn order(
    walker: &mut ExpressionWalker<'_>,
    call: &OperatorCall<'_>,
    descending: bool,
    append: bool,
) -> TranslationResult<()> {
    walker.state.prepare(Step::OrderBy)?;
    let shape = walker.state.scope()?.shape.clone();
    let key = walker.visit_lambda(call.arg(0)?, vec![shape])?;
    let exprs = walker.key_exprs(key, "a sort key")?;

    let select = &mut walker.state.scope_mut()?.select;
    if !append {
        select.order_by.clear();
    }
    select.order_by.extend(exprs.into_iter().map(|expr| {
        if descending {
            OrderByExpr::desc(expr)
        } else {
            OrderByExpr::asc(expr)
        }
    }));
    Ok(())
}

// ============================================================================
// Distinct and paging
// ============================================================================

pub fn distinct_op(walker: &mut ExpressionWalker<'_>, _call: &OperatorCall<'_>) -> TranslationResult<()> {
    walker.state.prepare(Step::Distinct)?;
    walker.state.scope_mut()?.select.distinct = true;
    Ok(())
}

/// `Take(n)`: narrows the window; `Take(a).Take(b)` keeps `min(a, b)`.
pub fn take_op(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    walker.state.prepare(Step::Take)?;
    let n = row_count(call)?;
    let select = &mut walker.state.scope_mut()?.select;
    let window = select.limit_offset.get_or_insert_with(LimitOffset::default);
    window.limit = Some(window.limit.map_or(n, |limit| limit.min(n)));
    close_empty_window(select);
    Ok(())
}

/// `Skip(n)`: moves the window start; a limit already set shrinks by `n`.
pub fn skip_op(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    walker.state.prepare(Step::Skip)?;
    let n = row_count(call)?;
    let select = &mut walker.state.scope_mut()?.select;
    let window = select.limit_offset.get_or_insert_with(LimitOffset::default);
    let offset = window
        .offset
        .unwrap_or(0)
        .checked_add(n)
        .filter(|offset| i64::try_from(*offset).is_ok())
        .ok_or_else(|| {
            TranslationError::InvalidQuery(format!("Skip moves the window past row {}", i64::MAX))
        })?;
    window.offset = Some(offset);
    window.limit = window.limit.map(|limit| limit.saturating_sub(n));
    close_empty_window(select);
    Ok(())
}

/// A window of zero rows becomes a false predicate; `fetch next 0 rows`
/// is rejected by T-SQL.
fn close_empty_window(select: &mut Select) {
    let Some(window) = select.limit_offset.as_mut() else {
        return;
    };
    if window.limit == Some(0) {
        window.limit = None;
        if window.offset.is_none() {
            select.limit_offset = None;
        }
        debug!("window is empty");
        select.and_where(lit_int(1).eq(lit_int(0)));
    }
}

fn row_count(call: &OperatorCall<'_>) -> TranslationResult<u64> {
    match call.arg(0)? {
        QueryExpr::Constant {
            value: ConstValue::Int(n),
            ..
        } if *n >= 0 => Ok(*n as u64),
        other => Err(TranslationError::InvalidQuery(format!(
            "{} needs a non-negative integer constant, got {}",
            call.name,
            other.kind_name()
        ))),
    }
}

// ============================================================================
// Join
// ============================================================================

/// `Join(inner, o => outerKey, i => innerKey, (o, i) => result)`.
///
/// The inner side is a table when it is a bare source and a derived table
/// when it is a chain of operators. Renders as an inner join.
pub fn join_op(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    walker.state.prepare(Step::Join)?;
    let outer_shape = walker.state.scope()?.shape.clone();
    let inner = call.arg(0)?;
    let outer_key = call.arg(1)?;
    let inner_key = call.arg(2)?;
    let result = call.arg(3)?;

    let (source, inner_shape) = match inner {
        QueryExpr::Source { entity } => {
            let entity = walker.state.entity(entity)?;
            let alias = walker.state.names.next(&entity.alias_seed());
            let table =
                TableRef::new(&entity.table, &alias).with_schema(entity.schema.as_deref());
            (
                Source::Table(table),
                Node::Entity(EntityRef::table(entity, &alias)),
            )
        }
        nested if is_query(nested) => {
            walker.visit_query(nested)?;
            let scope = walker.state.close_scope()?;
            walker.state.derive(scope)?
        }
        other => {
            return Err(TranslationError::InvalidQuery(format!(
                "join needs a query as its inner side, got {}",
                other.kind_name()
            )))
        }
    };

    // The join has to be in place while key lambdas expose derived columns
    let alias = source.alias().to_string();
    walker.state.scope_mut()?.select.joins.push(Join {
        kind: JoinKind::Inner,
        source,
        on: lit(Literal::Bool(true)),
    });

    let outer_keys = walker.visit_lambda(outer_key, vec![outer_shape.clone()])?;
    let outer_end = walker.state.scope()?.select.joins.len();
    let inner_keys = walker.visit_lambda(inner_key, vec![inner_shape.clone()])?;
    let inner_navigated = walker.state.scope()?.select.joins.len() > outer_end;
    let outer_keys = walker.key_exprs(outer_keys, "a join key")?;
    let inner_keys = walker.key_exprs(inner_keys, "a join key")?;
    if outer_keys.len() != inner_keys.len() {
        return Err(TranslationError::InvalidQuery(format!(
            "join keys differ in arity: {} outer, {} inner",
            outer_keys.len(),
            inner_keys.len()
        )));
    }
    let on = key_equality(outer_keys, inner_keys)
        .ok_or_else(|| TranslationError::InvalidQuery("join has no keys".into()))?;

    // Outer-side navigation joins precede the explicit join, inner-side ones
    // follow it. A condition reading inner-side joins moves to `where`.
    let select = &mut walker.state.scope_mut()?.select;
    let index = select
        .joins
        .iter()
        .position(|j| j.alias() == alias)
        .ok_or_else(|| {
            TranslationError::InternalStackInvariantViolation(format!(
                "join {} vanished while evaluating its keys",
                alias
            ))
        })?;
    let mut join = select.joins.remove(index);
    if inner_navigated {
        join.on = lit_int(1).eq(lit_int(1));
        select.and_where(on);
    } else {
        join.on = on;
    }
    select.joins.insert(outer_end - 1, join);
    debug!(alias = %alias, "joined inner source");

    let shape = walker.visit_projection(result, vec![outer_shape, inner_shape])?;
    walker.state.scope_mut()?.shape = shape;
    Ok(())
}
