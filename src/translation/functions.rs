//! Value operators: string matching and aggregates.
//!
//! The receiver node is on top of the stack when a handler runs; the
//! handler pops it and pushes exactly one result.

use crate::sql::{
    case_flag, count_star, lit_str, sum as sum_of, AggregateFunction, Expr, ExprExt, SqlDialect,
};
use crate::tree::{ConstValue, QueryExpr};

use super::error::{TranslationError, TranslationResult};
use super::registry::OperatorCall;
use super::state::Node;
use super::walker::ExpressionWalker;

// ============================================================================
// String matching
// ============================================================================

pub fn starts_with(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    like(walker, call, false, true)
}

pub fn ends_with(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    like(walker, call, true, false)
}

pub fn contains(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    like(walker, call, true, true)
}

fn like(
    walker: &mut ExpressionWalker<'_>,
    call: &OperatorCall<'_>,
    leading: bool,
    trailing: bool,
) -> TranslationResult<()> {
    let text = match call.arg(0)? {
        QueryExpr::Constant {
            value: ConstValue::String(s),
            ..
        } => s,
        other => {
            return Err(TranslationError::InvalidQuery(format!(
                "{} needs a constant string argument, got {}",
                call.name,
                other.kind_name()
            )))
        }
    };
    let target = walker.state.pop_value(call.name)?;

    let dialect = walker.state.dialect;
    let escaped = dialect.escape_like_pattern(text);
    let mut pattern = String::with_capacity(escaped.len() + 2);
    if leading {
        pattern.push('%');
    }
    pattern.push_str(&escaped);
    if trailing {
        pattern.push('%');
    }

    let expr = match dialect.like_escape_char() {
        Some(escape) if escaped != *text => target.like_escape(lit_str(&pattern), escape),
        _ => target.like(lit_str(&pattern)),
    };
    walker.state.push(Node::Value(expr));
    Ok(())
}

// ============================================================================
// Aggregates
// ============================================================================

pub fn sum(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    aggregate(walker, call, AggregateFunction::Sum)
}

pub fn average(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    aggregate(walker, call, AggregateFunction::Avg)
}

pub fn min(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    aggregate(walker, call, AggregateFunction::Min)
}

pub fn max(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    aggregate(walker, call, AggregateFunction::Max)
}

/// `count()` is `count(*)`; `count(x => p)` counts matching rows.
pub fn count(walker: &mut ExpressionWalker<'_>, call: &OperatorCall<'_>) -> TranslationResult<()> {
    let element = group_element(walker, call)?;
    let expr = match call.args.first() {
        None => count_star(),
        Some(predicate) => {
            let predicate = walker
                .visit_lambda(predicate, vec![element])?
                .into_value(call.name)?;
            sum_of(case_flag(predicate))
        }
    };
    walker.state.push(Node::Value(expr));
    Ok(())
}

fn aggregate(
    walker: &mut ExpressionWalker<'_>,
    call: &OperatorCall<'_>,
    function: AggregateFunction,
) -> TranslationResult<()> {
    let element = group_element(walker, call)?;
    let arg = match call.args.first() {
        Some(selector) => walker.visit_lambda(selector, vec![element])?,
        None => element,
    }
    .into_value(call.name)?;

    walker.state.push(Node::Value(Expr::Aggregate {
        function,
        arg: Some(Box::new(arg)),
    }));
    Ok(())
}

/// Pop the receiver, which must be a grouping (or a whole query).
fn group_element<'a>(
    walker: &mut ExpressionWalker<'a>,
    call: &OperatorCall<'_>,
) -> TranslationResult<Node<'a>> {
    match walker.state.pop()? {
        Node::Group { element, .. } => Ok(*element),
        other => Err(TranslationError::InvalidQuery(format!(
            "{} applies to a grouping or a query, got {}",
            call.name,
            other.kind_name()
        ))),
    }
}
