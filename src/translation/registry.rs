//! Operator translator registry.
//!
//! Maps lower-cased operator names to handlers. The default registry is
//! built once per process and read-only afterwards.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::tree::QueryExpr;

use super::error::{TranslationError, TranslationResult};
use super::functions;
use super::operators;
use super::walker::ExpressionWalker;

/// What an operator works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// Mutates the current statement; leaves the stack unchanged.
    Statement,
    /// Replaces the receiver node on top of the stack with its result.
    Value,
}

/// One operator call as seen by its handler.
#[derive(Debug, Clone, Copy)]
pub struct OperatorCall<'q> {
    pub name: &'q str,
    pub receiver: &'q QueryExpr,
    pub args: &'q [QueryExpr],
}

impl<'q> OperatorCall<'q> {
    /// Argument `index`, or `InvalidQuery` when absent.
    pub fn arg(&self, index: usize) -> TranslationResult<&'q QueryExpr> {
        self.args.get(index).ok_or_else(|| {
            TranslationError::InvalidQuery(format!(
                "{} expects at least {} argument(s), got {}",
                self.name,
                index + 1,
                self.args.len()
            ))
        })
    }
}

pub type Handler =
    for<'w, 'q> fn(&mut ExpressionWalker<'w>, &OperatorCall<'q>) -> TranslationResult<()>;

/// A registered operator.
#[derive(Clone, Copy)]
pub struct Translator {
    pub kind: OperatorKind,
    pub handler: Handler,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator").field("kind", &self.kind).finish()
    }
}

/// Operator name to translator.
#[derive(Debug, Default)]
pub struct OperatorRegistry {
    translators: HashMap<String, Translator>,
}

impl OperatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in operator.
    pub fn with_defaults() -> Self {
        use OperatorKind::{Statement, Value};

        let mut registry = Self::new();
        registry.register("where", Statement, operators::where_op);
        registry.register("select", Statement, operators::select_op);
        registry.register("groupby", Statement, operators::group_by_op);
        registry.register("orderby", Statement, operators::order_by_op);
        registry.register("orderbydescending", Statement, operators::order_by_desc_op);
        registry.register("thenby", Statement, operators::then_by_op);
        registry.register("thenbydescending", Statement, operators::then_by_desc_op);
        registry.register("distinct", Statement, operators::distinct_op);
        registry.register("join", Statement, operators::join_op);
        registry.register("take", Statement, operators::take_op);
        registry.register("skip", Statement, operators::skip_op);

        registry.register("startswith", Value, functions::starts_with);
        registry.register("endswith", Value, functions::ends_with);
        registry.register("contains", Value, functions::contains);
        registry.register("sum", Value, functions::sum);
        registry.register("count", Value, functions::count);
        registry.register("longcount", Value, functions::count);
        registry.register("average", Value, functions::average);
        registry.register("min", Value, functions::min);
        registry.register("max", Value, functions::max);
        registry
    }

    /// Register `handler` under `name` (case-insensitive), replacing any
    /// previous registration.
    pub fn register(&mut self, name: &str, kind: OperatorKind, handler: Handler) {
        self.translators
            .insert(name.to_lowercase(), Translator { kind, handler });
    }

    /// Find the translator for `name`.
    pub fn lookup(&self, name: &str) -> TranslationResult<&Translator> {
        self.translators
            .get(&name.to_lowercase())
            .ok_or_else(|| TranslationError::UnsupportedOperator(name.to_string()))
    }

    /// Kind of a registered operator.
    pub fn kind_of(&self, name: &str) -> Option<OperatorKind> {
        self.translators
            .get(&name.to_lowercase())
            .map(|t| t.kind)
    }

    pub fn len(&self) -> usize {
        self.translators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.is_empty()
    }
}

static DEFAULT_REGISTRY: Lazy<OperatorRegistry> = Lazy::new(OperatorRegistry::with_defaults);

/// The process-wide registry of built-in operators.
pub fn registry() -> &'static OperatorRegistry {
    &DEFAULT_REGISTRY
}
