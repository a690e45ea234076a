//! Translation of query trees into SQL statements.
//!
//! ```text
//! QueryExpr ──► ExpressionWalker ──► OperatorRegistry ──► handlers
//!                    │                                     │
//!                    ▼                                     ▼
//!              TranslationState ◄──── join resolver, planner (wrap/fold)
//!                    │
//!                    ▼
//!                  Select ──► to_sql(dialect)
//! ```
//!
//! One run owns its state: the result stack, the statement scopes with
//! their join caches, lambda bindings and the alias generator. Runs share
//! nothing but the read-only operator registry and schema, so separate
//! runs may proceed on separate threads.

mod error;
mod functions;
mod joins;
mod names;
mod operators;
mod registry;
mod state;
mod unwrap;
mod walker;

pub use error::{TranslationError, TranslationResult};
pub use joins::key_equality;
pub use names::UniqueNameGenerator;
pub use registry::{registry, Handler, OperatorCall, OperatorKind, OperatorRegistry, Translator};
pub use state::{EntityRef, Node, Origin, Scope, TranslateOptions, TranslationState};
pub use unwrap::{check_grouping, plan, Plan, Step};
pub use walker::{is_query, ExpressionWalker};

use tracing::debug;

use crate::schema::SchemaProvider;
use crate::sql::{Dialect, Select};
use crate::tree::QueryExpr;

/// Translate `root` against `schema` with default naming options.
pub fn translate(
    root: &QueryExpr,
    schema: &dyn SchemaProvider,
    dialect: Dialect,
) -> TranslationResult<Select> {
    translate_with(root, schema, dialect, TranslateOptions::default())
}

/// Translate `root` with explicit naming options.
pub fn translate_with(
    root: &QueryExpr,
    schema: &dyn SchemaProvider,
    dialect: Dialect,
    options: TranslateOptions,
) -> TranslationResult<Select> {
    let mut walker = ExpressionWalker::new(schema, dialect, options);
    let select = walker.translate(root)?;
    debug!(%dialect, joins = select.joins.len(), "translated query");
    Ok(select)
}

/// Translate and render in one step.
pub fn translate_to_sql(
    root: &QueryExpr,
    schema: &dyn SchemaProvider,
    dialect: Dialect,
) -> TranslationResult<String> {
    translate(root, schema, dialect).map(|select| select.to_sql(dialect))
}
