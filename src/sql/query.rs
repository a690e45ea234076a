//! Statement model - the `select` tree produced by translation.
//!
//! A [`Select`] is built incrementally by the operator translators and
//! rendered once at the end:
//!
//! ```text
//! select <items>
//! from <source>
//! [joins]
//! [where ..]
//! [group by ..]
//! [having ..]
//! [order by ..]
//! [paging]
//! ```
//!
//! Sources are either base tables or derived tables (a nested `Select`
//! with an alias).

use super::dialect::{Dialect, SqlDialect};
use super::expr::{Expr, ExprExt};
use super::token::{Token, TokenStream};

// =============================================================================
// Select Item (expression with optional alias)
// =============================================================================

/// A select list item: expression with optional output alias.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectItem {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Name the item is visible under from an enclosing statement.
    pub fn output_name(&self) -> Option<&str> {
        self.alias.as_deref().or_else(|| self.expr.column_name())
    }

    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = self.expr.to_tokens_for_dialect(dialect);
        if let Some(alias) = &self.alias {
            // `b0.Name as Name` is noise
            if self.expr.column_name() != Some(alias.as_str()) {
                ts.space()
                    .push(Token::As)
                    .space()
                    .push(Token::Ident(alias.clone()));
            }
        }
        ts
    }
}

impl From<Expr> for SelectItem {
    fn from(expr: Expr) -> Self {
        SelectItem::new(expr)
    }
}

// =============================================================================
// Sources
// =============================================================================

/// A base table with optional schema and a generated alias.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub table: String,
    pub alias: String,
}

impl TableRef {
    pub fn new(table: &str, alias: &str) -> Self {
        Self {
            schema: None,
            table: table.into(),
            alias: alias.into(),
        }
    }

    pub fn with_schema(mut self, schema: Option<&str>) -> Self {
        self.schema = schema.map(String::from);
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::QualifiedIdent {
            schema: self.schema.clone(),
            name: self.table.clone(),
        });
        ts.space().push(Token::Alias(self.alias.clone()));
        ts
    }
}

/// Row source of a statement or join.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(TableRef),
    /// Finalized statement used as a table: `(select ..) sq0`.
    Derived { select: Box<Select>, alias: String },
}

impl Source {
    pub fn alias(&self) -> &str {
        match self {
            Source::Table(t) => &t.alias,
            Source::Derived { alias, .. } => alias,
        }
    }

    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        match self {
            Source::Table(t) => t.to_tokens(),
            Source::Derived { select, alias } => {
                let mut ts = TokenStream::new();
                ts.lparen().newline();
                ts.append_indented(&select.to_tokens_for_dialect(dialect), 1);
                ts.newline()
                    .rparen()
                    .space()
                    .push(Token::Alias(alias.clone()));
                ts
            }
        }
    }
}

// =============================================================================
// Joins
// =============================================================================

/// Type of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
}

/// A join clause with an equality condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub kind: JoinKind,
    pub source: Source,
    pub on: Expr,
}

impl Join {
    pub fn alias(&self) -> &str {
        self.source.alias()
    }

    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self.kind {
            JoinKind::Inner => ts.push(Token::Inner),
            JoinKind::LeftOuter => ts.push(Token::Left).space().push(Token::Outer),
        };

        ts.space().push(Token::Join).space();
        ts.append(&self.source.to_tokens_for_dialect(dialect));
        ts.space().push(Token::On).space();
        ts.append(&self.on.to_tokens_for_dialect(dialect));

        ts
    }
}

// =============================================================================
// ORDER BY
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// An ORDER BY expression.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub dir: SortDir,
}

impl OrderByExpr {
    pub fn asc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Asc,
        }
    }

    pub fn desc(expr: Expr) -> Self {
        Self {
            expr,
            dir: SortDir::Desc,
        }
    }

    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = self.expr.to_tokens_for_dialect(dialect);
        // Ascending is the default, only the descending marker is emitted
        if self.dir == SortDir::Desc {
            ts.space().push(Token::Desc);
        }
        ts
    }
}

// =============================================================================
// LIMIT / OFFSET
// =============================================================================

/// LIMIT and OFFSET clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimitOffset {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl LimitOffset {
    /// Convert to token stream using dialect-specific pagination.
    ///
    /// Delegates to `SqlDialect::emit_limit_offset()` for the actual formatting.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        dialect.emit_limit_offset(self.limit, self.offset)
    }
}

// =============================================================================
// Select Statement
// =============================================================================

/// A SELECT statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub items: Vec<SelectItem>,
    pub distinct: bool,
    pub from: Source,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit_offset: Option<LimitOffset>,
}

impl Select {
    /// Create an empty statement over a source.
    pub fn new(from: Source) -> Self {
        Self {
            items: vec![],
            distinct: false,
            from,
            joins: vec![],
            where_clause: None,
            group_by: vec![],
            having: None,
            order_by: vec![],
            limit_offset: None,
        }
    }

    /// Whether the statement has group-by keys.
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }

    /// Whether take/skip has been applied.
    pub fn is_paged(&self) -> bool {
        self.limit_offset.is_some()
    }

    /// AND a predicate into the where clause.
    pub fn and_where(&mut self, predicate: Expr) {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
    }

    /// AND a predicate into the having clause.
    pub fn and_having(&mut self, predicate: Expr) {
        self.having = Some(match self.having.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
    }

    /// Append a group-by key unless it is already present.
    pub fn add_group_key(&mut self, key: Expr) {
        if !self.group_by.contains(&key) {
            self.group_by.push(key);
        }
    }

    /// Find the join that introduced `alias`.
    pub fn join_mut(&mut self, alias: &str) -> Option<&mut Join> {
        self.joins.iter_mut().find(|j| j.alias() == alias)
    }

    /// Mutable access to the derived table (from or joined) named `alias`.
    pub fn derived_mut(&mut self, alias: &str) -> Option<&mut Select> {
        if let Source::Derived {
            select,
            alias: from_alias,
        } = &mut self.from
        {
            if from_alias == alias {
                return Some(select);
            }
        }
        self.joins.iter_mut().find_map(|j| match &mut j.source {
            Source::Derived {
                select,
                alias: join_alias,
            } if join_alias == alias => Some(select.as_mut()),
            _ => None,
        })
    }

    /// Output name of an existing item computing exactly `expr`.
    pub fn find_output(&self, expr: &Expr) -> Option<&str> {
        self.items
            .iter()
            .find(|item| &item.expr == expr)
            .and_then(|item| item.output_name())
    }

    /// Whether some item is already visible under `name`.
    pub fn has_output_name(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.output_name() == Some(name))
    }

    /// Add an item visible as `name` to enclosing statements.
    pub fn push_item(&mut self, expr: Expr, name: &str) {
        let item = if expr.column_name() == Some(name) {
            SelectItem::new(expr)
        } else {
            SelectItem::new(expr).with_alias(name)
        };
        self.items.push(item);
    }

    /// Convert to token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        // SELECT
        ts.push(Token::Select);
        if self.distinct {
            ts.space().push(Token::Distinct);
        }

        // Columns
        for (i, item) in self.items.iter().enumerate() {
            if i == 0 {
                ts.newline().indent(1);
            } else {
                ts.comma().newline().indent(1);
            }
            ts.append(&item.to_tokens_for_dialect(dialect));
        }

        // FROM
        ts.newline().push(Token::From).space();
        ts.append(&self.from.to_tokens_for_dialect(dialect));

        // JOINs
        for join in &self.joins {
            ts.newline();
            ts.append(&join.to_tokens_for_dialect(dialect));
        }

        // WHERE
        if let Some(where_clause) = &self.where_clause {
            ts.newline().push(Token::Where).space();
            ts.append(&where_clause.to_tokens_for_dialect(dialect));
        }

        // GROUP BY
        if !self.group_by.is_empty() {
            ts.newline().push(Token::GroupBy).space();
            for (i, expr) in self.group_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&expr.to_tokens_for_dialect(dialect));
            }
        }

        // HAVING
        if let Some(having) = &self.having {
            ts.newline().push(Token::Having).space();
            ts.append(&having.to_tokens_for_dialect(dialect));
        }

        // ORDER BY
        // T-SQL requires ORDER BY for OFFSET FETCH syntax; without one we emit
        // `order by (select null)`, which leaves row order unspecified.
        let needs_order_by_placeholder = dialect.requires_order_by_for_offset()
            && self.order_by.is_empty()
            && self.limit_offset.is_some();

        if !self.order_by.is_empty() {
            ts.newline().push(Token::OrderBy).space();
            for (i, order_expr) in self.order_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&order_expr.to_tokens_for_dialect(dialect));
            }
        } else if needs_order_by_placeholder {
            ts.newline()
                .push(Token::OrderBy)
                .space()
                .lparen()
                .push(Token::Select)
                .space()
                .push(Token::Null)
                .rparen();
        }

        // LIMIT / OFFSET
        if let Some(lo) = &self.limit_offset {
            ts.newline();
            ts.append(&lo.to_tokens(dialect));
        }

        ts
    }

    /// Generate SQL string for a specific dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }
}

impl std::fmt::Display for Select {
    /// Formats the statement using the default dialect (SQLite).
    ///
    /// For dialect-specific SQL, use [`Select::to_sql`] instead.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_sql(Dialect::default()))
    }
}

// =============================================================================
// Tests
// =============================================================================
