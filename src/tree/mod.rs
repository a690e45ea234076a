//! Query tree - the input to translation.
//!
//! A query is a chain of operator calls rooted at a data source, each
//! operator taking lambdas as arguments:
//!
//! ```text
//! Source(Blog)
//!     .Where(b => b.Url != null && b.Name.StartsWith("Ethan"))
//!     .Select(b => new { K = b.BlogId })
//! ```
//!
//! Trees are immutable and borrowed for the duration of one translation.
//! They deserialize from JSON (internally tagged by `kind`) so the CLI
//! can accept queries produced by another process.

mod value;

pub use value::{ConstValue, ValueType};

use serde::{Deserialize, Serialize};

/// A node in the query tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryExpr {
    /// Data source of a chain, named by entity type hint.
    Source { entity: String },
    /// Operator call: `receiver.Operator(args...)`.
    Call {
        operator: String,
        receiver: Box<QueryExpr>,
        #[serde(default)]
        args: Vec<QueryExpr>,
    },
    /// Member access: `receiver.member`.
    Member {
        receiver: Box<QueryExpr>,
        member: String,
    },
    /// Reference to a bound lambda parameter.
    Parameter { name: String },
    /// Lambda argument: `(params) => body`.
    Lambda {
        params: Vec<String>,
        body: Box<QueryExpr>,
    },
    Binary {
        left: Box<QueryExpr>,
        op: HostBinaryOp,
        right: Box<QueryExpr>,
    },
    Unary {
        op: HostUnaryOp,
        operand: Box<QueryExpr>,
    },
    Constant { value: ConstValue, ty: ValueType },
    /// Anonymous object: `new { A = .., B = .. }`.
    New { fields: Vec<NewField> },
}

/// One named field of a [`QueryExpr::New`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewField {
    pub name: String,
    pub value: QueryExpr,
}

/// Binary operators as they appear in host expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostBinaryOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

/// Unary operators as they appear in host expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostUnaryOp {
    Not,
    Negate,
    /// Type conversion, e.g. nullable widening. Transparent in SQL.
    Convert,
}

// ============================================================================
// Builder functions
// ============================================================================

/// Data source for an entity.
pub fn source(entity: impl Into<String>) -> QueryExpr {
    QueryExpr::Source {
        entity: entity.into(),
    }
}

/// Lambda parameter reference.
pub fn param(name: impl Into<String>) -> QueryExpr {
    QueryExpr::Parameter { name: name.into() }
}

/// Single-parameter lambda.
pub fn lambda(param: impl Into<String>, body: QueryExpr) -> QueryExpr {
    QueryExpr::Lambda {
        params: vec![param.into()],
        body: Box::new(body),
    }
}

/// Lambda with several parameters (join result selectors).
pub fn lambda_n(params: &[&str], body: QueryExpr) -> QueryExpr {
    QueryExpr::Lambda {
        params: params.iter().map(|p| p.to_string()).collect(),
        body: Box::new(body),
    }
}

/// Anonymous object with the given fields, in order.
pub fn new_object<S: Into<String>>(fields: impl IntoIterator<Item = (S, QueryExpr)>) -> QueryExpr {
    QueryExpr::New {
        fields: fields
            .into_iter()
            .map(|(name, value)| NewField {
                name: name.into(),
                value,
            })
            .collect(),
    }
}

pub fn int(n: i64) -> QueryExpr {
    QueryExpr::Constant {
        value: ConstValue::Int(n),
        ty: ValueType::Int,
    }
}

pub fn float(n: f64) -> QueryExpr {
    QueryExpr::Constant {
        value: ConstValue::Float(n),
        ty: ValueType::Double,
    }
}

pub fn string(s: impl Into<String>) -> QueryExpr {
    QueryExpr::Constant {
        value: ConstValue::String(s.into()),
        ty: ValueType::String,
    }
}

pub fn boolean(b: bool) -> QueryExpr {
    QueryExpr::Constant {
        value: ConstValue::Bool(b),
        ty: ValueType::Bool,
    }
}

/// Untyped null literal (`object` in the host language).
pub fn null() -> QueryExpr {
    QueryExpr::Constant {
        value: ConstValue::Null,
        ty: ValueType::String.nullable(),
    }
}

impl QueryExpr {
    /// `self.member`
    pub fn member(self, name: impl Into<String>) -> QueryExpr {
        QueryExpr::Member {
            receiver: Box::new(self),
            member: name.into(),
        }
    }

    /// `self.Operator(args...)`
    pub fn call(self, operator: impl Into<String>, args: Vec<QueryExpr>) -> QueryExpr {
        QueryExpr::Call {
            operator: operator.into(),
            receiver: Box::new(self),
            args,
        }
    }

    pub fn filter(self, predicate: QueryExpr) -> QueryExpr {
        self.call("Where", vec![predicate])
    }

    pub fn select(self, projection: QueryExpr) -> QueryExpr {
        self.call("Select", vec![projection])
    }

    pub fn group_by(self, key: QueryExpr) -> QueryExpr {
        self.call("GroupBy", vec![key])
    }

    pub fn order_by(self, key: QueryExpr) -> QueryExpr {
        self.call("OrderBy", vec![key])
    }

    pub fn order_by_desc(self, key: QueryExpr) -> QueryExpr {
        self.call("OrderByDescending", vec![key])
    }

    pub fn then_by(self, key: QueryExpr) -> QueryExpr {
        self.call("ThenBy", vec![key])
    }

    pub fn distinct(self) -> QueryExpr {
        self.call("Distinct", vec![])
    }

    pub fn take(self, n: i64) -> QueryExpr {
        self.call("Take", vec![int(n)])
    }

    pub fn skip(self, n: i64) -> QueryExpr {
        self.call("Skip", vec![int(n)])
    }

    fn binary(self, op: HostBinaryOp, right: QueryExpr) -> QueryExpr {
        QueryExpr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    pub fn eq(self, right: QueryExpr) -> QueryExpr {
        self.binary(HostBinaryOp::Equal, right)
    }

    pub fn ne(self, right: QueryExpr) -> QueryExpr {
        self.binary(HostBinaryOp::NotEqual, right)
    }

    pub fn lt(self, right: QueryExpr) -> QueryExpr {
        self.binary(HostBinaryOp::LessThan, right)
    }

    pub fn lte(self, right: QueryExpr) -> QueryExpr {
        self.binary(HostBinaryOp::LessThanOrEqual, right)
    }

    pub fn gt(self, right: QueryExpr) -> QueryExpr {
        self.binary(HostBinaryOp::GreaterThan, right)
    }

    pub fn gte(self, right: QueryExpr) -> QueryExpr {
        self.binary(HostBinaryOp::GreaterThanOrEqual, right)
    }

    pub fn and(self, right: QueryExpr) -> QueryExpr {
        self.binary(HostBinaryOp::AndAlso, right)
    }

    pub fn or(self, right: QueryExpr) -> QueryExpr {
        self.binary(HostBinaryOp::OrElse, right)
    }

    pub fn add(self, right: QueryExpr) -> QueryExpr {
        self.binary(HostBinaryOp::Add, right)
    }

    pub fn not(self) -> QueryExpr {
        QueryExpr::Unary {
            op: HostUnaryOp::Not,
            operand: Box::new(self),
        }
    }

    /// Nullable widening conversion.
    pub fn convert(self) -> QueryExpr {
        QueryExpr::Unary {
            op: HostUnaryOp::Convert,
            operand: Box::new(self),
        }
    }

    /// Short label for log lines.
    pub fn kind_name(&self) -> &'static str {
        match self {
            QueryExpr::Source { .. } => "source",
            QueryExpr::Call { .. } => "call",
            QueryExpr::Member { .. } => "member",
            QueryExpr::Parameter { .. } => "parameter",
            QueryExpr::Lambda { .. } => "lambda",
            QueryExpr::Binary { .. } => "binary",
            QueryExpr::Unary { .. } => "unary",
            QueryExpr::Constant { .. } => "constant",
            QueryExpr::New { .. } => "new",
        }
    }
}
