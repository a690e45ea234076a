//! Expression walker: visits the operator chain and lambda bodies.
//!
//! Query positions (a source or a statement operator) open and mutate
//! statement scopes and leave the stack unchanged. Value positions push
//! exactly one [`Node`].

use tracing::{debug, trace};
use uuid::Uuid;

use crate::schema::{Member, SchemaProvider};
use crate::sql::{
    convert_type, BinaryOperator, Constant, Dialect, Expr, ExprExt, Literal, Select, SelectItem,
    UnaryOperator,
};
use crate::tree::{ConstValue, HostBinaryOp, HostUnaryOp, QueryExpr, ValueType};

use super::error::{TranslationError, TranslationResult};
use super::joins::key_equality;
use super::registry::{registry, OperatorCall, OperatorKind};
use super::state::{EntityRef, Node, TranslateOptions, TranslationState};
use super::unwrap::Step;

/// Drives one translation run.
pub struct ExpressionWalker<'a> {
    pub state: TranslationState<'a>,
}

impl<'a> ExpressionWalker<'a> {
    pub fn new(schema: &'a dyn SchemaProvider, dialect: Dialect, options: TranslateOptions) -> Self {
        Self {
            state: TranslationState::new(schema, dialect, options),
        }
    }

    /// Translate a complete query: an operator chain, optionally ending in
    /// an aggregate over the whole chain.
    pub fn translate(&mut self, root: &QueryExpr) -> TranslationResult<Select> {
        if is_query(root) {
            self.visit_query(root)?;
            self.state.expect_depth(0, "query")?;
        } else if matches!(root, QueryExpr::Call { .. }) {
            self.visit(root)?;
            let result = self.state.pop_value("query result")?;
            self.state.expect_depth(0, "query")?;
            self.state.scope_mut()?.select.items = vec![SelectItem::new(result)];
        } else {
            return Err(TranslationError::InvalidQuery(format!(
                "a query must start from a data source, got {}",
                root.kind_name()
            )));
        }

        let select = self.state.finalize()?;
        if self.state.scope_count() != 0 {
            return Err(TranslationError::InternalStackInvariantViolation(format!(
                "{} statement scopes left open",
                self.state.scope_count()
            )));
        }
        Ok(select)
    }

    /// Visit a query position, leaving its statement as the current scope.
    pub fn visit_query(&mut self, expr: &QueryExpr) -> TranslationResult<()> {
        match expr {
            QueryExpr::Source { entity } => {
                let entity = self.state.entity(entity)?;
                debug!(entity = %entity.name, "opening statement");
                self.state.open_scope(entity);
                Ok(())
            }
            QueryExpr::Call {
                operator,
                receiver,
                args,
            } => {
                let translator = registry().lookup(operator)?;
                if translator.kind != OperatorKind::Statement {
                    return Err(TranslationError::InvalidQuery(format!(
                        "'{}' does not produce a query",
                        operator
                    )));
                }

                self.visit_query(receiver)?;
                let depth = self.state.depth();
                debug!(operator = %operator, "translating statement operator");
                let call = OperatorCall {
                    name: operator.as_str(),
                    receiver: receiver.as_ref(),
                    args: args.as_slice(),
                };
                (translator.handler)(self, &call)?;
                self.state.expect_depth(depth, operator)
            }
            other => Err(TranslationError::InvalidQuery(format!(
                "expected a query, got {}",
                other.kind_name()
            ))),
        }
    }

    /// Visit a value position, pushing exactly one node.
    pub fn visit(&mut self, expr: &QueryExpr) -> TranslationResult<()> {
        match expr {
            QueryExpr::Source { entity } => Err(TranslationError::InvalidQuery(format!(
                "query over '{}' cannot be used as a value",
                entity
            ))),
            QueryExpr::Call {
                operator,
                receiver,
                args,
            } => self.visit_value_call(operator, receiver, args),
            QueryExpr::Member { receiver, member } => {
                self.visit(receiver)?;
                let node = self.state.pop()?;
                let resolved = self.resolve_member(node, member)?;
                self.state.push(resolved);
                Ok(())
            }
            QueryExpr::Parameter { name } => {
                let node = self.state.lookup(name)?;
                self.state.push(node);
                Ok(())
            }
            QueryExpr::Lambda { .. } => Err(TranslationError::InvalidQuery(
                "lambda is only valid as an operator argument".into(),
            )),
            QueryExpr::Binary { left, op, right } => self.visit_binary(left, *op, right),
            QueryExpr::Unary { op, operand } => {
                self.visit(operand)?;
                let unary = match op {
                    HostUnaryOp::Convert => return Ok(()),
                    HostUnaryOp::Not => UnaryOperator::Not,
                    HostUnaryOp::Negate => UnaryOperator::Minus,
                };
                let value = self.state.pop_value("unary operand")?;
                self.state.push(Node::Value(Expr::UnaryOp {
                    op: unary,
                    expr: Box::new(value),
                }));
                Ok(())
            }
            QueryExpr::Constant { value, ty } => {
                let constant = self.constant(value, ty)?;
                self.state.push(Node::Value(constant));
                Ok(())
            }
            QueryExpr::New { fields } => {
                let mut record = Vec::with_capacity(fields.len());
                for field in fields {
                    self.visit(&field.value)?;
                    record.push((field.name.clone(), self.state.pop()?));
                }
                self.state.push(Node::Record(record));
                Ok(())
            }
        }
    }

    fn visit_value_call(
        &mut self,
        operator: &str,
        receiver: &QueryExpr,
        args: &[QueryExpr],
    ) -> TranslationResult<()> {
        let translator = registry().lookup(operator)?;
        if translator.kind != OperatorKind::Value {
            return Err(TranslationError::InvalidQuery(format!(
                "query operator '{}' used as a value",
                operator
            )));
        }

        let depth = self.state.depth();
        if is_query(receiver) {
            // Correlated subqueries are out of reach; only a whole query
            // can be aggregated
            if self.state.scope_count() > 0 || self.state.in_lambda() {
                return Err(TranslationError::InvalidQuery(format!(
                    "'{}' over a nested query is not supported",
                    operator
                )));
            }
            self.visit_query(receiver)?;
            self.state.prepare(Step::Aggregate)?;
            let element = self.state.scope()?.shape.clone();
            self.state.push(Node::Group {
                key: Box::new(Node::Record(vec![])),
                element: Box::new(element),
            });
        } else {
            self.visit(receiver)?;
        }

        debug!(operator = %operator, "translating value operator");
        let call = OperatorCall {
            name: operator,
            receiver,
            args,
        };
        (translator.handler)(self, &call)?;
        self.state.expect_depth(depth + 1, operator)
    }

    /// Evaluate a lambda with its parameters bound to `args`.
    pub fn visit_lambda(
        &mut self,
        lambda: &QueryExpr,
        args: Vec<Node<'a>>,
    ) -> TranslationResult<Node<'a>> {
        let QueryExpr::Lambda { params, body } = lambda else {
            return Err(TranslationError::InvalidQuery(format!(
                "expected a lambda, got {}",
                lambda.kind_name()
            )));
        };

        let mark = self.state.bind(params, args)?;
        let depth = self.state.depth();
        let result = self.visit(body).and_then(|_| self.state.pop());
        self.state.unbind(mark);

        let node = result?;
        self.state.expect_depth(depth, "lambda")?;
        Ok(node)
    }

    /// Evaluate a lambda inside a projection, where joins must not drop rows.
    pub fn visit_projection(
        &mut self,
        lambda: &QueryExpr,
        args: Vec<Node<'a>>,
    ) -> TranslationResult<Node<'a>> {
        self.state.enter_projection();
        let result = self.visit_lambda(lambda, args);
        self.state.exit_projection();
        result
    }

    fn resolve_member(&mut self, node: Node<'a>, member: &str) -> TranslationResult<Node<'a>> {
        match node {
            Node::Record(fields) => fields
                .into_iter()
                .find(|(name, _)| name == member)
                .map(|(_, node)| node)
                .ok_or_else(|| TranslationError::UnresolvedMember {
                    entity: "anonymous object".into(),
                    member: member.to_string(),
                }),
            Node::Group { key, element } => {
                if member == "Key" {
                    Ok(*key)
                } else {
                    self.resolve_member(*element, member)
                }
            }
            Node::Entity(eref) => match self.state.member(eref.entity, member)? {
                Member::Column(column) => {
                    trace!(entity = %eref.entity.name, column = %column.name, "resolved column");
                    Ok(Node::Value(self.state.read_column(&eref, &column.name)?))
                }
                Member::Relationship(rel) => {
                    trace!(entity = %eref.entity.name, relationship = %rel.name, "resolved navigation");
                    Ok(Node::Entity(self.state.navigate(&eref, rel)?))
                }
            },
            Node::Value(expr) => match member {
                "Value" => Ok(Node::Value(expr)),
                "HasValue" => Ok(Node::Value(expr.is_not_null())),
                _ => Err(TranslationError::UnresolvedMember {
                    entity: "scalar".into(),
                    member: member.to_string(),
                }),
            },
        }
    }

    fn visit_binary(
        &mut self,
        left: &QueryExpr,
        op: HostBinaryOp,
        right: &QueryExpr,
    ) -> TranslationResult<()> {
        let disjunction = op == HostBinaryOp::OrElse;
        if disjunction {
            self.state.enter_disjunction();
        }
        let visited = self.visit(left).and_then(|_| self.visit(right));
        if disjunction {
            self.state.exit_disjunction();
        }
        visited?;

        let right = self.state.pop()?;
        let left = self.state.pop()?;
        let combined = self.combine(op, left, right)?;
        self.state.push(Node::Value(combined));
        Ok(())
    }

    fn combine(&mut self, op: HostBinaryOp, left: Node<'a>, right: Node<'a>) -> TranslationResult<Expr> {
        let negated = match op {
            HostBinaryOp::Equal => Some(false),
            HostBinaryOp::NotEqual => Some(true),
            _ => None,
        };

        if let Some(negated) = negated {
            if is_null_literal(&right) {
                return self.null_test(left, negated);
            }
            if is_null_literal(&left) {
                return self.null_test(right, negated);
            }
            if let (Node::Entity(l), Node::Entity(r)) = (&left, &right) {
                let left_keys = self.entity_keys(l)?;
                let right_keys = self.entity_keys(r)?;
                let eq = key_equality(left_keys, right_keys).ok_or_else(|| {
                    TranslationError::InvalidQuery(format!(
                        "'{}' has no columns to compare",
                        l.entity.name
                    ))
                })?;
                return Ok(if negated { eq.not() } else { eq });
            }
        }

        let left = left.into_value("left operand")?;
        let right = right.into_value("right operand")?;
        Ok(left.binary(sql_operator(op), right))
    }

    fn null_test(&mut self, node: Node<'a>, negated: bool) -> TranslationResult<Expr> {
        let expr = match node {
            Node::Value(expr) => expr,
            // A missing row has a null key
            Node::Entity(eref) => self
                .entity_keys(&eref)?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    TranslationError::InvalidQuery(format!(
                        "'{}' has no columns to test for null",
                        eref.entity.name
                    ))
                })?,
            other => {
                return Err(TranslationError::InvalidQuery(format!(
                    "a {} cannot be compared with null",
                    other.kind_name()
                )))
            }
        };
        Ok(if negated {
            expr.is_not_null()
        } else {
            expr.is_null()
        })
    }

    /// Key column expressions of an entity: its primary key, or every
    /// column when it has none.
    pub fn entity_keys(&mut self, eref: &EntityRef<'a>) -> TranslationResult<Vec<Expr>> {
        eref.entity
            .key_columns()
            .into_iter()
            .map(|column| self.state.read_column(eref, &column.name))
            .collect()
    }

    /// Flatten a key node (scalar, record or entity) to expressions.
    pub fn key_exprs(&mut self, node: Node<'a>, context: &str) -> TranslationResult<Vec<Expr>> {
        match node {
            Node::Value(expr) => Ok(vec![expr]),
            Node::Entity(eref) => self.entity_keys(&eref),
            Node::Record(fields) => {
                let mut exprs = vec![];
                for (_, node) in fields {
                    exprs.extend(self.key_exprs(node, context)?);
                }
                Ok(exprs)
            }
            Node::Group { .. } => Err(TranslationError::MalformedProjection(format!(
                "a grouping cannot be used as {}",
                context
            ))),
        }
    }

    fn constant(&self, value: &ConstValue, ty: &ValueType) -> TranslationResult<Expr> {
        let literal = match value {
            ConstValue::Null => Literal::Null,
            ConstValue::Bool(b) => Literal::Bool(*b),
            ConstValue::Int(n) => Literal::Int(*n),
            ConstValue::Float(f) if f.is_finite() => Literal::Float(*f),
            ConstValue::Float(f) => {
                return Err(TranslationError::InvalidQuery(format!(
                    "constant {} has no SQL representation",
                    f
                )))
            }
            ConstValue::String(s) => match ty.underlying() {
                ValueType::Guid => Uuid::parse_str(s)
                    .map(Literal::Guid)
                    .map_err(|e| TranslationError::InvalidQuery(format!("bad guid '{}': {}", s, e)))?,
                _ => Literal::String(s.clone()),
            },
        };
        Ok(Expr::Constant(Constant {
            value: literal,
            sql_type: Some(convert_type(ty, self.state.dialect)?),
        }))
    }
}

/// Whether `expr` is a query position: a source or a statement operator.
pub fn is_query(expr: &QueryExpr) -> bool {
    match expr {
        QueryExpr::Source { .. } => true,
        QueryExpr::Call { operator, .. } => {
            registry().kind_of(operator) == Some(OperatorKind::Statement)
        }
        _ => false,
    }
}

fn is_null_literal(node: &Node<'_>) -> bool {
    matches!(
        node,
        Node::Value(Expr::Constant(Constant {
            value: Literal::Null,
            ..
        }))
    )
}

fn sql_operator(op: HostBinaryOp) -> BinaryOperator {
    match op {
        HostBinaryOp::Equal => BinaryOperator::Eq,
        HostBinaryOp::NotEqual => BinaryOperator::Ne,
        HostBinaryOp::LessThan => BinaryOperator::Lt,
        HostBinaryOp::LessThanOrEqual => BinaryOperator::Lte,
        HostBinaryOp::GreaterThan => BinaryOperator::Gt,
        HostBinaryOp::GreaterThanOrEqual => BinaryOperator::Gte,
        HostBinaryOp::AndAlso => BinaryOperator::And,
        HostBinaryOp::OrElse => BinaryOperator::Or,
        HostBinaryOp::Add => BinaryOperator::Plus,
        HostBinaryOp::Subtract => BinaryOperator::Minus,
        HostBinaryOp::Multiply => BinaryOperator::Mul,
        HostBinaryOp::Divide => BinaryOperator::Div,
        HostBinaryOp::Modulo => BinaryOperator::Mod,
    }
}
