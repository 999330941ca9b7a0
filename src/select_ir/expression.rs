use serde::{Deserialize, Serialize};
use std::fmt;

use super::query_node::QueryNode;
use super::sql_types::SqlType;
use super::table_ref::QuerySourceId;

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Expression {
    /// Column of a base table (or join target) in the current scope
    Column(ColumnRef),

    /// Display name attached to an inner expression
    Alias(AliasExpr),

    /// Unresolved `table.*` placeholder
    Star(StarRef),

    /// Column exposed by a nested query's projection
    SubqueryColumn(SubqueryColumnRef),

    Constant(Constant),

    Parameter(Parameter),

    RowNumber(RowNumber),

    Cast(Cast),

    Binary(BinaryExpr),

    Not(Box<Expression>),

    /// Opaque scalar function call, passed through to the generator untouched
    Function(FunctionCall),

    /// EXISTS (subquery) boolean wrapper
    Exists(ExistsSubquery),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ColumnRef {
    pub table_alias: String,
    /// Query source satisfied by the owning table, if the table came from one
    pub query_source: Option<QuerySourceId>,
    pub name: String,
    pub ty: SqlType,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct AliasExpr {
    pub alias: String,
    pub inner: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct StarRef {
    pub table_alias: String,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SubqueryColumnRef {
    pub subquery_alias: String,
    pub name: String,
    pub ty: SqlType,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Literal {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Constant {
    pub value: Literal,
    pub ty: SqlType,
}

/// Named placeholder bound at execution time (`@p0`).
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: SqlType,
}

/// `ROW_NUMBER() OVER (ORDER BY ...)`
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct RowNumber {
    pub order_keys: Vec<OrderByItem>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Cast {
    pub operand: Box<Expression>,
    pub ty: SqlType,
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum BinaryOperator {
    And,
    Or,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl BinaryOperator {
    pub fn is_boolean_result(&self) -> bool {
        !matches!(
            self,
            BinaryOperator::Add | BinaryOperator::Subtract | BinaryOperator::Multiply | BinaryOperator::Divide
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct BinaryExpr {
    pub operator: BinaryOperator,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub args: Vec<Expression>,
    pub ty: SqlType,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ExistsSubquery {
    pub query: Box<QueryNode>,
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum OrderByOrder {
    Asc,
    Desc,
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expression: Expression,
    pub order: OrderByOrder,
}

impl OrderByItem {
    pub fn new(expression: Expression, order: OrderByOrder) -> Self {
        Self { expression, order }
    }

    pub fn asc(expression: Expression) -> Self {
        Self::new(expression, OrderByOrder::Asc)
    }

    pub fn desc(expression: Expression) -> Self {
        Self::new(expression, OrderByOrder::Desc)
    }
}

impl Expression {
    pub fn column(
        table_alias: impl Into<String>,
        query_source: Option<QuerySourceId>,
        name: impl Into<String>,
        ty: SqlType,
    ) -> Self {
        Expression::Column(ColumnRef {
            table_alias: table_alias.into(),
            query_source,
            name: name.into(),
            ty,
        })
    }

    /// Wrap `inner` under a display name. An existing alias on `inner` is
    /// replaced rather than nested.
    pub fn alias(alias: impl Into<String>, inner: Expression) -> Self {
        Expression::Alias(AliasExpr {
            alias: alias.into(),
            inner: Box::new(inner.into_unaliased()),
        })
    }

    pub fn star(table_alias: impl Into<String>) -> Self {
        Expression::Star(StarRef {
            table_alias: table_alias.into(),
        })
    }

    pub fn subquery_column(
        subquery_alias: impl Into<String>,
        name: impl Into<String>,
        ty: SqlType,
    ) -> Self {
        Expression::SubqueryColumn(SubqueryColumnRef {
            subquery_alias: subquery_alias.into(),
            name: name.into(),
            ty,
        })
    }

    pub fn constant(value: Literal, ty: SqlType) -> Self {
        Expression::Constant(Constant { value, ty })
    }

    pub fn int(value: i64) -> Self {
        Self::constant(Literal::Integer(value), SqlType::int32())
    }

    pub fn parameter(name: impl Into<String>, ty: SqlType) -> Self {
        Expression::Parameter(Parameter {
            name: name.into(),
            ty,
        })
    }

    pub fn row_number(order_keys: Vec<OrderByItem>) -> Self {
        Expression::RowNumber(RowNumber { order_keys })
    }

    pub fn cast(operand: Expression, ty: SqlType) -> Self {
        Expression::Cast(Cast {
            operand: Box::new(operand),
            ty,
        })
    }

    pub fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::Binary(BinaryExpr {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOperator::And, left, right)
    }

    pub fn equal(left: Expression, right: Expression) -> Self {
        Self::binary(BinaryOperator::Equal, left, right)
    }

    pub fn function(name: impl Into<String>, args: Vec<Expression>, ty: SqlType) -> Self {
        Expression::Function(FunctionCall {
            name: name.into(),
            args,
            ty,
        })
    }

    pub fn exists(query: QueryNode) -> Self {
        Expression::Exists(ExistsSubquery {
            query: Box::new(query),
        })
    }

    /// Static result type.
    pub fn ty(&self) -> SqlType {
        match self {
            Expression::Column(c) => c.ty,
            Expression::Alias(a) => a.inner.ty(),
            Expression::Star(_) => SqlType::row(),
            Expression::SubqueryColumn(c) => c.ty,
            Expression::Constant(c) => c.ty,
            Expression::Parameter(p) => p.ty,
            Expression::RowNumber(_) => SqlType::int64(),
            Expression::Cast(c) => c.ty,
            Expression::Binary(b) if b.operator.is_boolean_result() => SqlType::boolean(),
            Expression::Binary(b) => {
                let left = b.left.ty();
                left.with_nullable(left.nullable || b.right.ty().nullable)
            }
            Expression::Not(_) | Expression::Exists(_) => SqlType::boolean(),
            Expression::Function(f) => f.ty,
        }
    }

    /// Name under which this expression appears in a projection, if any.
    pub fn projection_name(&self) -> Option<&str> {
        match self {
            Expression::Column(c) => Some(&c.name),
            Expression::Alias(a) => Some(&a.alias),
            Expression::SubqueryColumn(c) => Some(&c.name),
            _ => None,
        }
    }

    pub fn unwrap_alias(&self) -> &Expression {
        match self {
            Expression::Alias(a) => a.inner.unwrap_alias(),
            other => other,
        }
    }

    pub fn into_unaliased(self) -> Expression {
        match self {
            Expression::Alias(a) => a.inner.into_unaliased(),
            other => other,
        }
    }

    /// Plain column of a table or nested query.
    pub fn is_column_reference(&self) -> bool {
        matches!(self, Expression::Column(_) | Expression::SubqueryColumn(_))
    }

    pub fn is_row_number(&self) -> bool {
        matches!(self.unwrap_alias(), Expression::RowNumber(_))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Expression::Constant(Constant {
                value: Literal::Integer(v),
                ..
            }) => Some(*v),
            _ => None,
        }
    }

    /// Direct child expressions, in evaluation order. Subqueries under
    /// `Exists` are not expressions and are not returned.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Alias(a) => vec![a.inner.as_ref()],
            Expression::RowNumber(r) => r.order_keys.iter().map(|o| &o.expression).collect(),
            Expression::Cast(c) => vec![c.operand.as_ref()],
            Expression::Binary(b) => vec![b.left.as_ref(), b.right.as_ref()],
            Expression::Not(inner) => vec![inner.as_ref()],
            Expression::Function(f) => f.args.iter().collect(),
            Expression::Column(_)
            | Expression::Star(_)
            | Expression::SubqueryColumn(_)
            | Expression::Constant(_)
            | Expression::Parameter(_)
            | Expression::Exists(_) => vec![],
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut Expression> {
        match self {
            Expression::Alias(a) => vec![a.inner.as_mut()],
            Expression::RowNumber(r) => r.order_keys.iter_mut().map(|o| &mut o.expression).collect(),
            Expression::Cast(c) => vec![c.operand.as_mut()],
            Expression::Binary(b) => vec![b.left.as_mut(), b.right.as_mut()],
            Expression::Not(inner) => vec![inner.as_mut()],
            Expression::Function(f) => f.args.iter_mut().collect(),
            Expression::Column(_)
            | Expression::Star(_)
            | Expression::SubqueryColumn(_)
            | Expression::Constant(_)
            | Expression::Parameter(_)
            | Expression::Exists(_) => vec![],
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

impl fmt::Display for OrderByItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = match self.order {
            OrderByOrder::Asc => "ASC",
            OrderByOrder::Desc => "DESC",
        };
        // ORDER BY addresses an aliased projection slot by its name
        match &self.expression {
            Expression::Alias(a) => write!(f, "{} {}", a.alias, direction),
            other => write!(f, "{} {}", other, direction),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column(c) => write!(f, "{}.{}", c.table_alias, c.name),
            Expression::Alias(a) => write!(f, "{} AS {}", a.inner, a.alias),
            Expression::Star(s) => write!(f, "{}.*", s.table_alias),
            Expression::SubqueryColumn(c) => write!(f, "{}.{}", c.subquery_alias, c.name),
            Expression::Constant(c) => write!(f, "{}", c.value),
            Expression::Parameter(p) => write!(f, "@{}", p.name),
            Expression::RowNumber(r) => {
                let keys: Vec<String> = r.order_keys.iter().map(|o| o.to_string()).collect();
                write!(f, "ROW_NUMBER() OVER(ORDER BY {})", keys.join(", "))
            }
            Expression::Cast(c) => write!(f, "CAST({} AS {})", c.operand, c.ty),
            Expression::Binary(b) => write!(f, "({} {} {})", b.left, b.operator.symbol(), b.right),
            Expression::Not(inner) => write!(f, "NOT ({})", inner),
            Expression::Function(func) => {
                let args: Vec<String> = func.args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", func.name, args.join(", "))
            }
            Expression::Exists(e) => write!(f, "EXISTS ({})", e.query),
        }
    }
}
