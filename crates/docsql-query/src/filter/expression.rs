//! The boolean expression tree and its SQL rendering.

use std::fmt;

use docsql_core::ident::is_field_path;
use docsql_core::{to_sql_value, SqlValue};
use serde_json::Value;

use crate::error::{QueryError, Result};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
    /// Membership in a list (IN)
    In,
}

impl CompareOp {
    const ALL: [Self; 7] = [
        Self::Eq,
        Self::Ne,
        Self::Gt,
        Self::Gte,
        Self::Lt,
        Self::Lte,
        Self::In,
    ];

    /// Parses a document operator key such as `$gte`.
    #[must_use]
    pub fn from_operator(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.operator() == key)
    }

    /// Returns the document operator key.
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::In => "$in",
        }
    }

    /// Returns the SQL symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => "IN",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    /// AND
    And,
    /// OR
    Or,
}

impl LogicalOp {
    /// Parses `$and` / `$or`.
    #[must_use]
    pub fn from_operator(key: &str) -> Option<Self> {
        match key {
            "$and" => Some(Self::And),
            "$or" => Some(Self::Or),
            _ => None,
        }
    }

    /// Returns the document operator key.
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::And => "$and",
            Self::Or => "$or",
        }
    }

    /// Returns the SQL keyword.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// The right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single value.
    Value(SqlValue),
    /// A list of values, for `IN`.
    List(Vec<SqlValue>),
}

impl Operand {
    /// Converts a document value into the operand `op` takes.
    ///
    /// `IN` takes a list of scalars; every other operator takes a scalar.
    pub fn from_json(op: CompareOp, value: &Value) -> Result<Self> {
        let type_error = |expected| QueryError::Type {
            operator: op.operator().to_string(),
            expected,
        };
        match (op, value) {
            (CompareOp::In, Value::Array(items)) => {
                if items.iter().any(|v| v.is_array() || v.is_object()) {
                    return Err(type_error("a list of scalar values"));
                }
                Ok(Self::List(items.iter().map(to_sql_value).collect()))
            }
            (CompareOp::In, _) => Err(type_error("a non-empty list")),
            (_, Value::Array(_) | Value::Object(_)) => Err(type_error("a scalar value")),
            (_, scalar) => Ok(Self::Value(to_sql_value(scalar))),
        }
    }
}

/// `<field> <op> <operand>`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    field: String,
    op: CompareOp,
    operand: Operand,
}

impl Comparison {
    /// Creates a comparison, checking the field name and the operand shape.
    pub fn new(field: impl Into<String>, op: CompareOp, operand: Operand) -> Result<Self> {
        let field = field.into();
        if !is_field_path(&field) {
            return Err(QueryError::validation(format!(
                "invalid field name '{field}'"
            )));
        }
        match (op, &operand) {
            (CompareOp::In, Operand::List(items)) if items.is_empty() => {
                return Err(QueryError::validation("$in requires at least one value"));
            }
            (CompareOp::In, Operand::Value(_)) => {
                return Err(QueryError::Type {
                    operator: op.operator().to_string(),
                    expected: "a non-empty list",
                });
            }
            (CompareOp::In, Operand::List(_)) | (_, Operand::Value(_)) => {}
            (_, Operand::List(_)) => {
                return Err(QueryError::Type {
                    operator: op.operator().to_string(),
                    expected: "a scalar value",
                });
            }
        }
        Ok(Self { field, op, operand })
    }

    /// Returns the field name.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the operator.
    #[must_use]
    pub const fn op(&self) -> CompareOp {
        self.op
    }

    /// Returns the operand.
    #[must_use]
    pub const fn operand(&self) -> &Operand {
        &self.operand
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.operand, self.op) {
            (Operand::Value(SqlValue::Null), CompareOp::Eq) => write!(f, "{} IS NULL", self.field),
            (Operand::Value(SqlValue::Null), CompareOp::Ne) => {
                write!(f, "{} IS NOT NULL", self.field)
            }
            (Operand::Value(value), op) => {
                write!(f, "{} {op} {}", self.field, value.to_sql_inline())
            }
            (Operand::List(items), op) => {
                let items: Vec<String> = items.iter().map(SqlValue::to_sql_inline).collect();
                write!(f, "{} {op} ({})", self.field, items.join(","))
            }
        }
    }
}

/// A non-empty group of expressions joined by one connective.
#[derive(Debug, Clone, PartialEq)]
pub struct Logical {
    op: LogicalOp,
    children: Vec<Expression>,
}

impl Logical {
    /// Creates a group; an empty child list is rejected.
    pub fn new(op: LogicalOp, children: Vec<Expression>) -> Result<Self> {
        if children.is_empty() {
            return Err(QueryError::validation("empty logical group"));
        }
        Ok(Self { op, children })
    }

    /// Returns the connective.
    #[must_use]
    pub const fn op(&self) -> LogicalOp {
        self.op
    }

    /// Returns the children, never empty.
    #[must_use]
    pub fn children(&self) -> &[Expression] {
        &self.children
    }
}

impl fmt::Display for Logical {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joiner = format!(" {} ", self.op);
        let parts: Vec<String> = self.children.iter().map(ToString::to_string).collect();
        write!(f, "({})", parts.join(&joiner))
    }
}

/// A compiled condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A single comparison.
    Comparison(Comparison),
    /// A group of expressions.
    Logical(Logical),
}

impl Expression {
    /// Groups `children` under `op`; a single child is returned as is.
    pub fn group(op: LogicalOp, mut children: Vec<Self>) -> Result<Self> {
        if children.len() == 1 {
            if let Some(only) = children.pop() {
                return Ok(only);
            }
        }
        Logical::new(op, children).map(Self::Logical)
    }

    /// ANDs `other` onto this expression, flattening AND groups.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut children = match self {
            Self::Logical(Logical {
                op: LogicalOp::And,
                children,
            }) => children,
            single => vec![single],
        };
        match other {
            Self::Logical(Logical {
                op: LogicalOp::And,
                children: more,
            }) => children.extend(more),
            single => children.push(single),
        }
        Self::Logical(Logical {
            op: LogicalOp::And,
            children,
        })
    }

    /// Renders the expression for a WHERE clause, which is always
    /// parenthesized.
    #[must_use]
    pub fn to_where(&self) -> String {
        match self {
            Self::Comparison(c) => format!("({c})"),
            Self::Logical(l) => l.to_string(),
        }
    }
}

impl From<Comparison> for Expression {
    fn from(comparison: Comparison) -> Self {
        Self::Comparison(comparison)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comparison(c) => c.fmt(f),
            Self::Logical(l) => l.fmt(f),
        }
    }
}
