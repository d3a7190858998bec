//! Filter documents to expressions.

use docsql_core::to_sql_value;
use serde_json::{Map, Value};

use super::expression::{CompareOp, Comparison, Expression, LogicalOp, Operand};
use crate::error::{QueryError, Result};

/// Deepest `$and`/`$or` nesting a filter document may use.
pub const MAX_DEPTH: usize = 32;

/// Compiles a filter document, joining top-level keys with AND.
///
/// An empty document (or `null`) compiles to `None`.
pub fn compile(filter: &Value) -> Result<Option<Expression>> {
    compile_with(filter, LogicalOp::And)
}

/// Compiles a filter document, joining top-level keys with `joiner`.
pub fn compile_with(filter: &Value, joiner: LogicalOp) -> Result<Option<Expression>> {
    match filter {
        Value::Null => Ok(None),
        Value::Object(doc) => compile_document(doc, joiner, 0),
        _ => Err(QueryError::Type {
            operator: String::from("filter"),
            expected: "a document",
        }),
    }
}

fn compile_document(
    doc: &Map<String, Value>,
    joiner: LogicalOp,
    depth: usize,
) -> Result<Option<Expression>> {
    if depth > MAX_DEPTH {
        return Err(QueryError::validation(format!(
            "filter nested deeper than {MAX_DEPTH} levels"
        )));
    }

    let mut children = Vec::with_capacity(doc.len());
    for (key, value) in doc {
        if let Some(op) = LogicalOp::from_operator(key) {
            children.push(compile_logical(op, value, depth + 1)?);
        } else if CompareOp::from_operator(key).is_some() {
            return Err(QueryError::validation(format!(
                "operator {key} must be nested under a field"
            )));
        } else if key.starts_with('$') {
            return Err(QueryError::validation(format!("unknown operator {key}")));
        } else {
            children.push(compile_field(key, value)?.into());
        }
    }

    if children.is_empty() {
        return Ok(None);
    }
    Expression::group(joiner, children).map(Some)
}

fn compile_logical(op: LogicalOp, value: &Value, depth: usize) -> Result<Expression> {
    let Value::Array(items) = value else {
        return Err(QueryError::Type {
            operator: op.operator().to_string(),
            expected: "a list of filter documents",
        });
    };
    if items.is_empty() {
        return Err(QueryError::validation("empty logical group"));
    }

    let mut children = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(doc) = item else {
            return Err(QueryError::Type {
                operator: op.operator().to_string(),
                expected: "a list of filter documents",
            });
        };
        match compile_document(doc, LogicalOp::And, depth)? {
            Some(expression) => children.push(expression),
            None => {
                return Err(QueryError::validation(format!(
                    "empty filter document in {}",
                    op.operator()
                )))
            }
        }
    }
    Expression::group(op, children)
}

fn compile_field(field: &str, value: &Value) -> Result<Comparison> {
    if let Value::Object(spec) = value {
        if spec.is_empty() {
            return Err(QueryError::Type {
                operator: field.to_string(),
                expected: "a value or an operator object",
            });
        }
        if spec.keys().any(|k| k.starts_with('$')) {
            if spec.len() != 1 {
                return Err(QueryError::validation(format!(
                    "operator object for '{field}' must have exactly one key"
                )));
            }
            let Some((key, operand)) = spec.iter().next() else {
                return Err(QueryError::validation(format!(
                    "empty operator object for '{field}'"
                )));
            };
            let op = CompareOp::from_operator(key)
                .ok_or_else(|| QueryError::validation(format!("unknown operator {key}")))?;
            return Comparison::new(field, op, Operand::from_json(op, operand)?);
        }
    }
    // Plain values, arrays and nested documents compare against their stored form.
    Comparison::new(field, CompareOp::Eq, Operand::Value(to_sql_value(value)))
}
