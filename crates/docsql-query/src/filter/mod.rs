//! Filter documents and the expressions they compile to.
//!
//! A filter document is a JSON object. Plain keys are fields compared for
//! equality (or with the single operator nested under them); `$and` and
//! `$or` take lists of documents. Sibling keys are ANDed.
//!
//! ```rust
//! use docsql_query::filter::compile;
//! use serde_json::json;
//!
//! let expression = compile(&json!({ "name": "benson", "age": { "$gte": 20 } }))
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(expression.to_where(), "(name = 'benson' AND age >= 20)");
//! ```

mod compiler;
mod expression;

pub use compiler::{compile, compile_with, MAX_DEPTH};
pub use expression::{CompareOp, Comparison, Expression, Logical, LogicalOp, Operand};
