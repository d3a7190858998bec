//! Error types for compiling and running queries.

use docsql_core::{SchemaError, StorageError};
use thiserror::Error;

/// Query errors.
#[derive(Debug, Error)]
pub enum QueryError {
    /// A filter document, field name or clause is not acceptable.
    #[error("validation error: {0}")]
    Validation(String),

    /// An operator got a value of the wrong shape.
    #[error("type error: {operator} expects {expected}")]
    Type {
        /// The operator, e.g. `$in`.
        operator: String,
        /// The shape the operator accepts.
        expected: &'static str,
    },

    /// Schema error from the property layer.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Error reported by the storage collaborator, unchanged.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The storage returned something the statement cannot produce.
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),
}

impl QueryError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
