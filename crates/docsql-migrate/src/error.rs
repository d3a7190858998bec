//! Error types for the migration system.

use std::path::PathBuf;

use docsql_core::{SchemaError, StorageError};
use docsql_query::QueryError;

/// Errors that can occur while migrating a table.
#[derive(Debug, thiserror::Error)]
pub enum MigrateError {
    /// The migration cannot proceed without losing or corrupting data, or the
    /// live table looks unlike anything SQLite reports.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// The property schema is malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The storage failed; the engine's error is kept as is.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Building a statement failed.
    #[error(transparent)]
    Query(QueryError),

    /// IO error (reading schema files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// A schema file could not be used.
    #[error("Failed to read schema file '{path}': {message}")]
    SchemaFile {
        /// Path to the schema file.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

impl From<QueryError> for MigrateError {
    fn from(err: QueryError) -> Self {
        match err {
            QueryError::Storage(e) => Self::Storage(e),
            QueryError::Schema(e) => Self::Schema(e),
            other => Self::Query(other),
        }
    }
}

/// Result type for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_storage_errors_stay_storage_errors() {
        let err: MigrateError = QueryError::Storage(StorageError::new("disk full")).into();
        assert!(matches!(err, MigrateError::Storage(ref e) if e.message() == "disk full"));

        let err: MigrateError = QueryError::Validation("bad".into()).into();
        assert!(matches!(err, MigrateError::Query(_)));
    }
}
