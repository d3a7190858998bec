//! The storage boundary.
//!
//! Everything above this trait renders complete SQL text; the implementor only
//! runs it. See `docsql-sqlite` for the SQLite implementation.

use serde_json::Value;

use crate::error::StorageError;

/// A raw result row: column name to value, in column order.
pub type Row = serde_json::Map<String, Value>;

/// What executing one statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageOutcome {
    /// Rows returned by a read.
    Rows(Vec<Row>),
    /// Result of a write.
    Write {
        /// Row id generated by an insert, if any.
        inserted_id: Option<i64>,
        /// Number of rows changed.
        rows_affected: u64,
    },
}

impl StorageOutcome {
    /// Returns the rows of a read, or an empty list for a write.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Self::Rows(rows) => rows,
            Self::Write { .. } => Vec::new(),
        }
    }

    /// Returns the number of rows changed by a write.
    #[must_use]
    pub const fn rows_affected(&self) -> u64 {
        match self {
            Self::Rows(_) => 0,
            Self::Write { rows_affected, .. } => *rows_affected,
        }
    }

    /// Returns the generated row id of a write.
    #[must_use]
    pub const fn inserted_id(&self) -> Option<i64> {
        match self {
            Self::Rows(_) => None,
            Self::Write { inserted_id, .. } => *inserted_id,
        }
    }
}

/// Executes rendered statements.
///
/// Implementations must report failures as [`StorageError`] and must not
/// retry on their own.
#[allow(async_fn_in_trait)]
pub trait Storage {
    /// Executes one SQL statement.
    async fn execute(&mut self, sql: &str) -> Result<StorageOutcome, StorageError>;
}

impl<S: Storage + ?Sized> Storage for &mut S {
    async fn execute(&mut self, sql: &str) -> Result<StorageOutcome, StorageError> {
        (**self).execute(sql).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    impl Storage for Echo {
        async fn execute(&mut self, sql: &str) -> Result<StorageOutcome, StorageError> {
            if sql.starts_with("SELECT") {
                let mut row = Row::new();
                row.insert(String::from("sql"), json!(sql));
                Ok(StorageOutcome::Rows(vec![row]))
            } else {
                Err(StorageError::new("read only"))
            }
        }
    }

    async fn run<S: Storage>(mut storage: S, sql: &str) -> Result<StorageOutcome, StorageError> {
        storage.execute(sql).await
    }

    #[tokio::test]
    async fn test_storage_through_mut_ref() {
        let mut echo = Echo;
        let rows = run(&mut echo, "SELECT 1").await.unwrap().into_rows();
        assert_eq!(rows[0]["sql"], json!("SELECT 1"));
        let err = run(&mut echo, "DELETE FROM t").await.unwrap_err();
        assert_eq!(err.message(), "read only");
    }

    #[test]
    fn test_outcome_accessors() {
        let write = StorageOutcome::Write {
            inserted_id: Some(7),
            rows_affected: 1,
        };
        assert_eq!(write.inserted_id(), Some(7));
        assert_eq!(write.rows_affected(), 1);
        assert!(write.into_rows().is_empty());
        assert_eq!(StorageOutcome::Rows(Vec::new()).inserted_id(), None);
    }
}
