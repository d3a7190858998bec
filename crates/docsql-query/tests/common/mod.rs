//! A scripted in-memory storage for driving `exec` without a database.

use std::collections::VecDeque;

use docsql_core::{Row, Storage, StorageError, StorageOutcome};
use serde_json::Value;

/// Replies to statements from a queue and remembers what it was sent.
#[derive(Debug, Default)]
pub struct ScriptedStorage {
    replies: VecDeque<Result<StorageOutcome, StorageError>>,
    pub executed: Vec<String>,
}

impl ScriptedStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply_rows(mut self, rows: Vec<Value>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => map,
                other => panic!("scripted row must be an object, got {other}"),
            })
            .collect::<Vec<Row>>();
        self.replies.push_back(Ok(StorageOutcome::Rows(rows)));
        self
    }

    pub fn reply_write(mut self, inserted_id: Option<i64>, rows_affected: u64) -> Self {
        self.replies.push_back(Ok(StorageOutcome::Write {
            inserted_id,
            rows_affected,
        }));
        self
    }

    pub fn reply_error(mut self, message: &str) -> Self {
        self.replies.push_back(Err(StorageError::new(message)));
        self
    }
}

impl Storage for ScriptedStorage {
    async fn execute(&mut self, sql: &str) -> Result<StorageOutcome, StorageError> {
        self.executed.push(sql.to_string());
        self.replies
            .pop_front()
            .unwrap_or_else(|| Err(StorageError::new("no scripted reply")))
    }
}
