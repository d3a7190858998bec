//! # docsql-sqlite
//!
//! SQLite storage for docsql, over one `sqlx` connection.
//!
//! # What the storage relies on
//!
//! - **[Type affinity]**: any column can hold any value, so rows are decoded
//!   by the storage class of each value, not by the declared column type. A
//!   `DATETIME` column holding UTC strings reads back as text, a `REAL`
//!   column holding `20` reads back as `20.0`.
//! - **One connection**: statements run one at a time through `&mut self`.
//!   `sqlite::memory:` databases live exactly as long as the storage.
//!   Statements are not cached, since the same text may run before and
//!   after a schema change.
//! - **[`last_insert_rowid`]**: reported as the generated id of an `INSERT`.
//!
//! [Type affinity]: https://www.sqlite.org/datatype3.html
//! [`last_insert_rowid`]: https://www.sqlite.org/c3ref/last_insert_rowid.html
//!
//! ## Example
//!
//! ```rust
//! use docsql_core::{Storage, StorageOutcome};
//! use docsql_sqlite::SqliteStorage;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut storage = SqliteStorage::in_memory().await.unwrap();
//! storage.execute("CREATE TABLE users (name TEXT)").await.unwrap();
//! storage.execute("INSERT INTO users (name) VALUES ('benson')").await.unwrap();
//!
//! let rows = storage.execute("SELECT name FROM users").await.unwrap().into_rows();
//! assert_eq!(rows[0]["name"], "benson");
//! # });
//! ```

use std::fmt::Write as _;
use std::str::FromStr;

use docsql_core::{Row, Storage, StorageError, StorageOutcome};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{Column as _, ConnectOptions as _, Row as _, TypeInfo as _, ValueRef as _};
use tracing::debug;

/// Leading keywords of statements that return rows.
const READ_KEYWORDS: [&str; 5] = ["SELECT", "PRAGMA", "WITH", "VALUES", "EXPLAIN"];

/// A [`Storage`] backed by a single SQLite connection.
#[derive(Debug)]
pub struct SqliteStorage {
    conn: SqliteConnection,
}

impl SqliteStorage {
    /// Opens the database at `url`, creating the file if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is malformed or the database cannot be
    /// opened.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(StorageError::from_source)?
            .create_if_missing(true);
        let conn = options.connect().await.map_err(StorageError::from_source)?;
        debug!(url = %url, "Opened SQLite database");
        Ok(Self { conn })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if SQLite cannot open the database.
    pub async fn in_memory() -> Result<Self, StorageError> {
        Self::connect("sqlite::memory:").await
    }

    /// Wraps an already open connection.
    #[must_use]
    pub const fn from_connection(conn: SqliteConnection) -> Self {
        Self { conn }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub fn into_inner(self) -> SqliteConnection {
        self.conn
    }

    async fn fetch(&mut self, sql: &str) -> Result<Vec<Row>, sqlx::Error> {
        let rows = sqlx::query(sql)
            .persistent(false)
            .fetch_all(&mut self.conn)
            .await?;
        rows.iter().map(decode_row).collect()
    }

    async fn write(&mut self, sql: &str) -> Result<StorageOutcome, sqlx::Error> {
        let result = sqlx::query(sql)
            .persistent(false)
            .execute(&mut self.conn)
            .await?;
        let inserted_id = (starts_with_keyword(sql, "INSERT") && result.rows_affected() > 0)
            .then(|| result.last_insert_rowid());
        Ok(StorageOutcome::Write {
            inserted_id,
            rows_affected: result.rows_affected(),
        })
    }
}

impl Storage for SqliteStorage {
    async fn execute(&mut self, sql: &str) -> Result<StorageOutcome, StorageError> {
        let outcome = if is_read(sql) {
            let rows = self.fetch(sql).await.map_err(StorageError::from_source)?;
            debug!(rows = rows.len(), "Fetched rows");
            StorageOutcome::Rows(rows)
        } else {
            self.write(sql).await.map_err(StorageError::from_source)?
        };
        Ok(outcome)
    }
}

fn starts_with_keyword(sql: &str, keyword: &str) -> bool {
    sql.trim_start()
        .get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
}

fn is_read(sql: &str) -> bool {
    READ_KEYWORDS.iter().any(|kw| starts_with_keyword(sql, kw))
}

/// Decodes a row by the storage class of each value.
fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut out = Row::new();
    for column in row.columns() {
        let idx = column.ordinal();
        let storage_class = {
            let raw = row.try_get_raw(idx)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().name().to_ascii_uppercase())
            }
        };
        let value = match storage_class.as_deref() {
            None | Some("NULL") => Value::Null,
            Some("INTEGER" | "BOOLEAN" | "INT8" | "BIGINT") => {
                Value::from(row.try_get_unchecked::<i64, _>(idx)?)
            }
            Some("REAL" | "NUMERIC") => Value::from(row.try_get_unchecked::<f64, _>(idx)?),
            Some("BLOB") => Value::String(hex(&row.try_get_unchecked::<Vec<u8>, _>(idx)?)),
            Some(_) => Value::String(row.try_get_unchecked::<String, _>(idx)?),
        };
        out.insert(column.name().to_string(), value);
    }
    Ok(out)
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
