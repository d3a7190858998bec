//! Reading the live shape of a table.

use docsql_core::ident::is_identifier;
use docsql_core::{Row, SchemaError, SqlValue, Storage};
use serde_json::Value;

use crate::error::{MigrateError, Result};

/// One column as SQLite reports it in `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveColumn {
    /// Column name.
    pub name: String,
    /// Declared type, as written in the table definition.
    pub declared_type: String,
    /// Whether the column is NOT NULL.
    pub not_null: bool,
    /// Default literal, as written in the table definition.
    pub default: Option<String>,
    /// Whether the column is part of the primary key.
    pub primary_key: bool,
    /// Whether a single-column UNIQUE constraint covers the column.
    pub unique: bool,
}

/// Returns whether `table` exists.
pub async fn table_exists<S: Storage>(storage: &mut S, table: &str) -> Result<bool> {
    let sql = format!(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = {}",
        SqlValue::Text(table.to_string()).to_sql_inline()
    );
    Ok(!storage.execute(&sql).await?.into_rows().is_empty())
}

/// Reads the columns of `table`; an absent table has none.
pub async fn read_columns<S: Storage>(storage: &mut S, table: &str) -> Result<Vec<LiveColumn>> {
    if !is_identifier(table) {
        return Err(SchemaError::InvalidIdentifier(table.to_string()).into());
    }
    let rows = storage
        .execute(&format!("PRAGMA table_info({table})"))
        .await?
        .into_rows();
    let mut columns = parse_table_info(&rows)?;

    let unique = unique_columns(storage, table).await?;
    for column in &mut columns {
        column.unique = unique.contains(&column.name);
    }
    Ok(columns)
}

/// Reads the columns covered by a single-column UNIQUE constraint.
///
/// Only indexes SQLite created for a `UNIQUE` clause (`origin = 'u'`) count;
/// primary-key and explicitly created indexes do not.
pub async fn unique_columns<S: Storage>(storage: &mut S, table: &str) -> Result<Vec<String>> {
    let indexes = storage
        .execute(&format!("PRAGMA index_list({table})"))
        .await?
        .into_rows();

    let mut columns = Vec::new();
    for index in constraint_indexes(&indexes) {
        let sql = format!(
            "PRAGMA index_info({})",
            SqlValue::Text(index).to_sql_inline()
        );
        let info = storage.execute(&sql).await?.into_rows();
        if let [row] = info.as_slice() {
            if let Some(Value::String(name)) = row.get("name") {
                columns.push(name.clone());
            }
        }
    }
    Ok(columns)
}

/// Names of the unique indexes backing `UNIQUE` clauses in `index_list` rows.
pub fn constraint_indexes(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter(|row| row.get("origin").and_then(Value::as_str) == Some("u"))
        .filter(|row| flag(row, "unique"))
        .filter_map(|row| row.get("name").and_then(Value::as_str).map(String::from))
        .collect()
}

/// Parses `PRAGMA table_info` rows.
pub fn parse_table_info(rows: &[Row]) -> Result<Vec<LiveColumn>> {
    rows.iter()
        .map(|row| {
            let name = match row.get("name") {
                Some(Value::String(name)) => name.clone(),
                _ => {
                    return Err(MigrateError::Migration(format!(
                        "table_info row without a column name: {}",
                        Value::Object(row.clone())
                    )))
                }
            };
            let declared_type = row
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let default = match row.get("dflt_value") {
                None | Some(Value::Null) => None,
                Some(Value::String(s)) => Some(s.clone()),
                Some(other) => Some(other.to_string()),
            };
            Ok(LiveColumn {
                name,
                declared_type,
                not_null: flag(row, "notnull"),
                default,
                primary_key: flag(row, "pk"),
                unique: false,
            })
        })
        .collect()
}

fn flag(row: &Row, key: &str) -> bool {
    row.get(key).and_then(Value::as_i64).is_some_and(|n| n > 0)
}
