//! Turning raw rows into records.

use std::ops::Index;

use docsql_core::Row;
use serde_json::Value;

/// Builds a record from a raw row.
///
/// Any `Fn(&str, Row) -> R` is a factory, so `&Record::from_row` or a
/// closure can be handed to [`QueryBuilder::exec`](crate::QueryBuilder::exec).
pub trait RecordFactory<R> {
    /// Builds one record for `table` from `row`.
    fn build(&self, table: &str, row: Row) -> R;
}

impl<F, R> RecordFactory<R> for F
where
    F: Fn(&str, Row) -> R,
{
    fn build(&self, table: &str, row: Row) -> R {
        self(table, row)
    }
}

/// A generic record: the table it came from and its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    table: String,
    fields: Row,
}

impl Record {
    /// Creates a record.
    #[must_use]
    pub fn new(table: impl Into<String>, fields: Row) -> Self {
        Self {
            table: table.into(),
            fields,
        }
    }

    /// The default record factory.
    #[must_use]
    pub fn from_row(table: &str, row: Row) -> Self {
        Self::new(table, row)
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Gets a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Sets a field, returning the previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.fields.insert(name.into(), value.into())
    }

    /// Returns all fields.
    #[must_use]
    pub const fn fields(&self) -> &Row {
        &self.fields
    }

    /// Consumes the record, returning its fields.
    #[must_use]
    pub fn into_fields(self) -> Row {
        self.fields
    }
}

static NULL: Value = Value::Null;

impl Index<&str> for Record {
    type Output = Value;

    /// Returns the field, or `null` when absent.
    fn index(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&NULL)
    }
}
