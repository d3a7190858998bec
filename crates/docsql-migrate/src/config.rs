//! Schema files.
//!
//! A schema file is a JSON document naming a table (directly or through a
//! model name) and declaring its properties:
//!
//! ```json
//! {
//!   "model": "User",
//!   "properties": {
//!     "firstName": { "type": "String", "unique": true, "defaultsTo": "X" },
//!     "ssn": { "type": "String", "primaryKey": true }
//!   }
//! }
//! ```

use std::path::{Path, PathBuf};

use docsql_core::{Properties, TableSchema};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{MigrateError, Result};

/// A parsed schema file.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaFile {
    /// Explicit table name.
    #[serde(default)]
    pub table: Option<String>,
    /// Model name; the table is its lowercase plural.
    #[serde(default)]
    pub model: Option<String>,
    /// Property declarations.
    pub properties: Value,
    #[serde(skip)]
    path: PathBuf,
}

impl SchemaFile {
    /// Reads and parses a schema file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut file: Self = serde_json::from_str(&text).map_err(|e| MigrateError::SchemaFile {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.path = path.to_path_buf();
        Ok(file)
    }

    /// Parses a schema document that did not come from disk.
    pub fn from_json(document: Value) -> Result<Self> {
        Ok(serde_json::from_value(document)?)
    }

    /// Returns the path the file was loaded from; empty for in-memory documents.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the table name: `table` if set, else the model name
    /// lowercased with an `s` appended.
    pub fn table_name(&self) -> Result<String> {
        match (&self.table, &self.model) {
            (Some(table), _) => Ok(table.clone()),
            (None, Some(model)) => Ok(format!("{}s", model.to_lowercase())),
            (None, None) => Err(self.error("neither 'table' nor 'model' is set")),
        }
    }

    /// Parses the property declarations.
    pub fn properties(&self) -> Result<Properties> {
        Ok(Properties::from_json(&self.properties)?)
    }

    /// Returns the table schema the file describes.
    pub fn table_schema(&self) -> Result<TableSchema> {
        Ok(TableSchema::from_properties(
            self.table_name()?,
            &self.properties()?,
        )?)
    }

    fn error(&self, message: &str) -> MigrateError {
        MigrateError::SchemaFile {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}
