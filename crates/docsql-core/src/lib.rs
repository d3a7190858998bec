//! # docsql-core
//!
//! Shared building blocks for the docsql workspace:
//!
//! - [`schema`] maps property declarations (`{"type": "String", ...}`) to SQL
//!   column types, DDL fragments and index lists.
//! - [`value`] converts document values to SQL literals.
//! - [`storage`] defines the boundary to the engine that executes statements.
//!
//! ## Example
//!
//! ```rust
//! use docsql_core::schema::{get_indexes, properties_ddl, Properties};
//! use serde_json::json;
//!
//! let properties = Properties::from_json(&json!({
//!     "firstName": { "type": "String", "unique": true, "defaultsTo": "X" },
//!     "lastName": { "type": "String" },
//!     "ssn": { "type": "String", "primaryKey": true, "index": true }
//! }))
//! .unwrap();
//!
//! assert_eq!(
//!     properties_ddl(&properties),
//!     r#"firstName TEXT UNIQUE DEFAULT "X", lastName TEXT, ssn TEXT PRIMARY KEY"#
//! );
//! assert_eq!(get_indexes(&properties), vec!["ssn"]);
//! ```

pub mod error;
pub mod ident;
pub mod schema;
pub mod storage;
pub mod value;

pub use error::{SchemaError, StorageError};
pub use schema::{
    cast_to_sql_type, get_indexes, properties_ddl, ColumnSpec, Constraint, Properties, Property,
    PropertyType, SqlType, TableSchema,
};
pub use storage::{Row, Storage, StorageOutcome};
pub use value::{to_sql_value, SqlValue, ToSqlValue};
