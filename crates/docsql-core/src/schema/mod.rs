//! Property schemas and their SQL mapping.
//!
//! A model declares its properties as a JSON mapping
//! `name -> {type, defaultsTo?, unique?, primaryKey?, index?, required?}`.
//! This module turns that declaration into column types, DDL text and the
//! list of indexed columns.

mod property;
mod table;
mod types;

pub use property::{Properties, Property};
pub use table::{get_indexes, properties_ddl, ColumnSpec, Constraint, TableSchema};
pub use types::{cast_to_sql_type, PropertyType, SqlType};
