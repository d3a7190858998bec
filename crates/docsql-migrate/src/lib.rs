//! Non-destructive SQLite migrations driven by property schemas.
//!
//! `docsql-migrate` compares the properties a model declares with the table
//! SQLite actually holds and brings the table in line without losing rows:
//!
//! - a missing table is created;
//! - new columns are added with `ALTER TABLE ... ADD COLUMN` where SQLite
//!   allows it;
//! - every other change rebuilds the table through a shadow table, keeping
//!   rows and primary keys;
//! - indexes are created for `index` and primary-key columns.
//!
//! A rebuild interrupted between dropping the old table and renaming the
//! shadow leaves the shadow behind; the next [`SchemaMigrator::alter`]
//! finishes the job.
//!
//! # Example
//!
//! ```rust
//! use docsql_core::Properties;
//! use docsql_migrate::prelude::*;
//! use docsql_sqlite::SqliteStorage;
//! use serde_json::json;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let mut storage = SqliteStorage::in_memory().await.unwrap();
//! let properties = Properties::from_json(&json!({
//!     "name": { "type": "String" },
//!     "ssn": { "type": "String", "primaryKey": true }
//! }))
//! .unwrap();
//!
//! let migrator = SchemaMigrator::new();
//! let outcome = migrator.alter(&mut storage, "users", &properties).await.unwrap();
//! assert_eq!(outcome.kind, MigrationKind::Created);
//! assert_eq!(outcome.to_string(), "users migrated successfully");
//! # });
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # Print the DDL a schema file describes
//! docsql-migrate ddl schemas/user.json
//!
//! # Show what would change
//! docsql-migrate --database sqlite:app.db plan schemas/*.json
//!
//! # Apply
//! docsql-migrate --database sqlite:app.db alter schemas/*.json
//! ```

pub mod config;
pub mod copy;
pub mod error;
pub mod live;
pub mod migrator;
pub mod plan;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::SchemaFile;
    pub use crate::copy::{copy_data, copy_statement};
    pub use crate::error::{MigrateError, Result};
    pub use crate::live::LiveColumn;
    pub use crate::migrator::{MigrationKind, MigrationOutcome, MigratorOptions, SchemaMigrator};
    pub use crate::plan::{plan, plan_with, MigrationPlan, MigrationStep, PlanKind};
}
