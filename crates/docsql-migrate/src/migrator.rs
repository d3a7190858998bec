//! Applying migration plans to a storage.

use std::collections::HashSet;
use std::fmt;

use docsql_core::{Properties, Row, Storage, TableSchema};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::copy::{copy_data, copy_statement};
use crate::error::{MigrateError, Result};
use crate::live::{read_columns, table_exists, LiveColumn};
use crate::plan::{plan_with, MigrationPlan, MigrationStep, PlanKind};

/// Settings for [`SchemaMigrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratorOptions {
    /// Appended to the table name to name the shadow table of a rebuild.
    pub shadow_suffix: String,
    /// Whether to create indexes for `index` and primary-key columns.
    pub create_indexes: bool,
    /// Rows per `INSERT` when copying into the shadow table.
    pub batch_size: usize,
}

impl Default for MigratorOptions {
    fn default() -> Self {
        Self {
            shadow_suffix: String::from("_shadow"),
            create_indexes: true,
            batch_size: 100,
        }
    }
}

/// What [`SchemaMigrator::alter`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationKind {
    /// The table was created.
    Created,
    /// Columns were added in place.
    Altered {
        /// Added column names.
        added: Vec<String>,
    },
    /// The table was rebuilt.
    Rebuilt {
        /// Number of rows copied into the new table.
        copied: usize,
    },
    /// The table already matched.
    Unchanged,
}

/// The result of migrating one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationOutcome {
    /// Table name.
    pub table: String,
    /// What was done.
    pub kind: MigrationKind,
}

impl fmt::Display for MigrationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} migrated successfully", self.table)
    }
}

/// Brings tables in line with their property schemas without losing rows.
#[derive(Debug, Clone, Default)]
pub struct SchemaMigrator {
    options: MigratorOptions,
}

impl SchemaMigrator {
    /// Creates a migrator with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a migrator with the given options.
    #[must_use]
    pub const fn with_options(options: MigratorOptions) -> Self {
        Self { options }
    }

    /// Returns the options.
    #[must_use]
    pub const fn options(&self) -> &MigratorOptions {
        &self.options
    }

    /// Plans a migration without touching storage.
    #[must_use]
    pub fn plan(&self, desired: &TableSchema, live: Option<&[LiveColumn]>) -> MigrationPlan {
        plan_with(desired, live, &self.options)
    }

    /// Reads the live columns of `table`, or `None` if it does not exist.
    pub async fn inspect<S: Storage>(
        &self,
        storage: &mut S,
        table: &str,
    ) -> Result<Option<Vec<LiveColumn>>> {
        if !table_exists(storage, table).await? {
            return Ok(None);
        }
        let columns = read_columns(storage, table).await?;
        if columns.is_empty() {
            return Err(MigrateError::Migration(format!(
                "table '{table}' exists but reports no columns"
            )));
        }
        Ok(Some(columns))
    }

    /// Plans the migration of `table` against its live state.
    ///
    /// Nothing is written; a leftover shadow table is not recovered.
    pub async fn plan_for<S: Storage>(
        &self,
        storage: &mut S,
        table: &str,
        properties: &Properties,
    ) -> Result<MigrationPlan> {
        let desired = desired_schema(table, properties)?;
        let live = self.inspect(storage, table).await?;
        Ok(self.plan(&desired, live.as_deref()))
    }

    /// Migrates `table` to `properties`.
    ///
    /// Missing tables are created, new columns are added in place where
    /// SQLite allows it, and anything else rebuilds the table through a
    /// shadow table. Rows and primary keys survive every path. A shadow
    /// table left by an interrupted rebuild is recovered first, so a failed
    /// call can simply be retried.
    pub async fn alter<S: Storage>(
        &self,
        storage: &mut S,
        table: &str,
        properties: &Properties,
    ) -> Result<MigrationOutcome> {
        let desired = desired_schema(table, properties)?;
        self.recover(storage, table).await?;

        let live = self.inspect(storage, table).await?;
        let plan = self.plan(&desired, live.as_deref());
        info!(table = %table, kind = ?plan.kind(), "Migrating table");
        for reason in plan.reasons() {
            debug!(table = %table, reason = %reason, "Rebuild required");
        }

        let mut copied = 0;
        for step in plan.steps() {
            if let MigrationStep::CopyRows { from, to } = step {
                let live = live.as_deref().unwrap_or_default();
                copied = self
                    .copy_rows(storage, (from, to), properties, &desired, live)
                    .await?;
            } else if let Some(sql) = step.sql() {
                debug!(sql = %sql, "Executing SQL");
                storage.execute(&sql).await?;
            }
        }

        let kind = match plan.kind() {
            PlanKind::Create => MigrationKind::Created,
            PlanKind::Alter => MigrationKind::Altered {
                added: plan.added().to_vec(),
            },
            PlanKind::Rebuild => MigrationKind::Rebuilt { copied },
            PlanKind::Unchanged => MigrationKind::Unchanged,
        };
        info!(table = %table, kind = ?kind, "Migration applied");
        Ok(MigrationOutcome {
            table: table.to_string(),
            kind,
        })
    }

    /// Finishes or discards a rebuild that stopped halfway.
    async fn recover<S: Storage>(&self, storage: &mut S, table: &str) -> Result<()> {
        let shadow = format!("{table}{}", self.options.shadow_suffix);
        if !table_exists(storage, &shadow).await? {
            return Ok(());
        }
        let step = if table_exists(storage, table).await? {
            warn!(table = %table, shadow = %shadow, "Dropping leftover shadow table");
            MigrationStep::DropTable(shadow)
        } else {
            warn!(table = %table, shadow = %shadow, "Restoring shadow table");
            MigrationStep::RenameTable {
                from: shadow,
                to: table.to_string(),
            }
        };
        let sql = step.sql().unwrap_or_default();
        debug!(sql = %sql, "Executing SQL");
        storage.execute(&sql).await?;
        Ok(())
    }

    /// Copies every row of `from` into `to`, reshaped to `properties`.
    ///
    /// Rows are read first so a NULL or duplicated primary key fails the
    /// migration before anything is written; the copy itself runs inside
    /// SQLite in batches of `batch_size` rows.
    async fn copy_rows<S: Storage>(
        &self,
        storage: &mut S,
        (from, to): (&str, &str),
        properties: &Properties,
        desired: &TableSchema,
        live: &[LiveColumn],
    ) -> Result<usize> {
        let rows = storage
            .execute(&format!("SELECT * FROM {from}"))
            .await?
            .into_rows();
        let rows = copy_data(rows, properties);
        if let Some(pk) = desired.primary_key() {
            check_primary_keys(&rows, &pk.name)?;
        }

        let existing: Vec<&str> = live.iter().map(|c| c.name.as_str()).collect();
        let insert = copy_statement(from, to, properties, &existing);
        let batch = self.options.batch_size.max(1);
        let mut copied = 0;
        for offset in (0..rows.len()).step_by(batch) {
            let sql = format!("{insert} ORDER BY rowid LIMIT {batch} OFFSET {offset}");
            debug!(sql = %sql, "Executing SQL");
            let outcome = storage.execute(&sql).await?;
            copied += usize::try_from(outcome.rows_affected()).unwrap_or(usize::MAX);
        }
        info!(from = %from, to = %to, rows = copied, "Copied rows");
        Ok(copied)
    }
}

fn desired_schema(table: &str, properties: &Properties) -> Result<TableSchema> {
    if properties.is_empty() {
        return Err(MigrateError::Migration(format!(
            "no properties declared for table '{table}'"
        )));
    }
    Ok(TableSchema::from_properties(table, properties)?)
}

/// Fails if any copied row would lose its primary key or share it.
fn check_primary_keys(rows: &[Row], pk: &str) -> Result<()> {
    let mut seen = HashSet::with_capacity(rows.len());
    for row in rows {
        let key = row.get(pk).unwrap_or(&Value::Null);
        if key.is_null() {
            return Err(MigrateError::Migration(format!(
                "primary key '{pk}' would be NULL for a copied row"
            )));
        }
        if !seen.insert(key.to_string()) {
            return Err(MigrateError::Migration(format!(
                "primary key '{pk}' value {key} is duplicated"
            )));
        }
    }
    Ok(())
}
