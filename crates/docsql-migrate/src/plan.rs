//! Diffing a desired table against the live one.
//!
//! SQLite can only add columns in place. Anything else (a removed column,
//! a changed type, flag or default, or a new column that cannot be added in
//! place) is handled by rebuilding the table: create a shadow table with the
//! desired schema, copy rows into it, drop the old table and rename the
//! shadow into place.

use std::fmt;

use docsql_core::{ColumnSpec, Constraint, TableSchema};

use crate::live::LiveColumn;
use crate::migrator::MigratorOptions;

/// One step of a migration.
#[derive(Debug, Clone, PartialEq)]
pub enum MigrationStep {
    /// `CREATE TABLE` for a table that does not exist.
    CreateTable(TableSchema),
    /// `ALTER TABLE ... ADD COLUMN`.
    AddColumn {
        /// Table to alter.
        table: String,
        /// Column to add.
        column: ColumnSpec,
    },
    /// `CREATE TABLE` for the shadow of a rebuild.
    CreateShadow(TableSchema),
    /// Read every row of `from`, reshape it and insert it into `to`.
    CopyRows {
        /// Source table.
        from: String,
        /// Shadow table.
        to: String,
    },
    /// `DROP TABLE`.
    DropTable(String),
    /// `ALTER TABLE ... RENAME TO`.
    RenameTable {
        /// Current name.
        from: String,
        /// New name.
        to: String,
    },
    /// `CREATE INDEX IF NOT EXISTS <table>_<column>_index`.
    CreateIndex {
        /// Indexed table.
        table: String,
        /// Indexed column.
        column: String,
    },
}

impl MigrationStep {
    /// Returns the SQL for the step; copying rows is not a single statement.
    #[must_use]
    pub fn sql(&self) -> Option<String> {
        match self {
            Self::CreateTable(schema) | Self::CreateShadow(schema) => Some(schema.create_sql()),
            Self::AddColumn { table, column } => Some(format!(
                "ALTER TABLE {table} ADD COLUMN {}",
                column.definition()
            )),
            Self::CopyRows { .. } => None,
            Self::DropTable(table) => Some(format!("DROP TABLE {table}")),
            Self::RenameTable { from, to } => Some(format!("ALTER TABLE {from} RENAME TO {to}")),
            Self::CreateIndex { table, column } => Some(format!(
                "CREATE INDEX IF NOT EXISTS {table}_{column}_index ON {table} ({column})"
            )),
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.sql()) {
            (Self::CopyRows { from, to }, _) => write!(f, "-- copy rows from {from} into {to}"),
            (_, Some(sql)) => write!(f, "{sql};"),
            (_, None) => Ok(()),
        }
    }
}

/// What a migration does to the table as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    /// The table does not exist yet.
    Create,
    /// Columns are added in place.
    Alter,
    /// The table is rebuilt through a shadow table.
    Rebuild,
    /// The table already matches.
    Unchanged,
}

/// The steps that bring a live table to its desired schema.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationPlan {
    table: String,
    kind: PlanKind,
    steps: Vec<MigrationStep>,
    added: Vec<String>,
    reasons: Vec<String>,
}

impl MigrationPlan {
    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the kind of migration.
    #[must_use]
    pub const fn kind(&self) -> PlanKind {
        self.kind
    }

    /// Returns the steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[MigrationStep] {
        &self.steps
    }

    /// Returns the columns added in place.
    #[must_use]
    pub fn added(&self) -> &[String] {
        &self.added
    }

    /// Returns why a rebuild is needed.
    #[must_use]
    pub fn reasons(&self) -> &[String] {
        &self.reasons
    }
}

impl fmt::Display for MigrationPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-- {}: {:?}", self.table, self.kind)?;
        for reason in &self.reasons {
            writeln!(f, "--   {reason}")?;
        }
        for step in &self.steps {
            writeln!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Plans a migration with the default options.
#[must_use]
pub fn plan(desired: &TableSchema, live: Option<&[LiveColumn]>) -> MigrationPlan {
    plan_with(desired, live, &MigratorOptions::default())
}

/// Plans a migration of `desired.table_name`; `live` is `None` when the
/// table does not exist.
#[must_use]
pub fn plan_with(
    desired: &TableSchema,
    live: Option<&[LiveColumn]>,
    options: &MigratorOptions,
) -> MigrationPlan {
    let table = desired.table_name.clone();
    let mut plan = MigrationPlan {
        table: table.clone(),
        kind: PlanKind::Unchanged,
        steps: Vec::new(),
        added: Vec::new(),
        reasons: Vec::new(),
    };

    match live {
        None => {
            plan.kind = PlanKind::Create;
            plan.steps.push(MigrationStep::CreateTable(desired.clone()));
        }
        Some(live) => {
            let mut additions = Vec::new();
            for column in live {
                if desired.column(&column.name).is_none() {
                    plan.reasons.push(format!("column '{}' removed", column.name));
                }
            }
            for column in &desired.columns {
                match live.iter().find(|l| l.name == column.name) {
                    Some(current) => plan.reasons.extend(column_changes(column, current)),
                    None if column.can_add_in_place() => additions.push(column.clone()),
                    None => plan
                        .reasons
                        .push(format!("column '{}' cannot be added in place", column.name)),
                }
            }

            if !plan.reasons.is_empty() {
                let shadow = format!("{table}{}", options.shadow_suffix);
                plan.kind = PlanKind::Rebuild;
                plan.steps.extend([
                    MigrationStep::CreateShadow(desired.renamed(shadow.clone())),
                    MigrationStep::CopyRows {
                        from: table.clone(),
                        to: shadow.clone(),
                    },
                    MigrationStep::DropTable(table.clone()),
                    MigrationStep::RenameTable {
                        from: shadow,
                        to: table.clone(),
                    },
                ]);
            } else if !additions.is_empty() {
                plan.kind = PlanKind::Alter;
                for column in additions {
                    plan.added.push(column.name.clone());
                    plan.steps.push(MigrationStep::AddColumn {
                        table: table.clone(),
                        column,
                    });
                }
            }
        }
    }

    if options.create_indexes {
        for column in desired.indexes() {
            plan.steps.push(MigrationStep::CreateIndex {
                table: table.clone(),
                column,
            });
        }
    }
    plan
}

/// Lists how an existing column differs from its desired definition.
///
/// UNIQUE is compared only for columns outside the primary key; SQLite folds
/// a UNIQUE clause on the primary key into the key's own index.
fn column_changes(desired: &ColumnSpec, live: &LiveColumn) -> Vec<String> {
    let mut changes = Vec::new();
    let name = &desired.name;
    if !desired.sql_type.matches_declared(&live.declared_type) {
        changes.push(format!(
            "column '{name}' type changed from {} to {}",
            live.declared_type, desired.sql_type
        ));
    }
    if desired.has(Constraint::PrimaryKey) != live.primary_key {
        changes.push(format!("column '{name}' primary key changed"));
    }
    if !desired.has(Constraint::PrimaryKey) && desired.has(Constraint::Unique) != live.unique {
        changes.push(format!("column '{name}' UNIQUE changed"));
    }
    if desired.has(Constraint::NotNull) != live.not_null {
        changes.push(format!("column '{name}' NOT NULL changed"));
    }
    let default = desired.default_literal();
    if default != live.default {
        changes.push(format!(
            "column '{name}' default changed from {} to {}",
            live.default.as_deref().unwrap_or("none"),
            default.as_deref().unwrap_or("none")
        ));
    }
    changes
}
