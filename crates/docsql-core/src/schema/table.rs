//! Column and table definitions derived from properties.

use std::collections::BTreeSet;

use super::property::Properties;
use super::types::SqlType;
use crate::error::SchemaError;
use crate::ident::is_identifier;
use crate::value::SqlValue;

/// Column constraints.
///
/// The declaration order of the variants is the order the clauses appear in
/// a column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Constraint {
    /// UNIQUE.
    Unique,
    /// PRIMARY KEY.
    PrimaryKey,
    /// Column gets an index; emits no clause in the definition itself.
    Index,
    /// NOT NULL.
    NotNull,
}

impl Constraint {
    /// Returns the DDL clause, if any.
    #[must_use]
    pub const fn clause(self) -> Option<&'static str> {
        match self {
            Self::Unique => Some("UNIQUE"),
            Self::PrimaryKey => Some("PRIMARY KEY"),
            Self::Index => None,
            Self::NotNull => Some("NOT NULL"),
        }
    }
}

/// A column as it should exist in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// SQL type.
    pub sql_type: SqlType,
    /// Constraints on the column.
    pub constraints: BTreeSet<Constraint>,
    /// Default value, if any.
    pub default: Option<SqlValue>,
}

impl ColumnSpec {
    /// Creates an unconstrained column.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            constraints: BTreeSet::new(),
            default: None,
        }
    }

    /// Adds a constraint.
    #[must_use]
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.insert(constraint);
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: SqlValue) -> Self {
        self.default = Some(value);
        self
    }

    /// Returns true if the column carries `constraint`.
    #[must_use]
    pub fn has(&self, constraint: Constraint) -> bool {
        self.constraints.contains(&constraint)
    }

    /// Returns the `DEFAULT` literal, if a default is set.
    #[must_use]
    pub fn default_literal(&self) -> Option<String> {
        self.default.as_ref().map(SqlValue::to_default_literal)
    }

    /// Returns true when SQLite can add this column with `ALTER TABLE ... ADD COLUMN`.
    ///
    /// UNIQUE and PRIMARY KEY columns cannot be added in place, and neither
    /// can a NOT NULL column without a default.
    #[must_use]
    pub fn can_add_in_place(&self) -> bool {
        if self.has(Constraint::Unique) || self.has(Constraint::PrimaryKey) {
            return false;
        }
        !(self.has(Constraint::NotNull) && self.default.is_none())
    }

    /// Renders the column definition, e.g. `firstName TEXT UNIQUE DEFAULT "X"`.
    #[must_use]
    pub fn definition(&self) -> String {
        let mut parts = vec![self.name.clone(), self.sql_type.name().to_string()];
        parts.extend(
            self.constraints
                .iter()
                .filter_map(|c| c.clause())
                .map(String::from),
        );
        if let Some(literal) = self.default_literal() {
            parts.push(format!("DEFAULT {literal}"));
        }
        parts.join(" ")
    }
}

/// The desired shape of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Table name.
    pub table_name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnSpec>,
}

impl TableSchema {
    /// Builds a table schema from a property set.
    pub fn from_properties(
        table_name: impl Into<String>,
        properties: &Properties,
    ) -> Result<Self, SchemaError> {
        let table_name = table_name.into();
        if !is_identifier(&table_name) {
            return Err(SchemaError::InvalidIdentifier(table_name));
        }
        Ok(Self {
            table_name,
            columns: columns_of(properties),
        })
    }

    /// Gets a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns the comma-joined column definitions.
    #[must_use]
    pub fn ddl(&self) -> String {
        definitions(&self.columns)
    }

    /// Returns the indexed column names: `index` or primary key, no repeats.
    #[must_use]
    pub fn indexes(&self) -> Vec<String> {
        indexed_names(&self.columns)
    }

    /// Returns the primary-key column, if one is declared.
    #[must_use]
    pub fn primary_key(&self) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.has(Constraint::PrimaryKey))
    }

    /// Returns `CREATE TABLE <name> (<ddl>)`.
    #[must_use]
    pub fn create_sql(&self) -> String {
        format!("CREATE TABLE {} ({})", self.table_name, self.ddl())
    }

    /// Returns the same schema under another table name.
    #[must_use]
    pub fn renamed(&self, table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            columns: self.columns.clone(),
        }
    }
}

/// Returns the column definitions for `properties`, comma-joined in
/// declaration order.
#[must_use]
pub fn properties_ddl(properties: &Properties) -> String {
    definitions(&columns_of(properties))
}

/// Returns the names of properties flagged `index` or `primaryKey`.
#[must_use]
pub fn get_indexes(properties: &Properties) -> Vec<String> {
    indexed_names(&columns_of(properties))
}

fn columns_of(properties: &Properties) -> Vec<ColumnSpec> {
    properties.iter().map(super::Property::column).collect()
}

fn definitions(columns: &[ColumnSpec]) -> String {
    columns
        .iter()
        .map(ColumnSpec::definition)
        .collect::<Vec<_>>()
        .join(", ")
}

fn indexed_names(columns: &[ColumnSpec]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for column in columns {
        let indexed = column.has(Constraint::Index) || column.has(Constraint::PrimaryKey);
        if indexed && !names.contains(&column.name) {
            names.push(column.name.clone());
        }
    }
    names
}
