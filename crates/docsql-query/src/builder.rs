//! Statement builder.
//!
//! A [`QueryBuilder`] holds the state of one statement against one table:
//! the kind of statement, its conditions, ordering and paging, and the rows
//! or assignments it writes. Builders are consumed by each call, so a chain
//! either yields a complete statement or stops at the first error.

use std::fmt;

use docsql_core::ident::{is_field_path, is_identifier};
use docsql_core::{to_sql_value, Row, SqlValue, Storage, StorageOutcome};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{QueryError, Result};
use crate::filter::{compile, CompareOp, Comparison, Expression, Operand};
use crate::record::RecordFactory;

/// The statement a builder renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT <cols> FROM ...`
    Select,
    /// `SELECT DISTINCT <col> FROM ...`
    Distinct,
    /// `SELECT COUNT(*) AS count FROM ...`
    Count,
    /// `INSERT INTO ...`
    Insert,
    /// `UPDATE ... SET ...`
    Update,
    /// `DELETE FROM ...`
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Select => "SELECT",
            Self::Distinct => "SELECT DISTINCT",
            Self::Count => "COUNT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        })
    }
}

/// How many records a read yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Every matching record.
    Many,
    /// The first matching record, if any.
    Single,
}

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

impl OrderDirection {
    /// Reads a direction token: `"desc"`, `"descending"` and `-1` are
    /// descending, `"asc"`, `"ascending"` and `1` ascending.
    #[must_use]
    pub fn from_token(token: &Value) -> Option<Self> {
        match token {
            Value::String(s)
                if s.eq_ignore_ascii_case("desc") || s.eq_ignore_ascii_case("descending") =>
            {
                Some(Self::Desc)
            }
            Value::String(s)
                if s.eq_ignore_ascii_case("asc") || s.eq_ignore_ascii_case("ascending") =>
            {
                Some(Self::Asc)
            }
            Value::Number(n) if n.as_i64() == Some(-1) => Some(Self::Desc),
            Value::Number(n) if n.as_i64() == Some(1) => Some(Self::Asc),
            _ => None,
        }
    }
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to order by
    pub column: String,
    /// Order direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates a new ascending order specification.
    #[must_use]
    pub fn asc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a new descending order specification.
    #[must_use]
    pub fn desc(column: &str) -> Self {
        Self {
            column: column.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parses `"name"` (ascending) or `"-name"` (descending).
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        spec.strip_prefix('-')
            .map_or_else(|| Self::asc(spec), Self::desc)
    }

    /// Returns the SQL representation.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self.direction {
            OrderDirection::Asc => format!("{} ASC", self.column),
            OrderDirection::Desc => format!("{} DESC", self.column),
        }
    }
}

/// Columns to select.
///
/// Built from a space-delimited string (`"name age"`) or a list of names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection(Vec<String>);

impl Projection {
    /// Returns the column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for Projection {
    fn from(spec: &str) -> Self {
        Self(spec.split_whitespace().map(String::from).collect())
    }
}

impl From<String> for Projection {
    fn from(spec: String) -> Self {
        Self::from(spec.as_str())
    }
}

impl From<Vec<String>> for Projection {
    fn from(columns: Vec<String>) -> Self {
        Self(columns)
    }
}

impl From<Vec<&str>> for Projection {
    fn from(columns: Vec<&str>) -> Self {
        Self(columns.into_iter().map(String::from).collect())
    }
}

impl From<&[&str]> for Projection {
    fn from(columns: &[&str]) -> Self {
        Self(columns.iter().map(|c| (*c).to_string()).collect())
    }
}

/// What running a statement produced, mapped to records.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<R> {
    /// Records of a many-arity read, in row order.
    Many(Vec<R>),
    /// The record of a single-arity read.
    One(Option<R>),
    /// Row id generated by an insert.
    Inserted(Option<i64>),
    /// Rows changed by an update or delete.
    Affected(u64),
    /// Result of a count.
    Count(u64),
}

impl<R> Outcome<R> {
    /// Returns every record carried by a read.
    #[must_use]
    pub fn into_records(self) -> Vec<R> {
        match self {
            Self::Many(records) => records,
            Self::One(record) => record.into_iter().collect(),
            Self::Inserted(_) | Self::Affected(_) | Self::Count(_) => Vec::new(),
        }
    }

    /// Returns the first record carried by a read.
    #[must_use]
    pub fn into_one(self) -> Option<R> {
        self.into_records().into_iter().next()
    }

    /// Returns the count of a count statement.
    #[must_use]
    pub const fn count(&self) -> Option<u64> {
        match self {
            Self::Count(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the rows changed by an update or delete.
    #[must_use]
    pub const fn rows_affected(&self) -> Option<u64> {
        match self {
            Self::Affected(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the row id generated by an insert.
    #[must_use]
    pub const fn inserted_id(&self) -> Option<i64> {
        match self {
            Self::Inserted(id) => *id,
            _ => None,
        }
    }
}

/// Builds and runs one statement against one table.
///
/// # Example
///
/// ```rust
/// use docsql_query::QueryBuilder;
/// use serde_json::json;
///
/// let mut query = QueryBuilder::new("customers")
///     .unwrap()
///     .find(&json!({ "age": { "$gt": 18 } }))
///     .unwrap()
///     .sort(&json!({ "name": "desc" }))
///     .unwrap()
///     .limit(10);
///
/// assert_eq!(
///     query.render().unwrap(),
///     "SELECT * FROM customers WHERE (age > 18) ORDER BY name DESC LIMIT 10"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    kind: StatementKind,
    table: String,
    columns: Vec<String>,
    expression: Option<Expression>,
    pending_field: Option<String>,
    order: Vec<OrderBy>,
    limit: Option<i64>,
    offset: Option<i64>,
    rows: Vec<Row>,
    assignments: Vec<(String, SqlValue)>,
    where_clause: Option<String>,
    finalized: bool,
    arity: Arity,
}

impl QueryBuilder {
    /// Creates a builder for `table`, initially a `SELECT *`.
    pub fn new(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        if !is_identifier(&table) {
            return Err(QueryError::validation(format!("invalid table name '{table}'")));
        }
        Ok(Self {
            kind: StatementKind::Select,
            table,
            columns: Vec::new(),
            expression: None,
            pending_field: None,
            order: Vec::new(),
            limit: None,
            offset: None,
            rows: Vec::new(),
            assignments: Vec::new(),
            where_clause: None,
            finalized: false,
            arity: Arity::Many,
        })
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the statement kind.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Returns the arity of a read.
    #[must_use]
    pub const fn arity(&self) -> Arity {
        self.arity
    }

    /// Returns the accumulated condition.
    #[must_use]
    pub const fn expression(&self) -> Option<&Expression> {
        self.expression.as_ref()
    }

    /// Returns true once the WHERE clause has been rendered.
    #[must_use]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    // --- statements ---

    /// Selects every record matching `conditions`.
    pub fn find(mut self, conditions: &Value) -> Result<Self> {
        self.kind = StatementKind::Select;
        self.arity = Arity::Many;
        self.filter(conditions)
    }

    /// Restricts the selected columns.
    pub fn select(mut self, projection: impl Into<Projection>) -> Result<Self> {
        for column in projection.into().0 {
            if column == "*" {
                continue;
            }
            if !is_field_path(&column) {
                return Err(QueryError::validation(format!(
                    "invalid column name '{column}'"
                )));
            }
            self.columns.push(column);
        }
        Ok(self)
    }

    /// Selects the first record matching `conditions`.
    pub fn find_one(self, conditions: &Value) -> Result<Self> {
        let mut query = self.find(conditions)?;
        query.limit = Some(1);
        query.offset = Some(0);
        query.arity = Arity::Single;
        Ok(query)
    }

    /// Selects the record whose `id` equals `id`.
    pub fn find_by_id(self, id: impl Into<Value>) -> Result<Self> {
        let mut conditions = Map::new();
        conditions.insert(String::from("id"), id.into());
        self.find_one(&Value::Object(conditions))
    }

    /// Inserts one document.
    pub fn insert(self, doc: &Value) -> Result<Self> {
        self.insert_many(std::slice::from_ref(doc))
    }

    /// Inserts several documents in one statement.
    ///
    /// The column list is the union of the documents' keys in first-seen
    /// order; a document lacking a column inserts NULL there.
    pub fn insert_many(mut self, docs: &[Value]) -> Result<Self> {
        if docs.is_empty() {
            return Err(QueryError::validation("nothing to insert"));
        }
        let mut rows = Vec::with_capacity(docs.len());
        for doc in docs {
            let Value::Object(row) = doc else {
                return Err(QueryError::Type {
                    operator: String::from("insert"),
                    expected: "a document",
                });
            };
            check_columns(row.keys())?;
            rows.push(row.clone());
        }
        self.kind = StatementKind::Insert;
        self.rows = rows;
        Ok(self)
    }

    /// Updates records matching `conditions` with `assignments`.
    pub fn update(mut self, conditions: &Value, assignments: &Value) -> Result<Self> {
        let Value::Object(assignments) = assignments else {
            return Err(QueryError::Type {
                operator: String::from("update"),
                expected: "a document of assignments",
            });
        };
        check_columns(assignments.keys())?;
        self.assignments = assignments
            .iter()
            .map(|(column, value)| (column.clone(), to_sql_value(value)))
            .collect();
        self.kind = StatementKind::Update;
        self.filter(conditions)
    }

    /// Deletes records matching `conditions`.
    pub fn remove(mut self, conditions: &Value) -> Result<Self> {
        self.kind = StatementKind::Delete;
        self.filter(conditions)
    }

    /// Counts records matching `conditions`.
    pub fn count(mut self, conditions: &Value) -> Result<Self> {
        self.kind = StatementKind::Count;
        self.filter(conditions)
    }

    /// Selects the distinct values of `field` among records matching
    /// `conditions`.
    pub fn distinct(mut self, field: &str, conditions: &Value) -> Result<Self> {
        if !is_field_path(field) {
            return Err(QueryError::validation(format!("invalid field name '{field}'")));
        }
        self.kind = StatementKind::Distinct;
        self.arity = Arity::Many;
        self.columns = vec![field.to_string()];
        self.filter(conditions)
    }

    // --- conditions ---

    /// ANDs the conditions of a filter document onto the statement.
    pub fn filter(mut self, conditions: &Value) -> Result<Self> {
        self.ensure_open()?;
        if let Some(expression) = compile(conditions)? {
            self.push_expression(expression);
        }
        Ok(self)
    }

    /// Sets the field the next comparison applies to.
    pub fn path(mut self, field: &str) -> Result<Self> {
        self.ensure_open()?;
        if !is_field_path(field) {
            return Err(QueryError::validation(format!("invalid field name '{field}'")));
        }
        self.pending_field = Some(field.to_string());
        Ok(self)
    }

    /// Compares the pending field with `value`.
    pub fn compare(mut self, op: CompareOp, value: impl Into<Value>) -> Result<Self> {
        self.ensure_open()?;
        let field = self
            .pending_field
            .take()
            .ok_or_else(|| QueryError::validation("no pending field"))?;
        let value = value.into();
        let comparison = Comparison::new(field, op, Operand::from_json(op, &value)?)?;
        self.push_expression(comparison.into());
        Ok(self)
    }

    /// Compares `field` with `value`.
    pub fn compare_at(self, field: &str, op: CompareOp, value: impl Into<Value>) -> Result<Self> {
        self.path(field)?.compare(op, value)
    }

    /// `<pending> = value`
    pub fn equals(self, value: impl Into<Value>) -> Result<Self> {
        self.compare(CompareOp::Eq, value)
    }

    /// `<pending> <> value`
    pub fn ne(self, value: impl Into<Value>) -> Result<Self> {
        self.compare(CompareOp::Ne, value)
    }

    /// `<pending> > value`
    pub fn gt(self, value: impl Into<Value>) -> Result<Self> {
        self.compare(CompareOp::Gt, value)
    }

    /// `<pending> >= value`
    pub fn gte(self, value: impl Into<Value>) -> Result<Self> {
        self.compare(CompareOp::Gte, value)
    }

    /// `<pending> < value`
    pub fn lt(self, value: impl Into<Value>) -> Result<Self> {
        self.compare(CompareOp::Lt, value)
    }

    /// `<pending> <= value`
    pub fn lte(self, value: impl Into<Value>) -> Result<Self> {
        self.compare(CompareOp::Lte, value)
    }

    /// `<pending> IN (values)`
    pub fn in_list<V: Into<Value>>(self, values: impl IntoIterator<Item = V>) -> Result<Self> {
        let values = values.into_iter().map(Into::into).collect::<Vec<Value>>();
        self.compare(CompareOp::In, Value::Array(values))
    }

    fn ensure_open(&self) -> Result<()> {
        if self.finalized {
            return Err(QueryError::validation(
                "conditions cannot change after the statement is finalized",
            ));
        }
        Ok(())
    }

    fn push_expression(&mut self, expression: Expression) {
        self.expression = Some(match self.expression.take() {
            Some(existing) => existing.and(expression),
            None => expression,
        });
    }

    // --- ordering and paging ---

    /// Limits the number of rows. Anything but a finite number is ignored.
    #[must_use]
    pub fn limit(mut self, n: impl Into<Value>) -> Self {
        let n = n.into();
        match finite_integer(&n) {
            Some(n) => self.limit = Some(n),
            None => debug!(value = %n, "Ignoring non-numeric limit"),
        }
        self
    }

    /// Skips rows. Anything but a finite number is ignored.
    #[must_use]
    pub fn offset(mut self, n: impl Into<Value>) -> Self {
        let n = n.into();
        match finite_integer(&n) {
            Some(n) => self.offset = Some(n),
            None => debug!(value = %n, "Ignoring non-numeric offset"),
        }
        self
    }

    /// Alias for [`offset`](Self::offset).
    #[must_use]
    pub fn skip(self, n: impl Into<Value>) -> Self {
        self.offset(n)
    }

    /// Appends orderings.
    ///
    /// Takes a field name, a list of field names (ascending), or a mapping
    /// of field to direction. An unrecognized direction sorts ascending.
    pub fn sort(mut self, spec: &Value) -> Result<Self> {
        match spec {
            Value::Null => {}
            Value::String(fields) => {
                for field in fields.split_whitespace() {
                    self.push_order(OrderBy::parse(field))?;
                }
            }
            Value::Array(fields) => {
                for field in fields {
                    let Value::String(field) = field else {
                        return Err(QueryError::Type {
                            operator: String::from("sort"),
                            expected: "a list of field names",
                        });
                    };
                    self.push_order(OrderBy::parse(field))?;
                }
            }
            Value::Object(fields) => {
                for (field, token) in fields {
                    let direction = OrderDirection::from_token(token).unwrap_or_else(|| {
                        warn!(field = %field, token = %token, "Unrecognized sort direction, sorting ascending");
                        OrderDirection::Asc
                    });
                    self.push_order(OrderBy {
                        column: field.clone(),
                        direction,
                    })?;
                }
            }
            Value::Bool(_) | Value::Number(_) => {
                return Err(QueryError::Type {
                    operator: String::from("sort"),
                    expected: "a field, a list of fields or a mapping of field to direction",
                });
            }
        }
        Ok(self)
    }

    /// Alias for [`sort`](Self::sort).
    pub fn order(self, spec: &Value) -> Result<Self> {
        self.sort(spec)
    }

    /// Appends one ordering; prefix the field with `-` for descending.
    pub fn order_by(mut self, spec: &str) -> Result<Self> {
        self.push_order(OrderBy::parse(spec))?;
        Ok(self)
    }

    fn push_order(&mut self, order: OrderBy) -> Result<()> {
        if !is_field_path(&order.column) {
            return Err(QueryError::validation(format!(
                "invalid sort field '{}'",
                order.column
            )));
        }
        self.order.push(order);
        Ok(())
    }

    // --- rendering ---

    /// Renders the accumulated condition into the WHERE clause.
    ///
    /// Runs once; later calls do nothing.
    pub fn finalize(&mut self) {
        if self.finalized {
            return;
        }
        self.where_clause = self.expression.as_ref().map(Expression::to_where);
        self.finalized = true;
    }

    /// Renders the complete statement.
    pub fn render(&mut self) -> Result<String> {
        self.finalize();
        self.check_clauses()?;

        let sql = match self.kind {
            StatementKind::Select | StatementKind::Distinct => self.build_select(),
            StatementKind::Count => {
                let mut sql = format!("SELECT COUNT(*) AS count FROM {}", self.table);
                self.push_where(&mut sql);
                sql
            }
            StatementKind::Insert => self.build_insert()?,
            StatementKind::Update => {
                let assignments: Vec<String> = self
                    .assignments
                    .iter()
                    .map(|(column, value)| format!("{column} = {}", value.to_sql_inline()))
                    .collect();
                let mut sql = format!("UPDATE {} SET {}", self.table, assignments.join(", "));
                self.push_where(&mut sql);
                sql
            }
            StatementKind::Delete => {
                let mut sql = format!("DELETE FROM {}", self.table);
                self.push_where(&mut sql);
                sql
            }
        };
        Ok(sql)
    }

    fn check_clauses(&self) -> Result<()> {
        if let Some(field) = &self.pending_field {
            return Err(QueryError::validation(format!(
                "field '{field}' has no comparison"
            )));
        }
        let paged = !self.order.is_empty() || self.limit.is_some() || self.offset.is_some();
        match self.kind {
            StatementKind::Select | StatementKind::Distinct => Ok(()),
            StatementKind::Insert if self.where_clause.is_some() => {
                Err(QueryError::validation("INSERT cannot take conditions"))
            }
            StatementKind::Update if self.assignments.is_empty() => {
                Err(QueryError::validation("UPDATE needs at least one assignment"))
            }
            kind if paged => Err(QueryError::validation(format!(
                "{kind} cannot take ORDER BY, LIMIT or OFFSET"
            ))),
            StatementKind::Insert
            | StatementKind::Update
            | StatementKind::Delete
            | StatementKind::Count => Ok(()),
        }
    }

    fn push_where(&self, sql: &mut String) {
        if let Some(where_clause) = &self.where_clause {
            sql.push_str(" WHERE ");
            sql.push_str(where_clause);
        }
    }

    fn build_select(&self) -> String {
        let mut sql = String::from("SELECT ");
        if self.kind == StatementKind::Distinct {
            sql.push_str("DISTINCT ");
        }
        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&self.table);

        self.push_where(&mut sql);

        if !self.order.is_empty() {
            sql.push_str(" ORDER BY ");
            let order_parts: Vec<String> = self.order.iter().map(OrderBy::to_sql).collect();
            sql.push_str(&order_parts.join(", "));
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {offset}"));
        }
        sql
    }

    fn build_insert(&self) -> Result<String> {
        let mut columns: Vec<&str> = Vec::new();
        for row in &self.rows {
            for column in row.keys() {
                if !columns.contains(&column.as_str()) {
                    columns.push(column);
                }
            }
        }

        if columns.is_empty() {
            if self.rows.len() > 1 {
                return Err(QueryError::validation(
                    "several empty documents cannot be inserted in one statement",
                ));
            }
            return Ok(format!("INSERT INTO {} DEFAULT VALUES", self.table));
        }

        let values: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let literals: Vec<String> = columns
                    .iter()
                    .map(|column| {
                        row.get(*column)
                            .map_or(SqlValue::Null, to_sql_value)
                            .to_sql_inline()
                    })
                    .collect();
                format!("({})", literals.join(", "))
            })
            .collect();

        Ok(format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.table,
            columns.join(", "),
            values.join(", ")
        ))
    }

    // --- execution ---

    /// Renders the statement, runs it and maps the result.
    ///
    /// Storage errors are returned unchanged.
    pub async fn exec<S, R, F>(mut self, storage: &mut S, factory: &F) -> Result<Outcome<R>>
    where
        S: Storage,
        F: RecordFactory<R>,
    {
        let sql = self.render()?;
        debug!(sql = %sql, table = %self.table, "Executing SQL");

        let outcome = storage.execute(&sql).await?;
        match (self.kind, outcome) {
            (StatementKind::Select | StatementKind::Distinct, StorageOutcome::Rows(rows)) => {
                let mut records = rows
                    .into_iter()
                    .filter(|row| !row.is_empty())
                    .map(|row| factory.build(&self.table, row));
                Ok(match self.arity {
                    Arity::Many => Outcome::Many(records.collect()),
                    Arity::Single => Outcome::One(records.next()),
                })
            }
            (StatementKind::Count, StorageOutcome::Rows(rows)) => read_count(&rows).map(Outcome::Count),
            (StatementKind::Insert, StorageOutcome::Write { inserted_id, .. }) => {
                Ok(Outcome::Inserted(inserted_id))
            }
            (
                StatementKind::Update | StatementKind::Delete,
                StorageOutcome::Write { rows_affected, .. },
            ) => Ok(Outcome::Affected(rows_affected)),
            (kind, other) => Err(QueryError::UnexpectedResult(format!(
                "{kind} statement produced {other:?}"
            ))),
        }
    }
}

fn check_columns<'a>(columns: impl IntoIterator<Item = &'a String>) -> Result<()> {
    for column in columns {
        if !is_identifier(column) {
            return Err(QueryError::validation(format!(
                "invalid column name '{column}'"
            )));
        }
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn finite_integer(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.trunc() as i64)
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn read_count(rows: &[Row]) -> Result<u64> {
    let count = rows.first().and_then(|row| row.get("count"));
    count
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f as u64)))
        .ok_or_else(|| QueryError::UnexpectedResult(String::from("count query returned no count")))
}
