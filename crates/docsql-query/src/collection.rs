//! Named models over a property schema.

use docsql_core::ident::is_identifier;
use docsql_core::{Properties, Row, SchemaError, TableSchema};
use serde_json::{Map, Value};

use crate::builder::QueryBuilder;
use crate::error::{QueryError, Result};
use crate::record::Record;

/// A model name bound to its properties and table.
///
/// Every query method returns a [`QueryBuilder`] that can be refined further
/// and then executed.
///
/// ```rust
/// use docsql_core::Properties;
/// use docsql_query::Collection;
/// use serde_json::json;
///
/// let properties = Properties::from_json(&json!({
///     "name": { "type": "String" },
///     "age": { "type": "Number", "defaultsTo": 20 }
/// }))
/// .unwrap();
/// let customers = Collection::new("Customer", properties).unwrap();
///
/// let mut query = customers.find(&json!({ "name": "benson", "age": 20 })).unwrap();
/// assert_eq!(
///     query.render().unwrap(),
///     "SELECT * FROM customers WHERE (name = 'benson' AND age = 20)"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Collection {
    name: String,
    table: String,
    properties: Properties,
}

impl Collection {
    /// Creates a collection; the table is the lowercased name plus `s`.
    pub fn new(name: impl Into<String>, properties: Properties) -> Result<Self> {
        let name = name.into();
        let table = format!("{}s", name.to_lowercase());
        Self::build(name, table, properties)
    }

    /// Overrides the table name.
    pub fn with_table_name(self, table: impl Into<String>) -> Result<Self> {
        Self::build(self.name, table.into(), self.properties)
    }

    fn build(name: String, table: String, properties: Properties) -> Result<Self> {
        if !is_identifier(&table) {
            return Err(QueryError::Schema(SchemaError::InvalidIdentifier(table)));
        }
        Ok(Self {
            name,
            table,
            properties,
        })
    }

    /// Returns the model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Returns the declared properties.
    #[must_use]
    pub const fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Returns the table schema the properties describe.
    pub fn schema(&self) -> Result<TableSchema> {
        Ok(TableSchema::from_properties(
            self.table.clone(),
            &self.properties,
        )?)
    }

    /// Returns an unconditioned builder for the table.
    pub fn query(&self) -> Result<QueryBuilder> {
        QueryBuilder::new(self.table.clone())
    }

    /// Selects every record matching `conditions`.
    pub fn find(&self, conditions: &Value) -> Result<QueryBuilder> {
        self.query()?.find(conditions)
    }

    /// Selects the first record matching `conditions`.
    pub fn find_one(&self, conditions: &Value) -> Result<QueryBuilder> {
        self.query()?.find_one(conditions)
    }

    /// Selects the record with the given `id`.
    pub fn find_by_id(&self, id: impl Into<Value>) -> Result<QueryBuilder> {
        self.query()?.find_by_id(id)
    }

    /// Inserts a document.
    ///
    /// Undeclared keys are dropped and absent properties that declare a
    /// default get it.
    pub fn create(&self, doc: &Value) -> Result<QueryBuilder> {
        let Value::Object(doc) = doc else {
            return Err(QueryError::Type {
                operator: String::from("create"),
                expected: "a document",
            });
        };
        let mut row = Map::new();
        for property in &self.properties {
            if let Some(value) = doc.get(&property.name) {
                row.insert(property.name.clone(), value.clone());
            } else if let Some(default) = &property.default {
                row.insert(property.name.clone(), default.clone());
            }
        }
        self.query()?.insert(&Value::Object(row))
    }

    /// Updates records matching `conditions`.
    pub fn update(&self, conditions: &Value, assignments: &Value) -> Result<QueryBuilder> {
        self.query()?.update(conditions, assignments)
    }

    /// Deletes records matching `conditions`.
    pub fn remove(&self, conditions: &Value) -> Result<QueryBuilder> {
        self.query()?.remove(conditions)
    }

    /// Counts records matching `conditions`.
    pub fn count(&self, conditions: &Value) -> Result<QueryBuilder> {
        self.query()?.count(conditions)
    }

    /// Selects distinct values of `field`.
    pub fn distinct(&self, field: &str, conditions: &Value) -> Result<QueryBuilder> {
        self.query()?.distinct(field, conditions)
    }

    /// Builds an unsaved record holding every declared property.
    ///
    /// Values from `data` win over declared defaults; properties without
    /// either are `null`. Keys `data` has but the schema does not are kept.
    #[must_use]
    pub fn new_record(&self, data: &Value) -> Record {
        let mut fields = Row::new();
        for property in &self.properties {
            fields.insert(property.name.clone(), property.default_value());
        }
        if let Value::Object(data) = data {
            for (key, value) in data {
                fields.insert(key.clone(), value.clone());
            }
        }
        Record::new(self.table.clone(), fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn customers() -> Collection {
        let properties = Properties::from_json(&json!({
            "name": { "type": "String" },
            "code": { "type": "String" },
            "age": { "type": "Number", "defaultsTo": 20 },
            "active": { "type": "Boolean", "defaultsTo": true }
        }))
        .unwrap();
        Collection::new("Customer", properties).unwrap()
    }

    #[test]
    fn test_table_name_is_pluralized() {
        let collection = customers();
        assert_eq!(collection.name(), "Customer");
        assert_eq!(collection.table_name(), "customers");
        let renamed = collection.with_table_name("people").unwrap();
        assert_eq!(renamed.table_name(), "people");
        assert!(customers().with_table_name("bad name").is_err());
    }

    #[test]
    fn test_new_record_has_every_property() {
        let record = customers().new_record(&json!({ "name": "benson", "age": 30 }));
        assert_eq!(record.table(), "customers");
        assert_eq!(record["name"], json!("benson"));
        assert_eq!(record["code"], Value::Null);
        assert_eq!(record["age"], json!(30));
        assert_eq!(record["active"], json!(true));
        assert_eq!(record.fields().len(), 4);
    }

    #[test]
    fn test_create_fills_defaults_and_drops_unknown_keys() {
        let mut query = customers()
            .create(&json!({ "name": "benson", "nickname": "ben" }))
            .unwrap();
        assert_eq!(
            query.render().unwrap(),
            "INSERT INTO customers (name, age, active) VALUES ('benson', 20, 1)"
        );
    }

    #[test]
    fn test_query_methods_target_the_table() {
        let c = customers();
        assert_eq!(
            c.find_by_id(3).unwrap().render().unwrap(),
            "SELECT * FROM customers WHERE (id = 3) LIMIT 1 OFFSET 0"
        );
        assert_eq!(
            c.count(&json!({})).unwrap().render().unwrap(),
            "SELECT COUNT(*) AS count FROM customers"
        );
        assert_eq!(
            c.distinct("code", &json!({})).unwrap().render().unwrap(),
            "SELECT DISTINCT code FROM customers"
        );
        assert_eq!(
            c.remove(&json!({ "code": "x" })).unwrap().render().unwrap(),
            "DELETE FROM customers WHERE (code = 'x')"
        );
        assert_eq!(
            c.update(&json!({ "code": "x" }), &json!({ "age": 5 }))
                .unwrap()
                .render()
                .unwrap(),
            "UPDATE customers SET age = 5 WHERE (code = 'x')"
        );
    }

    #[test]
    fn test_schema() {
        let schema = customers().schema().unwrap();
        assert_eq!(
            schema.ddl(),
            "name TEXT, code TEXT, age REAL DEFAULT 20, active INTEGER DEFAULT 1"
        );
    }
}
