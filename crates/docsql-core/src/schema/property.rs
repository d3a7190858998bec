//! Property declarations.

use serde::Deserialize;
use serde_json::Value;

use super::table::{ColumnSpec, Constraint};
use super::types::PropertyType;
use crate::error::SchemaError;
use crate::ident::is_identifier;
use crate::value::ToSqlValue;

/// One declared property of a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property (and column) name.
    pub name: String,
    /// Declared type.
    pub kind: PropertyType,
    /// Value used when a document or row lacks this property.
    pub default: Option<Value>,
    /// Whether the column carries a UNIQUE constraint.
    pub unique: bool,
    /// Whether the column is the primary key.
    pub primary_key: bool,
    /// Whether the column gets an index.
    pub index: bool,
    /// Whether the column is NOT NULL.
    pub required: bool,
}

impl Property {
    /// Creates a property with no constraints and no default.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: PropertyType) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            unique: false,
            primary_key: false,
            index: false,
            required: false,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn defaults_to(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Marks the property unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the property as primary key.
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Marks the property as indexed.
    #[must_use]
    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Marks the property as required (NOT NULL).
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Returns the default, or JSON null when none is declared.
    #[must_use]
    pub fn default_value(&self) -> Value {
        self.default.clone().unwrap_or(Value::Null)
    }

    /// Returns the column this property maps to.
    #[must_use]
    pub fn column(&self) -> ColumnSpec {
        let mut column = ColumnSpec::new(self.name.clone(), self.kind.sql_type());
        if self.unique {
            column = column.constraint(Constraint::Unique);
        }
        if self.primary_key {
            column = column.constraint(Constraint::PrimaryKey);
        }
        if self.index {
            column = column.constraint(Constraint::Index);
        }
        if self.required {
            column = column.constraint(Constraint::NotNull);
        }
        if let Some(default) = &self.default {
            column = column.default(default.to_sql_value());
        }
        column
    }
}

/// Shape of one entry in a JSON schema declaration.
///
/// Either the bare type (`"otherName": "String"`) or the full object. Keys
/// this layer does not understand (validation rules such as `presence` or
/// `length`) are ignored.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawProperty {
    Shorthand(String),
    Full(RawPropertySpec),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPropertySpec {
    #[serde(rename = "type")]
    kind: Option<String>,
    defaults_to: Option<Value>,
    #[serde(default)]
    unique: bool,
    #[serde(default)]
    primary_key: bool,
    #[serde(default)]
    index: bool,
    #[serde(default)]
    required: bool,
}

/// The ordered set of properties of one model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    items: Vec<Property>,
}

impl Properties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON schema declaration, keeping declaration order.
    pub fn from_json(declaration: &Value) -> Result<Self, SchemaError> {
        let Value::Object(entries) = declaration else {
            return Err(SchemaError::Malformed(String::from(
                "properties must be an object",
            )));
        };

        let mut properties = Self::new();
        for (name, raw) in entries {
            let raw: RawProperty = serde_json::from_value(raw.clone())
                .map_err(|e| SchemaError::Malformed(format!("property '{name}': {e}")))?;

            let property = match raw {
                RawProperty::Shorthand(kind) => Property::new(name.clone(), kind.parse()?),
                RawProperty::Full(spec) => {
                    let kind = spec
                        .kind
                        .ok_or_else(|| SchemaError::MissingType(name.clone()))?
                        .parse()?;
                    Property {
                        name: name.clone(),
                        kind,
                        default: spec.defaults_to,
                        unique: spec.unique,
                        primary_key: spec.primary_key,
                        index: spec.index,
                        required: spec.required,
                    }
                }
            };
            properties.push(property)?;
        }
        Ok(properties)
    }

    /// Appends a property, rejecting invalid or duplicate names and a second
    /// primary key.
    pub fn push(&mut self, property: Property) -> Result<(), SchemaError> {
        if !is_identifier(&property.name) {
            return Err(SchemaError::InvalidIdentifier(property.name));
        }
        if self.contains(&property.name) {
            return Err(SchemaError::DuplicateProperty(property.name));
        }
        if property.primary_key && self.items.iter().any(|p| p.primary_key) {
            return Err(SchemaError::DuplicatePrimaryKey(property.name));
        }
        self.items.push(property);
        Ok(())
    }

    /// Builder form of [`push`](Self::push).
    pub fn with(mut self, property: Property) -> Result<Self, SchemaError> {
        self.push(property)?;
        Ok(self)
    }

    /// Removes a property by name, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Property> {
        let idx = self.items.iter().position(|p| p.name == name)?;
        Some(self.items.remove(idx))
    }

    /// Gets a property by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.items.iter().find(|p| p.name == name)
    }

    /// Returns whether a property with this name is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns property names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|p| p.name.as_str())
    }

    /// Iterates properties in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.items.iter()
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true when no property is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_keeps_declaration_order() {
        let props = Properties::from_json(&json!({
            "name": { "type": "String", "defaultsTo": "anon" },
            "code": { "type": "String" },
            "age": { "type": "Number", "defaultsTo": 20 }
        }))
        .unwrap();

        assert_eq!(props.names().collect::<Vec<_>>(), vec!["name", "code", "age"]);
        assert_eq!(props.get("age").unwrap().default, Some(json!(20)));
        assert_eq!(props.get("code").unwrap().default_value(), Value::Null);
    }

    #[test]
    fn test_from_json_shorthand_and_flags() {
        let props = Properties::from_json(&json!({
            "otherName": "String",
            "dob": "Date",
            "ssn": { "type": "String", "primaryKey": true, "index": true, "required": true }
        }))
        .unwrap();

        assert_eq!(props.get("dob").unwrap().kind, PropertyType::Date);
        let ssn = props.get("ssn").unwrap();
        assert!(ssn.primary_key && ssn.index && ssn.required);
        assert!(!ssn.unique);
    }

    #[test]
    fn test_from_json_ignores_validation_keys() {
        let props = Properties::from_json(&json!({
            "code": { "type": "String", "length": { "minimum": 3 }, "presence": true }
        }))
        .unwrap();
        assert_eq!(props.len(), 1);
    }

    #[test]
    fn test_missing_type_is_schema_error() {
        let err = Properties::from_json(&json!({ "name": { "unique": true } })).unwrap_err();
        assert!(matches!(err, SchemaError::MissingType(ref n) if n == "name"));
    }

    #[test]
    fn test_unsupported_type_is_schema_error() {
        let err = Properties::from_json(&json!({ "name": { "type": "Buffer" } })).unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType(_)));
    }

    #[test]
    fn test_malformed_declarations() {
        assert!(matches!(
            Properties::from_json(&json!(["name"])).unwrap_err(),
            SchemaError::Malformed(_)
        ));
        assert!(matches!(
            Properties::from_json(&json!({ "name": 42 })).unwrap_err(),
            SchemaError::Malformed(_)
        ));
    }

    #[test]
    fn test_invalid_and_duplicate_names() {
        let mut props = Properties::new();
        props
            .push(Property::new("name", PropertyType::String))
            .unwrap();
        assert!(matches!(
            props.push(Property::new("name", PropertyType::Number)),
            Err(SchemaError::DuplicateProperty(_))
        ));
        assert!(matches!(
            props.push(Property::new("drop table", PropertyType::Number)),
            Err(SchemaError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            Properties::from_json(&json!({ "order": "Number" })),
            Err(SchemaError::InvalidIdentifier(ref n)) if n == "order"
        ));
    }

    #[test]
    fn test_one_primary_key() {
        let err = Properties::from_json(&json!({
            "ssn": { "type": "String", "primaryKey": true },
            "code": { "type": "String", "primaryKey": true }
        }))
        .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicatePrimaryKey(ref n) if n == "code"));

        let mut props = Properties::new();
        props
            .push(Property::new("ssn", PropertyType::String).primary_key())
            .unwrap();
        props
            .push(Property::new("code", PropertyType::String).unique())
            .unwrap();
        assert!(props
            .push(Property::new("id", PropertyType::Number).primary_key())
            .is_err());
        assert!(props.remove("ssn").is_some());
        assert!(props
            .push(Property::new("id", PropertyType::Number).primary_key())
            .is_ok());
    }

    #[test]
    fn test_property_column_mapping() {
        let column = Property::new("age", PropertyType::Number)
            .defaults_to(20)
            .required()
            .column();
        assert_eq!(column.definition(), "age REAL NOT NULL DEFAULT 20");
    }
}
