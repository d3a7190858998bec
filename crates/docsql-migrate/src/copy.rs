//! Reshaping rows for a rebuilt table.

use docsql_core::{to_sql_value, Properties, Row};

/// Reshapes `rows` to the declared properties.
///
/// Each output row holds exactly the declared properties, in declaration
/// order. Values present in the old row are kept; missing ones take the
/// property's default, or `null`. Columns no longer declared are dropped.
#[must_use]
pub fn copy_data(rows: Vec<Row>, properties: &Properties) -> Vec<Row> {
    rows.into_iter()
        .map(|row| {
            properties
                .iter()
                .map(|property| {
                    let value = row
                        .get(&property.name)
                        .cloned()
                        .unwrap_or_else(|| property.default_value());
                    (property.name.clone(), value)
                })
                .collect()
        })
        .collect()
}

/// Builds the `INSERT ... SELECT` that copies rows of `from` into `to`
/// with the same reshaping as [`copy_data`].
///
/// Columns present in both tables are selected as they are, so values keep
/// their storage class (BLOBs stay BLOBs). Declared properties missing from
/// `existing` are filled with their default literal, or `NULL`.
#[must_use]
pub fn copy_statement(from: &str, to: &str, properties: &Properties, existing: &[&str]) -> String {
    let mut columns = Vec::with_capacity(properties.len());
    let mut selected = Vec::with_capacity(properties.len());
    for property in properties {
        columns.push(property.name.clone());
        if existing.contains(&property.name.as_str()) {
            selected.push(property.name.clone());
        } else {
            selected.push(to_sql_value(&property.default_value()).to_sql_inline());
        }
    }
    format!(
        "INSERT INTO {to} ({}) SELECT {} FROM {from}",
        columns.join(", "),
        selected.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_copy_data() {
        let properties = Properties::from_json(&json!({
            "name": { "type": "String" },
            "age": { "type": "Number", "defaultsTo": 20 },
            "code": "String"
        }))
        .unwrap();
        let rows = vec![
            row(json!({ "nickname": "ben", "name": "benson", "age": 31.0 })),
            row(json!({ "code": null })),
        ];

        let copied = copy_data(rows, &properties);
        assert_eq!(
            copied,
            vec![
                row(json!({ "name": "benson", "age": 31.0, "code": null })),
                row(json!({ "name": null, "age": 20, "code": null })),
            ]
        );
        let order: Vec<&String> = copied[0].keys().collect();
        assert_eq!(order, ["name", "age", "code"]);
    }

    #[test]
    fn test_copy_statement() {
        let properties = Properties::from_json(&json!({
            "name": { "type": "String" },
            "age": { "type": "Number", "defaultsTo": 20 },
            "nick": { "type": "String", "defaultsTo": "it's" },
            "code": "String"
        }))
        .unwrap();
        assert_eq!(
            copy_statement("users", "users_shadow", &properties, &["nickname", "name"]),
            "INSERT INTO users_shadow (name, age, nick, code) SELECT name, 20, 'it''s', NULL FROM users"
        );
    }

    #[test]
    fn test_copy_nothing() {
        assert!(copy_data(Vec::new(), &Properties::new()).is_empty());
    }
}
