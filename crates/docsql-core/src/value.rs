//! SQL values and literal encoding.
//!
//! Statements are handed to the storage collaborator as a single string, so
//! values are rendered inline. Every text literal goes through
//! [`SqlValue::to_sql_inline`], which doubles embedded quotes.

use chrono::{DateTime, Utc};
use serde_json::Value;

/// A scalar SQL value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value, stored as INTEGER 0/1.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl SqlValue {
    /// Returns the SQL representation for inline use in a statement.
    ///
    /// Text is single-quoted, numbers are bare and booleans become `1`/`0`.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => String::from(if *b { "1" } else { "0" }),
            Self::Int(n) => format!("{n}"),
            Self::Float(f) if f.is_finite() => format!("{f}"),
            Self::Float(_) => String::from("NULL"),
            Self::Text(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
        }
    }

    /// Returns the literal used after `DEFAULT` in a column definition.
    ///
    /// Text defaults are double-quoted; everything else matches
    /// [`to_sql_inline`](Self::to_sql_inline).
    #[must_use]
    pub fn to_default_literal(&self) -> String {
        match self {
            Self::Text(s) => format!("\"{}\"", s.replace('"', "\"\"")),
            other => other.to_sql_inline(),
        }
    }

    /// Returns true for NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true when the literal is quoted text.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// Formats a timestamp the way dates are stored: an RFC 7231 UTC string,
/// e.g. `Sun, 18 Oct 2026 10:00:00 GMT`.
#[must_use]
pub fn format_utc(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Converts a document value to its SQL value.
///
/// Dates become UTC strings, arrays and objects become JSON text and
/// primitives pass through. Quoting is left to the renderer.
pub fn to_sql_value<V: ToSqlValue>(value: V) -> SqlValue {
    value.to_sql_value()
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(format_utc(&self))
    }
}

impl ToSqlValue for &Value {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(*b),
            Value::Number(n) => n.as_i64().map_or_else(
                || SqlValue::Float(n.as_f64().unwrap_or_default()),
                SqlValue::Int,
            ),
            Value::String(s) => SqlValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => SqlValue::Text(self.to_string()),
        }
    }
}

impl ToSqlValue for Value {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Value::String(s) => SqlValue::Text(s),
            other => (&other).to_sql_value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_sql_value_inline_scalars() {
        assert_eq!(SqlValue::Null.to_sql_inline(), "NULL");
        assert_eq!(SqlValue::Bool(true).to_sql_inline(), "1");
        assert_eq!(SqlValue::Bool(false).to_sql_inline(), "0");
        assert_eq!(SqlValue::Int(-100).to_sql_inline(), "-100");
        assert_eq!(SqlValue::Float(20.5).to_sql_inline(), "20.5");
        assert_eq!(SqlValue::Float(206.0).to_sql_inline(), "206");
    }

    #[test]
    fn test_sql_value_inline_text_escaping() {
        assert_eq!(
            SqlValue::Text(String::from("O'Brien")).to_sql_inline(),
            "'O''Brien'"
        );
        let escaped = SqlValue::Text(String::from("'; DROP TABLE users; --")).to_sql_inline();
        assert_eq!(escaped, "'''; DROP TABLE users; --'");
    }

    #[test]
    fn test_default_literal_quotes_text_only() {
        assert_eq!(SqlValue::Text("X".into()).to_default_literal(), "\"X\"");
        assert_eq!(
            SqlValue::Text("say \"hi\"".into()).to_default_literal(),
            "\"say \"\"hi\"\"\""
        );
        assert_eq!(SqlValue::Int(20).to_default_literal(), "20");
        assert_eq!(SqlValue::Bool(true).to_default_literal(), "1");
    }

    #[test]
    fn test_dates_become_utc_strings() {
        let date = Utc.with_ymd_and_hms(2026, 10, 18, 10, 0, 0).unwrap();
        assert_eq!(
            to_sql_value(date),
            SqlValue::Text(String::from("Sun, 18 Oct 2026 10:00:00 GMT"))
        );
    }

    #[test]
    fn test_arrays_and_objects_become_json_text() {
        assert_eq!(
            to_sql_value(&json!([1, 2, 3, 4])),
            SqlValue::Text(String::from("[1,2,3,4]"))
        );
        assert_eq!(
            to_sql_value(&json!({"city": "arusha", "zip": 23})),
            SqlValue::Text(String::from(r#"{"city":"arusha","zip":23}"#))
        );
    }

    #[test]
    fn test_primitives_pass_through() {
        assert_eq!(to_sql_value(&json!(20)), SqlValue::Int(20));
        assert_eq!(to_sql_value(&json!(1.5)), SqlValue::Float(1.5));
        assert_eq!(to_sql_value(&json!("john")), SqlValue::Text("john".into()));
        assert_eq!(to_sql_value(&json!(true)), SqlValue::Bool(true));
        assert_eq!(to_sql_value(&json!(null)), SqlValue::Null);
        assert_eq!(to_sql_value(None::<i32>), SqlValue::Null);
    }
}
