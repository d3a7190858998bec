//! Property types and the SQL types they map to.

use std::fmt;
use std::str::FromStr;

use crate::error::SchemaError;

/// The closed set of property types a schema may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    /// Text.
    String,
    /// Any number; integers and floats share one column type.
    Number,
    /// Boolean, stored as 0/1.
    Boolean,
    /// Timestamp, stored as a UTC string.
    Date,
    /// List, stored as JSON text.
    Array,
    /// Nested document, stored as JSON text.
    Object,
}

impl PropertyType {
    /// Every supported property type.
    pub const ALL: [Self; 6] = [
        Self::String,
        Self::Number,
        Self::Boolean,
        Self::Date,
        Self::Array,
        Self::Object,
    ];

    /// Returns the descriptor name (`"String"`, `"Number"`, ...).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Array => "Array",
            Self::Object => "Object",
        }
    }

    /// Returns the SQL column type for this property type.
    #[must_use]
    pub const fn sql_type(self) -> SqlType {
        match self {
            Self::String | Self::Array | Self::Object => SqlType::Text,
            Self::Number => SqlType::Real,
            Self::Boolean => SqlType::Integer,
            Self::Date => SqlType::DateTime,
        }
    }
}

impl FromStr for PropertyType {
    type Err = SchemaError;

    fn from_str(descriptor: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(descriptor.trim()))
            .ok_or_else(|| SchemaError::UnsupportedType(descriptor.to_string()))
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SQL column types used in generated DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// TEXT.
    Text,
    /// REAL.
    Real,
    /// INTEGER.
    Integer,
    /// DATETIME; SQLite gives it NUMERIC affinity but the values written are
    /// UTC strings.
    DateTime,
}

impl SqlType {
    /// Returns the SQL type name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Real => "REAL",
            Self::Integer => "INTEGER",
            Self::DateTime => "DATETIME",
        }
    }

    /// Returns true when `declared` (as reported by the engine) names this type.
    #[must_use]
    pub fn matches_declared(self, declared: &str) -> bool {
        self.name().eq_ignore_ascii_case(declared.trim())
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Casts a property type descriptor to its SQL column type.
///
/// Fails for anything outside the supported set; there is no fallback type.
pub fn cast_to_sql_type(descriptor: &str) -> Result<SqlType, SchemaError> {
    Ok(descriptor.parse::<PropertyType>()?.sql_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cast_to_sql_type_is_total() {
        assert_eq!(cast_to_sql_type("String").unwrap(), SqlType::Text);
        assert_eq!(cast_to_sql_type("Number").unwrap(), SqlType::Real);
        assert_eq!(cast_to_sql_type("Boolean").unwrap(), SqlType::Integer);
        assert_eq!(cast_to_sql_type("Date").unwrap(), SqlType::DateTime);
        assert_eq!(cast_to_sql_type("Array").unwrap(), SqlType::Text);
        assert_eq!(cast_to_sql_type("Object").unwrap(), SqlType::Text);
        for ty in PropertyType::ALL {
            assert!(cast_to_sql_type(ty.name()).is_ok());
        }
    }

    #[test]
    fn test_descriptors_are_case_insensitive() {
        assert_eq!(cast_to_sql_type("string").unwrap(), SqlType::Text);
        assert_eq!(cast_to_sql_type("NUMBER").unwrap(), SqlType::Real);
    }

    #[test]
    fn test_unknown_descriptor_fails() {
        let err = cast_to_sql_type("Symbol").unwrap_err();
        assert!(matches!(err, SchemaError::UnsupportedType(ref t) if t == "Symbol"));
        assert!(cast_to_sql_type("").is_err());
    }

    #[test]
    fn test_declared_type_matching() {
        assert!(SqlType::Text.matches_declared("text"));
        assert!(SqlType::DateTime.matches_declared("DATETIME"));
        assert!(!SqlType::Real.matches_declared("INTEGER"));
    }
}
