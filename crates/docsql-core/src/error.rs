//! Error types shared across the workspace.

use thiserror::Error;

/// Errors raised while reading or mapping a property schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The type descriptor is not one of the supported property types.
    #[error("unsupported property type: {0}")]
    UnsupportedType(String),

    /// A property declaration has no `type`.
    #[error("property '{0}' has no type")]
    MissingType(String),

    /// Two properties share a name.
    #[error("duplicate property '{0}'")]
    DuplicateProperty(String),

    /// A second property is declared as the primary key.
    #[error("property '{0}' is a second primary key")]
    DuplicatePrimaryKey(String),

    /// A table or property name is not a plain SQL identifier.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// The declaration is not shaped like a schema at all.
    #[error("malformed schema declaration: {0}")]
    Malformed(String),
}

/// Opaque failure reported by the storage collaborator.
///
/// The message is the engine's own text; the original error, when there is
/// one, stays reachable through [`std::error::Error::source`].
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StorageError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Creates a storage error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an engine error, keeping its message and the error itself.
    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Returns the engine's message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_storage_error_keeps_message() {
        let err = StorageError::new("no such table: users");
        assert_eq!(err.to_string(), "no such table: users");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_storage_error_keeps_source() {
        let io = std::io::Error::other("disk I/O error");
        let err = StorageError::from_source(io);
        assert_eq!(err.message(), "disk I/O error");
        assert!(err.source().is_some());
    }
}
