//! Error types for the friendly-errors crate.
//!
//! Resolution, normalization and envelope building never fail: every lookup
//! degrades to a fallback code. The errors here are raised only while
//! *defining* things: building a schema, loading configuration, or
//! extending the code tables.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FriendlyErrorsError>;

/// The main error type for friendly-errors operations.
#[derive(Debug, Error)]
pub enum FriendlyErrorsError {
    /// A schema definition was rejected.
    #[error("{0}")]
    Schema(#[from] SchemaError),

    /// A code table entry or setting was rejected.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FriendlyErrorsError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Error raised when a schema definition is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The schema has no name.
    #[error("Schema name cannot be empty or whitespace-only")]
    EmptyName,

    /// A field was declared without a name.
    #[error("Schema '{schema}' declares a field with an empty name")]
    EmptyFieldName {
        /// The schema being built.
        schema: String,
    },

    /// A field was declared without a type identifier.
    #[error("Field '{field}' in schema '{schema}' has no type")]
    EmptyFieldType {
        /// The schema being built.
        schema: String,
        /// The offending field.
        field: String,
    },

    /// The same field name was declared twice.
    #[error("Field '{field}' is declared more than once in schema '{schema}'")]
    DuplicateField {
        /// The schema being built.
        schema: String,
        /// The duplicated field.
        field: String,
    },

    /// An override key or code was empty.
    #[error("Schema '{schema}' has an empty override entry for '{key}'")]
    EmptyOverride {
        /// The schema being built.
        schema: String,
        /// The key of the offending entry.
        key: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display() {
        let err = SchemaError::DuplicateField {
            schema: "snippet".to_string(),
            field: "title".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Field 'title' is declared more than once in schema 'snippet'"
        );
    }

    #[test]
    fn test_schema_error_converts() {
        let err: FriendlyErrorsError = SchemaError::EmptyName.into();
        assert!(matches!(err, FriendlyErrorsError::Schema(SchemaError::EmptyName)));
    }

    #[test]
    fn test_serde_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: FriendlyErrorsError = parse.into();
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_config_error_display() {
        let err = FriendlyErrorsError::config("empty field type");
        assert_eq!(err.to_string(), "Configuration error: empty field type");
    }
}
