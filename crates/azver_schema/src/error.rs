//! Error types for the schema module.

use thiserror::Error;

/// Result type alias for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while working with schemas.
///
/// These are programmer errors in the schema definition itself. Problems with
/// the validated data never surface here; they are reported through
/// [`crate::ValidationResult`] instead.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Invalid regex pattern '{pattern}' on property '{path}': {source}")]
    InvalidPattern {
        path: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Unknown custom validation rule '{name}' on property '{path}'")]
    UnknownCustomRule { path: String, name: String },
}
