//! Error types for the core module.

use thiserror::Error;

/// Result type alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur during version resolution and resource creation.
///
/// Registry and resolution failures are hard errors that propagate to the
/// constructing code immediately. Validation findings travel as data in a
/// [`azver_schema::ValidationResult`]; only strict mode turns them into
/// [`CoreError::ValidationFailed`].
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Unknown API version '{version}' for resource type '{resource_type}'")]
    UnknownVersion {
        resource_type: String,
        version: String,
    },

    #[error("Unsupported API version '{version}' for resource type '{resource_type}': {reason}")]
    UnsupportedVersion {
        resource_type: String,
        version: String,
        reason: String,
    },

    #[error("No active API version registered for resource type '{0}'")]
    NoActiveVersion(String),

    #[error(
        "Invalid version identifier '{version}' for resource type '{resource_type}': \
         expected YYYY-MM-DD with an optional -preview suffix"
    )]
    InvalidVersionFormat {
        resource_type: String,
        version: String,
    },

    #[error("Invalid registration for resource type '{resource_type}': {message}")]
    InvalidRegistration {
        resource_type: String,
        message: String,
    },

    #[error("Location is required for resource type '{0}' but was not provided")]
    MissingLocation(String),

    #[error("Property validation failed for {resource_type}:\n{details}")]
    ValidationFailed {
        resource_type: String,
        details: String,
    },

    #[error("Schema error: {0}")]
    Schema(#[from] azver_schema::SchemaError),

    #[error("Backend error: {0}")]
    Backend(String),
}
