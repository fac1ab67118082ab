//! # azver_schema
//!
//! Schema model, validation and migration analysis for versioned Azure
//! resource APIs.
//!
//! A resource type can carry one schema per supported cloud-API version.
//! This crate defines the passive schema data model and the pure operations
//! over it:
//!
//! - **Model**: [`ApiSchema`], [`PropertyDefinition`], [`PropertyType`],
//!   [`ValidationRule`], [`VersionConfig`], [`VersionSupportLevel`]
//! - **Validation**: walk a property bag against a schema, accumulating
//!   field-level errors instead of failing fast
//! - **Transformation**: map a flat property bag into the canonical
//!   `{location, tags, properties}` body shape
//! - **Migration analysis**: diff two schemas and classify changes as
//!   breaking or advisory
//!
//! Version registration and resolution live in `azver_core`; this crate has
//! no registry state of its own.
//!
//! ## Example
//!
//! ```rust
//! use azver_schema::{validate, ApiSchema, PropertyDefinition};
//! use serde_json::json;
//!
//! let schema = ApiSchema::new("Test/widget", "2024-01-01")
//!     .with_property("size", PropertyDefinition::number().required());
//!
//! let result = validate(&schema, &json!({})).unwrap();
//! assert!(!result.valid);
//! assert_eq!(result.errors[0].path, "size");
//! ```

pub mod error;
pub mod migrate;
pub mod model;
pub mod transform;
pub mod validator;

pub use error::{SchemaError, SchemaResult};
pub use migrate::{analyze_schemas, MigrationAnalysis, PropertyChange, PropertyChangeKind};
pub use model::{
    ApiSchema, PropertyDefinition, PropertyType, RuleKind, ValidationRule, VersionConfig,
    VersionSupportLevel,
};
pub use transform::{build_body, ResourceBody};
pub use validator::{validate, SchemaValidator, ValidationError, ValidationResult};
