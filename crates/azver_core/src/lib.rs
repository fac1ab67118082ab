//! # azver_core
//!
//! Version registry and resource construction pipeline for azver.
//!
//! This crate turns the passive schema model from `azver_schema` into a
//! working framework:
//!
//! - **Registry**: [`ApiVersionManager`] holds the registered versions per
//!   resource type and resolves explicit pins or the latest active version
//! - **Pipeline**: [`AzapiResource::create`] resolves, validates, transforms
//!   and hands the finished request to a backend, in one synchronous pass
//! - **Backends**: [`TerraformBackend`] synthesizes Terraform JSON for the
//!   AZAPI provider; [`RecordingBackend`] supports tests
//!
//! The registry is an explicit, constructed instance passed by reference
//! into every resource-construction call; tests build a fresh one instead of
//! resetting shared state.
//!
//! ## Example
//!
//! ```rust
//! use azver_core::{
//!     ApiVersionManager, AzapiResource, ResourceDefinition, ResourceOptions,
//!     ResourceProps, TerraformBackend, ValidationMode,
//! };
//! use azver_schema::{ApiSchema, PropertyDefinition, VersionConfig};
//!
//! struct Widget;
//!
//! impl ResourceDefinition for Widget {
//!     fn resource_type(&self) -> &str {
//!         "Test/widget"
//!     }
//!     fn default_version(&self) -> &str {
//!         "2024-07-01"
//!     }
//! }
//!
//! let manager = ApiVersionManager::new();
//! manager
//!     .register_resource_type(
//!         "Test/widget",
//!         vec![VersionConfig::active(
//!             "2024-07-01",
//!             ApiSchema::new("Test/widget", "2024-07-01")
//!                 .with_property("size", PropertyDefinition::number().required()),
//!         )],
//!     )
//!     .unwrap();
//!
//! let backend = TerraformBackend::new();
//! let resource = AzapiResource::create(
//!     &manager,
//!     &backend,
//!     &Widget,
//!     ResourceProps::new("widget-1").with_property("size", 10),
//!     ResourceOptions::new().with_validation(ValidationMode::Strict),
//! )
//! .unwrap();
//!
//! assert_eq!(resource.resolved_api_version, "2024-07-01");
//! ```

pub mod backend;
pub mod error;
pub mod registry;
pub mod resource;

pub use backend::{
    RecordingBackend, ResourceBackend, ResourceHandle, ResourceRequest, TerraformBackend,
    SUBSCRIPTION_SCOPE,
};
pub use error::{CoreError, CoreResult};
pub use registry::ApiVersionManager;
pub use resource::{
    AzapiResource, ResourceDefinition, ResourceOptions, ResourceProps, ValidationMode,
};
