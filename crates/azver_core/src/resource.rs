//! Version-aware resource construction pipeline.
//!
//! [`AzapiResource::create`] runs the linear pipeline once, synchronously:
//! resolve the API version through the registry, validate the property bag
//! against the resolved schema, build the canonical body, and hand it to the
//! resource-creation backend. Concrete resource kinds are plain values
//! implementing [`ResourceDefinition`]; no inheritance is involved.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use azver_schema::{
    build_body, ApiSchema, MigrationAnalysis, ResourceBody, SchemaValidator, ValidationResult,
    VersionConfig, VersionSupportLevel,
};

use crate::backend::{ResourceBackend, ResourceHandle, ResourceRequest, SUBSCRIPTION_SCOPE};
use crate::error::{CoreError, CoreResult};
use crate::registry::ApiVersionManager;

/// Description of a concrete resource kind.
///
/// One value per resource kind supplies the resource type string, the
/// preferred default version (pinned by the author, not necessarily the
/// registry's computed latest, so roll-outs can be staged), and optionally a
/// custom body-shaping hook.
pub trait ResourceDefinition {
    /// The resource type, e.g. `"Microsoft.Network/dnsResolvers"`.
    fn resource_type(&self) -> &str;

    /// The version used when the caller does not pin one explicitly.
    fn default_version(&self) -> &str;

    /// Shape the transport body from the merged property bag.
    ///
    /// The default delegates to the generic transformer; override it when a
    /// resource needs a body the schema-driven mapping cannot express.
    fn create_resource_body(&self, schema: &ApiSchema, props: &Value) -> CoreResult<ResourceBody> {
        Ok(build_body(schema, props))
    }

    /// Default location when neither the caller nor a parent supplies one.
    fn default_location(&self) -> Option<&str> {
        None
    }

    /// Whether construction must fail when no location can be resolved.
    fn requires_location(&self) -> bool {
        false
    }
}

/// How validation findings are treated during construction.
///
/// Validation is opt-in: resource kinds with intentionally incomplete
/// schemas construct fine with it disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Skip validation entirely.
    #[default]
    Disabled,
    /// Validate and attach the result for inspection; never fail.
    Lenient,
    /// Validate and fail construction on any error, listing every violated
    /// field.
    Strict,
}

/// Per-construction options.
#[derive(Default)]
pub struct ResourceOptions {
    pub api_version: Option<String>,
    pub validation: ValidationMode,
    pub analyze_migration: bool,
    pub ignore_changes: Vec<String>,
}

impl ResourceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin an explicit API version instead of the definition's default.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    pub fn with_validation(mut self, mode: ValidationMode) -> Self {
        self.validation = mode;
        self
    }

    /// Attach an advisory migration analysis against the registry's latest
    /// active version.
    pub fn with_migration_analysis(mut self) -> Self {
        self.analyze_migration = true;
        self
    }

    pub fn with_ignore_changes<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_changes = paths.into_iter().map(Into::into).collect();
        self
    }
}

/// Raw construction input for one resource instance.
pub struct ResourceProps {
    pub name: String,
    pub location: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub parent_id: Option<String>,
    pub properties: Value,
}

impl ResourceProps {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            tags: BTreeMap::new(),
            parent_id: None,
            properties: Value::Object(Map::new()),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn with_parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Replace the whole property bag.
    pub fn with_properties(mut self, properties: Value) -> Self {
        self.properties = properties;
        self
    }

    /// Set a single property in the bag.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.properties {
            map.insert(key.into(), value.into());
        }
        self
    }
}

/// A constructed resource with its resolved version metadata.
///
/// Built once by [`AzapiResource::create`]; the pipeline is linear and the
/// built state is terminal, so an instance is never re-resolved.
#[derive(Debug)]
pub struct AzapiResource {
    resource_type: String,
    pub name: String,
    pub location: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub resolved_api_version: String,
    pub version_config: VersionConfig,
    pub schema: ApiSchema,
    pub validation_result: Option<ValidationResult>,
    pub migration_analysis: Option<MigrationAnalysis>,
    request: ResourceRequest,
    handle: ResourceHandle,
}

impl AzapiResource {
    /// Run the construction pipeline for one resource instance.
    ///
    /// Fails hard on an unknown resource type and on an unknown or removed
    /// version; validation failures are hard only in
    /// [`ValidationMode::Strict`].
    pub fn create(
        manager: &ApiVersionManager,
        backend: &dyn ResourceBackend,
        definition: &dyn ResourceDefinition,
        props: ResourceProps,
        options: ResourceOptions,
    ) -> CoreResult<Self> {
        let resource_type = definition.resource_type().to_string();

        // Resolve: an explicit pin wins, else the definition's default is
        // resolved as a pin through the same existence checks.
        let requested = options
            .api_version
            .as_deref()
            .unwrap_or_else(|| definition.default_version());
        let resolved_api_version = manager.resolve_version(&resource_type, Some(requested))?;
        let schema = manager.get_schema(&resource_type, &resolved_api_version)?;
        let version_config = manager.get_version_config(&resource_type, &resolved_api_version)?;
        debug!(
            %resource_type,
            version = %resolved_api_version,
            "resolved API version"
        );

        if version_config.support_level == VersionSupportLevel::Deprecated {
            let latest = manager.latest_version(&resource_type);
            warn!(
                %resource_type,
                version = %resolved_api_version,
                latest = latest.as_deref().unwrap_or("none"),
                "API version is deprecated, consider upgrading"
            );
        }

        let location = resolve_location(definition, &props)?;
        let bag = merge_property_bag(&props, location.as_deref());

        // Validate: findings stay attached as data unless strict mode
        // escalates them.
        let validation_result = match options.validation {
            ValidationMode::Disabled => None,
            ValidationMode::Lenient | ValidationMode::Strict => {
                let result = SchemaValidator::new().validate(&schema, &bag)?;
                for warning in &result.warnings {
                    warn!(%resource_type, "{warning}");
                }
                if options.validation == ValidationMode::Strict && !result.valid {
                    return Err(CoreError::ValidationFailed {
                        resource_type,
                        details: result.format_errors().join("\n"),
                    });
                }
                Some(result)
            }
        };

        let mut body = definition.create_resource_body(&schema, &bag)?;

        // Child resource types (more than two path segments) inherit their
        // location from the parent and must not specify one.
        if is_child_resource(&resource_type) {
            body.location = None;
        } else if body.location.is_none() {
            body.location = location.clone();
        }
        if body.tags.is_none() && !props.tags.is_empty() {
            body.tags = Some(props.tags.clone());
        }

        let request = ResourceRequest {
            resource_type: resource_type.clone(),
            api_version: resolved_api_version.clone(),
            name: props.name.clone(),
            parent_id: props
                .parent_id
                .clone()
                .unwrap_or_else(|| SUBSCRIPTION_SCOPE.to_string()),
            body,
            ignore_changes: options.ignore_changes.clone(),
        };
        let handle = backend.create_resource(&request)?;
        info!(
            %resource_type,
            name = %props.name,
            version = %resolved_api_version,
            "created resource"
        );

        // Advisory only: a failed analysis never fails construction.
        let migration_analysis = if options.analyze_migration {
            analyze_against_latest(manager, &resource_type, &resolved_api_version)
        } else {
            None
        };

        Ok(Self {
            resource_type,
            name: props.name,
            location,
            tags: props.tags,
            resolved_api_version,
            version_config,
            schema,
            validation_result,
            migration_analysis,
            request,
            handle,
        })
    }

    /// The resource type this instance was constructed as.
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Reference to the created resource's id.
    pub fn id(&self) -> &str {
        &self.handle.id
    }

    /// Handle returned by the backend.
    pub fn handle(&self) -> &ResourceHandle {
        &self.handle
    }

    /// The request handed to the backend.
    pub fn request(&self) -> &ResourceRequest {
        &self.request
    }

    /// The registry's current latest active version for this resource type.
    pub fn latest_version(&self, manager: &ApiVersionManager) -> Option<String> {
        manager.latest_version(&self.resource_type)
    }

    /// All registered versions for this resource type, chronological
    /// ascending.
    pub fn supported_versions(&self, manager: &ApiVersionManager) -> CoreResult<Vec<String>> {
        manager.list_versions(&self.resource_type)
    }

    /// Diff the resolved version against a target version.
    pub fn analyze_migration_to(
        &self,
        manager: &ApiVersionManager,
        target: &str,
    ) -> CoreResult<MigrationAnalysis> {
        manager.analyze_migration(&self.resource_type, &self.resolved_api_version, target)
    }
}

fn resolve_location(
    definition: &dyn ResourceDefinition,
    props: &ResourceProps,
) -> CoreResult<Option<String>> {
    if let Some(location) = &props.location {
        return Ok(Some(location.clone()));
    }
    if let Some(location) = definition.default_location() {
        return Ok(Some(location.to_string()));
    }
    if definition.requires_location() {
        return Err(CoreError::MissingLocation(
            definition.resource_type().to_string(),
        ));
    }
    Ok(None)
}

/// Merge envelope fields into the property bag so validation sees the same
/// view the transformer consumes.
fn merge_property_bag(props: &ResourceProps, location: Option<&str>) -> Value {
    let mut bag = match &props.properties {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    bag.insert("name".to_string(), Value::String(props.name.clone()));
    if let Some(location) = location {
        bag.entry("location".to_string())
            .or_insert_with(|| Value::String(location.to_string()));
    }
    if !props.tags.is_empty() && !bag.contains_key("tags") {
        bag.insert(
            "tags".to_string(),
            Value::Object(
                props
                    .tags
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect(),
            ),
        );
    }
    Value::Object(bag)
}

fn is_child_resource(resource_type: &str) -> bool {
    resource_type.split('/').count() > 2
}

fn analyze_against_latest(
    manager: &ApiVersionManager,
    resource_type: &str,
    resolved: &str,
) -> Option<MigrationAnalysis> {
    let versions = manager.list_versions(resource_type).ok()?;
    if versions.len() < 2 {
        return None;
    }
    let latest = manager.latest_version(resource_type)?;
    let analysis = manager.analyze_migration(resource_type, resolved, &latest).ok()?;
    if !analysis.compatible {
        warn!(
            %resource_type,
            from = %analysis.from_version,
            to = %analysis.to_version,
            "migration to latest version has breaking changes"
        );
    }
    Some(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::RecordingBackend;
    use azver_schema::PropertyDefinition;
    use serde_json::json;

    const WIDGET: &str = "Test/widget";

    struct Widget;

    impl ResourceDefinition for Widget {
        fn resource_type(&self) -> &str {
            WIDGET
        }

        fn default_version(&self) -> &str {
            "2024-07-01"
        }
    }

    fn widget_schema(version: &str) -> ApiSchema {
        ApiSchema::new(WIDGET, version)
            .with_property("size", PropertyDefinition::number().required())
    }

    fn widget_registry() -> ApiVersionManager {
        let manager = ApiVersionManager::new();
        manager
            .register_resource_type(
                WIDGET,
                vec![VersionConfig::active("2024-07-01", widget_schema("2024-07-01"))],
            )
            .unwrap();
        manager
    }

    #[test]
    fn test_end_to_end_valid_widget() {
        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1").with_property("size", 10),
            ResourceOptions::new().with_validation(ValidationMode::Strict),
        )
        .unwrap();

        assert_eq!(resource.resolved_api_version, "2024-07-01");
        assert!(resource.validation_result.as_ref().unwrap().valid);
        assert_eq!(resource.request().body.properties["size"], json!(10));
        assert_eq!(backend.requests().len(), 1);
    }

    #[test]
    fn test_end_to_end_missing_required_property() {
        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let err = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1"),
            ResourceOptions::new().with_validation(ValidationMode::Strict),
        )
        .unwrap_err();

        match err {
            CoreError::ValidationFailed { details, .. } => {
                assert!(details.contains("[size]"), "details: {details}");
            }
            other => panic!("expected ValidationFailed, got {other:?}"),
        }
        // Nothing reached the backend.
        assert!(backend.requests().is_empty());
    }

    #[test]
    fn test_lenient_mode_attaches_result_and_builds() {
        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1"),
            ResourceOptions::new().with_validation(ValidationMode::Lenient),
        )
        .unwrap();

        let result = resource.validation_result.as_ref().unwrap();
        assert!(!result.valid);
        assert_eq!(result.errors[0].path, "size");
        assert_eq!(backend.requests().len(), 1);
    }

    #[test]
    fn test_validation_disabled_by_default() {
        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1"),
            ResourceOptions::new(),
        )
        .unwrap();

        assert!(resource.validation_result.is_none());
    }

    #[test]
    fn test_unknown_pin_fails_construction() {
        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let err = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1"),
            ResourceOptions::new().with_api_version("1999-01-01"),
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::UnsupportedVersion { .. }));
    }

    #[test]
    fn test_unregistered_resource_type_fails_construction() {
        let manager = ApiVersionManager::new();
        let backend = RecordingBackend::new();

        let err = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1"),
            ResourceOptions::new(),
        )
        .unwrap_err();

        assert!(matches!(err, CoreError::UnknownResourceType(_)));
    }

    #[test]
    fn test_envelope_fields_reach_the_request() {
        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1")
                .with_location("westeurope")
                .with_tag("env", "dev")
                .with_parent_id("/subscriptions/s/resourceGroups/rg")
                .with_property("size", 10),
            ResourceOptions::new(),
        )
        .unwrap();

        let request = resource.request();
        assert_eq!(request.parent_id, "/subscriptions/s/resourceGroups/rg");
        assert_eq!(request.body.location.as_deref(), Some("westeurope"));
        assert_eq!(request.body.tags.as_ref().unwrap()["env"], "dev");
        assert!(!request.body.properties.contains_key("name"));
    }

    #[test]
    fn test_default_parent_is_subscription_scope() {
        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1").with_property("size", 1),
            ResourceOptions::new(),
        )
        .unwrap();

        assert_eq!(resource.request().parent_id, SUBSCRIPTION_SCOPE);
    }

    #[test]
    fn test_child_resource_has_no_location() {
        struct Subnet;
        impl ResourceDefinition for Subnet {
            fn resource_type(&self) -> &str {
                "Microsoft.Network/virtualNetworks/subnets"
            }
            fn default_version(&self) -> &str {
                "2024-05-01"
            }
        }

        let manager = ApiVersionManager::new();
        manager
            .register_resource_type(
                "Microsoft.Network/virtualNetworks/subnets",
                vec![VersionConfig::active(
                    "2024-05-01",
                    ApiSchema::new("Microsoft.Network/virtualNetworks/subnets", "2024-05-01")
                        .with_property("addressPrefix", PropertyDefinition::string().required()),
                )],
            )
            .unwrap();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Subnet,
            ResourceProps::new("subnet-1")
                .with_location("westeurope")
                .with_property("addressPrefix", "10.0.0.0/24"),
            ResourceOptions::new(),
        )
        .unwrap();

        assert_eq!(resource.request().body.location, None);
    }

    #[test]
    fn test_required_location() {
        struct Located;
        impl ResourceDefinition for Located {
            fn resource_type(&self) -> &str {
                WIDGET
            }
            fn default_version(&self) -> &str {
                "2024-07-01"
            }
            fn requires_location(&self) -> bool {
                true
            }
        }

        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let err = AzapiResource::create(
            &manager,
            &backend,
            &Located,
            ResourceProps::new("widget-1").with_property("size", 1),
            ResourceOptions::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::MissingLocation(_)));

        // A definition-level default satisfies the requirement.
        struct LocatedWithDefault;
        impl ResourceDefinition for LocatedWithDefault {
            fn resource_type(&self) -> &str {
                WIDGET
            }
            fn default_version(&self) -> &str {
                "2024-07-01"
            }
            fn default_location(&self) -> Option<&str> {
                Some("global")
            }
            fn requires_location(&self) -> bool {
                true
            }
        }

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &LocatedWithDefault,
            ResourceProps::new("widget-1").with_property("size", 1),
            ResourceOptions::new(),
        )
        .unwrap();
        assert_eq!(resource.location.as_deref(), Some("global"));
    }

    #[test]
    fn test_migration_analysis_attached_when_opted_in() {
        let manager = widget_registry();
        manager
            .register_resource_type(
                WIDGET,
                vec![VersionConfig::active(
                    "2024-10-01",
                    widget_schema("2024-10-01")
                        .with_property("color", PropertyDefinition::string()),
                )],
            )
            .unwrap();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1").with_property("size", 1),
            ResourceOptions::new().with_migration_analysis(),
        )
        .unwrap();

        let analysis = resource.migration_analysis.as_ref().unwrap();
        assert_eq!(analysis.from_version, "2024-07-01");
        assert_eq!(analysis.to_version, "2024-10-01");
        assert!(analysis.compatible);
        assert_eq!(analysis.added_properties, vec!["color"]);
    }

    #[test]
    fn test_migration_analysis_skipped_with_single_version() {
        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1").with_property("size", 1),
            ResourceOptions::new().with_migration_analysis(),
        )
        .unwrap();

        assert!(resource.migration_analysis.is_none());
    }

    #[test]
    fn test_custom_body_hook() {
        struct Wrapped;
        impl ResourceDefinition for Wrapped {
            fn resource_type(&self) -> &str {
                WIDGET
            }
            fn default_version(&self) -> &str {
                "2024-07-01"
            }
            fn create_resource_body(
                &self,
                schema: &ApiSchema,
                props: &Value,
            ) -> CoreResult<ResourceBody> {
                let mut body = build_body(schema, props);
                body.properties
                    .insert("managed".to_string(), Value::Bool(true));
                Ok(body)
            }
        }

        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Wrapped,
            ResourceProps::new("widget-1").with_property("size", 1),
            ResourceOptions::new(),
        )
        .unwrap();

        assert_eq!(resource.request().body.properties["managed"], json!(true));
    }

    #[test]
    fn test_ignore_changes_forwarded() {
        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1").with_property("size", 1),
            ResourceOptions::new().with_ignore_changes(["tags"]),
        )
        .unwrap();

        assert_eq!(resource.request().ignore_changes, vec!["tags"]);
    }

    #[test]
    fn test_introspection_helpers() {
        let manager = widget_registry();
        let backend = RecordingBackend::new();

        let resource = AzapiResource::create(
            &manager,
            &backend,
            &Widget,
            ResourceProps::new("widget-1").with_property("size", 1),
            ResourceOptions::new(),
        )
        .unwrap();

        assert_eq!(resource.latest_version(&manager).unwrap(), "2024-07-01");
        assert_eq!(resource.supported_versions(&manager).unwrap(), vec!["2024-07-01"]);
        let analysis = resource.analyze_migration_to(&manager, "2024-07-01").unwrap();
        assert!(analysis.compatible);
        assert_eq!(resource.id(), "recorded-1");
    }
}
