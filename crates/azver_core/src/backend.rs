//! Resource-creation backends.
//!
//! The framework itself never talks to any cloud API; it hands a finished
//! [`ResourceRequest`] to a [`ResourceBackend`] and stores the returned
//! handle. [`TerraformBackend`] synthesizes Terraform JSON for the AZAPI
//! provider; [`RecordingBackend`] is a test double that records requests.

use std::sync::Mutex;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use azver_schema::ResourceBody;

use crate::error::CoreResult;

/// Parent scope used when a resource does not name an explicit parent:
/// the current subscription, resolved by the provider at apply time.
pub const SUBSCRIPTION_SCOPE: &str =
    "/subscriptions/${data.azapi_client_config.current.subscription_id}";

/// Everything a backend needs to materialize one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceRequest {
    pub resource_type: String,
    pub api_version: String,
    pub name: String,
    pub parent_id: String,
    pub body: ResourceBody,
    pub ignore_changes: Vec<String>,
}

impl ResourceRequest {
    /// The provider type string, `<resourceType>@<apiVersion>`.
    pub fn type_tag(&self) -> String {
        format!("{}@{}", self.resource_type, self.api_version)
    }
}

/// Opaque handle to a created resource representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceHandle {
    /// Reference to the remote resource id, e.g.
    /// `${azapi_resource.my_vault.id}`.
    pub id: String,
    /// Address of the resource inside the backend, e.g.
    /// `azapi_resource.my_vault`.
    pub address: String,
}

/// The out-of-process collaborator that turns requests into resources.
pub trait ResourceBackend {
    fn create_resource(&self, request: &ResourceRequest) -> CoreResult<ResourceHandle>;
}

/// Backend that accumulates requests and synthesizes a Terraform JSON
/// document with one `azapi_resource` block per request.
#[derive(Default)]
pub struct TerraformBackend {
    resources: Mutex<Vec<(String, ResourceRequest)>>,
}

impl TerraformBackend {
    pub fn new() -> Self {
        Self {
            resources: Mutex::new(Vec::new()),
        }
    }

    /// Render everything created so far as a Terraform JSON document.
    pub fn synthesize(&self) -> Value {
        let resources = self.resources.lock().expect("backend lock poisoned");

        let mut blocks = Map::new();
        let mut needs_client_config = false;
        for (label, request) in resources.iter() {
            if request.parent_id == SUBSCRIPTION_SCOPE {
                needs_client_config = true;
            }
            blocks.insert(label.clone(), render_resource(request));
        }

        let mut document = Map::new();
        if needs_client_config {
            document.insert(
                "data".to_string(),
                json!({"azapi_client_config": {"current": {}}}),
            );
        }
        document.insert(
            "resource".to_string(),
            json!({ "azapi_resource": Value::Object(blocks) }),
        );
        Value::Object(document)
    }

    fn reserve_label(&self, name: &str, request: ResourceRequest) -> String {
        let mut resources = self.resources.lock().expect("backend lock poisoned");
        let base = sanitize_label(name);
        let mut label = base.clone();
        let mut suffix = 2;
        while resources.iter().any(|(existing, _)| *existing == label) {
            label = format!("{base}_{suffix}");
            suffix += 1;
        }
        resources.push((label.clone(), request));
        label
    }
}

impl ResourceBackend for TerraformBackend {
    fn create_resource(&self, request: &ResourceRequest) -> CoreResult<ResourceHandle> {
        let label = self.reserve_label(&request.name, request.clone());
        debug!(%label, resource = %request.type_tag(), "synthesized azapi_resource block");
        Ok(ResourceHandle {
            id: format!("${{azapi_resource.{label}.id}}"),
            address: format!("azapi_resource.{label}"),
        })
    }
}

fn render_resource(request: &ResourceRequest) -> Value {
    let mut block = Map::new();
    block.insert("type".to_string(), json!(request.type_tag()));
    block.insert("name".to_string(), json!(request.name));
    block.insert("parent_id".to_string(), json!(request.parent_id));
    if let Some(location) = &request.body.location {
        block.insert("location".to_string(), json!(location));
    }
    if let Some(tags) = &request.body.tags {
        if !tags.is_empty() {
            block.insert("tags".to_string(), json!(tags));
        }
    }
    block.insert(
        "body".to_string(),
        json!({ "properties": Value::Object(request.body.properties.clone()) }),
    );
    if !request.ignore_changes.is_empty() {
        block.insert(
            "lifecycle".to_string(),
            json!({ "ignore_changes": request.ignore_changes }),
        );
    }
    Value::Object(block)
}

/// Terraform labels allow word characters and dashes; everything else
/// collapses to underscores.
fn sanitize_label(name: &str) -> String {
    let label: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    if label.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        format!("_{label}")
    } else if label.is_empty() {
        "resource".to_string()
    } else {
        label
    }
}

/// Test double that records every request and returns synthetic handles.
#[derive(Default)]
pub struct RecordingBackend {
    requests: Mutex<Vec<ResourceRequest>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
        }
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<ResourceRequest> {
        self.requests.lock().expect("backend lock poisoned").clone()
    }
}

impl ResourceBackend for RecordingBackend {
    fn create_resource(&self, request: &ResourceRequest) -> CoreResult<ResourceHandle> {
        let mut requests = self.requests.lock().expect("backend lock poisoned");
        requests.push(request.clone());
        let ordinal = requests.len();
        Ok(ResourceHandle {
            id: format!("recorded-{ordinal}"),
            address: format!("recorded.{ordinal}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn request(name: &str) -> ResourceRequest {
        let mut properties = Map::new();
        properties.insert("size".to_string(), json!(10));
        ResourceRequest {
            resource_type: "Test/widget".to_string(),
            api_version: "2024-07-01".to_string(),
            name: name.to_string(),
            parent_id: SUBSCRIPTION_SCOPE.to_string(),
            body: ResourceBody {
                location: Some("westeurope".to_string()),
                tags: Some(BTreeMap::from([("env".to_string(), "dev".to_string())])),
                properties,
            },
            ignore_changes: vec![],
        }
    }

    #[test]
    fn test_terraform_synthesis_shape() {
        let backend = TerraformBackend::new();
        let handle = backend.create_resource(&request("widget-1")).unwrap();

        assert_eq!(handle.id, "${azapi_resource.widget-1.id}");

        let document = backend.synthesize();
        let block = &document["resource"]["azapi_resource"]["widget-1"];
        assert_eq!(block["type"], json!("Test/widget@2024-07-01"));
        assert_eq!(block["name"], json!("widget-1"));
        assert_eq!(block["location"], json!("westeurope"));
        assert_eq!(block["tags"]["env"], json!("dev"));
        assert_eq!(block["body"]["properties"]["size"], json!(10));
        // Default parent pulls in the client-config data source.
        assert_eq!(document["data"]["azapi_client_config"]["current"], json!({}));
    }

    #[test]
    fn test_duplicate_names_get_unique_labels() {
        let backend = TerraformBackend::new();
        let first = backend.create_resource(&request("widget")).unwrap();
        let second = backend.create_resource(&request("widget")).unwrap();

        assert_ne!(first.address, second.address);
        assert_eq!(second.address, "azapi_resource.widget_2");
    }

    #[test]
    fn test_label_sanitization() {
        assert_eq!(sanitize_label("my widget.v2"), "my_widget_v2");
        assert_eq!(sanitize_label("0widget"), "_0widget");
        assert_eq!(sanitize_label(""), "resource");
    }

    #[test]
    fn test_explicit_parent_skips_client_config() {
        let backend = TerraformBackend::new();
        let mut req = request("widget-1");
        req.parent_id = "/subscriptions/s/resourceGroups/rg".to_string();
        backend.create_resource(&req).unwrap();

        let document = backend.synthesize();
        assert!(document.get("data").is_none());
    }

    #[test]
    fn test_ignore_changes_lifecycle_block() {
        let backend = TerraformBackend::new();
        let mut req = request("widget-1");
        req.ignore_changes = vec!["tags".to_string()];
        backend.create_resource(&req).unwrap();

        let document = backend.synthesize();
        let block = &document["resource"]["azapi_resource"]["widget-1"];
        assert_eq!(block["lifecycle"]["ignore_changes"], json!(["tags"]));
    }

    #[test]
    fn test_recording_backend() {
        let backend = RecordingBackend::new();
        backend.create_resource(&request("a")).unwrap();
        backend.create_resource(&request("b")).unwrap();

        let recorded = backend.requests();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[1].name, "b");
    }
}
