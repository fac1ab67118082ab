//! Schema bundle loading from a directory.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use azver_core::ApiVersionManager;
use azver_schema::VersionConfig;

/// One schema bundle file: all registered versions of one resource type.
#[derive(Debug, Deserialize)]
pub struct SchemaBundle {
    pub resource_type: String,
    pub versions: Vec<VersionConfig>,
}

/// Load every bundle file under `dir` into a fresh registry.
///
/// Bundles are YAML or JSON files shaped as
/// `{ resource_type, versions: [{ version, support_level, schema }] }`.
/// Other file types in the tree are ignored.
pub fn load_registry(dir: &Path) -> Result<ApiVersionManager> {
    let manager = ApiVersionManager::new();
    let mut bundles = 0;

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };

        let bundle = match extension {
            "yaml" | "yml" => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_yaml::from_str::<SchemaBundle>(&content)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            "json" => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_str::<SchemaBundle>(&content)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            _ => continue,
        };

        debug!(path = %path.display(), resource_type = %bundle.resource_type, "loaded bundle");
        manager
            .register_resource_type(&bundle.resource_type, bundle.versions)
            .with_context(|| format!("registering {}", path.display()))?;
        bundles += 1;
    }

    if bundles == 0 {
        anyhow::bail!("no schema bundles found under {}", dir.display());
    }
    info!(bundles, "schema registry loaded");
    Ok(manager)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const BUNDLE_YAML: &str = r#"
resource_type: Test/widget
versions:
  - version: "2024-07-01"
    support_level: active
    schema:
      resource_type: Test/widget
      version: "2024-07-01"
      properties:
        size:
          type: number
          required: true
  - version: "2024-01-01"
    support_level: deprecated
    schema:
      resource_type: Test/widget
      version: "2024-01-01"
      properties:
        size:
          type: number
"#;

    #[test]
    fn test_load_yaml_bundle() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("widget.yaml"), BUNDLE_YAML).unwrap();

        let manager = load_registry(temp.path()).unwrap();

        assert_eq!(
            manager.list_versions("Test/widget").unwrap(),
            vec!["2024-01-01", "2024-07-01"]
        );
        assert_eq!(
            manager.resolve_version("Test/widget", None).unwrap(),
            "2024-07-01"
        );
        let schema = manager.get_schema("Test/widget", "2024-07-01").unwrap();
        assert!(schema.property("size").unwrap().required);
    }

    #[test]
    fn test_load_json_bundle() {
        let temp = tempdir().unwrap();
        let bundle = serde_json::json!({
            "resource_type": "Test/gadget",
            "versions": [{
                "version": "2024-05-01",
                "support_level": "active",
                "schema": {
                    "resource_type": "Test/gadget",
                    "version": "2024-05-01",
                    "properties": {
                        "mode": {"type": "string"}
                    }
                }
            }]
        });
        fs::write(
            temp.path().join("gadget.json"),
            serde_json::to_string_pretty(&bundle).unwrap(),
        )
        .unwrap();

        let manager = load_registry(temp.path()).unwrap();
        assert_eq!(manager.registered_resource_types(), vec!["Test/gadget"]);
    }

    #[test]
    fn test_empty_directory_fails() {
        let temp = tempdir().unwrap();
        assert!(load_registry(temp.path()).is_err());
    }

    #[test]
    fn test_non_bundle_files_are_ignored() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("widget.yaml"), BUNDLE_YAML).unwrap();
        fs::write(temp.path().join("README.md"), "# not a bundle").unwrap();

        let manager = load_registry(temp.path()).unwrap();
        assert_eq!(manager.registered_resource_types(), vec!["Test/widget"]);
    }
}
