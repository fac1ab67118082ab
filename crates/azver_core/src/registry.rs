//! Version registry for resource-type schemas.

use std::collections::{BTreeMap, HashMap};
use std::sync::{OnceLock, RwLock};

use chrono::NaiveDate;
use regex::Regex;
use tracing::debug;

use azver_schema::{analyze_schemas, ApiSchema, MigrationAnalysis, VersionConfig, VersionSupportLevel};

use crate::error::{CoreError, CoreResult};

/// Version identifiers are date-coded, so their lexicographic order is their
/// chronological order. The format is enforced at registration because the
/// "latest" tie-break silently misorders anything else.
fn version_format() -> &'static Regex {
    static FORMAT: OnceLock<Regex> = OnceLock::new();
    FORMAT.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}(-preview)?$").expect("valid regex"))
}

#[derive(Default)]
struct ResourceTypeEntry {
    // BTreeMap keyed by version string: iteration order is chronological.
    versions: BTreeMap<String, VersionConfig>,
}

/// Registry of API versions per resource type.
///
/// One registry serves a whole synthesis run; construct it once and pass it
/// by reference into every resource-construction call (wrap in `Arc` to share
/// across threads). Registration is append-only and idempotent per
/// `(resource type, version)` pair, so any number of resource modules can
/// register the same versions without coordination.
#[derive(Default)]
pub struct ApiVersionManager {
    registry: RwLock<HashMap<String, ResourceTypeEntry>>,
}

impl ApiVersionManager {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
        }
    }

    /// Register all versions for a resource type.
    ///
    /// The list must be non-empty and free of duplicate version strings.
    /// A `(resource type, version)` pair that is already registered is
    /// skipped silently, never replaced.
    pub fn register_resource_type(
        &self,
        resource_type: &str,
        versions: Vec<VersionConfig>,
    ) -> CoreResult<()> {
        if resource_type.trim().is_empty() {
            return Err(CoreError::InvalidRegistration {
                resource_type: resource_type.to_string(),
                message: "resource type cannot be empty".to_string(),
            });
        }
        if versions.is_empty() {
            return Err(CoreError::InvalidRegistration {
                resource_type: resource_type.to_string(),
                message: "at least one version must be supplied".to_string(),
            });
        }

        let mut seen = Vec::new();
        for config in &versions {
            validate_version_config(resource_type, config)?;
            if seen.contains(&config.version.as_str()) {
                return Err(CoreError::InvalidRegistration {
                    resource_type: resource_type.to_string(),
                    message: format!("duplicate version '{}' in registration", config.version),
                });
            }
            seen.push(config.version.as_str());
        }

        let mut registry = self.registry.write().expect("registry lock poisoned");
        let entry = registry.entry(resource_type.to_string()).or_default();
        for config in versions {
            if entry.versions.contains_key(&config.version) {
                debug!(
                    resource_type,
                    version = %config.version,
                    "version already registered, skipping"
                );
                continue;
            }
            debug!(resource_type, version = %config.version, "registering version");
            entry.versions.insert(config.version.clone(), config);
        }
        Ok(())
    }

    /// Resolve an optional explicit version request to a registered version.
    ///
    /// An explicit request must exist and must not be `Removed`. With no
    /// request, the chronologically greatest `Active` version wins.
    pub fn resolve_version(
        &self,
        resource_type: &str,
        requested: Option<&str>,
    ) -> CoreResult<String> {
        let registry = self.registry.read().expect("registry lock poisoned");
        let entry = registry
            .get(resource_type)
            .ok_or_else(|| CoreError::UnknownResourceType(resource_type.to_string()))?;

        match requested {
            Some(version) => {
                let config = entry.versions.get(version).ok_or_else(|| {
                    CoreError::UnsupportedVersion {
                        resource_type: resource_type.to_string(),
                        version: version.to_string(),
                        reason: format!(
                            "not registered (supported: {})",
                            render_versions(&entry.versions)
                        ),
                    }
                })?;
                if config.support_level == VersionSupportLevel::Removed {
                    return Err(CoreError::UnsupportedVersion {
                        resource_type: resource_type.to_string(),
                        version: version.to_string(),
                        reason: "version has been removed".to_string(),
                    });
                }
                Ok(version.to_string())
            }
            None => entry
                .versions
                .iter()
                .rev()
                .find(|(_, config)| config.support_level == VersionSupportLevel::Active)
                .map(|(version, _)| version.clone())
                .ok_or_else(|| CoreError::NoActiveVersion(resource_type.to_string())),
        }
    }

    /// Get the schema for a specific version.
    pub fn get_schema(&self, resource_type: &str, version: &str) -> CoreResult<ApiSchema> {
        Ok(self.get_version_config(resource_type, version)?.schema)
    }

    /// Get the full version configuration for a specific version.
    pub fn get_version_config(
        &self,
        resource_type: &str,
        version: &str,
    ) -> CoreResult<VersionConfig> {
        let registry = self.registry.read().expect("registry lock poisoned");
        let entry = registry
            .get(resource_type)
            .ok_or_else(|| CoreError::UnknownResourceType(resource_type.to_string()))?;
        entry
            .versions
            .get(version)
            .cloned()
            .ok_or_else(|| CoreError::UnknownVersion {
                resource_type: resource_type.to_string(),
                version: version.to_string(),
            })
    }

    /// All registered versions for a resource type, chronological ascending.
    pub fn list_versions(&self, resource_type: &str) -> CoreResult<Vec<String>> {
        let registry = self.registry.read().expect("registry lock poisoned");
        let entry = registry
            .get(resource_type)
            .ok_or_else(|| CoreError::UnknownResourceType(resource_type.to_string()))?;
        Ok(entry.versions.keys().cloned().collect())
    }

    /// The chronologically greatest `Active` version, if any.
    pub fn latest_version(&self, resource_type: &str) -> Option<String> {
        let registry = self.registry.read().expect("registry lock poisoned");
        registry.get(resource_type).and_then(|entry| {
            entry
                .versions
                .iter()
                .rev()
                .find(|(_, config)| config.support_level == VersionSupportLevel::Active)
                .map(|(version, _)| version.clone())
        })
    }

    /// All resource types with at least one registered version.
    pub fn registered_resource_types(&self) -> Vec<String> {
        let registry = self.registry.read().expect("registry lock poisoned");
        let mut types: Vec<String> = registry.keys().cloned().collect();
        types.sort();
        types
    }

    /// Diff two registered versions of a resource type.
    ///
    /// Purely advisory: the analysis reports compatibility and warnings but
    /// never blocks anything. `from == to` short-circuits to the trivial
    /// compatible analysis after the existence checks.
    pub fn analyze_migration(
        &self,
        resource_type: &str,
        from: &str,
        to: &str,
    ) -> CoreResult<MigrationAnalysis> {
        let from_config = self.get_version_config(resource_type, from)?;
        let to_config = self.get_version_config(resource_type, to)?;

        if from == to {
            return Ok(MigrationAnalysis::unchanged(from));
        }

        let mut analysis = analyze_schemas(&from_config.schema, &to_config.schema);

        let mut advisories = Vec::new();
        if from_config.support_level == VersionSupportLevel::Deprecated {
            advisories.push(format!("source version '{from}' is deprecated"));
        }
        match to_config.support_level {
            VersionSupportLevel::Deprecated => {
                advisories.push(format!("target version '{to}' is deprecated"));
            }
            VersionSupportLevel::Removed => {
                advisories.push(format!("target version '{to}' has been removed"));
            }
            VersionSupportLevel::Preview => {
                advisories.push(format!("target version '{to}' is a preview version"));
            }
            VersionSupportLevel::Active => {}
        }
        advisories.extend(std::mem::take(&mut analysis.warnings));
        analysis.warnings = advisories;

        Ok(analysis)
    }
}

fn validate_version_config(resource_type: &str, config: &VersionConfig) -> CoreResult<()> {
    if !version_format().is_match(&config.version)
        || NaiveDate::parse_from_str(&config.version[..10], "%Y-%m-%d").is_err()
    {
        return Err(CoreError::InvalidVersionFormat {
            resource_type: resource_type.to_string(),
            version: config.version.clone(),
        });
    }
    if config.schema.resource_type != resource_type {
        return Err(CoreError::InvalidRegistration {
            resource_type: resource_type.to_string(),
            message: format!(
                "schema resource type '{}' does not match registration",
                config.schema.resource_type
            ),
        });
    }
    if config.schema.version != config.version {
        return Err(CoreError::InvalidRegistration {
            resource_type: resource_type.to_string(),
            message: format!(
                "schema version '{}' does not match config version '{}'",
                config.schema.version, config.version
            ),
        });
    }
    Ok(())
}

fn render_versions(versions: &BTreeMap<String, VersionConfig>) -> String {
    versions.keys().cloned().collect::<Vec<_>>().join(", ")
}
