//! Schema-to-schema diffing between two versions of a resource type.

use serde::{Deserialize, Serialize};

use crate::model::ApiSchema;

/// How a property changed between two schema versions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum PropertyChangeKind {
    TypeChanged { from: String, to: String },
    BecameRequired,
    BecameOptional,
}

/// One changed property in a migration analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    pub name: String,
    #[serde(flatten)]
    pub kind: PropertyChangeKind,
    pub breaking: bool,
}

/// Result of diffing two versions of the same resource type.
///
/// Computed on demand as a pure function of the two schemas; advisory only,
/// never an enforcement mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationAnalysis {
    pub from_version: String,
    pub to_version: String,
    pub compatible: bool,
    pub added_properties: Vec<String>,
    pub removed_properties: Vec<String>,
    pub changed_properties: Vec<PropertyChange>,
    pub warnings: Vec<String>,
}

impl MigrationAnalysis {
    /// The trivial analysis for a version compared against itself.
    pub fn unchanged(version: impl Into<String>) -> Self {
        let version = version.into();
        Self {
            from_version: version.clone(),
            to_version: version,
            compatible: true,
            added_properties: Vec::new(),
            removed_properties: Vec::new(),
            changed_properties: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// Diff two schemas of the same resource type.
///
/// Breaking changes, which flip `compatible` to false: a property whose type
/// changed, and a property that is required in `to` while optional or absent
/// in `from`. Everything else (removals, new optional properties, properties
/// becoming optional) is reported as a non-breaking warning.
pub fn analyze_schemas(from: &ApiSchema, to: &ApiSchema) -> MigrationAnalysis {
    let mut added_properties = Vec::new();
    let mut removed_properties = Vec::new();
    let mut changed_properties = Vec::new();
    let mut warnings = Vec::new();

    for (name, to_def) in &to.properties {
        match from.properties.get(name) {
            None => {
                added_properties.push(name.clone());
                if to_def.required {
                    changed_properties.push(PropertyChange {
                        name: name.clone(),
                        kind: PropertyChangeKind::BecameRequired,
                        breaking: true,
                    });
                    warnings.push(format!(
                        "property '{name}' is new and required in {}",
                        to.version
                    ));
                } else {
                    warnings.push(format!(
                        "property '{name}' is new in {} (optional)",
                        to.version
                    ));
                }
            }
            Some(from_def) => {
                let from_kind = from_def.property_type.kind();
                let to_kind = to_def.property_type.kind();
                if from_kind != to_kind {
                    changed_properties.push(PropertyChange {
                        name: name.clone(),
                        kind: PropertyChangeKind::TypeChanged {
                            from: from_kind.to_string(),
                            to: to_kind.to_string(),
                        },
                        breaking: true,
                    });
                }
                if !from_def.required && to_def.required {
                    changed_properties.push(PropertyChange {
                        name: name.clone(),
                        kind: PropertyChangeKind::BecameRequired,
                        breaking: true,
                    });
                } else if from_def.required && !to_def.required {
                    changed_properties.push(PropertyChange {
                        name: name.clone(),
                        kind: PropertyChangeKind::BecameOptional,
                        breaking: false,
                    });
                    warnings.push(format!(
                        "property '{name}' is no longer required in {}",
                        to.version
                    ));
                }
            }
        }
    }

    for name in from.properties.keys() {
        if !to.properties.contains_key(name) {
            removed_properties.push(name.clone());
            warnings.push(format!("property '{name}' was removed in {}", to.version));
        }
    }

    let compatible = !changed_properties.iter().any(|change| change.breaking);

    MigrationAnalysis {
        from_version: from.version.clone(),
        to_version: to.version.clone(),
        compatible,
        added_properties,
        removed_properties,
        changed_properties,
        warnings,
    }
}
