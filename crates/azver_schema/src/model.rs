//! Data model for versioned API schemas.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The data type of a schema property.
///
/// Object and array types carry their nested shape inline, so a schema is a
/// self-contained tree with no external pointers to resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Enum {
        allowed: Vec<Value>,
    },
    Object {
        properties: BTreeMap<String, PropertyDefinition>,
    },
    Array {
        items: Box<PropertyType>,
    },
}

impl PropertyType {
    /// Short name of the type, used in error messages and schema diffs.
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Enum { .. } => "enum",
            PropertyType::Object { .. } => "object",
            PropertyType::Array { .. } => "array",
        }
    }
}

/// Kinds of validation rules that can be attached to a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleKind {
    /// The property must be present. Redundant with
    /// [`PropertyDefinition::required`] but kept so rule lists can be
    /// self-describing.
    Required,
    /// String value must match the regex pattern.
    Pattern { pattern: String },
    /// Numeric value, string length or array length must fall in the range.
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Value must be one of the allowed values.
    Enum { allowed: Vec<Value> },
    /// Named predicate resolved by the caller at validation time.
    Custom { name: String },
}

/// A single validation rule with an optional failure message override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(flatten)]
    pub kind: RuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationRule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            message: None,
        }
    }

    pub fn required() -> Self {
        Self::new(RuleKind::Required)
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::new(RuleKind::Pattern {
            pattern: pattern.into(),
        })
    }

    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(RuleKind::Range { min, max })
    }

    pub fn one_of<I, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(RuleKind::Enum {
            allowed: allowed.into_iter().map(Into::into).collect(),
        })
    }

    pub fn custom(name: impl Into<String>) -> Self {
        Self::new(RuleKind::Custom { name: name.into() })
    }

    /// Override the generated failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Contract for a single schema property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    #[serde(flatten)]
    pub property_type: PropertyType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<ValidationRule>,
}

impl PropertyDefinition {
    pub fn new(property_type: PropertyType) -> Self {
        Self {
            property_type,
            required: false,
            default: None,
            deprecated: false,
            description: None,
            rules: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::new(PropertyType::String)
    }

    pub fn number() -> Self {
        Self::new(PropertyType::Number)
    }

    pub fn boolean() -> Self {
        Self::new(PropertyType::Boolean)
    }

    pub fn object<K, I>(properties: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, PropertyDefinition)>,
    {
        Self::new(PropertyType::Object {
            properties: properties
                .into_iter()
                .map(|(name, def)| (name.into(), def))
                .collect(),
        })
    }

    pub fn array(items: PropertyType) -> Self {
        Self::new(PropertyType::Array {
            items: Box::new(items),
        })
    }

    pub fn enumeration<I, V>(allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(PropertyType::Enum {
            allowed: allowed.into_iter().map(Into::into).collect(),
        })
    }

    /// Mark the property as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value applied when the caller omits the property.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark the property as deprecated. Usage produces a warning.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// The structural contract for one (resource type, version) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSchema {
    pub resource_type: String,
    pub version: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyDefinition>,
}

impl ApiSchema {
    pub fn new(resource_type: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            version: version.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Add a property definition. Property names are unique within a schema;
    /// adding the same name twice replaces the earlier definition.
    pub fn with_property(mut self, name: impl Into<String>, definition: PropertyDefinition) -> Self {
        self.properties.insert(name.into(), definition);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.get(name)
    }

    /// Names of all required properties.
    pub fn required_properties(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|(_, def)| def.required)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Lifecycle tag for a registered API version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSupportLevel {
    /// Eligible as an automatic default.
    Active,
    /// Usable but discouraged; resolution warns.
    Deprecated,
    /// Usable, unstable.
    Preview,
    /// Present in the registry for diffing, rejected when requested.
    Removed,
}

impl VersionSupportLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionSupportLevel::Active => "active",
            VersionSupportLevel::Deprecated => "deprecated",
            VersionSupportLevel::Preview => "preview",
            VersionSupportLevel::Removed => "removed",
        }
    }
}

impl std::fmt::Display for VersionSupportLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One registered version of one resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionConfig {
    pub version: String,
    pub support_level: VersionSupportLevel,
    pub schema: ApiSchema,
}

impl VersionConfig {
    pub fn new(
        version: impl Into<String>,
        support_level: VersionSupportLevel,
        schema: ApiSchema,
    ) -> Self {
        Self {
            version: version.into(),
            support_level,
            schema,
        }
    }

    pub fn active(version: impl Into<String>, schema: ApiSchema) -> Self {
        Self::new(version, VersionSupportLevel::Active, schema)
    }

    pub fn deprecated(version: impl Into<String>, schema: ApiSchema) -> Self {
        Self::new(version, VersionSupportLevel::Deprecated, schema)
    }

    pub fn preview(version: impl Into<String>, schema: ApiSchema) -> Self {
        Self::new(version, VersionSupportLevel::Preview, schema)
    }

    pub fn removed(version: impl Into<String>, schema: ApiSchema) -> Self {
        Self::new(version, VersionSupportLevel::Removed, schema)
    }
}
