//! Structural validation of property bags against an [`ApiSchema`].

use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{SchemaError, SchemaResult};
use crate::model::{ApiSchema, PropertyDefinition, PropertyType, RuleKind, ValidationRule};

/// A single validation failure, located by a dotted path into the input
/// (`"osProfile.adminUsername"`, `"securityRules[2].port"`).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

/// Validation outcome with accumulated errors and warnings.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.valid = false;
        self.errors.push(ValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Render errors as `[path] message` lines for user-facing reports.
    pub fn format_errors(&self) -> Vec<String> {
        self.errors
            .iter()
            .map(|e| format!("[{}] {}", e.path, e.message))
            .collect()
    }
}

/// Named predicate for [`RuleKind::Custom`] rules.
pub type CustomPredicate = Box<dyn Fn(&Value) -> bool + Send + Sync>;

/// Validator walking a property bag against a schema's property tree.
///
/// The walk accumulates every violation instead of failing fast, so a single
/// call reports all missing and malformed fields at once. Keys present in the
/// input but absent from the schema are ignored: newer callers may pass
/// fields an older pinned version does not know about.
#[derive(Default)]
pub struct SchemaValidator {
    custom_rules: HashMap<String, CustomPredicate>,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self {
            custom_rules: HashMap::new(),
        }
    }

    /// Register a named predicate that [`RuleKind::Custom`] rules resolve to.
    pub fn with_custom_rule(
        mut self,
        name: impl Into<String>,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.custom_rules.insert(name.into(), Box::new(predicate));
        self
    }

    /// Validate `input` against `schema`.
    ///
    /// Data-shape problems are reported through the returned
    /// [`ValidationResult`]; `Err` is reserved for defects in the schema
    /// itself (an uncompilable pattern, an unresolved custom rule name).
    pub fn validate(&self, schema: &ApiSchema, input: &Value) -> SchemaResult<ValidationResult> {
        let mut result = ValidationResult::new();

        let Some(object) = input.as_object() else {
            result.add_error("", format!("expected an object, got {}", json_kind(input)));
            return Ok(result);
        };

        self.walk(&schema.properties, object, "", &mut result)?;
        Ok(result)
    }

    fn walk(
        &self,
        properties: &std::collections::BTreeMap<String, PropertyDefinition>,
        input: &Map<String, Value>,
        prefix: &str,
        result: &mut ValidationResult,
    ) -> SchemaResult<()> {
        for (name, definition) in properties {
            let path = format!("{prefix}{name}");
            match input.get(name) {
                None | Some(Value::Null) => {
                    if is_required(definition) {
                        result.add_error(&path, required_message(definition, name));
                    }
                }
                Some(value) => {
                    self.check_value(&path, definition, value, result)?;
                }
            }
        }
        Ok(())
    }

    fn check_value(
        &self,
        path: &str,
        definition: &PropertyDefinition,
        value: &Value,
        result: &mut ValidationResult,
    ) -> SchemaResult<()> {
        if definition.deprecated {
            result.add_warning(format!("property '{path}' is deprecated"));
        }

        match &definition.property_type {
            PropertyType::String => {
                if !value.is_string() {
                    result.add_error(path, type_message("string", value));
                    return Ok(());
                }
            }
            PropertyType::Number => {
                if !value.is_number() {
                    result.add_error(path, type_message("number", value));
                    return Ok(());
                }
            }
            PropertyType::Boolean => {
                if !value.is_boolean() {
                    result.add_error(path, type_message("boolean", value));
                    return Ok(());
                }
            }
            PropertyType::Enum { allowed } => {
                if !allowed.contains(value) {
                    result.add_error(path, format!("value is not one of {}", render_allowed(allowed)));
                    return Ok(());
                }
            }
            PropertyType::Object { properties } => {
                let Some(nested) = value.as_object() else {
                    result.add_error(path, type_message("object", value));
                    return Ok(());
                };
                let nested_prefix = format!("{path}.");
                self.walk(properties, nested, &nested_prefix, result)?;
            }
            PropertyType::Array { items } => {
                let Some(elements) = value.as_array() else {
                    result.add_error(path, type_message("array", value));
                    return Ok(());
                };
                let element_definition = PropertyDefinition::new((**items).clone());
                for (index, element) in elements.iter().enumerate() {
                    let element_path = format!("{path}[{index}]");
                    self.check_value(&element_path, &element_definition, element, result)?;
                }
            }
        }

        for rule in &definition.rules {
            self.apply_rule(path, rule, value, result)?;
        }
        Ok(())
    }

    fn apply_rule(
        &self,
        path: &str,
        rule: &ValidationRule,
        value: &Value,
        result: &mut ValidationResult,
    ) -> SchemaResult<()> {
        match &rule.kind {
            // Presence was already checked during the walk.
            RuleKind::Required => {}
            RuleKind::Pattern { pattern } => {
                let regex = Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
                    path: path.to_string(),
                    pattern: pattern.clone(),
                    source,
                })?;
                if let Some(text) = value.as_str() {
                    if !regex.is_match(text) {
                        result.add_error(
                            path,
                            message_or(rule, format!("value does not match pattern '{pattern}'")),
                        );
                    }
                }
            }
            RuleKind::Range { min, max } => {
                let measured = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => Some(s.chars().count() as f64),
                    Value::Array(a) => Some(a.len() as f64),
                    _ => None,
                };
                if let Some(measured) = measured {
                    if let Some(min) = min {
                        if measured < *min {
                            result.add_error(
                                path,
                                message_or(rule, format!("value {measured} is below minimum {min}")),
                            );
                        }
                    }
                    if let Some(max) = max {
                        if measured > *max {
                            result.add_error(
                                path,
                                message_or(rule, format!("value {measured} is above maximum {max}")),
                            );
                        }
                    }
                }
            }
            RuleKind::Enum { allowed } => {
                if !allowed.contains(value) {
                    result.add_error(
                        path,
                        message_or(rule, format!("value is not one of {}", render_allowed(allowed))),
                    );
                }
            }
            RuleKind::Custom { name } => {
                let predicate =
                    self.custom_rules
                        .get(name)
                        .ok_or_else(|| SchemaError::UnknownCustomRule {
                            path: path.to_string(),
                            name: name.clone(),
                        })?;
                if !predicate(value) {
                    result.add_error(
                        path,
                        message_or(rule, format!("value rejected by rule '{name}'")),
                    );
                }
            }
        }
        Ok(())
    }
}

/// Validate with no custom rules registered.
pub fn validate(schema: &ApiSchema, input: &Value) -> SchemaResult<ValidationResult> {
    SchemaValidator::new().validate(schema, input)
}

fn is_required(definition: &PropertyDefinition) -> bool {
    definition.required
        || definition
            .rules
            .iter()
            .any(|rule| matches!(rule.kind, RuleKind::Required))
}

fn required_message(definition: &PropertyDefinition, name: &str) -> String {
    definition
        .rules
        .iter()
        .find(|rule| matches!(rule.kind, RuleKind::Required))
        .and_then(|rule| rule.message.clone())
        .unwrap_or_else(|| format!("required property '{name}' is missing"))
}

fn message_or(rule: &ValidationRule, fallback: String) -> String {
    rule.message.clone().unwrap_or(fallback)
}

fn type_message(expected: &str, value: &Value) -> String {
    format!("expected {expected}, got {}", json_kind(value))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn render_allowed(allowed: &[Value]) -> String {
    let rendered: Vec<String> = allowed.iter().map(|v| v.to_string()).collect();
    format!("[{}]", rendered.join(", "))
}
