//! Mapping of validated property bags into the canonical resource body shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::ApiSchema;

/// Keys lifted out of the property bag into the body envelope rather than
/// copied into `properties`.
const ENVELOPE_KEYS: [&str; 3] = ["name", "location", "tags"];

/// Canonical request shape consumed by the resource-creation collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    pub properties: Map<String, Value>,
}

/// Build the canonical `{location, tags, properties}` body from a flat
/// property bag.
///
/// Assumes the input already passed validation and does not re-validate, so
/// the two concerns stay decoupled. Envelope keys are lifted to the top
/// level; every other key is copied into `properties`, including keys the
/// schema does not declare (the same forward-compatibility stance the
/// validator takes). Schema defaults fill properties the caller omitted.
/// The result never aliases the caller's input.
pub fn build_body(schema: &ApiSchema, input: &Value) -> ResourceBody {
    let empty = Map::new();
    let bag = input.as_object().unwrap_or(&empty);

    let mut properties = Map::new();
    for (key, value) in bag {
        if ENVELOPE_KEYS.contains(&key.as_str()) {
            continue;
        }
        properties.insert(key.clone(), value.clone());
    }

    for (name, definition) in &schema.properties {
        if ENVELOPE_KEYS.contains(&name.as_str()) || properties.contains_key(name) {
            continue;
        }
        if let Some(default) = &definition.default {
            properties.insert(name.clone(), default.clone());
        }
    }

    let location = bag
        .get("location")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| schema_default_string(schema, "location"));

    let tags = bag.get("tags").and_then(Value::as_object).map(|tags| {
        tags.iter()
            .filter_map(|(key, value)| {
                value.as_str().map(|text| (key.clone(), text.to_string()))
            })
            .collect::<BTreeMap<String, String>>()
    });

    ResourceBody {
        location,
        tags,
        properties,
    }
}

fn schema_default_string(schema: &ApiSchema, name: &str) -> Option<String> {
    schema
        .property(name)?
        .default
        .as_ref()?
        .as_str()
        .map(str::to_string)
}
