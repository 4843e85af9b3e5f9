//! Immutable schema handle shared by models and parsers.

use std::fmt;
use std::sync::Arc;

use jsonschema::JSONSchema;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// A compiled JSON Schema document.
///
/// Cloning is cheap; every clone refers to the same compiled schema. Schemas
/// written with draft-03 style per-property `"required": true` markers are
/// rewritten into the enclosing `"required": [..]` array before compiling.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

struct SchemaInner {
    document: Value,
    compiled: JSONSchema,
}

impl Schema {
    /// Normalize and compile a schema document.
    pub fn new(document: Value) -> Result<Self> {
        let mut document = document;
        normalize_required(&mut document);
        let compiled =
            JSONSchema::compile(&document).map_err(|err| Error::InvalidSchema(err.to_string()))?;
        Ok(Self {
            inner: Arc::new(SchemaInner { document, compiled }),
        })
    }

    /// Parse a schema from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(text)?;
        Self::new(document)
    }

    /// The normalized schema document.
    pub fn document(&self) -> &Value {
        &self.inner.document
    }

    pub(crate) fn compiled(&self) -> &JSONSchema {
        &self.inner.compiled
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("document", &self.inner.document)
            .finish_non_exhaustive()
    }
}

const NESTED_SCHEMA_KEYS: [&str; 7] = [
    "additionalProperties",
    "items",
    "additionalItems",
    "not",
    "allOf",
    "anyOf",
    "oneOf",
];

const SCHEMA_MAP_KEYS: [&str; 2] = ["patternProperties", "definitions"];

fn normalize_required(node: &mut Value) {
    let Value::Object(map) = node else {
        return;
    };

    let mut promoted = Vec::new();
    if let Some(Value::Object(properties)) = map.get_mut("properties") {
        for (name, property) in properties.iter_mut() {
            if property.get("required") == Some(&Value::Bool(true)) {
                promoted.push(Value::String(name.clone()));
            }
            normalize_required(property);
        }
    }

    for key in SCHEMA_MAP_KEYS {
        if let Some(Value::Object(children)) = map.get_mut(key) {
            children.values_mut().for_each(normalize_required);
        }
    }

    for key in NESTED_SCHEMA_KEYS {
        match map.get_mut(key) {
            Some(Value::Array(children)) => children.iter_mut().for_each(normalize_required),
            Some(child) => normalize_required(child),
            None => {}
        }
    }

    if matches!(map.get("required"), Some(Value::Bool(_))) {
        map.remove("required");
    }

    if !promoted.is_empty() {
        promote_required(map, promoted);
    }
}

fn promote_required(map: &mut Map<String, Value>, promoted: Vec<Value>) {
    let entry = map
        .entry("required")
        .or_insert_with(|| Value::Array(Vec::new()));
    if let Value::Array(names) = entry {
        for name in promoted {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
}
