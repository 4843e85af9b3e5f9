//! Schema validator adapter.
//!
//! The validation engine is consumed through [`SchemaValidator`]; the default
//! implementation runs the schema's compiled `jsonschema` validator.

use std::fmt;

use jsonschema::ValidationError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Schema;

/// One failed schema rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub message: String,
    /// Location of the failing value in the candidate object.
    pub uri: String,
    /// Location of the failing rule in the schema.
    pub schema_uri: String,
    /// Schema keyword that failed, e.g. `required` or `type`.
    pub attribute: String,
    pub details: Value,
}

impl Violation {
    pub fn new(
        message: impl Into<String>,
        uri: impl Into<String>,
        schema_uri: impl Into<String>,
        attribute: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            message: message.into(),
            uri: uri.into(),
            schema_uri: schema_uri.into(),
            attribute: attribute.into(),
            details,
        }
    }

    /// Render the violation as the text carried by model error signals.
    pub fn render(&self) -> String {
        let details = match &self.details {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        format!(
            "Model schema validation failed: {}\n  uri: {}\n  schemaUri: {}\n  attribute: {}\n  details: {}",
            self.message, self.uri, self.schema_uri, self.attribute, details
        )
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Validation capability used by models and parsers.
///
/// One validator instance is shared by any number of models, so
/// implementations must not keep per-call state.
pub trait SchemaValidator: Send + Sync {
    /// Validate `candidate` against `schema`. An empty result means valid;
    /// otherwise violations are returned in the order the engine reports them.
    fn validate(&self, candidate: &Value, schema: &Schema) -> Vec<Violation>;
}

/// Default validator backed by `jsonschema`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSchemaValidator;

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, candidate: &Value, schema: &Schema) -> Vec<Violation> {
        match schema.compiled().validate(candidate) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.map(|error| violation_from_error(&error)).collect(),
        }
    }
}

/// Validate and keep only the first reported violation.
pub fn first_violation(
    validator: &dyn SchemaValidator,
    candidate: &Value,
    schema: &Schema,
) -> Option<Violation> {
    validator.validate(candidate, schema).into_iter().next()
}

fn violation_from_error(error: &ValidationError<'_>) -> Violation {
    let schema_path = error.schema_path.to_string();
    let attribute = schema_path
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or_default()
        .to_string();

    Violation::new(
        error.to_string(),
        format!("#{}", error.instance_path),
        format!("#{schema_path}"),
        attribute,
        Value::String(format!("{:?}", error.kind)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn todo_schema() -> Schema {
        Schema::new(json!({
            "type": "object",
            "properties": {
                "text": { "type": "string", "required": true },
                "done": { "type": "boolean", "required": true },
                "number": { "type": "integer" }
            }
        }))
        .expect("compile schema")
    }

    #[test]
    fn valid_candidate_has_no_violations() {
        let violations = JsonSchemaValidator.validate(
            &json!({ "text": "hello world", "done": true }),
            &todo_schema(),
        );
        assert!(violations.is_empty());
    }

    #[test]
    fn reports_missing_required_property() {
        let violation = first_violation(
            &JsonSchemaValidator,
            &json!({ "text": "hello world" }),
            &todo_schema(),
        )
        .expect("violation");

        assert_eq!(violation.attribute, "required");
        assert_eq!(violation.schema_uri, "#/required");
        assert!(violation.message.contains("done"));
    }

    #[test]
    fn reports_type_mismatch_location() {
        let violation = first_violation(
            &JsonSchemaValidator,
            &json!({ "text": "hello world", "done": "yes" }),
            &todo_schema(),
        )
        .expect("violation");

        assert_eq!(violation.attribute, "type");
        assert_eq!(violation.uri, "#/done");
        assert_eq!(violation.schema_uri, "#/properties/done/type");
    }

    #[test]
    fn renders_all_fields() {
        let violation = Violation::new(
            "is a required property",
            "#",
            "#/required",
            "required",
            json!({ "property": "done" }),
        );
        let rendered = violation.render();
        assert_eq!(
            rendered,
            "Model schema validation failed: is a required property\n  uri: #\n  schemaUri: #/required\n  attribute: required\n  details: {\"property\":\"done\"}"
        );
        assert_eq!(violation.to_string(), rendered);
    }
}
