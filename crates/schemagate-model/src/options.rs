use std::sync::Arc;

use schemagate_core::{Events, JsonSchemaValidator, Schema, SchemaValidator};

/// Options that control how a model validates and where it emits signals.
#[derive(Clone)]
pub struct ModelOptions {
    /// Schema gating every write. `None` disables validation.
    pub schema: Option<Schema>,
    pub validator: Arc<dyn SchemaValidator>,
    /// Hub to emit on. Pass one in to observe construction-time errors.
    pub events: Option<Events>,
}

impl ModelOptions {
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema: Some(schema),
            ..Self::default()
        }
    }

    pub fn validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn events(mut self, events: Events) -> Self {
        self.events = Some(events);
        self
    }
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            schema: None,
            validator: Arc::new(JsonSchemaValidator),
            events: None,
        }
    }
}

impl std::fmt::Debug for ModelOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelOptions")
            .field("schema", &self.schema)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}
