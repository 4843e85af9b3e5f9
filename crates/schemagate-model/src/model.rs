use std::collections::BTreeSet;
use std::sync::Arc;

use schemagate_core::{
    AttributeSet, ChangeSet, Events, ModelEvent, Schema, SchemaValidator, Violation,
    first_violation,
};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::options::ModelOptions;

/// Attribute container whose committed state is always empty or valid
/// against its schema.
///
/// Every write goes through [`ValidatedModel::set`]: the candidate state is
/// computed, validated once, and either committed whole or discarded. Failures
/// are reported as `error` signals on [`ValidatedModel::events`], never as
/// panics or `Err` values.
pub struct ValidatedModel {
    cid: String,
    attributes: AttributeSet,
    previous: AttributeSet,
    schema: Option<Schema>,
    validator: Arc<dyn SchemaValidator>,
    events: Events,
}

impl ValidatedModel {
    /// Build a model from `initial`. When `initial` does not satisfy the
    /// schema the model starts empty and an error signal is emitted before
    /// this returns.
    pub fn new(initial: AttributeSet, options: ModelOptions) -> Self {
        let ModelOptions {
            schema,
            validator,
            events,
        } = options;

        let mut model = Self {
            cid: format!("c{}", Uuid::new_v4().simple()),
            attributes: AttributeSet::new(),
            previous: AttributeSet::new(),
            schema,
            validator,
            events: events.unwrap_or_default(),
        };

        let candidate = ChangeSet::from(initial).overlay(&model.attributes);
        match model.check(&candidate) {
            None => model.attributes = candidate,
            Some(violation) => {
                warn!(
                    cid = %model.cid,
                    attribute = %violation.attribute,
                    uri = %violation.uri,
                    "initial attributes rejected by schema"
                );
                model.events.emit_error(violation.render());
            }
        }

        model
    }

    /// An empty model.
    pub fn empty(options: ModelOptions) -> Self {
        Self::new(AttributeSet::new(), options)
    }

    /// Apply `changes` atomically. Returns true when the candidate state was
    /// committed (and one change signal emitted), false when it was rejected
    /// (and one error signal emitted).
    pub fn set(&mut self, changes: impl Into<ChangeSet>) -> bool {
        let event = self.apply(changes);
        self.events.emit(&event);
        matches!(event, ModelEvent::Change { .. })
    }

    /// Commit or reject `changes` like [`ValidatedModel::set`], but return
    /// the signal instead of emitting it. The caller must emit it on
    /// [`ValidatedModel::events`], typically after releasing any lock held
    /// around the model.
    pub fn apply(&mut self, changes: impl Into<ChangeSet>) -> ModelEvent {
        let changes = changes.into();
        let candidate = changes.overlay(&self.attributes);

        if let Some(violation) = self.check(&candidate) {
            warn!(
                cid = %self.cid,
                attribute = %violation.attribute,
                uri = %violation.uri,
                "mutation rejected by schema"
            );
            return ModelEvent::Error {
                message: violation.render(),
            };
        }

        let changed = changed_keys(&self.attributes, &candidate);
        self.previous = std::mem::replace(&mut self.attributes, candidate);
        debug!(
            cid = %self.cid,
            requested = changes.len(),
            changed = changed.len(),
            "mutation committed"
        );
        ModelEvent::Change { changed }
    }

    /// Remove one attribute through the gated write path.
    pub fn unset(&mut self, name: impl Into<String>) -> bool {
        self.set(ChangeSet::new().remove(name))
    }

    /// Remove every attribute. The candidate is empty, so this always
    /// commits.
    pub fn clear(&mut self) -> bool {
        let changes = ChangeSet::removing(self.attributes.keys().cloned());
        self.set(changes)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// True when `name` is set to a non-null value.
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some_and(|value| !value.is_null())
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Committed state before the last successful write.
    pub fn previous_attributes(&self) -> &AttributeSet {
        &self.previous
    }

    pub fn previous(&self, name: &str) -> Option<&Value> {
        self.previous.get(name)
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    /// Client-side identifier, unique per instance.
    pub fn cid(&self) -> &str {
        &self.cid
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn events(&self) -> &Events {
        &self.events
    }

    /// Re-validate the committed state.
    pub fn is_valid(&self) -> bool {
        self.check(&self.attributes).is_none()
    }

    // An absent schema or an empty candidate always passes.
    fn check(&self, candidate: &AttributeSet) -> Option<Violation> {
        let schema = self.schema.as_ref()?;
        if candidate.is_empty() {
            return None;
        }
        first_violation(
            self.validator.as_ref(),
            &Value::Object(candidate.clone()),
            schema,
        )
    }
}

impl Default for ValidatedModel {
    fn default() -> Self {
        Self::empty(ModelOptions::default())
    }
}

impl std::fmt::Debug for ValidatedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidatedModel")
            .field("cid", &self.cid)
            .field("attributes", &self.attributes)
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

fn changed_keys(before: &AttributeSet, after: &AttributeSet) -> Vec<String> {
    before
        .keys()
        .chain(after.keys())
        .filter(|name| before.get(*name) != after.get(*name))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
