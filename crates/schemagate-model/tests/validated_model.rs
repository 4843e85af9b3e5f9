use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use schemagate_core::{SchemaValidator, Violation};
use schemagate_model::{
    AttributeSet, ChangeSet, EventKind, Events, ModelEvent, ModelOptions, Schema, ValidatedModel,
};

fn todo_schema(additional_properties: bool) -> Schema {
    Schema::new(json!({
        "name": "testing",
        "type": "object",
        "properties": {
            "text": { "type": "string", "required": true },
            "done": { "type": "boolean", "required": true },
            "number": { "type": "integer" }
        },
        "additionalProperties": additional_properties
    }))
    .expect("compile schema")
}

fn attrs(value: Value) -> AttributeSet {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

/// Records every signal a model emits.
#[derive(Clone, Default)]
struct Recorder {
    events: Arc<Mutex<Vec<ModelEvent>>>,
}

impl Recorder {
    fn attach(&self, events: &Events) {
        for kind in [EventKind::Change, EventKind::Error] {
            let sink = Arc::clone(&self.events);
            events.on(kind, move |event| sink.lock().unwrap().push(event.clone()));
        }
    }

    fn changes(&self) -> usize {
        self.count(EventKind::Change)
    }

    fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                ModelEvent::Error { message } => Some(message.clone()),
                ModelEvent::Change { .. } => None,
            })
            .collect()
    }

    fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|event| event.kind() == kind)
            .count()
    }

    fn reset(&self) {
        self.events.lock().unwrap().clear();
    }
}

fn todo_model(additional_properties: bool) -> (ValidatedModel, Recorder) {
    let model = ValidatedModel::empty(ModelOptions::with_schema(todo_schema(
        additional_properties,
    )));
    let recorder = Recorder::default();
    recorder.attach(model.events());
    (model, recorder)
}

fn seeded_model(initial: Value) -> (ValidatedModel, Recorder) {
    let (mut model, recorder) = todo_model(true);
    assert!(model.set(attrs(initial)));
    recorder.reset();
    (model, recorder)
}

#[test]
fn rejects_write_missing_required_property() {
    let (mut model, recorder) = todo_model(true);

    assert!(!model.set(attrs(json!({ "text": "hello world" }))));

    assert!(model.attributes().is_empty());
    assert_eq!(recorder.errors().len(), 1);
    assert_eq!(recorder.changes(), 0);
}

#[test]
fn commits_conforming_write() {
    let (mut model, recorder) = todo_model(true);

    assert!(model.set(attrs(json!({ "text": "hello world", "done": true }))));

    assert_eq!(model.get("text"), Some(&json!("hello world")));
    assert_eq!(model.get("done"), Some(&json!(true)));
    assert!(recorder.errors().is_empty());
    assert_eq!(recorder.changes(), 1);
}

#[test]
fn rejects_wrong_property_type() {
    let (mut model, recorder) = todo_model(true);

    assert!(!model.set(attrs(json!({ "text": 123, "done": true }))));

    assert!(model.attributes().is_empty());
    assert_eq!(recorder.errors().len(), 1);
    assert_eq!(recorder.changes(), 0);
}

#[test]
fn accepts_extra_property_by_default() {
    let (mut model, recorder) = todo_model(true);

    assert!(model.set(attrs(json!({ "text": "hello world", "done": true, "extra": 123 }))));
    assert_eq!(model.get("extra"), Some(&json!(123)));
    assert_eq!(recorder.changes(), 1);

    recorder.reset();
    assert!(model.set(ChangeSet::new().set("extra", "test")));
    assert_eq!(model.get("text"), Some(&json!("hello world")));
    assert_eq!(model.get("extra"), Some(&json!("test")));
    assert!(recorder.errors().is_empty());
    assert_eq!(recorder.changes(), 1);
}

#[test]
fn rejects_extra_property_when_not_allowed() {
    let (mut model, recorder) = todo_model(false);

    assert!(!model.set(attrs(json!({ "text": "hello world", "done": true, "extra": 123 }))));

    assert!(model.attributes().is_empty());
    let errors = recorder.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("attribute: additionalProperties"));
    assert_eq!(recorder.changes(), 0);
}

#[test]
fn rejected_type_change_keeps_committed_state() {
    let (mut model, recorder) = seeded_model(json!({ "text": "hello world", "done": true }));
    let before = model.attributes().clone();

    assert!(!model.set(ChangeSet::new().set("done", "test")));

    assert_eq!(model.attributes(), &before);
    assert_eq!(model.get("done"), Some(&json!(true)));
    assert_eq!(recorder.errors().len(), 1);
    assert_eq!(recorder.changes(), 0);
}

#[test]
fn rejection_applies_no_part_of_the_change_set() {
    let (mut model, recorder) = seeded_model(json!({ "text": "hello world", "done": true }));

    // `text` alone would be valid; `done` is not.
    let changes = ChangeSet::new().set("text", "updated").set("done", "nope");
    assert!(!model.set(changes));

    assert_eq!(model.get("text"), Some(&json!("hello world")));
    assert_eq!(recorder.errors().len(), 1);
}

#[test]
fn unsets_optional_property() {
    let (mut model, recorder) =
        seeded_model(json!({ "text": "hello world", "done": true, "number": 123 }));

    assert!(model.unset("number"));

    assert_eq!(model.get("text"), Some(&json!("hello world")));
    assert_eq!(model.get("done"), Some(&json!(true)));
    assert_eq!(model.get("number"), None);
    assert!(!model.has("number"));
    assert_eq!(model.previous("number"), Some(&json!(123)));
    assert!(recorder.errors().is_empty());
    assert_eq!(recorder.changes(), 1);
}

#[test]
fn refuses_to_unset_required_property() {
    let (mut model, recorder) = seeded_model(json!({ "text": "hello world", "done": true }));

    assert!(!model.unset("done"));

    assert_eq!(model.get("text"), Some(&json!("hello world")));
    assert_eq!(model.get("done"), Some(&json!(true)));
    assert_eq!(recorder.errors().len(), 1);
    assert_eq!(recorder.changes(), 0);
}

#[test]
fn clear_always_succeeds() {
    let (mut model, recorder) = seeded_model(json!({ "text": "hello world", "done": true }));

    assert!(model.clear());
    assert!(model.attributes().is_empty());
    assert!(recorder.errors().is_empty());
    assert_eq!(recorder.changes(), 1);

    recorder.reset();
    assert!(model.clear(), "clearing an empty model still commits");
    assert_eq!(recorder.changes(), 1);
}

#[test]
fn removing_every_required_field_is_valid() {
    let (mut model, recorder) = seeded_model(json!({ "text": "hello world", "done": true }));

    assert!(model.set(ChangeSet::removing(["text", "done"])));
    assert!(model.attributes().is_empty());
    assert!(model.is_valid());
    assert_eq!(recorder.changes(), 1);
}

#[test]
fn change_signal_lists_changed_names() {
    let (mut model, recorder) = seeded_model(json!({ "text": "hello world", "done": true }));

    assert!(model.set(ChangeSet::new().set("done", false).set("text", "hello world")));

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![ModelEvent::Change {
            changed: vec!["done".to_string()]
        }]
    );
}

#[test]
fn invalid_initial_attributes_start_empty_and_signal() {
    let events = Events::new();
    let recorder = Recorder::default();
    recorder.attach(&events);

    let model = ValidatedModel::new(
        attrs(json!({ "text": "hello world" })),
        ModelOptions::with_schema(todo_schema(true)).events(events),
    );

    assert!(model.attributes().is_empty());
    let errors = recorder.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Model schema validation failed: "));
    assert!(errors[0].contains("attribute: required"));
    assert_eq!(recorder.changes(), 0);
}

#[test]
fn valid_initial_attributes_are_committed_silently() {
    let events = Events::new();
    let recorder = Recorder::default();
    recorder.attach(&events);

    let model = ValidatedModel::new(
        attrs(json!({ "text": "hello world", "done": false })),
        ModelOptions::with_schema(todo_schema(true)).events(events),
    );

    assert_eq!(model.to_json(), json!({ "text": "hello world", "done": false }));
    assert!(recorder.events.lock().unwrap().is_empty());
}

#[test]
fn no_schema_accepts_anything() {
    let mut model = ValidatedModel::default();
    let recorder = Recorder::default();
    recorder.attach(model.events());

    assert!(model.set(attrs(json!({ "anything": [1, 2, 3], "nothing": null }))));
    assert!(model.has("anything"));
    assert!(!model.has("nothing"));
    assert_eq!(recorder.changes(), 1);
}

struct TwoViolations;

impl SchemaValidator for TwoViolations {
    fn validate(&self, _candidate: &Value, _schema: &Schema) -> Vec<Violation> {
        vec![
            Violation::new("first", "#/a", "#/properties/a", "type", json!("detail")),
            Violation::new("second", "#/b", "#/properties/b", "type", Value::Null),
        ]
    }
}

#[test]
fn only_first_violation_is_reported() {
    let options = ModelOptions::with_schema(todo_schema(true)).validator(Arc::new(TwoViolations));
    let mut model = ValidatedModel::empty(options);
    let recorder = Recorder::default();
    recorder.attach(model.events());

    assert!(!model.set(ChangeSet::new().set("a", 1)));

    assert_eq!(
        recorder.errors(),
        vec![
            "Model schema validation failed: first\n  uri: #/a\n  schemaUri: #/properties/a\n  attribute: type\n  details: detail"
                .to_string()
        ]
    );
}
