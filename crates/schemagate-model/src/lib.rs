//! Attribute container whose writes are gated by a schema.

pub mod model;
pub mod options;

pub use model::ValidatedModel;
pub use options::ModelOptions;

pub use schemagate_core::{AttributeSet, Change, ChangeSet, EventKind, Events, ModelEvent, Schema};
