//! Core contracts for schemagate.
//!
//! This crate defines the schema wrapper, the schema validator adapter, the
//! change-set overlay used to compute candidate states and the signal hub that
//! models and the sync pipeline emit on.

pub mod attributes;
pub mod error;
pub mod events;
pub mod schema;
pub mod validation;

pub use attributes::{AttributeSet, Change, ChangeSet};
pub use error::{Error, Result};
pub use events::{EventKind, Events, ModelEvent, SubscriptionId};
pub use schema::Schema;
pub use validation::{JsonSchemaValidator, SchemaValidator, Violation, first_violation};
