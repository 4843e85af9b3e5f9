//! Read-only XML synchronization for schemagate models.
//!
//! A read fetches a document over a [`Transport`], converts the markup into a
//! JSON value with [`XmlParser`], optionally validates it against a schema and
//! hands the result to the caller. Failures are emitted as error signals on
//! the target's [`schemagate_core::Events`].

pub mod errors;
pub mod model;
pub mod parser;
pub mod sync;
pub mod transport;

pub use errors::{ParseError, ReadError, SyncError, TransportError};
pub use model::XmlModel;
pub use parser::{InlineValidator, ParserOptions, XmlParser};
pub use sync::{PendingRead, Resource, SyncDispatch, SyncMethod, SyncOptions, UrlSource, XmlSync};
pub use transport::{HttpConfig, HttpMethod, HttpTransport, Request, Transport};

/// Content type sent with every markup request.
pub const XML_CONTENT_TYPE: &str = "application/xml";
