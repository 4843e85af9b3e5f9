//! Read-only sync: fetch, parse, optionally validate, deliver.

use std::fmt;
use std::sync::Arc;

use schemagate_core::{Events, JsonSchemaValidator, Schema, SchemaValidator};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::XML_CONTENT_TYPE;
use crate::errors::{ReadError, SyncError};
use crate::parser::{InlineValidator, ParserOptions, XmlParser};
use crate::transport::{HttpMethod, Request, Transport};

/// CRUD operations a model may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMethod {
    Create,
    Update,
    Delete,
    Read,
}

impl SyncMethod {
    pub fn http_method(self) -> HttpMethod {
        match self {
            SyncMethod::Create => HttpMethod::Post,
            SyncMethod::Update => HttpMethod::Put,
            SyncMethod::Delete => HttpMethod::Delete,
            SyncMethod::Read => HttpMethod::Get,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncMethod::Create => "create",
            SyncMethod::Update => "update",
            SyncMethod::Delete => "delete",
            SyncMethod::Read => "read",
        }
    }
}

impl fmt::Display for SyncMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a resource lives: a fixed URL or one computed on demand.
#[derive(Clone)]
pub enum UrlSource {
    Literal(String),
    Computed(Arc<dyn Fn() -> String + Send + Sync>),
}

impl UrlSource {
    pub fn computed<F>(resolve: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        UrlSource::Computed(Arc::new(resolve))
    }

    pub fn resolve(&self) -> String {
        match self {
            UrlSource::Literal(url) => url.clone(),
            UrlSource::Computed(resolve) => resolve(),
        }
    }
}

impl From<&str> for UrlSource {
    fn from(url: &str) -> Self {
        UrlSource::Literal(url.to_string())
    }
}

impl From<String> for UrlSource {
    fn from(url: String) -> Self {
        UrlSource::Literal(url)
    }
}

impl fmt::Debug for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlSource::Literal(url) => f.debug_tuple("Literal").field(url).finish(),
            UrlSource::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Anything a sync can target: it may know its URL and it owns a signal hub.
pub trait Resource {
    fn url(&self) -> Option<UrlSource>;
    fn events(&self) -> Events;
}

/// Per-call sync options.
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Overrides the target's own URL.
    pub url: Option<String>,
    /// Validates the parsed document before delivery.
    pub schema: Option<Schema>,
}

impl SyncOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// Immediate result of [`XmlSync::sync`].
#[derive(Debug)]
pub enum SyncDispatch {
    /// The operation is not supported by this transport; nothing was sent.
    Unsupported(SyncMethod),
    /// A read is in flight.
    Issued(PendingRead),
}

impl SyncDispatch {
    pub fn is_issued(&self) -> bool {
        matches!(self, SyncDispatch::Issued(_))
    }

    /// Wait until an issued read has delivered its outcome.
    pub async fn wait(self) {
        if let SyncDispatch::Issued(pending) = self {
            pending.wait().await;
        }
    }
}

/// An in-flight read. It always runs to completion; dropping the handle
/// does not stop it.
#[derive(Debug)]
pub struct PendingRead {
    url: String,
    handle: JoinHandle<()>,
}

impl PendingRead {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn wait(self) {
        if let Err(err) = self.handle.await {
            warn!(url = %self.url, error = %err, "read task did not complete");
        }
    }
}

/// Read-only XML synchronizer.
#[derive(Clone)]
pub struct XmlSync {
    transport: Arc<dyn Transport>,
    parser_options: ParserOptions,
    validator: Arc<dyn SchemaValidator>,
}

impl XmlSync {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            parser_options: ParserOptions::default(),
            validator: Arc::new(JsonSchemaValidator),
        }
    }

    pub fn with_parser_options(mut self, options: ParserOptions) -> Self {
        self.parser_options = options;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Parser for one read, validating against `schema` when given.
    pub fn parser(&self, schema: Option<&Schema>) -> XmlParser {
        let parser = XmlParser::new(self.parser_options.clone());
        match schema {
            Some(schema) => parser.with_validator(InlineValidator::with_validator(
                schema.clone(),
                Arc::clone(&self.validator),
            )),
            None => parser,
        }
    }

    /// Fetch `url` and parse the body.
    pub async fn read(&self, url: &str, schema: Option<&Schema>) -> Result<Value, ReadError> {
        let request = Request::new(url, HttpMethod::Get, XML_CONTENT_TYPE);
        let body = self.transport.request(request).await?;
        let document = self.parser(schema).parse(&body)?;
        Ok(document)
    }

    /// Start `method` against `target`.
    ///
    /// Only reads are supported; any other method returns
    /// [`SyncDispatch::Unsupported`] without touching the network. A read
    /// without a resolvable URL fails immediately with
    /// [`SyncError::MissingUrl`], and one issued outside a tokio runtime
    /// with [`SyncError::NoRuntime`]. Otherwise the read runs on the current
    /// runtime and delivers exactly one outcome: `on_success` receives the
    /// parsed document, or an error signal is emitted on the target's events.
    pub fn sync<F>(
        &self,
        method: SyncMethod,
        target: &dyn Resource,
        options: SyncOptions,
        on_success: F,
    ) -> Result<SyncDispatch, SyncError>
    where
        F: FnOnce(Value) + Send + 'static,
    {
        if method != SyncMethod::Read {
            debug!(method = %method, "sync method not supported");
            return Ok(SyncDispatch::Unsupported(method));
        }

        let SyncOptions { url, schema } = options;
        let url = url
            .filter(|url| !url.is_empty())
            .or_else(|| target.url().map(|source| source.resolve()))
            .filter(|url| !url.is_empty())
            .ok_or(SyncError::MissingUrl)?;
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;

        debug!(url = %url, method = %method, "read dispatched");

        let events = target.events();
        let sync = self.clone();
        let task_url = url.clone();
        let handle = runtime.spawn(async move {
            match sync.read(&task_url, schema.as_ref()).await {
                Ok(document) => on_success(document),
                Err(err) => {
                    warn!(url = %task_url, error = %err, "read failed");
                    events.emit_error(err.to_string());
                }
            }
        });

        Ok(SyncDispatch::Issued(PendingRead { url, handle }))
    }
}

impl fmt::Debug for XmlSync {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XmlSync")
            .field("parser_options", &self.parser_options)
            .finish_non_exhaustive()
    }
}
