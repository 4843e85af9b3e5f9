use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use schemagate_core::{AttributeSet, Events};
use schemagate_model::ValidatedModel;
use serde_json::Value;

use crate::errors::SyncError;
use crate::sync::{Resource, SyncDispatch, SyncMethod, SyncOptions, UrlSource, XmlSync};

/// A validated model whose remote path is the read-only XML sync.
///
/// Fetched documents are committed through the model's gated write path, so
/// a document violating the model schema leaves the model unchanged and
/// emits an error signal. Signals are emitted after the model lock is
/// released; listeners may read the model.
#[derive(Clone)]
pub struct XmlModel {
    model: Arc<Mutex<ValidatedModel>>,
    events: Events,
    url: Option<UrlSource>,
    sync: XmlSync,
}

impl XmlModel {
    pub fn new(model: ValidatedModel, sync: XmlSync) -> Self {
        let events = model.events().clone();
        Self {
            model: Arc::new(Mutex::new(model)),
            events,
            url: None,
            sync,
        }
    }

    pub fn with_url(mut self, url: impl Into<UrlSource>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Read the document and commit it as the model's attributes.
    pub fn fetch(&self, options: SyncOptions) -> Result<SyncDispatch, SyncError> {
        let model = Arc::clone(&self.model);
        let events = self.events.clone();
        self.sync
            .sync(SyncMethod::Read, self, options, move |document| match document {
                Value::Object(attributes) => {
                    let event = lock(&model).apply(attributes);
                    events.emit(&event);
                }
                other => events.emit_error(format!(
                    "fetched document is not an object: {other}"
                )),
            })
    }

    /// Write the model back. The XML sync is read-only, so this always
    /// reports [`SyncDispatch::Unsupported`].
    pub fn save(&self, options: SyncOptions) -> Result<SyncDispatch, SyncError> {
        let method = if self.with_model(|model| model.has("id")) {
            SyncMethod::Update
        } else {
            SyncMethod::Create
        };
        self.sync.sync(method, self, options, |_| {})
    }

    /// Delete the remote document. Unsupported, like [`XmlModel::save`].
    pub fn destroy(&self, options: SyncOptions) -> Result<SyncDispatch, SyncError> {
        self.sync.sync(SyncMethod::Delete, self, options, |_| {})
    }

    /// Run `f` with exclusive access to the underlying model.
    pub fn with_model<R>(&self, f: impl FnOnce(&mut ValidatedModel) -> R) -> R {
        f(&mut lock(&self.model))
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.with_model(|model| model.get(name).cloned())
    }

    pub fn attributes(&self) -> AttributeSet {
        self.with_model(|model| model.attributes().clone())
    }

    pub fn events(&self) -> &Events {
        &self.events
    }
}

impl Resource for XmlModel {
    fn url(&self) -> Option<UrlSource> {
        self.url.clone()
    }

    fn events(&self) -> Events {
        self.events.clone()
    }
}

impl std::fmt::Debug for XmlModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XmlModel")
            .field("url", &self.url)
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

fn lock(model: &Mutex<ValidatedModel>) -> MutexGuard<'_, ValidatedModel> {
    model.lock().unwrap_or_else(PoisonError::into_inner)
}
