//! Signal hub shared by a model and everything that emits on its behalf.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Signals observable by subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelEvent {
    /// The committed attribute set was replaced.
    Change { changed: Vec<String> },
    /// A validation, parse or transport failure.
    Error { message: String },
}

impl ModelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ModelEvent::Change { .. } => EventKind::Change,
            ModelEvent::Error { .. } => EventKind::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Change,
    Error,
}

/// Handle returned by [`Events::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&ModelEvent) + Send + Sync>;

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    listener: Listener,
}

/// Clonable subscription hub. Clones share the same listeners.
#[derive(Clone, Default)]
pub struct Events {
    inner: Arc<EventsInner>,
}

#[derive(Default)]
struct EventsInner {
    next_id: AtomicU64,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl Events {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for events of `kind`.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> SubscriptionId
    where
        F: Fn(&ModelEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions().push(Subscription {
            id,
            kind,
            listener: Arc::new(listener),
        });
        id
    }

    /// Remove a listener. Returns false when it was not registered.
    pub fn off(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions();
        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != id);
        subscriptions.len() != before
    }

    /// Deliver `event` to every listener of its kind, in registration order.
    pub fn emit(&self, event: &ModelEvent) {
        let kind = event.kind();
        // Listeners run without the lock held so they may (un)subscribe.
        let listeners: Vec<Listener> = self
            .subscriptions()
            .iter()
            .filter(|subscription| subscription.kind == kind)
            .map(|subscription| Arc::clone(&subscription.listener))
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    pub fn emit_change(&self, changed: Vec<String>) {
        self.emit(&ModelEvent::Change { changed });
    }

    pub fn emit_error(&self, message: impl Into<String>) {
        self.emit(&ModelEvent::Error {
            message: message.into(),
        });
    }

    pub fn listener_count(&self) -> usize {
        self.subscriptions().len()
    }

    fn subscriptions(&self) -> MutexGuard<'_, Vec<Subscription>> {
        self.inner
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Events {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Events")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
