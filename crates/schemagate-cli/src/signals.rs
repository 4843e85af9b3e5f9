use std::sync::{Arc, Mutex};

use schemagate_core::{EventKind, Events, ModelEvent};

use crate::CliError;

/// Error signals recorded from a hub, turned into the command's exit status.
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl ErrorLog {
    /// Record every error signal emitted on `events` from now on.
    pub(crate) fn collect(events: &Events) -> Self {
        let log = Self::default();
        let sink = Arc::clone(&log.messages);
        events.on(EventKind::Error, move |event| {
            if let ModelEvent::Error { message } = event
                && let Ok(mut messages) = sink.lock()
            {
                messages.push(message.clone());
            }
        });
        log
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    /// Print recorded errors to stderr. Any recorded error fails the command.
    pub(crate) fn finish(&self) -> Result<(), CliError> {
        let messages = self.messages();
        for message in &messages {
            eprintln!("error: {message}");
        }
        if messages.is_empty() {
            Ok(())
        } else {
            Err(CliError::Rejected(messages.len()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_error_signals_succeeds() {
        let events = Events::new();
        let log = ErrorLog::collect(&events);
        events.emit_change(vec!["name".to_string()]);

        assert!(log.messages().is_empty());
        assert!(log.finish().is_ok());
    }

    #[test]
    fn each_error_signal_counts_toward_rejection() {
        let events = Events::new();
        let log = ErrorLog::collect(&events);
        events.emit_error("first");
        events.emit_change(Vec::new());
        events.emit_error("second");

        assert_eq!(log.messages(), vec!["first", "second"]);
        match log.finish() {
            Err(CliError::Rejected(count)) => assert_eq!(count, 2),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn signals_before_collection_are_not_recorded() {
        let events = Events::new();
        events.emit_error("too early");
        let log = ErrorLog::collect(&events);

        assert!(log.finish().is_ok());
    }
}
