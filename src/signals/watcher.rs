//! # Signal watcher registration.
//!
//! A [`SignalWatcher`] pairs a set of OS signals with an optional handler.
//! Without a handler, received signals are only published on the event bus.

use crate::signals::{OsSignal, SignalHandlerRef};

/// A set of OS signals and the handler invoked for each occurrence.
pub struct SignalWatcher<V> {
    signals: Vec<OsSignal>,
    handler: Option<SignalHandlerRef<V>>,
}

impl<V> SignalWatcher<V> {
    /// Watches `signals` with `handler`.
    pub fn new(signals: impl IntoIterator<Item = OsSignal>, handler: SignalHandlerRef<V>) -> Self {
        Self {
            signals: signals.into_iter().collect(),
            handler: Some(handler),
        }
    }

    /// Watches `signals` without a handler.
    pub fn inert(signals: impl IntoIterator<Item = OsSignal>) -> Self {
        Self {
            signals: signals.into_iter().collect(),
            handler: None,
        }
    }

    /// Subscribed signals.
    pub fn signals(&self) -> &[OsSignal] {
        &self.signals
    }

    pub(crate) fn handler(&self) -> Option<&SignalHandlerRef<V>> {
        self.handler.as_ref()
    }
}

impl<V> Clone for SignalWatcher<V> {
    fn clone(&self) -> Self {
        Self {
            signals: self.signals.clone(),
            handler: self.handler.clone(),
        }
    }
}
