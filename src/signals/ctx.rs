//! # `SignalCtx`: the handle a signal handler receives.
//!
//! Same surface as [`App`](crate::App) minus the value-change notification:
//! signal handlers are not running routines and have no private queue. The
//! token is the watcher's own scope, cancelled when the supervisor shuts down.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{RoutineState, Supervisor};
use crate::error::{RuntimeError, ShutdownCause};
use crate::signals::OsSignal;

/// Handle passed to [`SignalHandler::on_signal`](crate::SignalHandler::on_signal).
pub struct SignalCtx<V> {
    signal: OsSignal,
    token: CancellationToken,
    sup: Arc<Supervisor<V>>,
}

impl<V> SignalCtx<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(signal: OsSignal, token: CancellationToken, sup: Arc<Supervisor<V>>) -> Self {
        Self { signal, token, sup }
    }

    /// The signal being handled.
    pub fn signal(&self) -> OsSignal {
        self.signal
    }

    /// A clone of the watcher's cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Completes when the watcher is asked to stop.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// True once the watcher is asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Current shared value.
    pub fn value(&self) -> V {
        self.sup.value()
    }

    /// Replaces the shared value.
    pub fn set_value(&self, value: V) {
        self.sup.set_value(value)
    }

    /// State of any registered routine.
    pub fn routine_state(&self, name: &str) -> RoutineState {
        self.sup.routine_state(name)
    }

    /// Starts any registered routine.
    pub fn routine_start(&self, name: &str) -> Result<(), RuntimeError> {
        self.sup.routine_start(name)
    }

    /// Stops any running routine.
    pub fn routine_shutdown(&self, name: &str) {
        self.sup.routine_shutdown(name)
    }

    /// Shuts the whole supervisor down.
    pub fn shutdown(&self, cause: Option<ShutdownCause>) {
        self.sup.shutdown(cause)
    }
}
