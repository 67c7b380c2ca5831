//! # `App`: the handle a running routine receives.
//!
//! A transient view bound to one routine run. It exposes the routine's own name
//! and cancellation, its private value-change notification, and delegated
//! supervisor operations.
//!
//! ```text
//! App
//!  ├─ self:   name(), token(), cancelled(), is_cancelled()
//!  ├─ value:  value(), set_value(), value_changed(), value_check()
//!  ├─ others: routine_state(), routine_start(), routine_shutdown()
//!  └─ global: shutdown(cause)
//! ```
//!
//! `routine_shutdown` on the routine's own name is legal and cancels its own token.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::{RoutineState, Supervisor, ValueNotify};
use crate::error::{RuntimeError, ShutdownCause};

/// Handle passed to [`Routine::run`](crate::Routine::run).
pub struct App<V> {
    name: Arc<str>,
    token: CancellationToken,
    notify: ValueNotify,
    sup: Arc<Supervisor<V>>,
}

impl<V> App<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        name: Arc<str>,
        token: CancellationToken,
        notify: ValueNotify,
        sup: Arc<Supervisor<V>>,
    ) -> Self {
        Self {
            name,
            token,
            notify,
            sup,
        }
    }

    /// Name this routine is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A clone of this run's cancellation token.
    ///
    /// Useful in `select!` next to [`value_changed`](Self::value_changed), which
    /// borrows the handle mutably.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Completes when this run is asked to stop.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// True once this run is asked to stop.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Waits until the shared value changes.
    ///
    /// Several changes before this call collapse into one wake-up. Returns
    /// `false` once the run is being torn down.
    pub async fn value_changed(&mut self) -> bool {
        self.notify.changed().await
    }

    /// Consumes a pending change notification without waiting.
    pub fn value_check(&mut self) -> bool {
        self.notify.check()
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

    /// Stops any running routine, including this one.
    pub fn routine_shutdown(&self, name: &str) {
        self.sup.routine_shutdown(name)
    }

    /// Shuts the whole supervisor down.
    pub fn shutdown(&self, cause: Option<ShutdownCause>) {
        self.sup.shutdown(cause)
    }
}
