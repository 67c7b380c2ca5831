//! # Predefined signal handlers.
//!
//! - [`Terminate`] requests a graceful supervisor shutdown.
//! - [`Reload`] re-reads the shared value through a loader and publishes it.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use appvisor::{OsSignal, Reload, SignalWatcher, Terminate};
//!
//! let watchers = vec![
//!     SignalWatcher::<u32>::new(OsSignal::TERMINATION, Arc::new(Terminate)),
//!     SignalWatcher::<u32>::new([OsSignal::Hangup], Arc::new(Reload::new(|| "7".parse::<u32>()))),
//! ];
//! # let _ = watchers;
//! ```

use std::fmt;

use async_trait::async_trait;

use crate::error::ShutdownCause;
use crate::signals::{SignalCtx, SignalHandler};

/// Requests `shutdown(None)` on every received signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Terminate;

#[async_trait]
impl<V> SignalHandler<V> for Terminate
where
    V: Clone + Send + Sync + 'static,
{
    async fn on_signal(&self, ctx: SignalCtx<V>) {
        tracing::debug!(signal = %ctx.signal(), "termination signal");
        ctx.shutdown(None);
    }
}

/// Replaces the shared value with the loader's result on every received signal.
///
/// A failing loader leaves the value unchanged and logs a warning. With
/// [`escalate`](Reload::escalate) the failure also shuts the supervisor down
/// with a failure status.
pub struct Reload<F> {
    loader: F,
    escalate: bool,
}

impl<F> Reload<F> {
    /// Creates a reload handler around `loader`.
    pub fn new(loader: F) -> Self {
        Self {
            loader,
            escalate: false,
        }
    }

    /// Turns a failed reload into a supervisor shutdown.
    pub fn escalate(mut self) -> Self {
        self.escalate = true;
        self
    }
}

#[async_trait]
impl<F, V, E> SignalHandler<V> for Reload<F>
where
    V: Clone + Send + Sync + 'static,
    F: Fn() -> Result<V, E> + Send + Sync + 'static,
    E: fmt::Display + Send,
{
    async fn on_signal(&self, ctx: SignalCtx<V>) {
        let signal = ctx.signal();
        match (self.loader)() {
            Ok(value) => {
                tracing::debug!(%signal, "value reloaded");
                ctx.set_value(value);
            }
            Err(error) => {
                tracing::warn!(%signal, %error, "reload failed");
                if self.escalate {
                    ctx.shutdown(Some(ShutdownCause::failure(format!(
                        "reload failed: {error}"
                    ))));
                }
            }
        }
    }
}
