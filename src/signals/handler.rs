//! # Signal handler abstraction.
//!
//! [`SignalHandler`] is invoked once per received signal with a fresh
//! [`SignalCtx`]. Invocations for the same watcher are sequential; different
//! watchers run concurrently with each other and with routines.
//!
//! [`SignalFn`] adapts a closure `Fn(SignalCtx<V>) -> Fut`.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::signals::SignalCtx;

/// Handler invoked for each received OS signal.
#[async_trait]
pub trait SignalHandler<V>: Send + Sync + 'static {
    /// Handles one signal occurrence. `run` waits for in-flight calls on shutdown.
    async fn on_signal(&self, ctx: SignalCtx<V>);
}

/// Shared handle to a signal handler.
pub type SignalHandlerRef<V> = Arc<dyn SignalHandler<V>>;

/// Function-backed signal handler.
///
/// ## Example
/// ```rust
/// use appvisor::{SignalCtx, SignalFn, SignalHandlerRef};
///
/// let h: SignalHandlerRef<u32> = SignalFn::arc(|ctx: SignalCtx<u32>| async move {
///     ctx.set_value(ctx.value() + 1);
/// });
/// # let _ = h;
/// ```
pub struct SignalFn<F> {
    f: F,
}

impl<F> SignalFn<F> {
    /// Creates a new function-backed handler.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, V> SignalHandler<V> for SignalFn<F>
where
    V: Clone + Send + Sync + 'static,
    F: Fn(SignalCtx<V>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn on_signal(&self, ctx: SignalCtx<V>) {
        (self.f)(ctx).await
    }
}
