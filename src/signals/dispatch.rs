//! # Signal dispatch loop.
//!
//! One loop per watcher, spawned on the supervisor's task tracker under a child
//! of the root token.
//!
//! ```text
//! loop {
//!   select! (biased) {
//!     token.cancelled()  → exit
//!     listener.recv()    → publish SignalReceived
//!                          handler.on_signal(SignalCtx)   (awaited inline)
//!   }
//! }
//! ```
//!
//! The handler is awaited inside the tracked task, so `run` waits for in-flight
//! handlers. A panicking handler is logged and the loop continues.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::Supervisor;
use crate::events::{Event, EventKind};
use crate::signals::{SignalCtx, SignalListener, SignalWatcher};
use crate::subscribers::panic_info;

pub(crate) async fn dispatch<V>(
    watcher: SignalWatcher<V>,
    mut listener: SignalListener,
    token: CancellationToken,
    sup: Arc<Supervisor<V>>,
) where
    V: Clone + Send + Sync + 'static,
{
    loop {
        let signal = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            sig = listener.recv() => match sig {
                Some(sig) => sig,
                None => break,
            },
        };

        tracing::debug!(%signal, "signal received");
        sup.bus()
            .publish(Event::new(EventKind::SignalReceived).with_signal(signal));

        let Some(handler) = watcher.handler() else {
            continue;
        };
        let ctx = SignalCtx::new(signal, token.clone(), Arc::clone(&sup));
        if let Err(panic) = AssertUnwindSafe(handler.on_signal(ctx)).catch_unwind().await {
            tracing::warn!(%signal, panic = %panic_info(&*panic), "signal handler panicked");
        }
    }
}
