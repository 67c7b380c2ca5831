//! # Shared application value and its change broadcast.
//!
//! [`ValueStore`] holds the single shared value behind a lock. Every write is
//! announced on the store's own change channel (the reserved "value" topic) and
//! mirrored on the supervisor [`Bus`] as [`EventKind::ValueChanged`] for
//! subscribers. Other bus traffic never reaches value subscriptions.
//!
//! Each running routine gets its own watcher worker that turns the broadcast into
//! a **coalescing** single-slot queue ([`ValueNotify`]):
//!
//! ```text
//! set(v) ──► lock, store ──► changes.send(()) ──► Bus.publish(ValueChanged)
//!                                  │
//!          ┌───────────────────────┼───────────────────────┐
//!          ▼                       ▼                       ▼
//!   ValueSubscription       ValueSubscription       ValueSubscription
//!          │ watcher               │ watcher               │ watcher
//!          ▼ try_send(())          ▼                       ▼
//!   [slot: 0 or 1]           [slot: 0 or 1]          [slot: 0 or 1]
//!          │                       │                       │
//!    App::value_changed()    App::value_changed()    App::value_changed()
//! ```
//!
//! ## Rules
//! - The slot never holds more than one pending notification; N writes before the
//!   consumer looks yield exactly one wake-up.
//! - Notifications carry no value: consumers re-read with [`ValueStore::get`].
//! - A lagged subscription counts as a change: only writes travel on the channel.
//! - The publish happens after the new value is stored, so a woken consumer
//!   never reads an older value than the one that woke it.

use std::sync::{PoisonError, RwLock};

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::events::{Bus, Event, EventKind};

const CHANGES_CAPACITY: usize = 16;

/// Mutex-guarded shared value with change broadcast.
pub struct ValueStore<V> {
    value: RwLock<V>,
    changes: broadcast::Sender<()>,
    bus: Bus,
}

impl<V> ValueStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a store that also reports its changes on `bus`.
    pub fn new(initial: V, bus: Bus) -> Self {
        let (changes, _) = broadcast::channel(CHANGES_CAPACITY);
        Self {
            value: RwLock::new(initial),
            changes,
            bus,
        }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> V {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the value, wakes subscriptions and publishes [`EventKind::ValueChanged`].
    pub fn set(&self, value: V) {
        let mut slot = self.value.write().unwrap_or_else(PoisonError::into_inner);
        *slot = value;
        // No receivers is fine.
        let _ = self.changes.send(());
        drop(slot);
        self.bus.publish(Event::new(EventKind::ValueChanged));
    }

    /// Subscribes to subsequent changes.
    pub fn subscribe(&self) -> ValueSubscription {
        ValueSubscription {
            rx: self.changes.subscribe(),
        }
    }

    /// Replaces the value without publishing (initialization only).
    pub(crate) fn init(&self, value: V) {
        *self.value.write().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

/// Receiver of "value changed" broadcasts.
pub struct ValueSubscription {
    rx: broadcast::Receiver<()>,
}

impl ValueSubscription {
    /// Waits for the next change.
    ///
    /// Returns `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        match self.rx.recv().await {
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => true,
            Err(broadcast::error::RecvError::Closed) => false,
        }
    }
}

/// Single-slot "value changed since you last looked" flag owned by a routine.
#[derive(Debug)]
pub struct ValueNotify {
    rx: mpsc::Receiver<()>,
}

impl ValueNotify {
    /// Waits until the value changes.
    ///
    /// Returns `false` once the routine's watcher has stopped.
    pub async fn changed(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }

    /// Consumes a pending notification without waiting.
    pub fn check(&mut self) -> bool {
        let mut seen = false;
        while self.rx.try_recv().is_ok() {
            seen = true;
        }
        seen
    }
}

/// Spawns the per-routine watcher that folds broadcasts into a [`ValueNotify`].
///
/// The subscription is taken before this returns, so no write after the call is
/// missed. The watcher exits when `token` is cancelled.
pub(crate) fn watch(
    mut sub: ValueSubscription,
    tracker: &TaskTracker,
    token: CancellationToken,
) -> (ValueNotify, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel::<()>(1);
    let handle = tracker.spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                changed = sub.changed() => {
                    if !changed {
                        break;
                    }
                    // Full means a notification is already pending.
                    let _ = tx.try_send(());
                }
            }
        }
    });
    (ValueNotify { rx }, handle)
}
