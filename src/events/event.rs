//! # Runtime events emitted by the supervisor, routines and signal watchers.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Routine events**: routine lifecycle (starting, done, failed, shutdown requested)
//! - **Value events**: the shared value changed
//! - **Supervisor events**: signals observed, shutdown requested, all workers stopped
//! - **Subscriber events**: subscriber queue overflow or panic
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! routine name, signal and reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use appvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RoutineFailed)
//!     .with_routine("worker")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, EventKind::RoutineFailed);
//! assert_eq!(ev.routine.as_deref(), Some("worker"));
//! assert_eq!(ev.reason.as_deref(), Some("boom"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

use crate::signals::OsSignal;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `routine`: subscriber name
    /// - `reason`: panic info
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `routine`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Supervisor events ===
    /// An OS signal was received by a watcher.
    ///
    /// Sets:
    /// - `signal`: the received signal
    SignalReceived,

    /// Root scope cancelled through [`Supervisor::shutdown`](crate::Supervisor::shutdown).
    ///
    /// Sets:
    /// - `reason`: rendered cause (absent for a graceful stop)
    ShutdownRequested,

    /// Every routine run, watcher and value watcher has exited.
    AllStopped,

    // === Value events ===
    /// The shared value was replaced. This is the reserved "value" topic.
    ValueChanged,

    // === Routine lifecycle events ===
    /// Routine moved to `Run` and its handler is about to be invoked.
    ///
    /// Sets:
    /// - `routine`: routine name
    RoutineStarting,

    /// Routine handler returned `Ok(())`.
    ///
    /// Sets:
    /// - `routine`: routine name
    RoutineDone,

    /// Routine handler returned an error (or panicked).
    ///
    /// Sets:
    /// - `routine`: routine name
    /// - `reason`: rendered error
    RoutineFailed,

    /// A running routine's scope was cancelled by `routine_shutdown`.
    ///
    /// Sets:
    /// - `routine`: routine name
    RoutineShutdownRequested,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the routine (or subscriber), if applicable.
    pub routine: Option<Arc<str>>,
    /// Signal that triggered the event, if applicable.
    pub signal: Option<OsSignal>,
    /// Human-readable reason (errors, overflow details, shutdown cause).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            routine: None,
            signal: None,
            reason: None,
        }
    }

    /// Attaches a routine name.
    #[inline]
    pub fn with_routine(mut self, name: impl Into<Arc<str>>) -> Self {
        self.routine = Some(name.into());
        self
    }

    /// Attaches a signal.
    #[inline]
    pub fn with_signal(mut self, signal: OsSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_routine(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_routine(subscriber)
            .with_reason(info)
    }

    #[inline]
    pub fn is_value_changed(&self) -> bool {
        matches!(self.kind, EventKind::ValueChanged)
    }

    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
