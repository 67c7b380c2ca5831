//! # LogWriter: renders runtime events as `tracing` records
//!
//! A subscriber that turns every [`Event`] into a structured log line. With the
//! crate's [`logging`](crate::logging) sink installed the output looks like:
//!
//! ```text
//! [2024-05-01T10:00:00+00:00] DEBUG: routine starting (routine: worker)
//! [2024-05-01T10:00:04+00:00] WARN: routine failed (routine: worker, reason: execution failed: boom)
//! [2024-05-01T10:00:05+00:00] INFO: signal received (signal: SIGHUP)
//! [2024-05-01T10:00:09+00:00] INFO: shutdown requested
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let routine = e.routine.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::RoutineStarting => debug!(routine, "routine starting"),
            EventKind::RoutineDone => debug!(routine, "routine done"),
            EventKind::RoutineFailed => warn!(routine, reason, "routine failed"),
            EventKind::RoutineShutdownRequested => debug!(routine, "routine shutdown requested"),
            EventKind::ValueChanged => debug!("value changed"),
            EventKind::SignalReceived => match e.signal {
                Some(signal) => info!(%signal, "signal received"),
                None => info!("signal received"),
            },
            EventKind::ShutdownRequested if e.reason.is_some() => {
                info!(reason, "shutdown requested")
            }
            EventKind::ShutdownRequested => info!("shutdown requested"),
            EventKind::AllStopped => debug!("all workers stopped"),
            EventKind::SubscriberOverflow => {
                warn!(subscriber = routine, reason, "subscriber dropped event")
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber = routine, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
