//! # Routine entry: lifecycle state machine of one named routine.
//!
//! ```text
//!             start (CAS)                handler Ok
//!  Standby ───────────────► Run ─────────────────────► Done
//!                            ▲ │       handler Err
//!                            │ └─────────────────────► Failed
//!                            │                          │
//!                            └──── start (CAS) ─────────┴── (Done / Failed)
//! ```
//!
//! ## Rules
//! - The state is an atomic tag; `* → Run` is a compare-and-swap performed while
//!   holding the token-slot mutex, so two concurrent starts yield one run.
//! - Only the worker that won the swap moves the routine out of `Run`.
//! - Every run gets a fresh child token; it is cancelled and dropped on exit.
//! - An entry without handler is inert and stays `Standby` forever.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::routines::RoutineRef;

/// Lifecycle state of a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineState {
    /// The name is not registered.
    Unknown,
    /// Registered, never started.
    Standby,
    /// Handler is running.
    Run,
    /// Last run returned `Ok(())`.
    Done,
    /// Last run returned an error.
    Failed,
}

impl RoutineState {
    const STANDBY: u8 = 0;
    const RUN: u8 = 1;
    const DONE: u8 = 2;
    const FAILED: u8 = 3;

    fn from_tag(tag: u8) -> Self {
        match tag {
            Self::STANDBY => RoutineState::Standby,
            Self::RUN => RoutineState::Run,
            Self::DONE => RoutineState::Done,
            Self::FAILED => RoutineState::Failed,
            _ => RoutineState::Unknown,
        }
    }

    /// Returns a short stable label.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoutineState::Unknown => "unknown",
            RoutineState::Standby => "standby",
            RoutineState::Run => "run",
            RoutineState::Done => "success",
            RoutineState::Failed => "failed",
        }
    }

    /// True for `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RoutineState::Done | RoutineState::Failed)
    }
}

impl fmt::Display for RoutineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) struct RoutineEntry<V> {
    name: Arc<str>,
    handler: Option<RoutineRef<V>>,
    state: AtomicU8,
    run_token: Mutex<Option<CancellationToken>>,
}

impl<V> RoutineEntry<V> {
    pub(crate) fn new(name: Arc<str>, handler: Option<RoutineRef<V>>) -> Self {
        Self {
            name,
            handler,
            state: AtomicU8::new(RoutineState::STANDBY),
            run_token: Mutex::new(None),
        }
    }

    pub(crate) fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub(crate) fn state(&self) -> RoutineState {
        RoutineState::from_tag(self.state.load(Ordering::Acquire))
    }

    /// Claims a new run: moves the state to `Run` and derives the run token from `parent`.
    ///
    /// Returns `None` for inert entries and when a run is already in progress.
    pub(crate) fn try_begin(
        &self,
        parent: &CancellationToken,
    ) -> Option<(RoutineRef<V>, CancellationToken)> {
        let handler = self.handler.clone()?;
        let mut slot = self.run_token.lock().unwrap_or_else(PoisonError::into_inner);
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current == RoutineState::RUN {
                return None;
            }
            match self.state.compare_exchange(
                current,
                RoutineState::RUN,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
        let token = parent.child_token();
        *slot = Some(token.clone());
        Some((handler, token))
    }

    /// Ends the current run with `Done` (`ok`) or `Failed`.
    pub(crate) fn finish(&self, ok: bool) {
        let mut slot = self.run_token.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = slot.take() {
            token.cancel();
        }
        let next = if ok {
            RoutineState::DONE
        } else {
            RoutineState::FAILED
        };
        self.state.store(next, Ordering::Release);
    }

    /// Cancels the current run.
    ///
    /// Returns `true` only if this call cancelled a live run token.
    pub(crate) fn shutdown(&self) -> bool {
        let slot = self.run_token.lock().unwrap_or_else(PoisonError::into_inner);
        if self.state() != RoutineState::Run {
            return false;
        }
        match slot.as_ref() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoutineError;
    use crate::routines::{App, RoutineFn};

    fn entry(inert: bool) -> RoutineEntry<()> {
        let handler: RoutineRef<()> =
            RoutineFn::arc(|_app: App<()>| async { Ok::<_, RoutineError>(()) });
        RoutineEntry::new(Arc::from("worker"), (!inert).then_some(handler))
    }

    #[test]
    fn inert_entry_never_leaves_standby() {
        let e = entry(true);
        let root = CancellationToken::new();
        assert!(e.try_begin(&root).is_none());
        assert!(!e.shutdown());
        assert_eq!(e.state(), RoutineState::Standby);
    }

    #[test]
    fn second_begin_while_running_is_dropped() {
        let e = entry(false);
        let root = CancellationToken::new();

        let (_, first) = e.try_begin(&root).unwrap();
        assert_eq!(e.state(), RoutineState::Run);
        assert!(e.try_begin(&root).is_none());

        e.finish(true);
        assert!(first.is_cancelled());
        assert_eq!(e.state(), RoutineState::Done);
    }

    #[test]
    fn restart_from_terminal_state_uses_fresh_token() {
        let e = entry(false);
        let root = CancellationToken::new();

        let (_, first) = e.try_begin(&root).unwrap();
        e.finish(false);
        assert_eq!(e.state(), RoutineState::Failed);

        let (_, second) = e.try_begin(&root).unwrap();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert_eq!(e.state(), RoutineState::Run);
    }

    #[test]
    fn shutdown_is_idempotent() {
        let e = entry(false);
        let root = CancellationToken::new();

        assert!(!e.shutdown());
        let (_, token) = e.try_begin(&root).unwrap();
        assert!(e.shutdown());
        assert!(token.is_cancelled());
        assert!(!e.shutdown());

        e.finish(true);
        assert!(!e.shutdown());
        assert_eq!(e.state(), RoutineState::Done);
    }

    #[test]
    fn root_cancellation_reaches_run_token() {
        let e = entry(false);
        let root = CancellationToken::new();
        let (_, token) = e.try_begin(&root).unwrap();
        root.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn state_labels() {
        assert_eq!(RoutineState::Done.to_string(), "success");
        assert_eq!(RoutineState::Unknown.as_str(), "unknown");
        assert!(RoutineState::Failed.is_terminal());
        assert!(!RoutineState::Run.is_terminal());
    }
}
