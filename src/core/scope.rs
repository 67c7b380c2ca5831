//! # Root cancellation scope with a first-wins shutdown cause.
//!
//! [`RootScope`] owns the supervisor's root [`CancellationToken`]. Every routine
//! run and signal watcher derives a child token from it, so cancelling the root
//! cancels the whole tree.
//!
//! ```text
//! parent (optional)
//!   └─► root ──┬─► watcher #1 ... watcher #N
//!              └─► routine run ──► value watcher
//! ```
//!
//! The cause is recorded under the same lock that cancels the token: the first
//! `cancel` wins, later calls are no-ops. Cancellation coming from the parent
//! token leaves the cause empty.

use std::sync::{Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::error::ShutdownCause;

pub(crate) struct RootScope {
    token: CancellationToken,
    cause: Mutex<Option<ShutdownCause>>,
}

impl RootScope {
    pub(crate) fn new(parent: Option<&CancellationToken>) -> Self {
        let token = match parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        Self {
            token,
            cause: Mutex::new(None),
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels the root token, recording `cause` if this is the first cancellation.
    ///
    /// Returns `false` if the scope was already cancelled.
    pub(crate) fn cancel(&self, cause: Option<ShutdownCause>) -> bool {
        let mut slot = self.cause.lock().unwrap_or_else(PoisonError::into_inner);
        if self.token.is_cancelled() {
            return false;
        }
        *slot = cause;
        self.token.cancel();
        true
    }

    pub(crate) fn cause(&self) -> Option<ShutdownCause> {
        self.cause
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
