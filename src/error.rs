//! Error types used by the appvisor runtime and routines.
//!
//! This module defines the main error types:
//!
//! - [`RuntimeError`] - errors raised by the supervisor itself.
//! - [`RoutineError`] - errors returned by routine handlers.
//! - [`ShutdownCause`] - the terminal status handed to [`Supervisor::shutdown`](crate::Supervisor::shutdown).
//!
//! Each provides `as_label` for logs/metrics.

use std::sync::Arc;

use thiserror::Error;

use crate::signals::OsSignal;

/// Boxed error returned by value initializers and reload loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Exit status for a graceful stop.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit status for a failure-driven stop.
pub const EXIT_FAILURE: i32 = 1;

/// # Errors produced by the appvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Operation referenced a routine name that was never registered.
    #[error("routine not found: {name}")]
    NotFound {
        /// The unknown routine name.
        name: String,
    },

    /// A routine with the same name is already registered.
    #[error("routine already registered: {name}")]
    AlreadyRegistered {
        /// The duplicate routine name.
        name: String,
    },

    /// Registration attempted after `run` started.
    #[error("registry is frozen: supervisor is running")]
    RegistryFrozen,

    /// `run` was called more than once.
    #[error("supervisor is already running")]
    AlreadyRunning,

    /// Start requested after the root scope was cancelled.
    #[error("routine {name} not started: supervisor is shutting down")]
    ShuttingDown {
        /// The routine that was asked to start.
        name: String,
    },

    /// The shared value initializer failed; no worker was started.
    #[error("value initializer failed: {error}")]
    ValueInit {
        /// The initializer's error.
        #[source]
        error: BoxError,
    },

    /// An OS signal subscription could not be established; no worker was started.
    #[error("unable to subscribe to {signal}: {source}")]
    SignalRegister {
        /// The signal that failed.
        signal: OsSignal,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The supervisor was shut down with a cause.
    #[error("shutdown: {cause}")]
    Shutdown {
        /// The first cause passed to `shutdown`.
        cause: ShutdownCause,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use appvisor::RuntimeError;
    ///
    /// let err = RuntimeError::NotFound { name: "worker".into() };
    /// assert_eq!(err.as_label(), "runtime_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::NotFound { .. } => "runtime_not_found",
            RuntimeError::AlreadyRegistered { .. } => "runtime_already_registered",
            RuntimeError::RegistryFrozen => "runtime_registry_frozen",
            RuntimeError::AlreadyRunning => "runtime_already_running",
            RuntimeError::ShuttingDown { .. } => "runtime_shutting_down",
            RuntimeError::ValueInit { .. } => "runtime_value_init",
            RuntimeError::SignalRegister { .. } => "runtime_signal_register",
            RuntimeError::Shutdown { .. } => "runtime_shutdown",
        }
    }

    /// Returns the shutdown cause, if this error carries one.
    pub fn cause(&self) -> Option<&ShutdownCause> {
        match self {
            RuntimeError::Shutdown { cause } => Some(cause),
            _ => None,
        }
    }
}

/// # Errors returned by routine handlers.
///
/// The supervisor only looks at whether a handler returned an error; the
/// content is carried into events and logs.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutineError {
    /// Routine execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Routine stopped because its scope was cancelled and it chose to report it.
    #[error("context cancelled")]
    Canceled,
}

impl RoutineError {
    /// Builds a [`RoutineError::Fail`] from anything printable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        RoutineError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use appvisor::RoutineError;
    ///
    /// assert_eq!(RoutineError::fail("boom").as_label(), "routine_failed");
    /// assert_eq!(RoutineError::Canceled.as_label(), "routine_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RoutineError::Fail { .. } => "routine_failed",
            RoutineError::Canceled => "routine_canceled",
        }
    }
}

/// Terminal status passed to [`Supervisor::shutdown`](crate::Supervisor::shutdown)
/// and returned by [`Supervisor::run`](crate::Supervisor::run).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} (exit status {code})")]
pub struct ShutdownCause {
    code: i32,
    reason: Arc<str>,
}

impl ShutdownCause {
    /// Creates a cause with an explicit exit status.
    pub fn new(code: i32, reason: impl Into<Arc<str>>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// Creates a cause with [`EXIT_FAILURE`].
    pub fn failure(reason: impl Into<Arc<str>>) -> Self {
        Self::new(EXIT_FAILURE, reason)
    }

    /// Exit status carried by this cause.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Human-readable reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<RoutineError> for ShutdownCause {
    fn from(err: RoutineError) -> Self {
        ShutdownCause::failure(err.to_string())
    }
}
