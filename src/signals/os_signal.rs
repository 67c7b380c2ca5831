//! # OS signal identifiers.
//!
//! [`OsSignal`] names the signals a watcher can subscribe to. The common ones
//! have their own variant; anything else is reachable through [`OsSignal::Raw`].

use std::fmt;

/// An OS signal a [`SignalWatcher`](crate::SignalWatcher) can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsSignal {
    /// `SIGINT` (Ctrl-C in a terminal).
    Interrupt,
    /// `SIGTERM` (default kill signal, used by systemd/Kubernetes).
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`, conventionally "reload configuration".
    Hangup,
    /// `SIGUSR1`.
    User1,
    /// `SIGUSR2`.
    User2,
    /// Any other signal by number.
    Raw(i32),
}

impl OsSignal {
    /// Signals that conventionally request a graceful stop.
    pub const TERMINATION: [OsSignal; 3] = [OsSignal::Interrupt, OsSignal::Terminate, OsSignal::Quit];

    /// Conventional name, e.g. `"SIGTERM"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            OsSignal::Interrupt => "SIGINT",
            OsSignal::Terminate => "SIGTERM",
            OsSignal::Quit => "SIGQUIT",
            OsSignal::Hangup => "SIGHUP",
            OsSignal::User1 => "SIGUSR1",
            OsSignal::User2 => "SIGUSR2",
            OsSignal::Raw(_) => "signal",
        }
    }

    /// Matching tokio signal kind.
    #[cfg(unix)]
    pub(crate) fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            OsSignal::Interrupt => SignalKind::interrupt(),
            OsSignal::Terminate => SignalKind::terminate(),
            OsSignal::Quit => SignalKind::quit(),
            OsSignal::Hangup => SignalKind::hangup(),
            OsSignal::User1 => SignalKind::user_defined1(),
            OsSignal::User2 => SignalKind::user_defined2(),
            OsSignal::Raw(n) => SignalKind::from_raw(*n),
        }
    }

    /// Platform signal number.
    #[cfg(unix)]
    pub fn as_raw(&self) -> i32 {
        self.kind().as_raw_value()
    }
}

impl fmt::Display for OsSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsSignal::Raw(n) => write!(f, "signal {n}"),
            other => f.write_str(other.as_str()),
        }
    }
}
