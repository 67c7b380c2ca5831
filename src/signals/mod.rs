//! # OS signal watchers.
//!
//! - [`OsSignal`] - signal identifiers
//! - [`SignalWatcher`] - a set of signals plus an optional handler
//! - [`SignalHandler`] / [`SignalFn`] - handler trait and closure adapter
//! - [`SignalCtx`] - handle given to a handler invocation
//! - [`Terminate`] / [`Reload`] - predefined handlers
//!
//! Subscriptions are established synchronously when
//! [`Supervisor::run`](crate::Supervisor::run) starts; each watcher then gets
//! its own dispatch loop.

mod ctx;
mod dispatch;
mod handler;
mod handlers;
mod listener;
mod os_signal;
mod watcher;

pub use ctx::SignalCtx;
pub(crate) use dispatch::dispatch;
pub use handler::{SignalFn, SignalHandler, SignalHandlerRef};
pub use handlers::{Reload, Terminate};
pub(crate) use listener::SignalListener;
pub use os_signal::OsSignal;
pub use watcher::SignalWatcher;
