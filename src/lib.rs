//! # appvisor
//!
//! **Appvisor** is an in-process application lifecycle supervisor for tokio
//! daemons.
//!
//! It runs a set of named long-lived routines under a shared cancellation
//! tree, multiplexes OS signals into typed handlers, coordinates graceful
//! shutdown, and lets routines react to changes of a shared application value.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ┌──────────────┐   ┌──────────────┐   ┌───────────────┐   ┌───────────────┐
//!   │ RoutineSpec  │   │ RoutineSpec  │   │ SignalWatcher │   │ value init    │
//!   │  "ticker"    │   │  "server"    │   │ SIGTERM→Term. │   │ (settings)    │
//!   └──────┬───────┘   └──────┬───────┘   └───────┬───────┘   └───────┬───────┘
//!          ▼                  ▼                   ▼                   ▼
//! ┌────────────────────────────────────────────────────────────────────────────┐
//! │  Supervisor<V>                                                             │
//! │  - RootScope (root CancellationToken + first-wins ShutdownCause)           │
//! │  - Registry (name → RoutineEntry, frozen at run)                           │
//! │  - ValueStore<V> (shared value, ValueChanged on the Bus)                   │
//! │  - TaskTracker (completion barrier for every spawned worker)               │
//! └──────┬──────────────────┬───────────────────┬──────────────────────────────┘
//!        ▼                  ▼                   ▼
//!  ┌────────────┐     ┌────────────┐     ┌──────────────┐
//!  │ run_routine│     │ run_routine│     │ dispatch     │
//!  │  App<V>    │     │  App<V>    │     │  SignalCtx<V>│
//!  │  + value   │     │  + value   │     │              │
//!  │    watcher │     │    watcher │     │              │
//!  └─────┬──────┘     └─────┬──────┘     └──────┬───────┘
//!        ▼                  ▼                   ▼
//! ┌────────────────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                             │
//! └────────────────────────────────────┬───────────────────────────────────────┘
//!                                      ▼
//!                           subscriber_listener ──► SubscriberSet ──► Subscribe
//! ```
//!
//! ### Routine lifecycle
//! ```text
//!            register            routine_start / run
//! Unknown ───────────► Standby ─────────────────────► Run
//!                         ▲                          │  │
//!                         │           Ok(())         │  │ Err / panic
//!                         │    Done ◄────────────────┘  └──────► Failed
//!                         │     │                                  │
//!                         │     └──────── routine_start ───────────┘──► Run
//! ```
//!
//! ## Features
//! | Area              | Description                                                     | Key types / traits                          |
//! |-------------------|-----------------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Run, start, stop and query named routines.                      | [`Supervisor`], [`SupervisorBuilder`]       |
//! | **Routines**      | Define routines as trait objects or closures.                   | [`Routine`], [`RoutineFn`], [`RoutineSpec`] |
//! | **Signals**       | Dispatch OS signals to handlers.                                | [`SignalWatcher`], [`SignalHandler`]        |
//! | **Shared value**  | Get/set a shared value, coalesced change notifications.         | [`ValueStore`], [`App::value_changed`]      |
//! | **Subscriber API**| Hook into lifecycle events (logging, metrics, custom).          | [`Subscribe`]                               |
//! | **Errors**        | Typed errors and shutdown causes.                               | [`RuntimeError`], [`RoutineError`]          |
//! | **Daemon helpers**| YAML settings, pidfile, log sink with reopen on signal.         | [`settings`], [`pidfile`], `logging`        |
//!
//! ## Optional features
//! - `logging` (default): the [`LogWriter`] subscriber and the `logging` module.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use appvisor::{
//!     App, OsSignal, RoutineError, RoutineFn, RoutineRef, RoutineSpec, SignalWatcher, Supervisor,
//!     SupervisorConfig, Terminate,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ticker: RoutineRef<u64> = RoutineFn::arc(|mut app: App<u64>| async move {
//!         let token = app.token();
//!         loop {
//!             tokio::select! {
//!                 _ = token.cancelled() => return Ok::<_, RoutineError>(()),
//!                 _ = app.value_changed() => println!("value is now {}", app.value()),
//!                 _ = tokio::time::sleep(Duration::from_millis(10)) => {
//!                     app.shutdown(None);
//!                 }
//!             }
//!         }
//!     });
//!
//!     let sup = Supervisor::<u64>::builder(SupervisorConfig::default())
//!         .with_routine("ticker", RoutineSpec::new(ticker))
//!         .with_signal_watchers(vec![SignalWatcher::<u64>::new(
//!             OsSignal::TERMINATION,
//!             Arc::new(Terminate),
//!         )])
//!         .build()?;
//!
//!     sup.run().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod routines;
mod signals;
mod subscribers;

pub mod pidfile;
pub mod settings;

// Optional: log sink with file targets and reopen on signal.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub mod logging;

// ---- Public re-exports ----

pub use crate::core::{
    RoutineState, Supervisor, SupervisorBuilder, SupervisorConfig, ValueInit, ValueNotify,
    ValueStore, ValueSubscription,
};
pub use error::{BoxError, RoutineError, RuntimeError, ShutdownCause, EXIT_FAILURE, EXIT_SUCCESS};
pub use events::{Bus, Event, EventKind};
pub use routines::{App, Routine, RoutineFn, RoutineRef, RoutineSpec};
pub use signals::{
    OsSignal, Reload, SignalCtx, SignalFn, SignalHandler, SignalHandlerRef, SignalWatcher,
    Terminate,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
