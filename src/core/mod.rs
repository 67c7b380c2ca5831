//! Runtime core: orchestration and lifecycle.
//!
//! This module contains the supervisor implementation. The public API from this
//! module is [`Supervisor`], its [`SupervisorBuilder`] and [`SupervisorConfig`],
//! the [`RoutineState`] enum and the shared [`ValueStore`].
//!
//! Internal modules:
//! - [`supervisor`]: root scope, registry, completion barrier, shared value;
//! - [`builder`]: assembles a supervisor before `run`;
//! - [`registry`]: routine name → entry map, frozen at `run`;
//! - [`routine`]: per-routine atomic state machine;
//! - [`runner`]: executes one routine run;
//! - [`scope`]: root cancellation token and shutdown cause;
//! - [`value`]: shared value store and coalescing change notifications.

mod builder;
mod config;
mod registry;
mod routine;
mod runner;
mod scope;
mod supervisor;
mod value;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use routine::RoutineState;
pub use supervisor::{Supervisor, ValueInit};
pub use value::{ValueNotify, ValueStore, ValueSubscription};
