//! # Routine abstractions and handles.
//!
//! This module provides the routine-related types:
//! - [`Routine`] - trait for implementing async cancelable routine handlers
//! - [`RoutineFn`] - function-based routine implementation
//! - [`RoutineRef`] - shared reference to a routine (`Arc<dyn Routine<V>>`)
//! - [`RoutineSpec`] - what gets registered under a name (handler or inert)
//! - [`App`] - handle given to a running routine

mod app;
mod routine;
mod routine_fn;
mod spec;

pub use app::App;
pub use routine::{Routine, RoutineRef};
pub use routine_fn::RoutineFn;
pub use spec::RoutineSpec;
