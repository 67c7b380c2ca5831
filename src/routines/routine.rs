//! # Routine handler abstraction.
//!
//! This module defines the [`Routine`] trait (async, cancelable) and the shared
//! handle type [`RoutineRef`], an `Arc<dyn Routine<V>>` suitable for sharing
//! across the runtime.
//!
//! A routine receives an [`App`] handle and should watch its cancellation
//! ([`App::cancelled`]) to stop cooperatively.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RoutineError;
use crate::routines::App;

/// # Asynchronous, cancelable routine handler.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use appvisor::{App, Routine, RoutineError};
///
/// struct Ticker;
///
/// #[async_trait]
/// impl Routine<u64> for Ticker {
///     async fn run(&self, app: App<u64>) -> Result<(), RoutineError> {
///         app.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Routine<V>: Send + Sync + 'static {
    /// Executes one run of the routine until completion or cancellation.
    ///
    /// `Ok(())` ends the run in `Done`, any error in `Failed`.
    async fn run(&self, app: App<V>) -> Result<(), RoutineError>;
}

/// Shared handle to a routine handler.
pub type RoutineRef<V> = Arc<dyn Routine<V>>;
