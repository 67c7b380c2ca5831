//! # Function-backed routine (`RoutineFn`)
//!
//! [`RoutineFn`] wraps a closure `F: Fn(App<V>) -> Fut`, producing a fresh
//! future per run. State shared between runs must be held explicitly (e.g. an
//! `Arc<...>` captured by the closure).
//!
//! ## Example
//! ```rust
//! use appvisor::{App, RoutineError, RoutineFn, RoutineRef};
//!
//! let r: RoutineRef<u32> = RoutineFn::arc(|app: App<u32>| async move {
//!     app.cancelled().await;
//!     Ok::<_, RoutineError>(())
//! });
//! # let _ = r;
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RoutineError;
use crate::routines::{App, Routine};

/// Function-backed routine implementation.
pub struct RoutineFn<F> {
    f: F,
}

impl<F> RoutineFn<F> {
    /// Creates a new function-backed routine.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the routine and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, V> Routine<V> for RoutineFn<F>
where
    V: Clone + Send + Sync + 'static,
    F: Fn(App<V>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RoutineError>> + Send + 'static,
{
    async fn run(&self, app: App<V>) -> Result<(), RoutineError> {
        (self.f)(app).await
    }
}
