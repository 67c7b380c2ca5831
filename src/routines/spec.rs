//! # Routine registration entry.
//!
//! [`RoutineSpec`] is what gets registered under a name: a handler, or nothing.
//! A spec without handler registers an **inert** routine that stays `Standby`.

use crate::routines::RoutineRef;

/// Registration entry for one named routine.
pub struct RoutineSpec<V> {
    handler: Option<RoutineRef<V>>,
}

impl<V> RoutineSpec<V> {
    /// A routine driven by `handler`.
    pub fn new(handler: RoutineRef<V>) -> Self {
        Self {
            handler: Some(handler),
        }
    }

    /// A routine with no handler; it never leaves `Standby`.
    pub fn inert() -> Self {
        Self { handler: None }
    }

    /// True if the spec has no handler.
    pub fn is_inert(&self) -> bool {
        self.handler.is_none()
    }

    pub(crate) fn into_handler(self) -> Option<RoutineRef<V>> {
        self.handler
    }
}

impl<V> From<RoutineRef<V>> for RoutineSpec<V> {
    fn from(handler: RoutineRef<V>) -> Self {
        Self::new(handler)
    }
}

impl<V> Clone for RoutineSpec<V> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
        }
    }
}
