//! # Routine registry.
//!
//! Maps routine names to their [`RoutineEntry`]. Names are unique and fixed
//! once `run` starts: [`Registry::freeze`] is called by the supervisor and every
//! later registration fails with [`RuntimeError::RegistryFrozen`].
//!
//! ## Rules
//! - Registry owns every entry; runs only hold `Arc` clones while active.
//! - Registering an existing name fails with [`RuntimeError::AlreadyRegistered`]
//!   and leaves the whole batch unapplied.
//! - Lookups take the read lock only for the duration of the map access.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::core::routine::{RoutineEntry, RoutineState};
use crate::error::RuntimeError;
use crate::routines::RoutineSpec;

struct Inner<V> {
    entries: HashMap<Arc<str>, Arc<RoutineEntry<V>>>,
    frozen: bool,
}

pub(crate) struct Registry<V> {
    inner: RwLock<Inner<V>>,
}

impl<V> Registry<V> {
    pub(crate) fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entries: HashMap::new(),
                frozen: false,
            }),
        }
    }

    /// Adds a batch of routines; all-or-nothing.
    pub(crate) fn register<I, S>(&self, routines: I) -> Result<(), RuntimeError>
    where
        I: IntoIterator<Item = (S, RoutineSpec<V>)>,
        S: Into<String>,
    {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.frozen {
            return Err(RuntimeError::RegistryFrozen);
        }

        let mut batch: HashMap<Arc<str>, Arc<RoutineEntry<V>>> = HashMap::new();
        for (name, spec) in routines {
            let name: Arc<str> = Arc::from(name.into());
            if inner.entries.contains_key(&name) || batch.contains_key(&name) {
                return Err(RuntimeError::AlreadyRegistered {
                    name: name.to_string(),
                });
            }
            let entry = RoutineEntry::new(Arc::clone(&name), spec.into_handler());
            batch.insert(name, Arc::new(entry));
        }
        inner.entries.extend(batch);
        Ok(())
    }

    /// Forbids further registration.
    pub(crate) fn freeze(&self) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .frozen = true;
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .frozen
    }

    pub(crate) fn get(&self, name: &str) -> Option<Arc<RoutineEntry<V>>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(name)
            .cloned()
    }

    pub(crate) fn state(&self, name: &str) -> RoutineState {
        self.get(name)
            .map_or(RoutineState::Unknown, |entry| entry.state())
    }

    /// Snapshot of all entries, in map iteration order.
    pub(crate) fn entries(&self) -> Vec<Arc<RoutineEntry<V>>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .values()
            .cloned()
            .collect()
    }

    /// Sorted list of registered names.
    pub(crate) fn names(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = inner.entries.keys().map(|n| n.to_string()).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RoutineError;
    use crate::routines::{App, RoutineFn};

    fn spec() -> RoutineSpec<u8> {
        RoutineSpec::new(RoutineFn::arc(|_app: App<u8>| async {
            Ok::<_, RoutineError>(())
        }))
    }

    #[test]
    fn unknown_name_reports_unknown_state() {
        let reg = Registry::<u8>::new();
        reg.register([("a", spec()), ("b", RoutineSpec::inert())])
            .unwrap();
        assert_eq!(reg.state("a"), RoutineState::Standby);
        assert_eq!(reg.state("b"), RoutineState::Standby);
        assert_eq!(reg.state("zzz"), RoutineState::Unknown);
        assert_eq!(reg.names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn duplicate_name_rejects_whole_batch() {
        let reg = Registry::<u8>::new();
        reg.register([("a", spec())]).unwrap();

        let err = reg.register([("b", spec()), ("a", spec())]).unwrap_err();
        assert!(matches!(err, RuntimeError::AlreadyRegistered { name } if name == "a"));
        assert!(reg.get("b").is_none());
    }

    #[test]
    fn frozen_registry_rejects_registration() {
        let reg = Registry::<u8>::new();
        reg.freeze();
        assert!(reg.is_frozen());
        let err = reg.register([("a", spec())]).unwrap_err();
        assert_eq!(err.as_label(), "runtime_registry_frozen");
    }
}
