use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{
    config::SupervisorConfig,
    supervisor::{Supervisor, ValueInit},
};
use crate::error::{BoxError, RuntimeError};
use crate::routines::RoutineSpec;
use crate::signals::SignalWatcher;
use crate::subscribers::Subscribe;

/// Builder for constructing a [`Supervisor`].
pub struct SupervisorBuilder<V> {
    cfg: SupervisorConfig,
    value: V,
    routines: Vec<(String, RoutineSpec<V>)>,
    watchers: Vec<SignalWatcher<V>>,
    value_init: Option<ValueInit<V>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    parent: Option<CancellationToken>,
}

impl<V> SupervisorBuilder<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new builder with the given configuration and `V::default()` as initial value.
    pub fn new(cfg: SupervisorConfig) -> Self
    where
        V: Default,
    {
        Self {
            cfg,
            value: V::default(),
            routines: Vec::new(),
            watchers: Vec::new(),
            value_init: None,
            subscribers: Vec::new(),
            parent: None,
        }
    }

    /// Sets the initial shared value (overridden by a value initializer at `run`).
    pub fn with_value(mut self, value: V) -> Self {
        self.value = value;
        self
    }

    /// Registers one named routine.
    pub fn with_routine(mut self, name: impl Into<String>, spec: RoutineSpec<V>) -> Self {
        self.routines.push((name.into(), spec));
        self
    }

    /// Registers several named routines.
    pub fn with_routines<I, S>(mut self, routines: I) -> Self
    where
        I: IntoIterator<Item = (S, RoutineSpec<V>)>,
        S: Into<String>,
    {
        self.routines
            .extend(routines.into_iter().map(|(n, s)| (n.into(), s)));
        self
    }

    /// Sets the signal watchers (replaces any previous list).
    pub fn with_signal_watchers(mut self, watchers: Vec<SignalWatcher<V>>) -> Self {
        self.watchers = watchers;
        self
    }

    /// Sets the initializer invoked once at the start of `run`.
    ///
    /// A failing initializer aborts `run` before any worker starts.
    pub fn with_value_init<F, E>(mut self, init: F) -> Self
    where
        F: FnOnce() -> Result<V, E> + Send + 'static,
        E: Into<BoxError>,
    {
        self.value_init = Some(Box::new(move || init().map_err(Into::into)));
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Derives the root scope from `parent`: cancelling it stops the supervisor
    /// without a cause.
    pub fn with_parent(mut self, parent: CancellationToken) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Builds the supervisor. Fails if two routines share a name.
    pub fn build(self) -> Result<Arc<Supervisor<V>>, RuntimeError> {
        let sup = Supervisor::new_internal(
            self.cfg,
            self.value,
            self.parent.as_ref(),
            self.subscribers,
        );
        sup.register_routines(self.routines)?;
        sup.register_signal_watchers(self.watchers)?;
        if let Some(init) = self.value_init {
            sup.set_value_init(init)?;
        }
        Ok(Arc::new(sup))
    }
}
