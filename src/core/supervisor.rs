//! # Supervisor: owns the root scope, the routine registry and the shared value.
//!
//! The [`Supervisor`] starts every registered routine and signal watcher under a
//! shared cancellation tree, tracks them with a completion barrier, and returns
//! the shutdown cause once everything has unwound.
//!
//! ## Key responsibilities
//! - keep the routine registry (fixed once [`Supervisor::run`] starts)
//! - start / stop / query routines by name
//! - hold the shared value and broadcast its changes
//! - dispatch OS signals to watcher handlers
//! - fan out runtime events to [`Subscribe`] implementations
//!
//! ## High-level architecture
//! ```text
//! run():
//!   ├─► started.swap(true)            (second call → AlreadyRunning)
//!   ├─► registry.freeze()
//!   ├─► value initializer             (error → ValueInit, nothing spawned)
//!   ├─► subscribe OS signals          (error → SignalRegister, nothing spawned)
//!   ├─► subscriber_listener: Bus ─► SubscriberSet::emit
//!   ├─► tracker.spawn(dispatch)       one per watcher, root.child_token()
//!   ├─► start_entry()                 one per routine, root.child_token()
//!   ├─► root.cancelled().await        ◄── shutdown(cause) / parent token
//!   ├─► tracker.close(); tracker.wait().await
//!   └─► cause: None → Ok(()), Some(c) → Err(Shutdown { cause: c })
//! ```
//!
//! ## Rules
//! - `shutdown` is the only path that ends `run`; routines finishing on their own
//!   do not.
//! - A routine's failure is recorded in its state and never cancels the root.
//! - `run` returns only after every routine run, watcher and value watcher exited.
//!   A handler that ignores its cancellation stalls `run` indefinitely.
//! - Starts and `tracker.close()` are serialized by `spawn_gate`: a start either
//!   lands on the barrier before it closes or is refused with `ShuttingDown`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::core::builder::SupervisorBuilder;
use crate::core::config::SupervisorConfig;
use crate::core::registry::Registry;
use crate::core::routine::{RoutineEntry, RoutineState};
use crate::core::runner;
use crate::core::scope::RootScope;
use crate::core::value::ValueStore;
use crate::error::{BoxError, RuntimeError, ShutdownCause};
use crate::events::{Bus, Event, EventKind};
use crate::routines::RoutineSpec;
use crate::signals::{dispatch, SignalListener, SignalWatcher};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Initializer producing the shared value at the start of [`Supervisor::run`].
pub type ValueInit<V> = Box<dyn FnOnce() -> Result<V, BoxError> + Send>;

/// Application lifecycle supervisor over a shared value of type `V`.
pub struct Supervisor<V> {
    cfg: SupervisorConfig,
    bus: Bus,
    scope: RootScope,
    registry: Registry<V>,
    watchers: Mutex<Vec<SignalWatcher<V>>>,
    value: ValueStore<V>,
    value_init: Mutex<Option<ValueInit<V>>>,
    subscribers: Mutex<Vec<Arc<dyn Subscribe>>>,
    tracker: TaskTracker,
    spawn_gate: Mutex<()>,
    started: AtomicBool,
}

impl<V> Supervisor<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a builder with the given configuration and `V::default()` as initial value.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder<V>
    where
        V: Default,
    {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: SupervisorConfig,
        initial: V,
        parent: Option<&CancellationToken>,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        Self {
            value: ValueStore::new(initial, bus.clone()),
            bus,
            scope: RootScope::new(parent),
            registry: Registry::new(),
            watchers: Mutex::new(Vec::new()),
            value_init: Mutex::new(None),
            subscribers: Mutex::new(subscribers),
            tracker: TaskTracker::new(),
            spawn_gate: Mutex::new(()),
            started: AtomicBool::new(false),
            cfg,
        }
    }

    /// Adds named routines. Fails for duplicate names and once `run` started.
    pub fn register_routines<I, S>(&self, routines: I) -> Result<(), RuntimeError>
    where
        I: IntoIterator<Item = (S, RoutineSpec<V>)>,
        S: Into<String>,
    {
        self.registry.register(routines)
    }

    /// Replaces the signal watcher list. Fails once `run` started.
    pub fn register_signal_watchers(
        &self,
        watchers: Vec<SignalWatcher<V>>,
    ) -> Result<(), RuntimeError> {
        let mut slot = self.watchers.lock().unwrap_or_else(PoisonError::into_inner);
        if self.started.load(Ordering::Acquire) {
            return Err(RuntimeError::RegistryFrozen);
        }
        *slot = watchers;
        Ok(())
    }

    /// Sets the initializer invoked once at the start of `run`. Fails once `run` started.
    pub fn set_value_init<F, E>(&self, init: F) -> Result<(), RuntimeError>
    where
        F: FnOnce() -> Result<V, E> + Send + 'static,
        E: Into<BoxError>,
    {
        let mut slot = self
            .value_init
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.started.load(Ordering::Acquire) {
            return Err(RuntimeError::RegistryFrozen);
        }
        *slot = Some(Box::new(move || init().map_err(Into::into)));
        Ok(())
    }

    /// Runs every registered routine and signal watcher until the root scope is
    /// cancelled and all of them have exited.
    ///
    /// Returns `Ok(())` for a graceful stop and [`RuntimeError::Shutdown`] when
    /// [`shutdown`](Self::shutdown) was given a cause.
    pub async fn run(self: &Arc<Self>) -> Result<(), RuntimeError> {
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(RuntimeError::AlreadyRunning);
        }
        self.registry.freeze();

        let init = self
            .value_init
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(init) = init {
            let value = init().map_err(|error| RuntimeError::ValueInit { error })?;
            self.value.init(value);
        }

        let watchers =
            std::mem::take(&mut *self.watchers.lock().unwrap_or_else(PoisonError::into_inner));
        let mut armed = Vec::with_capacity(watchers.len());
        for watcher in watchers {
            let listener = SignalListener::new(watcher.signals()).map_err(|(signal, source)| {
                tracing::error!(%signal, error = %source, "signal subscription failed");
                RuntimeError::SignalRegister { signal, source }
            })?;
            armed.push((watcher, listener));
        }

        let listener = self.subscriber_listener();

        for (watcher, signals) in armed {
            let token = self.scope.token().child_token();
            self.tracker
                .spawn(dispatch(watcher, signals, token, Arc::clone(self)));
        }
        for entry in self.registry.entries() {
            self.start_entry(&entry);
        }

        self.scope.token().cancelled().await;
        {
            let _gate = self.spawn_gate.lock().unwrap_or_else(PoisonError::into_inner);
            self.tracker.close();
        }
        self.tracker.wait().await;

        tracing::debug!("all workers stopped");
        self.bus.publish(Event::new(EventKind::AllStopped));
        listener.stop().await;

        match self.scope.cause() {
            None => Ok(()),
            Some(cause) => Err(RuntimeError::Shutdown { cause }),
        }
    }

    /// Returns the state of `name`, or [`RoutineState::Unknown`] if it is not registered.
    pub fn routine_state(&self, name: &str) -> RoutineState {
        self.registry.state(name)
    }

    /// Requests a (re)start of `name`. A no-op if it is already running or inert.
    ///
    /// Must be called from within a tokio runtime.
    pub fn routine_start(self: &Arc<Self>, name: &str) -> Result<(), RuntimeError> {
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| RuntimeError::NotFound {
                name: name.to_string(),
            })?;
        if self.scope.token().is_cancelled() || !self.start_entry(&entry) {
            return Err(RuntimeError::ShuttingDown {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Cancels the running routine `name`. A no-op for unknown or non-running routines.
    pub fn routine_shutdown(&self, name: &str) {
        let Some(entry) = self.registry.get(name) else {
            return;
        };
        if entry.shutdown() {
            tracing::debug!(routine = name, "routine shutdown requested");
            self.bus.publish(
                Event::new(EventKind::RoutineShutdownRequested)
                    .with_routine(Arc::clone(entry.name())),
            );
        }
    }

    /// Sorted list of registered routine names.
    pub fn routine_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Returns a clone of the shared value.
    pub fn value(&self) -> V {
        self.value.get()
    }

    /// Replaces the shared value and notifies running routines.
    pub fn set_value(&self, value: V) {
        self.value.set(value);
    }

    /// The shared value store.
    pub fn value_store(&self) -> &ValueStore<V> {
        &self.value
    }

    /// Cancels the root scope. The first cause wins; later calls are no-ops.
    pub fn shutdown(&self, cause: Option<ShutdownCause>) {
        let reason = cause.as_ref().map(ToString::to_string);
        if !self.scope.cancel(cause) {
            return;
        }
        let mut ev = Event::new(EventKind::ShutdownRequested);
        match reason {
            Some(reason) => {
                tracing::debug!(%reason, "shutdown requested");
                ev = ev.with_reason(reason);
            }
            None => tracing::debug!("shutdown requested"),
        }
        self.bus.publish(ev);
    }

    /// True once the root scope is cancelled.
    pub fn is_shutting_down(&self) -> bool {
        self.scope.token().is_cancelled()
    }

    /// True once `run` has been called.
    pub fn is_started(&self) -> bool {
        self.registry.is_frozen()
    }

    /// A child of the root token; cancelled when the supervisor shuts down.
    pub fn child_token(&self) -> CancellationToken {
        self.scope.token().child_token()
    }

    /// Subscribes to raw runtime events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    pub(crate) fn tracker(&self) -> &TaskTracker {
        &self.tracker
    }

    /// Claims and spawns a run of `entry`.
    ///
    /// Returns `false` once the barrier is closed; a run already in progress or an
    /// inert entry counts as started.
    fn start_entry(self: &Arc<Self>, entry: &Arc<RoutineEntry<V>>) -> bool {
        let _gate = self.spawn_gate.lock().unwrap_or_else(PoisonError::into_inner);
        if self.tracker.is_closed() {
            return false;
        }
        if let Some((handler, token)) = entry.try_begin(self.scope.token()) {
            self.tracker.spawn(runner::run_routine(
                Arc::clone(self),
                Arc::clone(entry),
                handler,
                token,
            ));
        }
        true
    }

    /// Forwards bus events to the subscriber set until stopped.
    fn subscriber_listener(&self) -> Listener {
        let subs = std::mem::take(
            &mut *self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let set = SubscriberSet::new(subs, self.bus.clone());
        let mut rx = self.bus.subscribe();
        let stop = CancellationToken::new();
        let stopped = stop.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "subscriber listener lagged");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stopped.cancelled() => break,
                }
            }
            set.shutdown().await;
        });
        Listener { stop, handle }
    }
}

struct Listener {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl Listener {
    /// Drains already-queued events, then joins the subscriber workers.
    async fn stop(self) {
        self.stop.cancel();
        let _ = self.handle.await;
    }
}
