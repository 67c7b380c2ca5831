//! # Run a single routine run.
//!
//! Executes one run of a routine handler and records its terminal state.
//!
//! ## Flow
//! ```text
//! try_begin (state = Run, fresh run token)      [in Supervisor::start_entry]
//!   └─► run_routine()
//!         ├─► value::watch(subscription, child of run token)
//!         ├─► publish RoutineStarting
//!         ├─► handler.run(App)                  (panics are caught)
//!         ├─► cancel + join value watcher
//!         ├─► entry.finish(ok)                  (state = Done | Failed)
//!         └─► publish RoutineDone | RoutineFailed
//! ```
//!
//! ## Rules
//! - The terminal state depends only on whether the handler returned an error.
//! - A failed routine does **not** cancel the root scope.
//! - The value watcher is fully stopped before the state leaves `Run`.

use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::core::routine::RoutineEntry;
use crate::core::supervisor::Supervisor;
use crate::core::value;
use crate::error::RoutineError;
use crate::events::{Event, EventKind};
use crate::routines::{App, RoutineRef};
use crate::subscribers::panic_info;

pub(crate) async fn run_routine<V>(
    sup: Arc<Supervisor<V>>,
    entry: Arc<RoutineEntry<V>>,
    handler: RoutineRef<V>,
    token: CancellationToken,
) where
    V: Clone + Send + Sync + 'static,
{
    let name = Arc::clone(entry.name());
    let watch_token = token.child_token();
    let (notify, watcher) = value::watch(
        sup.value_store().subscribe(),
        sup.tracker(),
        watch_token.clone(),
    );

    tracing::debug!(routine = %name, "routine starting");
    sup.bus()
        .publish(Event::new(EventKind::RoutineStarting).with_routine(Arc::clone(&name)));

    let app = App::new(Arc::clone(&name), token, notify, Arc::clone(&sup));
    let res = match std::panic::AssertUnwindSafe(handler.run(app))
        .catch_unwind()
        .await
    {
        Ok(res) => res,
        Err(panic) => Err(RoutineError::fail(format!(
            "panicked: {}",
            panic_info(panic.as_ref())
        ))),
    };

    watch_token.cancel();
    let _ = watcher.await;

    match res {
        Ok(()) => {
            entry.finish(true);
            tracing::debug!(routine = %name, "routine done");
            sup.bus()
                .publish(Event::new(EventKind::RoutineDone).with_routine(name));
        }
        Err(err) => {
            entry.finish(false);
            tracing::debug!(routine = %name, error = %err, "routine failed");
            sup.bus().publish(
                Event::new(EventKind::RoutineFailed)
                    .with_routine(name)
                    .with_reason(err.to_string()),
            );
        }
    }
}
