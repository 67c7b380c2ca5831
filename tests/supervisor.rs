use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use appvisor::{
    App, Event, EventKind, RoutineError, RoutineFn, RoutineRef, RoutineSpec, RoutineState,
    RuntimeError, ShutdownCause, Subscribe, Supervisor, SupervisorConfig,
};

const WAIT: Duration = Duration::from_secs(5);

fn spawn_run<V>(sup: &Arc<Supervisor<V>>) -> JoinHandle<Result<(), RuntimeError>>
where
    V: Clone + Send + Sync + 'static,
{
    let sup = Arc::clone(sup);
    tokio::spawn(async move { sup.run().await })
}

async fn wait_state<V>(sup: &Supervisor<V>, name: &str, want: RoutineState)
where
    V: Clone + Send + Sync + 'static,
{
    tokio::time::timeout(WAIT, async {
        while sup.routine_state(name) != want {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{name} never reached {want}, is {}", sup.routine_state(name)));
}

async fn join(run: JoinHandle<Result<(), RuntimeError>>) -> Result<(), RuntimeError> {
    tokio::time::timeout(WAIT, run)
        .await
        .expect("run did not return")
        .expect("run task panicked")
}

/// Returns `Ok(())` once its run is cancelled.
fn until_cancelled<V>(starts: Arc<AtomicUsize>) -> RoutineRef<V>
where
    V: Clone + Send + Sync + 'static,
{
    RoutineFn::arc(move |app: App<V>| {
        let starts = Arc::clone(&starts);
        async move {
            starts.fetch_add(1, Ordering::SeqCst);
            app.cancelled().await;
            Ok::<_, RoutineError>(())
        }
    })
}

#[tokio::test]
async fn ticks_until_graceful_shutdown() {
    let ticks = Arc::new(AtomicUsize::new(0));
    let ticker: RoutineRef<()> = {
        let ticks = Arc::clone(&ticks);
        RoutineFn::arc(move |app: App<()>| {
            let ticks = Arc::clone(&ticks);
            async move {
                let mut interval = tokio::time::interval(Duration::from_millis(5));
                loop {
                    tokio::select! {
                        _ = app.cancelled() => return Ok::<_, RoutineError>(()),
                        _ = interval.tick() => {
                            if ticks.fetch_add(1, Ordering::SeqCst) + 1 == 4 {
                                app.shutdown(None);
                            }
                        }
                    }
                }
            }
        })
    };

    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("ticker", RoutineSpec::new(ticker))
        .build()
        .unwrap();

    join(spawn_run(&sup)).await.unwrap();

    assert_eq!(ticks.load(Ordering::SeqCst), 4);
    assert_eq!(sup.routine_state("ticker"), RoutineState::Done);
    assert!(sup.is_shutting_down());
}

#[tokio::test]
async fn failing_routine_does_not_stop_the_supervisor() {
    let failing: RoutineRef<u32> = RoutineFn::arc(|_app: App<u32>| async {
        Err::<(), _>(RoutineError::fail("sentinel"))
    });
    let starts = Arc::new(AtomicUsize::new(0));

    let sup = Supervisor::<u32>::builder(SupervisorConfig::default())
        .with_value(7)
        .with_routine("failing", RoutineSpec::new(failing))
        .with_routine("steady", RoutineSpec::new(until_cancelled(Arc::clone(&starts))))
        .build()
        .unwrap();
    let run = spawn_run(&sup);

    wait_state(&sup, "failing", RoutineState::Failed).await;
    wait_state(&sup, "steady", RoutineState::Run).await;
    assert!(!sup.is_shutting_down());
    assert_eq!(sup.value(), 7);

    sup.shutdown(None);
    join(run).await.unwrap();
    assert_eq!(sup.routine_state("failing"), RoutineState::Failed);
    assert_eq!(sup.routine_state("steady"), RoutineState::Done);
}

#[tokio::test]
async fn value_set_from_outside_wakes_routine() {
    let ready = Arc::new(Notify::new());
    let (seen_tx, mut seen_rx) = mpsc::channel::<u64>(4);

    let watcher: RoutineRef<u64> = {
        let ready = Arc::clone(&ready);
        RoutineFn::arc(move |mut app: App<u64>| {
            let ready = Arc::clone(&ready);
            let seen_tx = seen_tx.clone();
            async move {
                ready.notify_one();
                let token = app.token();
                loop {
                    tokio::select! {
                        _ = token.cancelled() => return Ok::<_, RoutineError>(()),
                        changed = app.value_changed() => {
                            if changed {
                                let _ = seen_tx.send(app.value()).await;
                            }
                        }
                    }
                }
            }
        })
    };

    let sup = Supervisor::<u64>::builder(SupervisorConfig::default())
        .with_routine("watcher", RoutineSpec::new(watcher))
        .build()
        .unwrap();
    let run = spawn_run(&sup);

    tokio::time::timeout(WAIT, ready.notified()).await.unwrap();
    let setter = {
        let sup = Arc::clone(&sup);
        tokio::spawn(async move { sup.set_value(42) })
    };
    setter.await.unwrap();

    let seen = tokio::time::timeout(WAIT, seen_rx.recv()).await.unwrap();
    assert_eq!(seen, Some(42));

    sup.shutdown(None);
    join(run).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_leave_one_whole_value() {
    let sup = Supervisor::<String>::builder(SupervisorConfig::default())
        .with_routine("idle", RoutineSpec::inert())
        .build()
        .unwrap();
    let run = spawn_run(&sup);

    let left = "a".repeat(64 * 1024);
    let right = "b".repeat(64 * 1024);
    for _ in 0..32 {
        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let writers: Vec<_> = [left.clone(), right.clone()]
            .into_iter()
            .map(|value| {
                let sup = Arc::clone(&sup);
                let barrier = Arc::clone(&barrier);
                tokio::spawn(async move {
                    barrier.wait().await;
                    sup.set_value(value);
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let read = sup.value();
        assert!(read == left || read == right, "torn value of len {}", read.len());
    }

    sup.shutdown(None);
    join(run).await.unwrap();
}

#[tokio::test]
async fn burst_of_writes_yields_one_notification() {
    let ready = Arc::new(Notify::new());
    let go = Arc::new(Notify::new());
    let (report_tx, mut report_rx) = mpsc::channel::<(bool, bool, u64)>(1);

    let reader: RoutineRef<u64> = {
        let (ready, go) = (Arc::clone(&ready), Arc::clone(&go));
        RoutineFn::arc(move |mut app: App<u64>| {
            let (ready, go) = (Arc::clone(&ready), Arc::clone(&go));
            let report_tx = report_tx.clone();
            async move {
                ready.notify_one();
                go.notified().await;
                let first = app.value_check();
                let second = app.value_check();
                let _ = report_tx.send((first, second, app.value())).await;
                app.cancelled().await;
                Ok::<_, RoutineError>(())
            }
        })
    };

    let sup = Supervisor::<u64>::builder(SupervisorConfig::default())
        .with_routine("reader", RoutineSpec::new(reader))
        .build()
        .unwrap();
    let run = spawn_run(&sup);

    tokio::time::timeout(WAIT, ready.notified()).await.unwrap();
    for v in 1..=5 {
        sup.set_value(v);
    }
    tokio::time::sleep(Duration::from_millis(50)).await;
    go.notify_one();

    let report = tokio::time::timeout(WAIT, report_rx.recv()).await.unwrap();
    assert_eq!(report, Some((true, false, 5)));

    sup.shutdown(None);
    join(run).await.unwrap();
}

#[tokio::test]
async fn inert_routine_stays_standby() {
    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("placeholder", RoutineSpec::inert())
        .build()
        .unwrap();
    let run = spawn_run(&sup);

    sup.routine_start("placeholder").unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(sup.routine_state("placeholder"), RoutineState::Standby);
    sup.routine_shutdown("placeholder");

    sup.shutdown(None);
    join(run).await.unwrap();
    assert_eq!(sup.routine_state("placeholder"), RoutineState::Standby);
}

#[tokio::test]
async fn unknown_names() {
    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .build()
        .unwrap();

    assert_eq!(sup.routine_state("ghost"), RoutineState::Unknown);
    let err = sup.routine_start("ghost").unwrap_err();
    assert!(matches!(err, RuntimeError::NotFound { ref name } if name == "ghost"));
    sup.routine_shutdown("ghost");
}

#[tokio::test]
async fn first_shutdown_cause_wins() {
    let starts = Arc::new(AtomicUsize::new(0));
    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("worker", RoutineSpec::new(until_cancelled(starts)))
        .build()
        .unwrap();
    let run = spawn_run(&sup);
    wait_state(&sup, "worker", RoutineState::Run).await;

    sup.shutdown(Some(ShutdownCause::new(3, "first")));
    sup.shutdown(Some(ShutdownCause::new(4, "second")));
    sup.shutdown(None);

    let err = join(run).await.unwrap_err();
    let cause = err.cause().expect("shutdown cause");
    assert_eq!(cause.code(), 3);
    assert_eq!(cause.reason(), "first");
    assert_eq!(err.as_label(), "runtime_shutdown");
}

#[tokio::test]
async fn finished_routine_can_be_restarted() {
    let runs = Arc::new(AtomicUsize::new(0));
    let once: RoutineRef<()> = {
        let runs = Arc::clone(&runs);
        RoutineFn::arc(move |_app: App<()>| {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok::<_, RoutineError>(())
            }
        })
    };

    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("once", RoutineSpec::new(once))
        .build()
        .unwrap();
    let run = spawn_run(&sup);

    wait_state(&sup, "once", RoutineState::Done).await;
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    sup.routine_start("once").unwrap();
    tokio::time::timeout(WAIT, async {
        while runs.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap();
    wait_state(&sup, "once", RoutineState::Done).await;

    sup.shutdown(None);
    join(run).await.unwrap();
}

#[tokio::test]
async fn concurrent_starts_run_the_handler_once() {
    let starts = Arc::new(AtomicUsize::new(0));
    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("worker", RoutineSpec::new(until_cancelled(Arc::clone(&starts))))
        .build()
        .unwrap();
    let run = spawn_run(&sup);
    wait_state(&sup, "worker", RoutineState::Run).await;

    let mut starters = Vec::new();
    for _ in 0..8 {
        let sup = Arc::clone(&sup);
        starters.push(tokio::spawn(async move { sup.routine_start("worker") }));
    }
    for s in starters {
        s.await.unwrap().unwrap();
    }
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(starts.load(Ordering::SeqCst), 1);

    sup.shutdown(None);
    join(run).await.unwrap();
}

#[tokio::test]
async fn routine_shutdown_stops_only_that_routine() {
    let starts = Arc::new(AtomicUsize::new(0));
    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("a", RoutineSpec::new(until_cancelled(Arc::clone(&starts))))
        .with_routine("b", RoutineSpec::new(until_cancelled(Arc::clone(&starts))))
        .build()
        .unwrap();
    let run = spawn_run(&sup);
    wait_state(&sup, "a", RoutineState::Run).await;
    wait_state(&sup, "b", RoutineState::Run).await;

    sup.routine_shutdown("a");
    wait_state(&sup, "a", RoutineState::Done).await;
    assert_eq!(sup.routine_state("b"), RoutineState::Run);
    assert!(!sup.is_shutting_down());

    // Stopped routines come back on demand.
    sup.routine_start("a").unwrap();
    wait_state(&sup, "a", RoutineState::Run).await;

    sup.shutdown(None);
    join(run).await.unwrap();
    assert_eq!(sup.routine_names(), vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn routine_can_stop_itself() {
    let quitter: RoutineRef<()> = RoutineFn::arc(|app: App<()>| async move {
        app.routine_shutdown(app.name());
        app.cancelled().await;
        Err::<(), _>(RoutineError::Canceled)
    });
    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("quitter", RoutineSpec::new(quitter))
        .build()
        .unwrap();
    let run = spawn_run(&sup);

    wait_state(&sup, "quitter", RoutineState::Failed).await;
    assert!(!sup.is_shutting_down());

    sup.shutdown(None);
    join(run).await.unwrap();
}

#[tokio::test]
async fn panicking_routine_is_failed() {
    let boom: RoutineRef<()> = RoutineFn::arc(|_app: App<()>| async {
        if true {
            panic!("boom");
        }
        Ok::<_, RoutineError>(())
    });
    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("boom", RoutineSpec::new(boom))
        .build()
        .unwrap();
    let run = spawn_run(&sup);

    wait_state(&sup, "boom", RoutineState::Failed).await;
    sup.shutdown(None);
    join(run).await.unwrap();
}

#[tokio::test]
async fn value_initializer_runs_before_routines() {
    let (seen_tx, mut seen_rx) = mpsc::channel::<String>(1);
    let reader: RoutineRef<String> = RoutineFn::arc(move |app: App<String>| {
        let seen_tx = seen_tx.clone();
        async move {
            let _ = seen_tx.send(app.value()).await;
            app.cancelled().await;
            Ok::<_, RoutineError>(())
        }
    });

    let sup = Supervisor::<String>::builder(SupervisorConfig::default())
        .with_value("default".into())
        .with_value_init(|| Ok::<_, std::io::Error>("from settings".to_string()))
        .with_routine("reader", RoutineSpec::new(reader))
        .build()
        .unwrap();
    let run = spawn_run(&sup);

    let seen = tokio::time::timeout(WAIT, seen_rx.recv()).await.unwrap();
    assert_eq!(seen.as_deref(), Some("from settings"));

    sup.shutdown(None);
    join(run).await.unwrap();
}

#[tokio::test]
async fn failing_initializer_starts_nothing() {
    let starts = Arc::new(AtomicUsize::new(0));
    let sup = Supervisor::<u8>::builder(SupervisorConfig::default())
        .with_value_init(|| Err::<u8, _>("bad config"))
        .with_routine("worker", RoutineSpec::new(until_cancelled(Arc::clone(&starts))))
        .build()
        .unwrap();

    let err = join(spawn_run(&sup)).await.unwrap_err();
    assert_eq!(err.as_label(), "runtime_value_init");
    assert_eq!(err.to_string(), "value initializer failed: bad config");
    assert_eq!(starts.load(Ordering::SeqCst), 0);
    assert_eq!(sup.routine_state("worker"), RoutineState::Standby);
}

#[tokio::test]
async fn run_twice_and_late_registration_are_rejected() {
    let starts = Arc::new(AtomicUsize::new(0));
    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("worker", RoutineSpec::new(until_cancelled(Arc::clone(&starts))))
        .build()
        .unwrap();
    let run = spawn_run(&sup);
    wait_state(&sup, "worker", RoutineState::Run).await;

    assert!(matches!(sup.run().await, Err(RuntimeError::AlreadyRunning)));
    let late = sup.register_routines([("late", RoutineSpec::inert())]);
    assert!(matches!(late, Err(RuntimeError::RegistryFrozen)));
    assert!(matches!(
        sup.register_signal_watchers(Vec::new()),
        Err(RuntimeError::RegistryFrozen)
    ));
    assert_eq!(sup.routine_state("late"), RoutineState::Unknown);

    sup.shutdown(None);
    join(run).await.unwrap();

    let err = sup.routine_start("worker").unwrap_err();
    assert_eq!(err.as_label(), "runtime_shutting_down");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn starts_racing_shutdown_never_outlive_run() {
    let starts = Arc::new(AtomicUsize::new(0));
    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("worker", RoutineSpec::new(until_cancelled(Arc::clone(&starts))))
        .build()
        .unwrap();
    let run = spawn_run(&sup);
    wait_state(&sup, "worker", RoutineState::Run).await;

    let starter = {
        let sup = Arc::clone(&sup);
        tokio::spawn(async move {
            loop {
                match sup.routine_start("worker") {
                    Ok(()) => tokio::task::yield_now().await,
                    Err(err) => return err,
                }
            }
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    sup.shutdown(None);

    join(run).await.unwrap();
    assert_ne!(sup.routine_state("worker"), RoutineState::Run);

    let err = tokio::time::timeout(WAIT, starter).await.unwrap().unwrap();
    assert_eq!(err.as_label(), "runtime_shutting_down");
    assert_ne!(sup.routine_state("worker"), RoutineState::Run);
}

#[tokio::test]
async fn duplicate_names_are_rejected() {
    let res = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_routine("twin", RoutineSpec::inert())
        .with_routine("twin", RoutineSpec::inert())
        .build();
    assert!(matches!(res, Err(RuntimeError::AlreadyRegistered { ref name }) if name == "twin"));
}

#[tokio::test]
async fn parent_token_cancels_everything() {
    let parent = CancellationToken::new();
    let starts = Arc::new(AtomicUsize::new(0));
    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_parent(parent.clone())
        .with_routine("worker", RoutineSpec::new(until_cancelled(Arc::clone(&starts))))
        .build()
        .unwrap();
    let run = spawn_run(&sup);
    wait_state(&sup, "worker", RoutineState::Run).await;

    parent.cancel();
    join(run).await.unwrap();
    assert_eq!(sup.routine_state("worker"), RoutineState::Done);
}

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(EventKind, Option<String>)>>,
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        let routine = ev.routine.as_deref().map(str::to_string);
        self.seen.lock().unwrap().push((ev.kind, routine));
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn lifecycle_events_reach_subscribers() {
    let recorder = Arc::new(Recorder::default());
    let once: RoutineRef<()> = RoutineFn::arc(|_app: App<()>| async { Ok::<_, RoutineError>(()) });

    let sup = Supervisor::<()>::builder(SupervisorConfig::default())
        .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
        .with_routine("once", RoutineSpec::new(once))
        .build()
        .unwrap();
    let run = spawn_run(&sup);
    wait_state(&sup, "once", RoutineState::Done).await;
    sup.shutdown(None);
    join(run).await.unwrap();

    let seen = recorder.seen.lock().unwrap().clone();
    let once = Some("once".to_string());
    let pos = |kind: EventKind, routine: &Option<String>| {
        seen.iter()
            .position(|(k, r)| *k == kind && r == routine)
            .unwrap_or_else(|| panic!("missing {kind:?} in {seen:?}"))
    };
    assert!(pos(EventKind::RoutineStarting, &once) < pos(EventKind::RoutineDone, &once));
    assert!(pos(EventKind::ShutdownRequested, &None) < pos(EventKind::AllStopped, &None));
}
