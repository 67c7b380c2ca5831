//! Ticker daemon.
//!
//! ```text
//! cargo run --example ticker -- ticker.yml
//!
//! # ticker.yml
//! time_int: 2
//! logfile: /tmp/ticker.log
//! loglevel: debug
//! pidfile: /tmp/ticker.pid
//! ```
//!
//! - SIGINT / SIGTERM: graceful stop
//! - SIGHUP: reload `ticker.yml` (interval, log target/level, pidfile)
//! - SIGUSR1: reopen the log file after rotation

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use appvisor::logging::{self, LogHandle};
use appvisor::{
    pidfile, settings, App, LogWriter, OsSignal, RoutineError, RoutineFn, RoutineRef,
    RoutineSpec, RuntimeError, ShutdownCause, SignalCtx, SignalFn, SignalWatcher, Subscribe,
    Supervisor, SupervisorConfig, Terminate, EXIT_FAILURE, EXIT_SUCCESS,
};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TickerSettings {
    #[serde(default = "default_interval")]
    time_int: u64,
    #[serde(default = "default_logfile")]
    logfile: String,
    #[serde(default = "default_loglevel")]
    loglevel: String,
    #[serde(default)]
    pidfile: Option<PathBuf>,
}

fn default_interval() -> u64 {
    5
}

fn default_logfile() -> String {
    "stdout".into()
}

fn default_loglevel() -> String {
    "info".into()
}

impl Default for TickerSettings {
    fn default() -> Self {
        Self {
            time_int: default_interval(),
            logfile: default_logfile(),
            loglevel: default_loglevel(),
            pidfile: None,
        }
    }
}

impl TickerSettings {
    fn pidfile(&self) -> PathBuf {
        self.pidfile.clone().unwrap_or_default()
    }
}

fn ticker(offset: u64) -> RoutineRef<TickerSettings> {
    RoutineFn::arc(move |mut app: App<TickerSettings>| async move {
        let token = app.token();
        let mut interval = app.value().time_int + offset;
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(routine = app.name(), "done");
                    return Ok::<_, RoutineError>(());
                }
                _ = app.value_changed() => {
                    interval = app.value().time_int + offset;
                    tracing::info!(routine = app.name(), interval, "settings updated");
                }
                _ = tokio::time::sleep(Duration::from_secs(interval)) => {
                    tracing::info!(routine = app.name(), interval, "time to work");
                }
            }
        }
    })
}

fn reload(path: PathBuf, log: LogHandle) -> SignalWatcher<TickerSettings> {
    let handler = SignalFn::arc(move |ctx: SignalCtx<TickerSettings>| {
        let (path, log) = (path.clone(), log.clone());
        async move {
            let next = match settings::load::<TickerSettings>(&path) {
                Ok(next) => next,
                Err(error) => {
                    tracing::warn!(%error, "reload failed, keeping current settings");
                    return;
                }
            };
            let current = ctx.value();
            if let Err(error) = log.change(&next.logfile, &next.loglevel) {
                tracing::warn!(%error, "log settings not changed");
            }
            if let Err(error) = pidfile::change(current.pidfile(), next.pidfile()) {
                ctx.shutdown(Some(ShutdownCause::failure(error.to_string())));
                return;
            }
            tracing::info!(signal = %ctx.signal(), "settings reloaded");
            ctx.set_value(next);
        }
    });
    SignalWatcher::new([OsSignal::Hangup], handler)
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let path = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| "ticker.yml".to_string()),
    );
    let conf: TickerSettings = settings::load(&path)
        .with_context(|| format!("reading {}", path.display()))?;

    let log = logging::init(&conf.logfile, &conf.loglevel)?;
    pidfile::create(conf.pidfile())?;

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::default())];
    let sup = Supervisor::<TickerSettings>::builder(SupervisorConfig::default())
        .with_value(conf)
        .with_subscribers(subs)
        .with_routine("ticker", RoutineSpec::new(ticker(0)))
        .with_routine("ticker-slow", RoutineSpec::new(ticker(1)))
        .with_signal_watchers(vec![
            SignalWatcher::<TickerSettings>::new(
                [OsSignal::Interrupt, OsSignal::Terminate],
                Arc::new(Terminate),
            ),
            reload(path, log.clone()),
            log.reopen_watcher([OsSignal::User1]),
        ])
        .build()?;

    let code = match sup.run().await {
        Ok(()) => EXIT_SUCCESS,
        Err(RuntimeError::Shutdown { cause }) => {
            tracing::error!(%cause, "program terminating");
            cause.code()
        }
        Err(error) => {
            tracing::error!(%error, "program terminating");
            EXIT_FAILURE
        }
    };
    tracing::info!(exit_code = code, "program terminating");

    if let Err(error) = pidfile::remove(sup.value().pidfile()) {
        tracing::warn!(%error, "pidfile not removed");
    }
    std::process::exit(code);
}
