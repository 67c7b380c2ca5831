//! # Log sink.
//!
//! Installs a `tracing-subscriber` registry that writes plain-text lines
//!
//! ```text
//! [2024-05-01T10:00:00+02:00] INFO: routine starting (routine: ticker)
//! ```
//!
//! to stdout, stderr or an append-mode file. Level and target can be changed at
//! runtime through the returned [`LogHandle`], and a file target can be re-opened
//! after external rotation, typically from a signal watcher:
//!
//! ```text
//! let log = logging::init("/var/log/app.log", "info")?;
//! builder.with_signal_watchers(vec![log.reopen_watcher([OsSignal::User1]), ...])
//! ```

mod format;
mod sink;

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{reload, Registry};

pub use format::LineFormat;
pub use sink::LogTarget;

use crate::signals::{OsSignal, SignalCtx, SignalFn, SignalWatcher};
use sink::{LogSink, Output};

/// Errors from setting up or changing the log sink.
#[derive(Error, Debug)]
pub enum LoggingError {
    /// Level string is not one of `trace|debug|info|warn|error`.
    #[error("wrong loglevel value: {0}")]
    InvalidLevel(String),

    /// Log file could not be opened.
    #[error("can't open log file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A global subscriber is already installed.
    #[error("init logging error: {0}")]
    Init(String),

    /// The subscriber owning the level filter is gone.
    #[error("log level reload error: {0}")]
    Reload(String),
}

impl LoggingError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            LoggingError::InvalidLevel(_) => "logging_invalid_level",
            LoggingError::Open { .. } => "logging_open",
            LoggingError::Init(_) => "logging_init",
            LoggingError::Reload(_) => "logging_reload",
        }
    }
}

/// Parses a level name. `warning`, `fatal` and `panic` are accepted as aliases.
pub fn parse_level(level: &str) -> Result<LevelFilter, LoggingError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" | "warning" => Ok(LevelFilter::WARN),
        "error" | "fatal" | "panic" => Ok(LevelFilter::ERROR),
        _ => Err(LoggingError::InvalidLevel(level.to_string())),
    }
}

/// Runtime control over an installed log sink.
#[derive(Clone)]
pub struct LogHandle {
    sink: LogSink,
    level: reload::Handle<LevelFilter, Registry>,
}

impl LogHandle {
    /// Switches target and level. The new target is opened before the old one is released.
    pub fn change(&self, target: &str, level: &str) -> Result<(), LoggingError> {
        let filter = parse_level(level)?;
        let output = open_output(&LogTarget::parse(target))?;
        self.level
            .reload(filter)
            .map_err(|e| LoggingError::Reload(e.to_string()))?;
        drop(self.sink.replace(output));
        Ok(())
    }

    /// Re-opens the current log file. A no-op for stdout/stderr.
    pub fn reopen(&self) -> Result<(), LoggingError> {
        match self.sink.current() {
            Output::File(lf) => lf.reopen().map_err(|source| LoggingError::Open {
                path: lf.path().to_path_buf(),
                source,
            }),
            Output::Stdout | Output::Stderr => Ok(()),
        }
    }

    /// A signal watcher re-opening the log file on each of `signals`.
    pub fn reopen_watcher<V>(&self, signals: impl IntoIterator<Item = OsSignal>) -> SignalWatcher<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        let handle = self.clone();
        let reopen = SignalFn::arc(move |ctx: SignalCtx<V>| {
            let handle = handle.clone();
            async move {
                match handle.reopen() {
                    Ok(()) => tracing::debug!(signal = %ctx.signal(), "log file reopened"),
                    Err(error) => tracing::warn!(%error, "error reopening log file"),
                }
            }
        });
        SignalWatcher::new(signals, reopen)
    }
}

/// Builds the subscriber without installing it.
///
/// Useful with `tracing::dispatcher::with_default` in tests.
pub fn dispatch(target: &str, level: &str) -> Result<(Dispatch, LogHandle), LoggingError> {
    let filter = parse_level(level)?;
    let sink = LogSink::new(open_output(&LogTarget::parse(target))?);
    let (filter, level) = reload::Layer::new(filter);

    let subscriber = Registry::default().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .event_format(LineFormat)
            .with_writer(sink.clone()),
    );
    Ok((Dispatch::new(subscriber), LogHandle { sink, level }))
}

/// Installs the log sink as the global default subscriber.
pub fn init(target: &str, level: &str) -> Result<LogHandle, LoggingError> {
    let (dispatch, handle) = dispatch(target, level)?;
    tracing::dispatcher::set_global_default(dispatch)
        .map_err(|_| LoggingError::Init("unable to set global logging subscriber".to_string()))?;
    tracing::debug!("logging initialized");
    Ok(handle)
}

fn open_output(target: &LogTarget) -> Result<Output, LoggingError> {
    Output::open(target).map_err(|source| LoggingError::Open {
        path: match target {
            LogTarget::File(path) => path.clone(),
            LogTarget::Stdout | LogTarget::Stderr => PathBuf::new(),
        },
        source,
    })
}
