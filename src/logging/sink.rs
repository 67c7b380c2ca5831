//! Switchable log output.
//!
//! [`LogSink`] is the `MakeWriter` handed to the fmt layer. Its current
//! [`Output`] can be swapped at runtime, and a file output can be re-opened in
//! place after an external rotation.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing_subscriber::fmt::MakeWriter;

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard output (`""` or `"stdout"`).
    Stdout,
    /// Standard error (`"stderr"`).
    Stderr,
    /// A file opened in append mode, created if missing.
    File(PathBuf),
}

impl LogTarget {
    /// Parses a settings string.
    pub fn parse(s: &str) -> Self {
        match s {
            "" | "stdout" => LogTarget::Stdout,
            "stderr" => LogTarget::Stderr,
            path => LogTarget::File(PathBuf::from(path)),
        }
    }
}

impl From<&str> for LogTarget {
    fn from(s: &str) -> Self {
        LogTarget::parse(s)
    }
}

/// A log file that can be re-opened at the same path.
#[derive(Debug)]
pub(crate) struct LogFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl LogFile {
    pub(crate) fn open(path: &Path) -> io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(open_append(path)?),
        })
    }

    /// Opens the path again and swaps the handle. On failure the old handle stays.
    pub(crate) fn reopen(&self) -> io::Result<()> {
        let fresh = open_append(&self.path)?;
        *self.file.lock().unwrap_or_else(PoisonError::into_inner) = fresh;
        Ok(())
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().append(true).create(true).open(path)
}

#[derive(Debug, Clone)]
pub(crate) enum Output {
    Stdout,
    Stderr,
    File(Arc<LogFile>),
}

impl Output {
    pub(crate) fn open(target: &LogTarget) -> io::Result<Self> {
        Ok(match target {
            LogTarget::Stdout => Output::Stdout,
            LogTarget::Stderr => Output::Stderr,
            LogTarget::File(path) => Output::File(Arc::new(LogFile::open(path)?)),
        })
    }
}

/// `MakeWriter` over the current output.
#[derive(Debug, Clone)]
pub(crate) struct LogSink {
    current: Arc<RwLock<Output>>,
}

impl LogSink {
    pub(crate) fn new(output: Output) -> Self {
        Self {
            current: Arc::new(RwLock::new(output)),
        }
    }

    pub(crate) fn current(&self) -> Output {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Installs `output` and returns the previous one.
    pub(crate) fn replace(&self, output: Output) -> Output {
        let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *slot, output)
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = OutputWriter;

    fn make_writer(&'a self) -> Self::Writer {
        OutputWriter(self.current())
    }
}

pub(crate) struct OutputWriter(Output);

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.0 {
            Output::Stdout => io::stdout().write(buf),
            Output::Stderr => io::stderr().write(buf),
            Output::File(lf) => lf.file.lock().unwrap_or_else(PoisonError::into_inner).write(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        match &self.0 {
            Output::Stdout => io::stdout().lock().write_all(buf),
            Output::Stderr => io::stderr().lock().write_all(buf),
            Output::File(lf) => lf
                .file
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .write_all(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.0 {
            Output::Stdout => io::stdout().flush(),
            Output::Stderr => io::stderr().flush(),
            Output::File(lf) => lf.file.lock().unwrap_or_else(PoisonError::into_inner).flush(),
        }
    }
}
