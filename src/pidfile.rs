//! # PID file management.
//!
//! An empty path disables every operation, so a settings value of `""` means
//! "no pidfile".

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from pidfile operations.
#[derive(Error, Debug)]
pub enum PidfileError {
    /// The file is already there, likely from another instance.
    #[error("pidfile already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    /// Creating or writing the file failed.
    #[error("pidfile create error: {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Removing the file failed.
    #[error("pidfile remove error: {}: {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PidfileError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            PidfileError::AlreadyExists { .. } => "pidfile_already_exists",
            PidfileError::Create { .. } => "pidfile_create",
            PidfileError::Remove { .. } => "pidfile_remove",
        }
    }
}

fn is_unset(path: &Path) -> bool {
    path.as_os_str().is_empty()
}

/// Creates `path` containing the current process id.
pub fn create(path: impl AsRef<Path>) -> Result<(), PidfileError> {
    let path = path.as_ref();
    if is_unset(path) {
        return Ok(());
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| match source.kind() {
            io::ErrorKind::AlreadyExists => PidfileError::AlreadyExists {
                path: path.to_path_buf(),
            },
            _ => PidfileError::Create {
                path: path.to_path_buf(),
                source,
            },
        })?;
    write!(file, "{}", std::process::id()).map_err(|source| PidfileError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "pidfile created");
    Ok(())
}

/// Removes `path`.
pub fn remove(path: impl AsRef<Path>) -> Result<(), PidfileError> {
    let path = path.as_ref();
    if is_unset(path) {
        return Ok(());
    }
    std::fs::remove_file(path).map_err(|source| PidfileError::Remove {
        path: path.to_path_buf(),
        source,
    })
}

/// Moves the pidfile from `from` to `to`; the new file is created first.
pub fn change(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<(), PidfileError> {
    let (from, to) = (from.as_ref(), to.as_ref());
    if from == to {
        return Ok(());
    }
    create(to)?;
    remove(from)
}
