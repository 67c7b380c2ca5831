//! # YAML settings loading.
//!
//! [`load`] reads any `DeserializeOwned` type from a YAML file. [`AppSettings`]
//! carries the keys every daemon needs (log target, log level, pidfile); an
//! application with more keys defines its own struct with the same fields.
//!
//! A failed load is fatal when it happens in the value initializer and a
//! failed reload otherwise (see [`Reload`](crate::Reload)).

use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

/// Errors from reading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("settings read error: {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid YAML for the target type.
    #[error("settings parse error: {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl SettingsError {
    /// Returns a short stable label.
    pub fn as_label(&self) -> &'static str {
        match self {
            SettingsError::Read { .. } => "settings_read",
            SettingsError::Parse { .. } => "settings_parse",
        }
    }
}

/// Logging and pidfile settings shared by daemons.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppSettings {
    /// `stdout`, `stderr` or a file path.
    #[serde(default = "default_logfile")]
    pub logfile: String,
    /// `trace|debug|info|warn|error`.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,
    /// PID file path; no pidfile when absent.
    #[serde(default)]
    pub pidfile: Option<PathBuf>,
}

fn default_logfile() -> String {
    "stdout".to_string()
}

fn default_loglevel() -> String {
    "info".to_string()
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            logfile: default_logfile(),
            loglevel: default_loglevel(),
            pidfile: None,
        }
    }
}

/// Reads and parses the YAML file at `path`.
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, SettingsError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_apply_for_missing_keys() {
        let f = write_tmp("loglevel: debug\n");
        let s: AppSettings = load(f.path()).unwrap();
        assert_eq!(s.logfile, "stdout");
        assert_eq!(s.loglevel, "debug");
        assert_eq!(s.pidfile, None);
    }

    #[test]
    fn full_document_parses() {
        let f = write_tmp("logfile: /var/log/app.log\nloglevel: warn\npidfile: /run/app.pid\n");
        let s: AppSettings = load(f.path()).unwrap();
        assert_eq!(s.logfile, "/var/log/app.log");
        assert_eq!(s.pidfile, Some(PathBuf::from("/run/app.pid")));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let f = write_tmp("loglevel: info\nverbose: true\n");
        let err = load::<AppSettings>(f.path()).unwrap_err();
        assert_eq!(err.as_label(), "settings_parse");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load::<AppSettings>(dir.path().join("nope.yml")).unwrap_err();
        assert_eq!(err.as_label(), "settings_read");
    }
}
