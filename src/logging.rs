//! env_logger setup
//!
//! The log file is opened before the process daemonizes so that a bad path
//! is still reported on the terminal.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to open log file {path}: {source}")]
pub struct LogFileError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Where log lines end up
#[derive(Debug)]
pub enum LogTarget {
    Stderr,
    File(File),
}

impl LogTarget {
    /// Open `path` for appending, creating it if needed; `None` logs to stderr
    pub fn open(path: Option<&Path>) -> Result<Self, LogFileError> {
        match path {
            Some(path) => OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map(LogTarget::File)
                .map_err(|source| LogFileError {
                    path: path.to_path_buf(),
                    source,
                }),
            None => Ok(LogTarget::Stderr),
        }
    }
}

/// Install the global logger. `RUST_LOG` overrides the default `info` filter.
pub fn init(target: LogTarget) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    // Keep hyper/reqwest connection chatter out of the log unless asked for
    let log_level = std::env::var("RUST_LOG").unwrap_or_default();
    if !log_level.contains("hyper") {
        builder.filter_module("hyper", log::LevelFilter::Warn);
        builder.filter_module("hyper_util", log::LevelFilter::Warn);
    }

    let target = match target {
        LogTarget::Stderr => env_logger::Target::Stderr,
        LogTarget::File(file) => env_logger::Target::Pipe(Box::new(file)),
    };

    builder.target(target).format_timestamp_secs().init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_no_path_is_stderr() {
        assert!(matches!(LogTarget::open(None).unwrap(), LogTarget::Stderr));
    }

    #[test]
    fn test_file_is_appended() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipbeacon.log");
        std::fs::write(&path, "existing\n").unwrap();

        let LogTarget::File(mut file) = LogTarget::open(Some(&path)).unwrap() else {
            panic!("expected file target");
        };
        writeln!(file, "appended").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing\nappended\n");
    }

    #[test]
    fn test_unopenable_path_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("ipbeacon.log");

        let err = LogTarget::open(Some(&path)).unwrap_err();
        assert_eq!(err.path, path);
    }
}
