//! Pid file written while the collector is running

use std::fs;
use std::path::{Path, PathBuf};

/// A pid file on disk, removed again by [`PidFile::remove`]
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Write the current process id to `path`, replacing any previous content
    pub fn create(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        fs::write(&path, std::process::id().to_string())?;
        log::debug!("Wrote pid file {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file; a missing file is not an error
    pub fn remove(self) {
        match fs::remove_file(&self.path) {
            Ok(()) => log::info!("Removed pid file {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("Failed to remove pid file {}: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_writes_pid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipbeacon.pid");

        let pid_file = PidFile::create(&path).unwrap();

        let content = fs::read_to_string(pid_file.path()).unwrap();
        assert_eq!(content, std::process::id().to_string());
    }

    #[test]
    fn test_remove_deletes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipbeacon.pid");

        PidFile::create(&path).unwrap().remove();

        assert!(!path.exists());
    }

    #[test]
    fn test_remove_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipbeacon.pid");

        let pid_file = PidFile::create(&path).unwrap();
        fs::remove_file(&path).unwrap();
        pid_file.remove();
    }

    #[test]
    fn test_create_fails_in_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("ipbeacon.pid");

        assert!(PidFile::create(&path).is_err());
    }
}
