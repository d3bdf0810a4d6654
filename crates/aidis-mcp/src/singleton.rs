// aidis-mcp/src/singleton.rs
// ============================================================================
// Module: Process Singleton
// Description: PID-file guard preventing multiple live server instances.
// Purpose: Fail startup when another instance holds the PID file.
// Dependencies: std
// ============================================================================

//! ## Overview
//! The PID file is written before any port opens. A file referencing a
//! live process fails startup with `AlreadyRunning`; a stale file is
//! removed and startup continues. The guard removes the file on release
//! and on drop, so normal termination always cleans up. This is an
//! operational safeguard; data correctness still rests with the database.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Singleton acquisition errors.
#[derive(Debug, Error)]
pub enum SingletonError {
    /// Another live instance holds the PID file.
    #[error("another AIDIS instance is already running (pid {0})")]
    AlreadyRunning(u32),
    /// Filesystem failure while reading or writing the PID file.
    #[error("pid file {path}: {reason}")]
    Io {
        /// PID file path.
        path: PathBuf,
        /// Failure description.
        reason: String,
    },
}

// ============================================================================
// SECTION: PID File Guard
// ============================================================================

/// Held PID file; the file is removed on release or drop.
#[derive(Debug)]
pub struct PidFile {
    /// PID file path.
    path: PathBuf,
    /// True while this guard owns the file.
    armed: bool,
}

impl PidFile {
    /// Acquires the PID file, cleaning up stale files from dead processes.
    ///
    /// # Errors
    ///
    /// Returns [`SingletonError::AlreadyRunning`] when a live process holds
    /// the file, or [`SingletonError::Io`] on filesystem failure.
    pub fn acquire(path: &Path) -> Result<Self, SingletonError> {
        if let Some(existing) = read_pid(path)? {
            if process_alive(existing) {
                return Err(SingletonError::AlreadyRunning(existing));
            }
            tracing::warn!(pid = existing, path = %path.display(), "removing stale pid file");
            fs::remove_file(path).map_err(|error| io_error(path, &error))?;
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|error| io_error(path, &error))?;
        }
        fs::write(path, format!("{}\n", std::process::id()))
            .map_err(|error| io_error(path, &error))?;
        Ok(Self {
            path: path.to_path_buf(),
            armed: true,
        })
    }

    /// Removes the PID file. Idempotent.
    pub fn release(&mut self) {
        if self.armed {
            if let Err(error) = fs::remove_file(&self.path) {
                tracing::warn!(path = %self.path.display(), error = %error, "pid file removal failed");
            }
            self.armed = false;
        }
    }

    /// Returns the PID file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        self.release();
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads the PID stored in the file, when the file exists and parses.
fn read_pid(path: &Path) -> Result<Option<u32>, SingletonError> {
    match fs::read_to_string(path) {
        Ok(contents) => match contents.trim().parse::<u32>() {
            Ok(pid) => Ok(Some(pid)),
            Err(_) => {
                // Unparseable contents cannot belong to a live instance.
                tracing::warn!(path = %path.display(), "pid file holds no pid; treating as stale");
                Ok(None)
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(error) => Err(io_error(path, &error)),
    }
}

/// Returns true when `pid` names a live process.
///
/// Probes `/proc`; on platforms without procfs the file is conservatively
/// treated as live so two instances can never race.
fn process_alive(pid: u32) -> bool {
    let proc_root = Path::new("/proc");
    if proc_root.is_dir() {
        return proc_root.join(pid.to_string()).exists();
    }
    true
}

/// Builds an [`SingletonError::Io`] for `path`.
fn io_error(path: &Path, error: &std::io::Error) -> SingletonError {
    SingletonError::Io {
        path: path.to_path_buf(),
        reason: error.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        reason = "Test-only assertions."
    )]

    use super::PidFile;
    use super::SingletonError;

    #[test]
    fn acquire_writes_the_current_pid() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aidis.pid");
        let guard = PidFile::acquire(&path).expect("acquire");
        let contents = std::fs::read_to_string(guard.path()).expect("read");
        assert_eq!(contents.trim(), std::process::id().to_string());
    }

    #[test]
    fn release_removes_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aidis.pid");
        let mut guard = PidFile::acquire(&path).expect("acquire");
        guard.release();
        assert!(!path.exists());
        // Idempotent.
        guard.release();
    }

    #[test]
    fn drop_removes_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aidis.pid");
        {
            let _guard = PidFile::acquire(&path).expect("acquire");
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn live_pid_blocks_acquisition() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aidis.pid");
        // Our own PID is certainly alive.
        std::fs::write(&path, format!("{}\n", std::process::id())).expect("write");
        let error = PidFile::acquire(&path).expect_err("must fail");
        assert!(matches!(error, SingletonError::AlreadyRunning(_)));
    }

    #[test]
    fn stale_pid_is_cleaned_up() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aidis.pid");
        // PID near the u32 ceiling is effectively never alive.
        std::fs::write(&path, "4294967294\n").expect("write");
        let guard = PidFile::acquire(&path).expect("acquire");
        let contents = std::fs::read_to_string(guard.path()).expect("read");
        assert_eq!(contents.trim(), std::process::id().to_string());
    }

    #[test]
    fn garbage_contents_are_treated_as_stale() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aidis.pid");
        std::fs::write(&path, "not-a-pid\n").expect("write");
        assert!(PidFile::acquire(&path).is_ok());
    }

    #[test]
    fn missing_parent_directories_are_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run/nested/aidis.pid");
        let guard = PidFile::acquire(&path).expect("acquire");
        assert!(guard.path().exists());
    }
}
