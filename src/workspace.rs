// src/workspace.rs

//! Working directory for a run
//!
//! Builds never share a directory. A run either gets a private temporary
//! directory, removed when the `Workspace` is dropped on any exit path, or
//! works inside a caller-supplied directory that it holds an exclusive
//! `flock` on for its whole lifetime.
//!
//! # Example
//!
//! ```ignore
//! use seedlock::workspace::Workspace;
//!
//! let workspace = Workspace::at("/var/tmp/seedlock")?;
//! let dir = workspace.build_dir(python, profile);
//! // lock released on drop
//! ```

use crate::error::{Error, Result};
use crate::profile::HardwareProfile;
use crate::version::PythonVersion;
use fs2::FileExt;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// Lock file name inside a caller-supplied workspace
pub const WORKSPACE_LOCK_FILE: &str = ".seedlock.lock";

enum Root {
    Temporary(TempDir),
    Locked {
        path: PathBuf,
        /// Kept open to hold the lock
        #[allow(dead_code)]
        file: File,
    },
}

/// Scoped working directory for one run
pub struct Workspace {
    root: Root,
}

impl Workspace {
    /// Create a private temporary workspace
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("seedlock-")
            .tempdir()
            .map_err(|e| Error::IoError(format!("Failed to create temporary workspace: {}", e)))?;
        debug!("Created temporary workspace {}", dir.path().display());
        Ok(Self {
            root: Root::Temporary(dir),
        })
    }

    /// Use `path` as the workspace, failing fast if another run holds it
    pub fn at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        fs::create_dir_all(path)?;
        let path = path.canonicalize()?;
        let lock_path = path.join(WORKSPACE_LOCK_FILE);

        let file = File::create(&lock_path)?;
        match file.try_lock_exclusive() {
            Ok(()) => {
                info!("Acquired workspace lock at {}", lock_path.display());
                Ok(Self {
                    root: Root::Locked { path, file },
                })
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {
                debug!("Workspace lock already held at {}", lock_path.display());
                Err(Error::WorkspaceLocked(path))
            }
            Err(e) => Err(Error::IoError(format!(
                "Failed to lock workspace {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Open a caller-supplied workspace, or a temporary one when `None`
    pub fn open(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::at(path),
            None => Self::temporary(),
        }
    }

    pub fn path(&self) -> &Path {
        match &self.root {
            Root::Temporary(dir) => dir.path(),
            Root::Locked { path, .. } => path,
        }
    }

    pub fn is_temporary(&self) -> bool {
        matches!(self.root, Root::Temporary(_))
    }

    /// Per-build directory; not created until the build starts
    pub fn build_dir(&self, python: PythonVersion, profile: HardwareProfile) -> PathBuf {
        self.path()
            .join("builds")
            .join(python.dir_name())
            .join(profile.to_string())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        match &self.root {
            Root::Temporary(dir) => debug!("Removing temporary workspace {}", dir.path().display()),
            Root::Locked { path, .. } => info!("Released workspace lock at {}", path.display()),
        }
    }
}
