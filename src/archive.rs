// src/archive.rs

//! Artifact archiving
//!
//! Moves a build's manifest, lock artifact and resolver state into
//! `{output_dir}/py{X_Y}/{profile}/`. Files already there are replaced.
//!
//! A run's builds are archived together: every target is first staged in a
//! scratch directory inside the output root, and only once all of them are
//! staged are the files renamed into their final place.

use crate::environment::BuildArtifacts;
use crate::error::{Error, Result};
use crate::profile::HardwareProfile;
use crate::version::PythonVersion;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Archive directory for a target
pub fn archive_dir(output_dir: &Path, python: PythonVersion, profile: HardwareProfile) -> PathBuf {
    output_dir.join(python.dir_name()).join(profile.to_string())
}

/// Move one file, falling back to copy and remove across file systems
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)?;
    }
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(
                "rename {} -> {} failed ({}), copying instead",
                from.display(),
                to.display(),
                e
            );
            fs::copy(from, to).map_err(|e| {
                Error::IoError(format!(
                    "Failed to copy {} to {}: {}",
                    from.display(),
                    to.display(),
                    e
                ))
            })?;
            fs::remove_file(from)?;
            Ok(())
        }
    }
}

/// Move a build's artifacts into the output tree, returning the directory
pub fn archive(artifacts: &BuildArtifacts, output_dir: &Path) -> Result<PathBuf> {
    let dest = archive_dir(output_dir, artifacts.python, artifacts.profile);
    fs::create_dir_all(&dest)?;

    for file in artifacts.files() {
        let name = file.file_name().ok_or_else(|| {
            Error::IoError(format!("Artifact path {} has no file name", file.display()))
        })?;
        let target = dest.join(name);
        move_file(file, &target)?;
        debug!("Archived {}", target.display());
    }

    debug!(
        "Moved Python {} {} artifacts to {}",
        artifacts.python,
        artifacts.profile,
        dest.display()
    );
    Ok(dest)
}

/// Archive every build of a run, or none of them
///
/// Returns the final directory of each build, in input order. If staging
/// fails, the output tree is left as it was (an output root this call
/// created is removed again).
pub fn archive_all(builds: &[BuildArtifacts], output_dir: &Path) -> Result<Vec<PathBuf>> {
    let created = !output_dir.exists();
    fs::create_dir_all(output_dir)?;

    let staging = tempfile::Builder::new()
        .prefix(".seedlock-staging-")
        .tempdir_in(output_dir)?;

    let staged: Result<Vec<PathBuf>> = builds
        .iter()
        .map(|artifacts| archive(artifacts, staging.path()))
        .collect();
    let staged = match staged {
        Ok(staged) => staged,
        Err(e) => {
            drop(staging);
            if created {
                if let Err(cleanup) = fs::remove_dir_all(output_dir) {
                    warn!("Failed to remove {}: {}", output_dir.display(), cleanup);
                }
            }
            return Err(e);
        }
    };

    let mut outputs = Vec::with_capacity(builds.len());
    for (artifacts, from) in builds.iter().zip(&staged) {
        let dest = archive_dir(output_dir, artifacts.python, artifacts.profile);
        fs::create_dir_all(&dest)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            fs::rename(entry.path(), dest.join(entry.file_name()))?;
        }
        info!(
            "Archived Python {} {} artifacts to {}",
            artifacts.python,
            artifacts.profile,
            dest.display()
        );
        outputs.push(dest);
    }
    Ok(outputs)
}
