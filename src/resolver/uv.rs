// src/resolver/uv.rs

//! `uv` backend
//!
//! Every invocation passes `--managed-python` so uv provisions the runtime
//! named by the manifest's `requires-python` instead of using whatever
//! interpreter is on the host.

use super::{DependencyResolver, ResolutionStrategy};
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Name of the state file uv keeps next to `pyproject.toml`
pub const UV_LOCK_FILE: &str = "uv.lock";

/// Drives the `uv` executable
#[derive(Debug, Clone)]
pub struct UvResolver {
    program: PathBuf,
}

impl UvResolver {
    /// Locate a resolver executable by name or path
    pub fn locate(program: &str) -> Result<Self> {
        let program = which::which(program).map_err(|e| {
            Error::ConfigError(format!(
                "Resolver '{}' not found: {}. Install uv (https://docs.astral.sh/uv/) or pass --resolver",
                program, e
            ))
        })?;
        debug!("Using resolver at {}", program.display());
        Ok(Self { program })
    }

    /// Use an explicit executable without searching PATH
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn add_args(requirements: &Path, strategy: ResolutionStrategy, allow_source_builds: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["add".into(), "--managed-python".into()];
        if !allow_source_builds {
            args.push("--no-build".into());
        }
        args.push("--no-sync".into());
        args.push(format!("--resolution={strategy}").into());
        args.push("-r".into());
        args.push(requirements.as_os_str().to_owned());
        args
    }

    fn remove_args(package: &str, strategy: ResolutionStrategy) -> Vec<OsString> {
        vec![
            "remove".into(),
            "--managed-python".into(),
            "--no-sync".into(),
            format!("--resolution={strategy}").into(),
            package.into(),
        ]
    }

    fn export_args(output: &Path, strategy: ResolutionStrategy) -> Vec<OsString> {
        vec![
            "export".into(),
            "--managed-python".into(),
            "--locked".into(),
            "--no-hashes".into(),
            "--no-annotate".into(),
            format!("--resolution={strategy}").into(),
            "--output-file".into(),
            output.as_os_str().to_owned(),
        ]
    }

    fn lock_args(strategy: ResolutionStrategy) -> Vec<OsString> {
        vec![
            "lock".into(),
            "--managed-python".into(),
            format!("--resolution={strategy}").into(),
        ]
    }

    fn run(&self, project_dir: &Path, args: &[OsString]) -> Result<()> {
        let command_line = std::iter::once(self.program.as_os_str())
            .chain(args.iter().map(OsString::as_os_str))
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ");
        info!("Running: {}", command_line);

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(project_dir)
            .output()
            .map_err(|e| Error::ResolverProcessError {
                command: command_line.clone(),
                status: "not started".to_string(),
                stderr: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            debug!("resolver stdout:\n{}", stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            debug!("resolver stderr:\n{}", stderr.trim_end());
        }

        if !output.status.success() {
            return Err(Error::ResolverProcessError {
                command: command_line,
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

impl DependencyResolver for UvResolver {
    fn state_file(&self) -> &str {
        UV_LOCK_FILE
    }

    fn add(
        &self,
        project_dir: &Path,
        requirements: &Path,
        strategy: ResolutionStrategy,
        allow_source_builds: bool,
    ) -> Result<()> {
        self.run(
            project_dir,
            &Self::add_args(requirements, strategy, allow_source_builds),
        )
    }

    fn remove(&self, project_dir: &Path, package: &str, strategy: ResolutionStrategy) -> Result<()> {
        self.run(project_dir, &Self::remove_args(package, strategy))
    }

    fn export(&self, project_dir: &Path, output: &Path, strategy: ResolutionStrategy) -> Result<()> {
        self.run(project_dir, &Self::export_args(output, strategy))
    }

    fn relock(&self, project_dir: &Path, strategy: ResolutionStrategy) -> Result<()> {
        self.run(project_dir, &Self::lock_args(strategy))
    }
}
