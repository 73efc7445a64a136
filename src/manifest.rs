// src/manifest.rs

//! Synthetic project manifest (`pyproject.toml`)
//!
//! The manifest starts out with an identity and an empty dependency list.
//! The resolver fills it in, and the lower-bound transform rewrites it in
//! place between the two resolution passes.
//!
//! # Example
//!
//! ```toml
//! [project]
//! name = "seed-env"
//! version = "0.1.0"
//! requires-python = "==3.12.*"
//! dependencies = [
//!     "absl-py>=2.1.0",
//!     "numpy>=1.26.4",
//! ]
//! ```

use crate::error::{Error, Result};
use crate::lockfile::LockArtifact;
use crate::requirements::{normalize_name, requirement_name};
use crate::version::PythonVersion;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use toml::{Table, Value};
use tracing::info;

/// File name the resolver expects
pub const MANIFEST_FILE: &str = "pyproject.toml";

/// Outcome of a lower-bound rewrite
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LowerBoundSummary {
    /// Existing entries replaced by a lower bound
    pub rewritten: usize,
    /// Entries added for packages the manifest did not declare
    pub added: usize,
    /// Duplicate entries for a locked package that were dropped
    pub dropped: usize,
    /// Malformed lock lines that were ignored
    pub skipped: usize,
}

/// A `pyproject.toml` document
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    doc: Table,
}

impl Manifest {
    /// Create a manifest with no dependencies
    pub fn new(name: &str, version: &str, python: PythonVersion) -> Self {
        let mut project = Table::new();
        project.insert("name".to_string(), Value::String(name.to_string()));
        project.insert("version".to_string(), Value::String(version.to_string()));
        project.insert(
            "requires-python".to_string(),
            Value::String(python.requires_python()),
        );
        project.insert("dependencies".to_string(), Value::Array(Vec::new()));

        let mut doc = Table::new();
        doc.insert("project".to_string(), Value::Table(project));
        Self { doc }
    }

    pub fn parse(text: &str) -> Result<Self> {
        let doc: Table = toml::from_str(text)
            .map_err(|e| Error::ParseError(format!("Invalid {MANIFEST_FILE}: {e}")))?;
        if !doc.get("project").is_some_and(Value::is_table) {
            return Err(Error::ParseError(format!(
                "{MANIFEST_FILE} has no [project] table"
            )));
        }
        Ok(Self { doc })
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(&self.doc)
            .map_err(|e| Error::ParseError(format!("Failed to serialize {MANIFEST_FILE}: {e}")))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    fn project(&self) -> Option<&Table> {
        self.doc.get("project").and_then(Value::as_table)
    }

    fn project_mut(&mut self) -> &mut Table {
        if !self.doc.get("project").is_some_and(Value::is_table) {
            self.doc
                .insert("project".to_string(), Value::Table(Table::new()));
        }
        match self.doc.get_mut("project") {
            Some(Value::Table(t)) => t,
            _ => unreachable!("[project] is always a table after parse/new"),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.project()?.get("name")?.as_str()
    }

    pub fn requires_python(&self) -> Option<&str> {
        self.project()?.get("requires-python")?.as_str()
    }

    /// Dependency specifiers in declaration order
    pub fn dependencies(&self) -> Vec<String> {
        self.project()
            .and_then(|p| p.get("dependencies"))
            .and_then(Value::as_array)
            .map(|deps| {
                deps.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn set_dependencies(&mut self, deps: Vec<String>) {
        self.project_mut().insert(
            "dependencies".to_string(),
            Value::Array(deps.into_iter().map(Value::String).collect()),
        );
    }

    /// Whether any dependency entry names `package`
    pub fn declares(&self, package: &str) -> bool {
        let wanted = normalize_name(package);
        self.dependencies()
            .iter()
            .filter_map(|d| requirement_name(d))
            .any(|n| normalize_name(n) == wanted)
    }

    /// Rewrite dependencies as lower bounds of the lock's pins
    ///
    /// Every package in the lock ends up with one `name>=version` entry per
    /// distinct marker it is locked under (direct references are copied
    /// as-is), placed where the manifest first declared it. Entries for
    /// packages the lock does not mention keep their position and text.
    pub fn apply_lower_bounds(&mut self, lock: &LockArtifact) -> LowerBoundSummary {
        let bounds = lock.lower_bounds();
        let index: HashMap<&str, &[String]> = bounds
            .iter()
            .map(|(name, reqs)| (name.as_str(), reqs.as_slice()))
            .collect();

        let mut summary = LowerBoundSummary {
            skipped: lock.skipped(),
            ..Default::default()
        };
        let mut placed: HashSet<String> = HashSet::new();
        let mut deps = Vec::new();

        for dep in self.dependencies() {
            let key = requirement_name(&dep).map(normalize_name);
            let reqs = key.as_deref().and_then(|k| index.get(k).copied());
            match (key, reqs) {
                (Some(key), Some(reqs)) => {
                    if placed.contains(&key) {
                        summary.dropped += 1;
                        continue;
                    }
                    deps.extend(reqs.iter().cloned());
                    placed.insert(key);
                    summary.rewritten += 1;
                }
                _ => deps.push(dep),
            }
        }

        for (name, reqs) in &bounds {
            if !placed.contains(name) {
                deps.extend(reqs.iter().cloned());
                summary.added += 1;
            }
        }

        self.set_dependencies(deps);
        summary
    }
}

/// Lower-bound the manifest at `manifest_path` from the lock at `lock_path`,
/// rewriting the manifest in place
pub fn lower_bound_project(lock_path: &Path, manifest_path: &Path) -> Result<LowerBoundSummary> {
    let lock = LockArtifact::read_from(lock_path)?;
    let mut manifest = Manifest::load(manifest_path)?;
    let summary = manifest.apply_lower_bounds(&lock);
    manifest.save(manifest_path)?;

    info!(
        "Lower-bounded {}: {} rewritten, {} added, {} malformed lock line(s) skipped",
        manifest_path.display(),
        summary.rewritten,
        summary.added,
        summary.skipped
    );
    Ok(summary)
}
