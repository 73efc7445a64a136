// src/lockfile.rs

//! Exported lock artifacts
//!
//! The resolver exports its fully pinned closure as a flat requirements file
//! (no hashes, no annotations):
//!
//! ```text
//! absl-py==2.1.0
//! numpy==1.26.4 ; python_full_version >= '3.12'
//! google-jetstream @ git+https://github.com/AI-Hypercomputer/JetStream.git@261f...
//! ```
//!
//! Blank lines, comments and pip options are ignored. Anything else that is
//! neither an exact pin nor a direct reference is skipped with a warning.

use crate::error::Result;
use crate::requirements::{normalize_name, requirement_name};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, warn};

static PIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<name>[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(?:\[[^\]]*\])?\s*==\s*(?P<ver>[A-Za-z0-9][A-Za-z0-9.+!_-]*)$",
    )
    .unwrap()
});

/// One pinned package in a lock artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEntry {
    /// `name==version`, with an optional environment marker
    Pinned {
        name: String,
        version: String,
        marker: Option<String>,
    },
    /// `name @ url`, carried through verbatim
    Direct { name: String, line: String },
}

impl LockEntry {
    pub fn name(&self) -> &str {
        match self {
            LockEntry::Pinned { name, .. } | LockEntry::Direct { name, .. } => name,
        }
    }

    /// Environment marker, if the line carries one
    pub fn marker(&self) -> Option<&str> {
        match self {
            LockEntry::Pinned { marker, .. } => marker.as_deref(),
            LockEntry::Direct { line, .. } => line
                .split_once(';')
                .map(|(_, m)| m.trim())
                .filter(|m| !m.is_empty()),
        }
    }

    /// The manifest entry this lock line lowers to
    ///
    /// Exact pins become `name>=version`; direct references are unchanged.
    pub fn lower_bound(&self) -> String {
        match self {
            LockEntry::Pinned {
                name,
                version,
                marker: Some(marker),
            } => format!("{name}>={version} ; {marker}"),
            LockEntry::Pinned {
                name,
                version,
                marker: None,
            } => format!("{name}>={version}"),
            LockEntry::Direct { line, .. } => line.clone(),
        }
    }
}

/// Parsed lock artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockArtifact {
    entries: Vec<LockEntry>,
    skipped: usize,
}

impl LockArtifact {
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        let mut skipped = 0;

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line.starts_with('-') {
                debug!("Ignoring lock option line {}: {}", lineno + 1, line);
                continue;
            }

            match parse_entry(line) {
                Some(entry) => entries.push(entry),
                None => {
                    warn!("Skipping malformed lock line {}: '{}'", lineno + 1, line);
                    skipped += 1;
                }
            }
        }

        Self { entries, skipped }
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn entries(&self) -> &[LockEntry] {
        &self.entries
    }

    /// Number of malformed lines dropped while parsing
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pinned version of a package, if the lock pins it
    pub fn version_of(&self, package: &str) -> Option<&str> {
        let wanted = normalize_name(package);
        self.entries.iter().find_map(|e| match e {
            LockEntry::Pinned { name, version, .. } if normalize_name(name) == wanted => {
                Some(version.as_str())
            }
            _ => None,
        })
    }

    pub fn contains(&self, package: &str) -> bool {
        let wanted = normalize_name(package);
        self.entries.iter().any(|e| normalize_name(e.name()) == wanted)
    }

    /// Lower-bound requirements grouped by package, in lock order
    ///
    /// Returns `(normalized name, requirements)` pairs. A package locked
    /// under several markers keeps one requirement per distinct marker; a
    /// repeated entry under the same marker (or none) keeps the first.
    pub fn lower_bounds(&self) -> Vec<(String, Vec<String>)> {
        let mut seen: HashSet<(String, Option<&str>)> = HashSet::new();
        let mut position: HashMap<String, usize> = HashMap::new();
        let mut bounds: Vec<(String, Vec<String>)> = Vec::new();

        for entry in &self.entries {
            let key = normalize_name(entry.name());
            if !seen.insert((key.clone(), entry.marker())) {
                debug!("Ignoring repeated lock entry for {}", entry.name());
                continue;
            }
            match position.get(&key) {
                Some(&i) => bounds[i].1.push(entry.lower_bound()),
                None => {
                    position.insert(key.clone(), bounds.len());
                    bounds.push((key, vec![entry.lower_bound()]));
                }
            }
        }
        bounds
    }
}

fn parse_entry(line: &str) -> Option<LockEntry> {
    let (spec, marker) = match line.split_once(';') {
        Some((spec, marker)) => (spec.trim(), Some(marker.trim().to_string())),
        None => (line, None),
    };

    if spec.contains("==") {
        let caps = PIN_RE.captures(spec)?;
        return Some(LockEntry::Pinned {
            name: caps["name"].to_string(),
            version: caps["ver"].to_string(),
            marker: marker.filter(|m| !m.is_empty()),
        });
    }

    if spec.contains(" @ ") {
        let name = requirement_name(spec)?;
        return Some(LockEntry::Direct {
            name: name.to_string(),
            line: line.to_string(),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORTED: &str = "\
# This file was autogenerated by uv via the following command:
#    uv export --no-hashes --no-annotate --resolution=highest
-e .
absl-py==2.1.0
numpy==1.26.4 ; python_full_version >= '3.12'
jax[tpu]==0.6.2
google-jetstream @ git+https://github.com/AI-Hypercomputer/JetStream.git@261f25007e4d12bb57cf8d5d61e291ba8f18430f
this line is broken
==1.0
";

    #[test]
    fn test_parse_exported_lock() {
        let lock = LockArtifact::parse(EXPORTED);
        assert_eq!(lock.len(), 4);
        assert_eq!(lock.skipped(), 2);
        assert_eq!(lock.version_of("absl_py"), Some("2.1.0"));
        assert_eq!(lock.version_of("jax"), Some("0.6.2"));
        assert!(lock.contains("google-jetstream"));
        assert!(!lock.contains("scipy"));
    }

    #[test]
    fn test_lower_bound_forms() {
        let lock = LockArtifact::parse(EXPORTED);
        let bounds: Vec<String> = lock
            .lower_bounds()
            .into_iter()
            .flat_map(|(_, reqs)| reqs)
            .collect();
        assert_eq!(
            bounds,
            vec![
                "absl-py>=2.1.0".to_string(),
                "numpy>=1.26.4 ; python_full_version >= '3.12'".to_string(),
                "jax>=0.6.2".to_string(),
                "google-jetstream @ git+https://github.com/AI-Hypercomputer/JetStream.git@261f25007e4d12bb57cf8d5d61e291ba8f18430f".to_string(),
            ]
        );
    }

    #[test]
    fn test_complementary_markers_each_keep_a_bound() {
        let lock = LockArtifact::parse(
            "numpy==1.26.4 ; sys_platform == 'darwin'\n\
             numpy==2.0.0 ; sys_platform == 'linux'\n\
             absl-py==2.1.0\n",
        );
        let bounds = lock.lower_bounds();
        assert_eq!(bounds.len(), 2);
        assert_eq!(bounds[0].0, "numpy");
        assert_eq!(
            bounds[0].1,
            vec![
                "numpy>=1.26.4 ; sys_platform == 'darwin'".to_string(),
                "numpy>=2.0.0 ; sys_platform == 'linux'".to_string(),
            ]
        );
        assert_eq!(bounds[1].1, vec!["absl-py>=2.1.0".to_string()]);
    }

    #[test]
    fn test_repeated_marker_keeps_first() {
        let lock = LockArtifact::parse(
            "numpy==1.26.4\nNumPy==2.0.0\nscipy==1.0 ; python_version < '3.13'\nscipy==1.1 ; python_version < '3.13'\n",
        );
        let bounds = lock.lower_bounds();
        assert_eq!(bounds[0].1, vec!["numpy>=1.26.4".to_string()]);
        assert_eq!(bounds[1].1, vec!["scipy>=1.0 ; python_version < '3.13'".to_string()]);
    }

    #[test]
    fn test_range_pins_are_malformed() {
        let lock = LockArtifact::parse("numpy==1.0,<2\n");
        assert!(lock.is_empty());
        assert_eq!(lock.skipped(), 1);
    }
}
