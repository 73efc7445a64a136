// src/requirements/patch.rs

//! Fixed corrections applied to the downstream requirements list
//!
//! Every rule is idempotent on its own, so a patched list patched again
//! comes out unchanged, and rules never interact with one another.

use super::{DependencyList, normalize_name, requirement_name};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, info};

/// `head==version tail`, where head is the name plus any extras
static EXACT_PIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<head>[^=<>!~;@]*?)\s*==\s*(?P<ver>[^\s;,]+)(?P<tail>.*)$").unwrap()
});

/// Pinned revision of the JetStream source dependency
pub const JETSTREAM_REVISION: &str = "261f25007e4d12bb57cf8d5d61e291ba8f18430f";

/// Pinned revision of the MLPerf logging source dependency
pub const MLPERF_LOGGING_REVISION: &str = "44b4810e65e8c0a7d9e4e207c60e51d9458a3fb8";

/// Requirement appended to every patched list
pub const DEFAULT_APPENDED_REQUIREMENT: &str = "pathwaysutils";

/// A single textual correction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatchRule {
    /// Rewrite `package==pinned` to `package>=pinned`
    Loosen { package: String, pinned: String },

    /// Pin a source-hosted dependency whose URL contains `repository`
    /// (for example `/JetStream.git`) to an exact revision
    PinRevision { repository: String, revision: String },

    /// Append a requirement unless the list already declares that package
    Append { requirement: String },
}

impl PatchRule {
    fn apply_line(&self, line: &str) -> Option<String> {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        match self {
            PatchRule::Loosen { package, pinned } => loosen_line(line, package, pinned),
            PatchRule::PinRevision {
                repository,
                revision,
            } => pin_revision_line(line, repository, revision),
            PatchRule::Append { .. } => None,
        }
    }
}

fn loosen_line(line: &str, package: &str, pinned: &str) -> Option<String> {
    let name = requirement_name(line)?;
    if normalize_name(name) != normalize_name(package) {
        return None;
    }
    let caps = EXACT_PIN_RE.captures(line)?;
    if &caps["ver"] != pinned {
        return None;
    }
    Some(format!("{}>={}{}", &caps["head"], &caps["ver"], &caps["tail"]))
}

fn pin_revision_line(line: &str, repository: &str, revision: &str) -> Option<String> {
    // The repository must end at a URL boundary, so `/logging.git` does not
    // match inside `/logging.github.io`
    let split = line
        .match_indices(repository)
        .map(|(start, _)| start + repository.len())
        .find(|&end| {
            line[end..]
                .chars()
                .next()
                .is_none_or(|c| matches!(c, '@' | '#' | ';') || c.is_whitespace())
        })?;
    let (head, rest) = line.split_at(split);

    // Drop whatever revision is already there so re-pinning is a no-op
    let rest = match rest.strip_prefix('@') {
        Some(after_at) => {
            let end = after_at
                .find(|c: char| c.is_whitespace() || c == ';' || c == '#')
                .unwrap_or(after_at.len());
            &after_at[end..]
        }
        None => rest,
    };

    let patched = format!("{head}@{revision}{rest}");
    (patched != line).then_some(patched)
}

/// An ordered set of patch rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementPatch {
    pub rules: Vec<PatchRule>,
}

impl Default for RequirementPatch {
    fn default() -> Self {
        Self {
            rules: vec![
                PatchRule::Loosen {
                    package: "protobuf".to_string(),
                    pinned: "3.20.3".to_string(),
                },
                PatchRule::Loosen {
                    package: "sentencepiece".to_string(),
                    pinned: "0.1.97".to_string(),
                },
                PatchRule::PinRevision {
                    repository: "/JetStream.git".to_string(),
                    revision: JETSTREAM_REVISION.to_string(),
                },
                PatchRule::PinRevision {
                    repository: "/logging.git".to_string(),
                    revision: MLPERF_LOGGING_REVISION.to_string(),
                },
                PatchRule::Append {
                    requirement: DEFAULT_APPENDED_REQUIREMENT.to_string(),
                },
            ],
        }
    }
}

impl RequirementPatch {
    pub fn new(rules: Vec<PatchRule>) -> Self {
        Self { rules }
    }

    /// Apply every rule, returning the patched list
    pub fn apply(&self, list: &DependencyList) -> DependencyList {
        let mut patched = list.clone();
        let mut changed = 0usize;

        for line in patched.lines_mut().iter_mut() {
            for rule in &self.rules {
                if let Some(new_line) = rule.apply_line(line) {
                    debug!("Patched requirement: '{}' -> '{}'", line, new_line);
                    *line = new_line;
                    changed += 1;
                }
            }
        }

        for rule in &self.rules {
            if let PatchRule::Append { requirement } = rule {
                let present = match requirement_name(requirement) {
                    Some(name) => patched.contains_package(name),
                    None => patched.requirements().any(|r| r == requirement.trim()),
                };
                if !present {
                    debug!("Appending requirement: '{}'", requirement);
                    patched.lines_mut().push(requirement.clone());
                    changed += 1;
                }
            }
        }

        info!("Applied requirement patch ({} line(s) changed)", changed);
        patched
    }
}
