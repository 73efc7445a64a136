// src/requirements/mod.rs

//! Line-oriented dependency lists
//!
//! Both the seed list (`requirements_lock_X_Y.txt`) and the downstream
//! project list (`requirements.txt`) are treated as ordered sequences of
//! lines. Comments, blank lines and pip options are carried through
//! untouched; only requirement lines are ever inspected or rewritten.

pub mod patch;

pub use patch::{PatchRule, RequirementPatch};

use crate::error::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)").unwrap());

/// Normalize a package name for comparison (PEP 503)
///
/// `Foo_Bar.baz` and `foo-bar-baz` name the same distribution.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_sep = false;
    for c in name.trim().chars() {
        if matches!(c, '-' | '_' | '.') {
            if !last_sep {
                out.push('-');
            }
            last_sep = true;
        } else {
            out.push(c.to_ascii_lowercase());
            last_sep = false;
        }
    }
    out
}

/// Whether a line carries a requirement (not a comment, blank or option)
pub fn is_requirement_line(line: &str) -> bool {
    let trimmed = line.trim();
    !(trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-'))
}

/// Extract the distribution name a requirement line declares
///
/// Returns `None` for non-requirement lines and for bare URLs such as
/// `git+https://host/org/repo.git`, which carry no name.
pub fn requirement_name(line: &str) -> Option<&str> {
    if !is_requirement_line(line) {
        return None;
    }
    let first_token = line
        .trim()
        .split(|c: char| c.is_whitespace() || c == ';')
        .next()
        .unwrap_or_default();
    if first_token.contains("://") {
        return None;
    }
    NAME_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// An ordered list of dependency specifier lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyList {
    lines: Vec<String>,
}

impl DependencyList {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Split text into lines, dropping `\r` line endings
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text
                .lines()
                .map(|l| l.trim_end_matches('\r').to_string())
                .collect(),
        }
    }

    pub fn read_from(path: &Path) -> Result<Self> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_text())?;
        Ok(())
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut Vec<String> {
        &mut self.lines
    }

    /// Requirement lines only, trimmed
    pub fn requirements(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| is_requirement_line(l))
    }

    /// Normalized names of every named requirement
    pub fn package_names(&self) -> Vec<String> {
        self.requirements()
            .filter_map(requirement_name)
            .map(normalize_name)
            .collect()
    }

    pub fn contains_package(&self, name: &str) -> bool {
        let wanted = normalize_name(name);
        self.requirements()
            .filter_map(requirement_name)
            .any(|n| normalize_name(n) == wanted)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render with a trailing newline
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}
