// src/version/mod.rs

//! Runtime (Python) version handling
//!
//! Builds are keyed by a `major.minor` Python version. The version shows up
//! in three spellings: `3.12` in the manifest's `requires-python`, `3_12` in
//! file names, and `py3_12` in the archive directory.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// A `major.minor` runtime version such as `3.12`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
}

impl PythonVersion {
    pub fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse a version string
    ///
    /// Only the two-component form is accepted:
    /// - "3.12" → 3.12
    /// - "3" → error
    /// - "3.10.5" → error
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || {
            Error::ConfigError(format!(
                "Python version '{}' is not in 'X.Y' format",
                s
            ))
        };

        let (major, minor) = s.trim().split_once('.').ok_or_else(invalid)?;
        if major.is_empty()
            || minor.is_empty()
            || !major.bytes().all(|b| b.is_ascii_digit())
            || !minor.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        Ok(Self {
            major: major.parse().map_err(|_| invalid())?,
            minor: minor.parse().map_err(|_| invalid())?,
        })
    }

    /// File-name form: `3_12`
    pub fn sanitized(&self) -> String {
        format!("{}_{}", self.major, self.minor)
    }

    /// `requires-python` constraint pinning this minor series
    pub fn requires_python(&self) -> String {
        format!("=={}.{}.*", self.major, self.minor)
    }

    /// Archive directory component: `py3_12`
    pub fn dir_name(&self) -> String {
        format!("py{}", self.sanitized())
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PythonVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
