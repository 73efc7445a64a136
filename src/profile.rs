// src/profile.rs

//! Hardware profiles and their exclusion lists
//!
//! Each build targets exactly one hardware profile. The profile selects which
//! exclusion list is applied after the seed list is resolved: a TPU build
//! drops the GPU-only packages, a GPU build drops the TPU-only packages.

use crate::error::Result;
use crate::requirements::{DependencyList, normalize_name};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum_macros::{Display, EnumString};

/// Target accelerator for a build
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum HardwareProfile {
    Tpu,
    Gpu,
}

impl HardwareProfile {
    pub const ALL: [HardwareProfile; 2] = [HardwareProfile::Tpu, HardwareProfile::Gpu];
}

/// Packages that only make sense on TPU hosts
pub const DEFAULT_TPU_ONLY: &[&str] = &["libtpu", "libtpu-nightly"];

/// Packages that only make sense on GPU hosts
pub const DEFAULT_GPU_ONLY: &[&str] = &[
    "jax-cuda12-pjrt",
    "jax-cuda12-plugin",
    "nvidia-cublas-cu12",
    "nvidia-cuda-cupti-cu12",
    "nvidia-cuda-nvcc-cu12",
    "nvidia-cuda-runtime-cu12",
    "nvidia-cudnn-cu12",
    "nvidia-cufft-cu12",
    "nvidia-cusolver-cu12",
    "nvidia-cusparse-cu12",
    "nvidia-nccl-cu12",
    "nvidia-nvjitlink-cu12",
];

/// Package names removed from the manifest after seed resolution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    packages: Vec<String>,
}

impl ExclusionList {
    pub fn new<I, S>(packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            packages: packages
                .into_iter()
                .map(Into::into)
                .map(|p: String| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Read a constraints file: one package name per line, `#` comments
    pub fn from_file(path: &Path) -> Result<Self> {
        let list = DependencyList::read_from(path)?;
        Ok(Self::new(list.requirements().map(str::to_string)))
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn contains(&self, package: &str) -> bool {
        let wanted = normalize_name(package);
        self.packages.iter().any(|p| normalize_name(p) == wanted)
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use tempfile::TempDir;

    #[test]
    fn test_profile_names() {
        assert_eq!(HardwareProfile::Tpu.to_string(), "tpu");
        assert_eq!(HardwareProfile::from_str("GPU").unwrap(), HardwareProfile::Gpu);
        assert!(HardwareProfile::from_str("cpu").is_err());
    }

    #[test]
    fn test_exclusion_list_matches_normalized() {
        let list = ExclusionList::new(["LibTPU", " ", "jax_cuda12_plugin"]);
        assert_eq!(list.packages().len(), 2);
        assert!(list.contains("libtpu"));
        assert!(list.contains("jax-cuda12-plugin"));
        assert!(!list.contains("jax"));
    }

    #[test]
    fn test_exclusion_list_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("constraints_tpu_only.txt");
        std::fs::write(&path, "# TPU only\nlibtpu\n\nlibtpu-nightly\n").unwrap();

        let list = ExclusionList::from_file(&path).unwrap();
        assert_eq!(list.packages(), &["libtpu", "libtpu-nightly"]);
    }
}
