// src/config/mod.rs

//! Build configuration
//!
//! Every setting has a default matching the MaxText/JAX setup, so a bare
//! `seedlock build` needs no config file. A TOML file can override any
//! section, and CLI flags override the file.
//!
//! # Example seedlock.toml
//!
//! ```toml
//! [project]
//! repository = "AI-Hypercomputer/maxtext"
//! requirements_path = "requirements.txt"
//!
//! [seed]
//! repository = "jax-ml/jax"
//! reference = "jax-v0.6.2"
//!
//! [seed.overrides]
//! "3.10" = "jax-v0.6.2"
//!
//! [build]
//! python_versions = ["3.11", "3.12"]
//! hardware_profiles = ["tpu"]
//! output_dir = "maxtext/seed_env_files"
//!
//! [exclusions]
//! tpu_only = ["libtpu"]
//! ```

use crate::error::{Error, Result};
use crate::profile::{DEFAULT_GPU_ONLY, DEFAULT_TPU_ONLY, ExclusionList, HardwareProfile};
use crate::requirements::RequirementPatch;
use crate::version::PythonVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Placeholder in the seed lock path template
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Full configuration for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub seed: SeedConfig,

    #[serde(default)]
    pub build: BuildSettings,

    #[serde(default)]
    pub exclusions: ExclusionConfig,

    #[serde(default)]
    pub patch: RequirementPatch,

    #[serde(default)]
    pub hosting: HostingConfig,
}

/// The downstream project whose requirements are locked
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// `org/repo` on the hosting service
    pub repository: String,
    /// Short name used in lock artifact file names
    pub name: String,
    /// Path of the requirements file inside the repository
    pub requirements_path: String,
    /// Ref fetched when no commit is given
    pub default_branch: String,
    /// Exact commit to fetch instead of the default branch
    pub commit: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            repository: "AI-Hypercomputer/maxtext".to_string(),
            name: "maxtext".to_string(),
            requirements_path: "requirements.txt".to_string(),
            default_branch: "main".to_string(),
            commit: None,
        }
    }
}

/// The upstream project whose test-matrix lock seeds the environment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub repository: String,
    /// Tag or commit
    pub reference: String,
    /// Seed lock path; `{version}` expands to e.g. `3_12`
    pub lock_path_template: String,
    /// Per-runtime-version reference overrides, keyed by "X.Y"
    pub overrides: BTreeMap<String, String>,
}

impl Default for SeedConfig {
    fn default() -> Self {
        let mut overrides = BTreeMap::new();
        overrides.insert("3.10".to_string(), "jax-v0.6.2".to_string());
        Self {
            repository: "jax-ml/jax".to_string(),
            reference: "jax-v0.6.2".to_string(),
            lock_path_template: format!("build/requirements_lock_{VERSION_PLACEHOLDER}.txt"),
            overrides,
        }
    }
}

impl SeedConfig {
    /// Reference to resolve for a runtime version
    pub fn reference_for(&self, python: PythonVersion) -> &str {
        self.overrides
            .get(&python.to_string())
            .map(String::as_str)
            .unwrap_or(self.reference.as_str())
    }

    /// Seed lock path inside the seed repository
    pub fn lock_path(&self, python: PythonVersion) -> String {
        self.lock_path_template
            .replace(VERSION_PLACEHOLDER, &python.sanitized())
    }
}

/// Build matrix and local settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    pub python_versions: Vec<String>,
    pub hardware_profiles: Vec<HardwareProfile>,
    /// Archive root; builds land in `{output_dir}/py{X_Y}/{profile}/`
    pub output_dir: PathBuf,
    /// Caller-supplied workspace; a temporary directory when unset
    pub workspace: Option<PathBuf>,
    /// Resolver executable
    pub resolver: String,
    pub manifest_name: String,
    pub manifest_version: String,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            python_versions: vec!["3.10".to_string(), "3.11".to_string(), "3.12".to_string()],
            hardware_profiles: HardwareProfile::ALL.to_vec(),
            output_dir: PathBuf::from("maxtext/seed_env_files"),
            workspace: None,
            resolver: "uv".to_string(),
            manifest_name: "seed-env".to_string(),
            manifest_version: "0.1.0".to_string(),
        }
    }
}

/// Hardware exclusion lists, inline or from constraints files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    pub tpu_only: Vec<String>,
    pub gpu_only: Vec<String>,
    /// Replaces `tpu_only` when set
    pub tpu_only_file: Option<PathBuf>,
    /// Replaces `gpu_only` when set
    pub gpu_only_file: Option<PathBuf>,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            tpu_only: DEFAULT_TPU_ONLY.iter().map(|s| s.to_string()).collect(),
            gpu_only: DEFAULT_GPU_ONLY.iter().map(|s| s.to_string()).collect(),
            tpu_only_file: None,
            gpu_only_file: None,
        }
    }
}

impl ExclusionConfig {
    /// The list removed from a build targeting `profile`
    ///
    /// A TPU build removes GPU-only packages and vice versa.
    pub fn for_profile(&self, profile: HardwareProfile) -> Result<ExclusionList> {
        let (inline, file) = match profile {
            HardwareProfile::Tpu => (&self.gpu_only, &self.gpu_only_file),
            HardwareProfile::Gpu => (&self.tpu_only, &self.tpu_only_file),
        };
        match file {
            Some(path) => ExclusionList::from_file(path).map_err(|e| {
                Error::ConfigError(format!(
                    "Cannot read exclusion list {}: {}",
                    path.display(),
                    e
                ))
            }),
            None => Ok(ExclusionList::new(inline.iter().cloned())),
        }
    }
}

/// Hosting service endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostingConfig {
    pub api_url: String,
    pub raw_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            raw_url: "https://raw.githubusercontent.com".to_string(),
            user_agent: format!("seedlock/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

impl HostingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `org/repo` identifier on the hosting service
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub org: String,
    pub name: String,
}

impl RepoId {
    pub fn parse(s: &str) -> Result<Self> {
        let valid_part = |p: &str| {
            !p.is_empty()
                && p
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        };
        match s.trim().split_once('/') {
            Some((org, name)) if valid_part(org) && valid_part(name) => Ok(Self {
                org: org.to_string(),
                name: name.to_string(),
            }),
            _ => Err(Error::ConfigError(format!(
                "Repository '{}' is not in 'org/repo' form",
                s
            ))),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.name)
    }
}

impl FromStr for RepoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// One (runtime version, hardware profile) build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTarget {
    pub python: PythonVersion,
    pub profile: HardwareProfile,
    pub exclusions: ExclusionList,
}

/// A validated configuration, ready to run
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub project_repo: RepoId,
    pub seed_repo: RepoId,
    pub python_versions: Vec<PythonVersion>,
    pub targets: Vec<BuildTarget>,
}

impl BuildConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| Error::ConfigError(format!("Invalid config file: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    /// Validate everything that can be checked without the network
    pub fn plan(&self) -> Result<BuildPlan> {
        let project_repo = RepoId::parse(&self.project.repository)?;
        let seed_repo = RepoId::parse(&self.seed.repository)?;

        if self.build.python_versions.is_empty() {
            return Err(Error::ConfigError("No Python versions to build".to_string()));
        }
        if self.build.hardware_profiles.is_empty() {
            return Err(Error::ConfigError("No hardware profiles to build".to_string()));
        }
        if !self.seed.lock_path_template.contains(VERSION_PLACEHOLDER) {
            return Err(Error::ConfigError(format!(
                "Seed lock path template '{}' has no {} placeholder",
                self.seed.lock_path_template, VERSION_PLACEHOLDER
            )));
        }
        if self.seed.reference.trim().is_empty() {
            return Err(Error::ConfigError("Seed reference is empty".to_string()));
        }
        for key in self.seed.overrides.keys() {
            PythonVersion::parse(key)?;
        }
        for url in [&self.hosting.api_url, &self.hosting.raw_url] {
            url::Url::parse(url)
                .map_err(|e| Error::ConfigError(format!("Invalid hosting URL '{url}': {e}")))?;
        }

        let mut python_versions = Vec::new();
        for raw in &self.build.python_versions {
            let version = PythonVersion::parse(raw)?;
            if !python_versions.contains(&version) {
                python_versions.push(version);
            }
        }

        let mut profiles: Vec<HardwareProfile> = Vec::new();
        for &profile in &self.build.hardware_profiles {
            if !profiles.contains(&profile) {
                profiles.push(profile);
            }
        }

        let mut targets = Vec::new();
        for &python in &python_versions {
            for &profile in &profiles {
                targets.push(BuildTarget {
                    python,
                    profile,
                    exclusions: self.exclusions.for_profile(profile)?,
                });
            }
        }

        Ok(BuildPlan {
            project_repo,
            seed_repo,
            python_versions,
            targets,
        })
    }
}
