// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.
//!
//! `FakeHost` serves tags, commits and raw files from memory. `FakeResolver`
//! stands in for uv: it edits the manifest's dependency array and resolves
//! against a small in-memory package index, greedily picking the highest or
//! lowest release that satisfies every constraint.

#![allow(dead_code)]

use seedlock::hosting::GitObject;
use seedlock::requirements::{normalize_name, requirement_name};
use seedlock::{
    BuildConfig, DependencyList, DependencyResolver, Error, HardwareProfile, Manifest,
    RepoId, ResolutionStrategy, Result, SourceHost,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

pub const SEED_COMMIT: &str = "1ad05bb26105f23ee7728b36cca12901fe70e187";
pub const SEED_TAG: &str = "jax-v0.6.2";

/// In-memory hosting service
#[derive(Default)]
pub struct FakeHost {
    tags: HashMap<String, String>,
    commits: HashSet<String>,
    files: HashMap<String, String>,
    pub raw_fetches: RefCell<Vec<String>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: &str, commit: &str) -> Self {
        self.tags.insert(tag.to_string(), commit.to_string());
        self.commits.insert(commit.to_string());
        self
    }

    pub fn with_file(mut self, repo: &str, reference: &str, path: &str, content: &str) -> Self {
        self.files
            .insert(format!("{repo}/{reference}/{path}"), content.to_string());
        self
    }
}

impl SourceHost for FakeHost {
    fn tag_ref(&self, _repo: &RepoId, tag: &str) -> Result<Option<GitObject>> {
        Ok(self.tags.get(tag).map(|sha| GitObject {
            sha: sha.clone(),
            kind: "commit".to_string(),
        }))
    }

    fn annotated_tag(&self, _repo: &RepoId, _sha: &str) -> Result<Option<GitObject>> {
        Ok(None)
    }

    fn commit(&self, _repo: &RepoId, sha: &str) -> Result<Option<String>> {
        Ok(self.commits.get(sha).cloned())
    }

    fn fetch_raw(&self, repo: &RepoId, reference: &str, path: &str) -> Result<String> {
        let key = format!("{repo}/{reference}/{path}");
        self.raw_fetches.borrow_mut().push(key.clone());
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| Error::NotFoundError(key))
    }
}

/// Version comparison key: "1.10.0" sorts after "1.9"
fn version_key(version: &str) -> Vec<u64> {
    let mut parts: Vec<u64> = version
        .split('.')
        .map(|p| p.parse().unwrap_or(0))
        .collect();
    while parts.last() == Some(&0) {
        parts.pop();
    }
    parts
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Constraint {
    Any,
    Exact(String),
    AtLeast(String),
}

impl Constraint {
    fn allows(&self, version: &str) -> bool {
        match self {
            Constraint::Any => true,
            Constraint::Exact(v) => version_key(version) == version_key(v),
            Constraint::AtLeast(v) => version_key(version) >= version_key(v),
        }
    }
}

/// Split a requirement into a normalized name and its constraint
fn parse_requirement(line: &str) -> Option<(String, Constraint)> {
    let spec = line.split(';').next().unwrap_or_default().trim();
    let name = normalize_name(requirement_name(spec)?);
    let constraint = if let Some((_, v)) = spec.split_once("==") {
        Constraint::Exact(v.trim().to_string())
    } else if let Some((_, v)) = spec.split_once(">=") {
        Constraint::AtLeast(v.trim().to_string())
    } else {
        Constraint::Any
    };
    Some((name, constraint))
}

#[derive(Debug, Clone)]
struct Release {
    version: String,
    requires: Vec<String>,
}

/// Resolver over an in-memory package index
pub struct FakeResolver {
    index: RefCell<BTreeMap<String, Vec<Release>>>,
    pub calls: RefCell<Vec<String>>,
    /// Every lock the resolver exported, in order
    pub exports: RefCell<Vec<String>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self {
            index: RefCell::new(BTreeMap::new()),
            calls: RefCell::new(Vec::new()),
            exports: RefCell::new(Vec::new()),
        }
    }

    /// Make a release available to later resolutions
    pub fn publish(&self, name: &str, version: &str, requires: &[&str]) -> &Self {
        self.index
            .borrow_mut()
            .entry(normalize_name(name))
            .or_default()
            .push(Release {
                version: version.to_string(),
                requires: requires.iter().map(|r| r.to_string()).collect(),
            });
        self
    }

    fn fail(command: String, stderr: impl Into<String>) -> Error {
        Error::ResolverProcessError {
            command,
            status: "exit status: 1".to_string(),
            stderr: stderr.into(),
        }
    }

    fn resolve(&self, roots: &[String], strategy: ResolutionStrategy) -> Result<BTreeMap<String, String>> {
        let index = self.index.borrow();
        let root_constraints: Vec<(String, Constraint)> =
            roots.iter().filter_map(|r| parse_requirement(r)).collect();

        let collect = |extra: &[(String, Constraint)]| {
            let mut map: BTreeMap<String, Vec<Constraint>> = BTreeMap::new();
            for (name, c) in root_constraints.iter().chain(extra) {
                map.entry(name.clone()).or_default().push(c.clone());
            }
            for cs in map.values_mut() {
                cs.sort();
                cs.dedup();
            }
            map
        };

        let mut constraints = collect(&[]);
        for _ in 0..64 {
            let mut chosen: BTreeMap<String, &Release> = BTreeMap::new();
            for (name, cs) in &constraints {
                let releases = index
                    .get(name)
                    .ok_or_else(|| Self::fail(format!("resolve {name}"), format!("No package named {name}")))?;
                let candidates = releases.iter().filter(|r| cs.iter().all(|c| c.allows(&r.version)));
                let pick = match strategy {
                    ResolutionStrategy::Highest => candidates.max_by_key(|r| version_key(&r.version)),
                    ResolutionStrategy::Lowest => candidates.min_by_key(|r| version_key(&r.version)),
                };
                let release = pick.ok_or_else(|| {
                    Self::fail(format!("resolve {name}"), format!("No solution found for {name} {cs:?}"))
                })?;
                chosen.insert(name.clone(), release);
            }

            let transitive: Vec<(String, Constraint)> = chosen
                .values()
                .flat_map(|r| r.requires.iter().filter_map(|d| parse_requirement(d)))
                .collect();
            let next = collect(&transitive);
            if next == constraints {
                return Ok(chosen
                    .into_iter()
                    .map(|(name, r)| (name, r.version.clone()))
                    .collect());
            }
            constraints = next;
        }
        Err(Self::fail("resolve".to_string(), "resolution did not converge"))
    }

    fn lock(&self, dir: &Path, strategy: ResolutionStrategy) -> Result<()> {
        let manifest = Manifest::load(&dir.join("pyproject.toml"))?;
        let pins = self.resolve(&manifest.dependencies(), strategy)?;
        let state: String = pins
            .iter()
            .map(|(name, version)| format!("{name}=={version}\n"))
            .collect();
        fs::write(dir.join(self.state_file()), state)?;
        Ok(())
    }
}

impl Default for FakeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyResolver for FakeResolver {
    fn state_file(&self) -> &str {
        "uv.lock"
    }

    fn add(&self, dir: &Path, requirements: &Path, strategy: ResolutionStrategy, builds: bool) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("add --resolution={strategy} build={builds}"));
        let list = DependencyList::read_from(requirements)?;
        let path = dir.join("pyproject.toml");
        let mut manifest = Manifest::load(&path)?;
        let mut deps = manifest.dependencies();
        for line in list.requirements() {
            let name = requirement_name(line).map(normalize_name);
            deps.retain(|d| requirement_name(d).map(normalize_name) != name);
            deps.push(line.to_string());
        }
        manifest.set_dependencies(deps);
        manifest.save(&path)?;
        self.lock(dir, strategy)
    }

    fn remove(&self, dir: &Path, package: &str, strategy: ResolutionStrategy) -> Result<()> {
        self.calls.borrow_mut().push(format!("remove {package}"));
        let path = dir.join("pyproject.toml");
        let mut manifest = Manifest::load(&path)?;
        if !manifest.declares(package) {
            return Err(Self::fail(
                format!("remove {package}"),
                format!("The dependency `{package}` could not be found in `project.dependencies`"),
            ));
        }
        let wanted = normalize_name(package);
        let deps = manifest
            .dependencies()
            .into_iter()
            .filter(|d| requirement_name(d).map(normalize_name).as_deref() != Some(wanted.as_str()))
            .collect();
        manifest.set_dependencies(deps);
        manifest.save(&path)?;
        self.lock(dir, strategy)
    }

    fn export(&self, dir: &Path, output: &Path, strategy: ResolutionStrategy) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("export --resolution={strategy}"));
        let state = fs::read_to_string(dir.join(self.state_file()))
            .map_err(|_| Self::fail("export --locked".to_string(), "Unable to find lockfile"))?;
        fs::write(output, &state)?;
        self.exports.borrow_mut().push(state);
        Ok(())
    }

    fn relock(&self, dir: &Path, strategy: ResolutionStrategy) -> Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("lock --resolution={strategy}"));
        self.lock(dir, strategy)
    }
}

/// A small index with several releases per package
pub fn sample_resolver() -> FakeResolver {
    let resolver = FakeResolver::new();
    resolver
        .publish("numpy", "1.0.0", &[])
        .publish("numpy", "1.2.0", &[])
        .publish("numpy", "2.0.0", &[])
        .publish("scipy", "1.0", &["numpy>=1.0.0", "packaging>=20.0"])
        .publish("scipy", "1.1", &["numpy>=2.0.0", "packaging>=20.0"])
        .publish("packaging", "20.0", &[])
        .publish("packaging", "24.0", &[])
        .publish("absl-py", "1.0.0", &[])
        .publish("absl-py", "2.1.0", &[])
        .publish("libtpu", "1.0", &[])
        .publish("pathwaysutils", "0.1.0", &["absl-py>=1.0.0"])
        .publish("pathwaysutils", "0.1.1", &["absl-py>=1.0.0"]);
    resolver
}

/// Config for a single-version build writing under `output_dir`
pub fn single_target_config(output_dir: &Path, profile: HardwareProfile) -> BuildConfig {
    let mut config = BuildConfig::default();
    config.seed.reference = SEED_TAG.to_string();
    config.seed.overrides.clear();
    config.build.python_versions = vec!["3.12".to_string()];
    config.build.hardware_profiles = vec![profile];
    config.build.output_dir = output_dir.to_path_buf();
    config
}

/// Host serving a seed list for 3.12 and a project requirements file
pub fn host_with(seed: &str, project: &str) -> FakeHost {
    FakeHost::new()
        .with_tag(SEED_TAG, SEED_COMMIT)
        .with_file(
            "jax-ml/jax",
            SEED_COMMIT,
            "build/requirements_lock_3_12.txt",
            seed,
        )
        .with_file(
            "AI-Hypercomputer/maxtext",
            "main",
            "requirements.txt",
            project,
        )
}
