// src/environment.rs

//! Environment builder
//!
//! Turns a seed list and a patched project list into a lowest-version lock
//! for one (runtime version, hardware profile) target. Each build runs in
//! its own directory holding the manifest, the resolver state file and the
//! exported lock.
//!
//! # Sequence
//!
//! 1. Fresh manifest for the target runtime, no resolver state
//! 2. `add` the seed list (highest, binary distributions only)
//! 3. `remove` every excluded package the manifest declares
//! 4. `add` the project list (highest)
//! 5. `export` the highest closure
//! 6. Rewrite the manifest's entries to lower bounds from that export
//! 7. Drop the resolver state, `relock` lowest, `export` the final lock

use crate::config::{BuildSettings, BuildTarget};
use crate::error::Result;
use crate::manifest::{MANIFEST_FILE, Manifest, lower_bound_project};
use crate::profile::HardwareProfile;
use crate::requirements::DependencyList;
use crate::resolver::{DependencyResolver, ResolutionStrategy};
use crate::version::PythonVersion;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SEED_REQUIREMENTS_FILE: &str = "seed_requirements.txt";
const PROJECT_REQUIREMENTS_FILE: &str = "requirements.txt";

/// File name of the final lock artifact for a target
///
/// `maxtext_requirements_lock_tpu_3_12.txt`
pub fn lock_file_name(project: &str, profile: HardwareProfile, python: PythonVersion) -> String {
    format!(
        "{}_requirements_lock_{}_{}.txt",
        project,
        profile,
        python.sanitized()
    )
}

/// Files produced by one successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifacts {
    pub python: PythonVersion,
    pub profile: HardwareProfile,
    /// Build directory the files live in until archived
    pub dir: PathBuf,
    pub manifest: PathBuf,
    pub lock: PathBuf,
    pub state: PathBuf,
}

impl BuildArtifacts {
    /// Paths in archive order
    pub fn files(&self) -> [&Path; 3] {
        [&self.manifest, &self.lock, &self.state]
    }
}

/// Builds one environment at a time with a resolver
pub struct EnvironmentBuilder<'a, R: DependencyResolver + ?Sized> {
    resolver: &'a R,
    project_name: String,
    manifest_name: String,
    manifest_version: String,
}

impl<'a, R: DependencyResolver + ?Sized> EnvironmentBuilder<'a, R> {
    pub fn new(resolver: &'a R, project_name: &str, settings: &BuildSettings) -> Self {
        Self {
            resolver,
            project_name: project_name.to_string(),
            manifest_name: settings.manifest_name.clone(),
            manifest_version: settings.manifest_version.clone(),
        }
    }

    /// Run the full build sequence in `build_dir`
    ///
    /// The first failing resolver call aborts the build with its error.
    pub fn build(
        &self,
        build_dir: &Path,
        target: &BuildTarget,
        seed: &DependencyList,
        project: &DependencyList,
    ) -> Result<BuildArtifacts> {
        let python = target.python;
        let profile = target.profile;
        info!("Building {} environment for Python {}", profile, python);

        fs::create_dir_all(build_dir)?;
        let manifest_path = build_dir.join(MANIFEST_FILE);
        let state_path = build_dir.join(self.resolver.state_file());
        let lock_path = build_dir.join(lock_file_name(&self.project_name, profile, python));
        let seed_path = build_dir.join(SEED_REQUIREMENTS_FILE);
        let project_path = build_dir.join(PROJECT_REQUIREMENTS_FILE);

        seed.write_to(&seed_path)?;
        project.write_to(&project_path)?;

        Manifest::new(&self.manifest_name, &self.manifest_version, python).save(&manifest_path)?;
        remove_state(&state_path)?;

        self.resolver
            .add(build_dir, &seed_path, ResolutionStrategy::Highest, false)?;

        self.remove_exclusions(build_dir, &manifest_path, target)?;

        self.resolver
            .add(build_dir, &project_path, ResolutionStrategy::Highest, true)?;
        self.resolver
            .export(build_dir, &lock_path, ResolutionStrategy::Highest)?;

        lower_bound_project(&lock_path, &manifest_path)?;

        remove_state(&state_path)?;
        self.resolver.relock(build_dir, ResolutionStrategy::Lowest)?;
        self.resolver
            .export(build_dir, &lock_path, ResolutionStrategy::Lowest)?;

        info!("Built {}", lock_path.display());
        Ok(BuildArtifacts {
            python,
            profile,
            dir: build_dir.to_path_buf(),
            manifest: manifest_path,
            lock: lock_path,
            state: state_path,
        })
    }

    /// Remove excluded packages, skipping the ones the manifest never declared
    fn remove_exclusions(&self, build_dir: &Path, manifest_path: &Path, target: &BuildTarget) -> Result<()> {
        let manifest = Manifest::load(manifest_path)?;
        let mut removed = 0;
        for package in target.exclusions.packages() {
            if manifest.declares(package) {
                self.resolver
                    .remove(build_dir, package, ResolutionStrategy::Highest)?;
                removed += 1;
            } else {
                debug!("{} not declared, nothing to remove", package);
            }
        }
        info!(
            "Removed {} package(s) excluded from {} builds",
            removed, target.profile
        );
        Ok(())
    }
}

fn remove_state(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed resolver state {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::lockfile::LockArtifact;
    use crate::profile::ExclusionList;
    use crate::requirements::requirement_name;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Records calls and pins every added package at 1.0
    #[derive(Default)]
    struct ScriptedResolver {
        calls: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl ScriptedResolver {
        fn record(&self, call: String) -> Result<()> {
            let op = call.split(':').next().unwrap_or_default().to_string();
            self.calls.borrow_mut().push(call.clone());
            if self.fail_on == Some(op.as_str()) {
                return Err(Error::ResolverProcessError {
                    command: call,
                    status: "exit status: 1".to_string(),
                    stderr: "No solution found".to_string(),
                });
            }
            Ok(())
        }
    }

    impl DependencyResolver for ScriptedResolver {
        fn state_file(&self) -> &str {
            "uv.lock"
        }

        fn add(&self, dir: &Path, requirements: &Path, strategy: ResolutionStrategy, builds: bool) -> Result<()> {
            self.record(format!("add:{strategy}:{builds}"))?;
            let list = DependencyList::read_from(requirements)?;
            let path = dir.join(MANIFEST_FILE);
            let mut manifest = Manifest::load(&path)?;
            let mut deps = manifest.dependencies();
            deps.extend(list.requirements().map(str::to_string));
            manifest.set_dependencies(deps);
            manifest.save(&path)?;
            fs::write(dir.join("uv.lock"), "version = 1\n")?;
            Ok(())
        }

        fn remove(&self, dir: &Path, package: &str, strategy: ResolutionStrategy) -> Result<()> {
            self.record(format!("remove:{strategy}:{package}"))?;
            let path = dir.join(MANIFEST_FILE);
            let mut manifest = Manifest::load(&path)?;
            let deps = manifest
                .dependencies()
                .into_iter()
                .filter(|d| requirement_name(d) != Some(package))
                .collect();
            manifest.set_dependencies(deps);
            manifest.save(&path)
        }

        fn export(&self, dir: &Path, output: &Path, strategy: ResolutionStrategy) -> Result<()> {
            self.record(format!("export:{strategy}"))?;
            let manifest = Manifest::load(&dir.join(MANIFEST_FILE))?;
            let pins: String = manifest
                .dependencies()
                .iter()
                .filter_map(|d| requirement_name(d))
                .map(|name| format!("{name}==1.0\n"))
                .collect();
            fs::write(output, pins)?;
            Ok(())
        }

        fn relock(&self, dir: &Path, strategy: ResolutionStrategy) -> Result<()> {
            self.record(format!("relock:{strategy}"))?;
            assert!(!dir.join("uv.lock").exists(), "state must be gone before relock");
            fs::write(dir.join("uv.lock"), "version = 1\n")?;
            Ok(())
        }
    }

    fn target(profile: HardwareProfile, exclusions: &[&str]) -> BuildTarget {
        BuildTarget {
            python: PythonVersion::new(3, 12),
            profile,
            exclusions: ExclusionList::new(exclusions.iter().copied()),
        }
    }

    #[test]
    fn test_lock_file_name() {
        assert_eq!(
            lock_file_name("maxtext", HardwareProfile::Gpu, PythonVersion::new(3, 11)),
            "maxtext_requirements_lock_gpu_3_11.txt"
        );
    }

    #[test]
    fn test_build_sequence() {
        let dir = TempDir::new().unwrap();
        let resolver = ScriptedResolver::default();
        let builder = EnvironmentBuilder::new(&resolver, "maxtext", &BuildSettings::default());

        let seed = DependencyList::parse("numpy==1.26.4\nlibtpu==0.0.17\njax-cuda12-plugin==0.6.2\n");
        let project = DependencyList::parse("absl-py\n");
        let artifacts = builder
            .build(
                dir.path(),
                &target(HardwareProfile::Tpu, &["jax-cuda12-plugin", "nvidia-nccl-cu12"]),
                &seed,
                &project,
            )
            .unwrap();

        assert_eq!(
            resolver.calls.borrow().as_slice(),
            &[
                "add:highest:false",
                "remove:highest:jax-cuda12-plugin",
                "add:highest:true",
                "export:highest",
                "relock:lowest",
                "export:lowest",
            ]
        );

        for file in artifacts.files() {
            assert!(file.exists(), "{} missing", file.display());
        }
        assert!(artifacts.lock.ends_with("maxtext_requirements_lock_tpu_3_12.txt"));

        let manifest = Manifest::load(&artifacts.manifest).unwrap();
        assert_eq!(
            manifest.dependencies(),
            vec!["numpy>=1.0", "libtpu>=1.0", "absl-py>=1.0"]
        );
        let lock = LockArtifact::read_from(&artifacts.lock).unwrap();
        assert!(!lock.contains("jax-cuda12-plugin"));
    }

    #[test]
    fn test_resolver_failure_aborts_build() {
        let dir = TempDir::new().unwrap();
        let resolver = ScriptedResolver {
            fail_on: Some("relock"),
            ..Default::default()
        };
        let builder = EnvironmentBuilder::new(&resolver, "maxtext", &BuildSettings::default());

        let err = builder
            .build(
                dir.path(),
                &target(HardwareProfile::Gpu, &[]),
                &DependencyList::parse("numpy==1.26.4\n"),
                &DependencyList::parse("absl-py\n"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::ResolverProcessError { .. }));
        assert_eq!(resolver.calls.borrow().last().unwrap(), "relock:lowest");
    }
}
