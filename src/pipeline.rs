// src/pipeline.rs

//! End-to-end run: fetch, patch, build every target, archive
//!
//! All remote input is fetched before the first resolver call, and nothing
//! is archived until every build in the matrix has succeeded. Archiving
//! stages every target before moving any of them into place, so a failed
//! run leaves the output directory as it was.

use crate::archive::archive_all;
use crate::config::{BuildConfig, RepoId};
use crate::environment::{BuildArtifacts, EnvironmentBuilder};
use crate::error::Result;
use crate::hosting::SourceHost;
use crate::progress::ProgressTracker;
use crate::project::fetch_project_requirements;
use crate::requirements::DependencyList;
use crate::resolver::DependencyResolver;
use crate::seed::{CommitId, SeedResolver};
use crate::version::PythonVersion;
use crate::workspace::Workspace;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use tracing::info;

/// What a successful run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Seed commit used for each runtime version
    pub seed_commits: BTreeMap<PythonVersion, CommitId>,
    /// Archive directories, one per target
    pub outputs: Vec<PathBuf>,
}

/// Wires the stages together for one configuration
pub struct Pipeline<'a, H: SourceHost + ?Sized, R: DependencyResolver + ?Sized> {
    config: &'a BuildConfig,
    host: &'a H,
    resolver: &'a R,
    progress: &'a dyn ProgressTracker,
}

impl<'a, H: SourceHost + ?Sized, R: DependencyResolver + ?Sized> Pipeline<'a, H, R> {
    pub fn new(
        config: &'a BuildConfig,
        host: &'a H,
        resolver: &'a R,
        progress: &'a dyn ProgressTracker,
    ) -> Self {
        Self {
            config,
            host,
            resolver,
            progress,
        }
    }

    pub fn run(&self, workspace: &Workspace) -> Result<RunReport> {
        let result = self.run_stages(workspace);
        match &result {
            Ok(report) => self
                .progress
                .finish_with_message(&format!("Built {} environment(s)", report.outputs.len())),
            Err(e) => self.progress.finish_with_error(&e.to_string()),
        }
        result
    }

    fn run_stages(&self, workspace: &Workspace) -> Result<RunReport> {
        let plan = self.config.plan()?;
        self.progress.set_length(plan.targets.len() as u64);

        self.progress.set_message("Fetching project requirements");
        let project = fetch_project_requirements(
            self.host,
            &plan.project_repo,
            &self.config.project,
            None,
        )?;
        let patched = self.config.patch.apply(&project);

        let mut report = RunReport::default();
        let seeds = self.fetch_seeds(&plan.seed_repo, &plan.python_versions, &mut report)?;

        let builder = EnvironmentBuilder::new(self.resolver, &self.config.project.name, &self.config.build);
        let mut built: Vec<BuildArtifacts> = Vec::with_capacity(plan.targets.len());
        for target in &plan.targets {
            self.progress.set_message(&format!(
                "Resolving Python {} ({})",
                target.python, target.profile
            ));
            let build_dir = workspace.build_dir(target.python, target.profile);
            let seed = &seeds[&target.python];
            built.push(builder.build(&build_dir, target, seed, &patched)?);
            self.progress.increment(1);
        }

        self.progress.set_message("Archiving artifacts");
        report.outputs = archive_all(&built, &self.config.build.output_dir)?;

        info!(
            "Archived {} environment(s) under {}",
            report.outputs.len(),
            self.config.build.output_dir.display()
        );
        Ok(report)
    }

    /// Resolve each version's seed reference once and download its list
    fn fetch_seeds(
        &self,
        repo: &RepoId,
        versions: &[PythonVersion],
        report: &mut RunReport,
    ) -> Result<BTreeMap<PythonVersion, DependencyList>> {
        let resolver = SeedResolver::new(self.host);
        let mut commits: HashMap<&str, CommitId> = HashMap::new();
        let mut seeds = BTreeMap::new();

        for &python in versions {
            let reference = self.config.seed.reference_for(python);
            self.progress
                .set_message(&format!("Resolving seed reference {}", reference));
            let commit = match commits.get(reference) {
                Some(commit) => commit.clone(),
                None => {
                    let commit = resolver.resolve_reference(repo, reference)?;
                    commits.insert(reference, commit.clone());
                    commit
                }
            };

            let list = resolver.fetch_seed_list(repo, &self.config.seed, &commit, python)?;
            report.seed_commits.insert(python, commit);
            seeds.insert(python, list);
        }
        Ok(seeds)
    }
}
