// src/commands/build.rs

//! `seedlock build`: the full pipeline

use super::load_config;
use anyhow::{Context, Result};
use seedlock::{
    BuildConfig, CliProgress, GithubClient, HardwareProfile, LogProgress, Pipeline,
    ProgressTracker, UvResolver, Workspace,
};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::info;

/// Command-line values that override the config file
#[derive(Debug, Default)]
pub struct BuildOverrides {
    pub project_commit: Option<String>,
    pub seed_ref: Option<String>,
    pub python_versions: Vec<String>,
    pub hardware_profiles: Vec<HardwareProfile>,
    pub output_dir: Option<String>,
    pub workspace: Option<String>,
    pub resolver: Option<String>,
}

impl BuildOverrides {
    fn apply(self, config: &mut BuildConfig) {
        if let Some(commit) = self.project_commit {
            config.project.commit = Some(commit);
        }
        if let Some(reference) = self.seed_ref {
            // An explicit reference wins for every runtime version
            config.seed.reference = reference;
            config.seed.overrides.clear();
        }
        if !self.python_versions.is_empty() {
            config.build.python_versions = self.python_versions;
        }
        if !self.hardware_profiles.is_empty() {
            config.build.hardware_profiles = self.hardware_profiles;
        }
        if let Some(dir) = self.output_dir {
            config.build.output_dir = PathBuf::from(dir);
        }
        if let Some(dir) = self.workspace {
            config.build.workspace = Some(PathBuf::from(dir));
        }
        if let Some(resolver) = self.resolver {
            config.build.resolver = resolver;
        }
    }
}

pub fn cmd_build(config_path: Option<&str>, overrides: BuildOverrides) -> Result<()> {
    let mut config = load_config(config_path)?;
    overrides.apply(&mut config);

    // Fail on bad input before touching the network or the resolver
    let plan = config.plan()?;
    let resolver = UvResolver::locate(&config.build.resolver)?;
    let host = GithubClient::new(&config.hosting)?;

    let workspace = Workspace::open(config.build.workspace.as_deref())
        .context("Failed to prepare workspace")?;
    info!(
        "Building {} target(s) in {}",
        plan.targets.len(),
        workspace.path().display()
    );

    let progress: Box<dyn ProgressTracker> = if std::io::stderr().is_terminal() {
        Box::new(CliProgress::new("Building seed environments"))
    } else {
        Box::new(LogProgress::new("build"))
    };

    let report = Pipeline::new(&config, &host, &resolver, progress.as_ref())
        .run(&workspace)
        .context("Build failed, no artifacts were archived")?;

    for (python, commit) in &report.seed_commits {
        println!("Python {}: seed commit {}", python, commit);
    }
    for dir in &report.outputs {
        println!("  {}", display_relative(dir));
    }
    Ok(())
}

fn display_relative(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_config() {
        let mut config = BuildConfig::default();
        BuildOverrides {
            seed_ref: Some("jax-v0.7.0".to_string()),
            python_versions: vec!["3.12".to_string()],
            hardware_profiles: vec![HardwareProfile::Gpu],
            output_dir: Some("out".to_string()),
            ..Default::default()
        }
        .apply(&mut config);

        assert_eq!(config.seed.reference, "jax-v0.7.0");
        assert!(config.seed.overrides.is_empty());
        assert_eq!(config.build.python_versions, vec!["3.12"]);
        assert_eq!(config.build.hardware_profiles, vec![HardwareProfile::Gpu]);
        assert_eq!(config.build.output_dir, PathBuf::from("out"));
        assert_eq!(config.build.resolver, "uv");
    }

    #[test]
    fn test_empty_overrides_keep_config() {
        let mut config = BuildConfig::default();
        BuildOverrides::default().apply(&mut config);
        assert_eq!(config.seed.reference, "jax-v0.6.2");
        assert_eq!(config.seed.overrides.len(), 1);
        assert_eq!(config.build.python_versions.len(), 3);
    }
}
