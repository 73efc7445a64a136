// src/project.rs

//! Downstream project requirements
//!
//! The project's requirements file is fetched at an exact commit when one is
//! given, otherwise at the tip of its default branch.

use crate::config::{ProjectConfig, RepoId};
use crate::error::Result;
use crate::hosting::SourceHost;
use crate::requirements::DependencyList;
use crate::seed::SeedResolver;
use tracing::info;

/// Fetch the project's requirements file
///
/// `commit` overrides `config.commit`. A commit that does not exist in the
/// repository is a `ResolutionError` and nothing is downloaded.
pub fn fetch_project_requirements<H: SourceHost + ?Sized>(
    host: &H,
    repo: &RepoId,
    config: &ProjectConfig,
    commit: Option<&str>,
) -> Result<DependencyList> {
    let reference = match commit.or(config.commit.as_deref()) {
        Some(commit) => {
            let verified = SeedResolver::new(host).verify_commit(repo, commit.trim())?;
            info!("Using {} requirements at commit {}", repo, verified);
            verified.to_string()
        }
        None => {
            info!("Using {} requirements at branch {}", repo, config.default_branch);
            config.default_branch.clone()
        }
    };

    let text = host.fetch_raw(repo, &reference, &config.requirements_path)?;
    Ok(DependencyList::parse(&text))
}
