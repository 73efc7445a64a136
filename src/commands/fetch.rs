// src/commands/fetch.rs

//! Single-stage commands: reference resolution, seed download, patching

use super::{load_config, write_output};
use anyhow::{Context, Result};
use seedlock::project::fetch_project_requirements;
use seedlock::{GithubClient, PythonVersion, RepoId, SeedResolver};

/// Print the commit a reference resolves to
pub fn cmd_resolve_ref(config_path: Option<&str>, reference: &str, repo: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let repo = RepoId::parse(repo.unwrap_or(&config.seed.repository))?;
    let host = GithubClient::new(&config.hosting)?;

    let commit = SeedResolver::new(&host)
        .resolve_reference(&repo, reference)
        .with_context(|| format!("Failed to resolve '{}' in {}", reference, repo))?;
    println!("{}", commit);
    Ok(())
}

/// Resolve the seed reference and download one runtime version's list
pub fn cmd_fetch_seed(
    config_path: Option<&str>,
    python_version: &str,
    seed_ref: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let python = PythonVersion::parse(python_version)?;
    let repo = RepoId::parse(&config.seed.repository)?;
    let reference = seed_ref.unwrap_or_else(|| config.seed.reference_for(python));
    let host = GithubClient::new(&config.hosting)?;

    let resolver = SeedResolver::new(&host);
    let commit = resolver.resolve_reference(&repo, reference)?;
    let list = resolver
        .fetch_seed_list(&repo, &config.seed, &commit, python)
        .with_context(|| format!("No seed list for Python {} at {}", python, commit))?;

    eprintln!("Seed {} at {} ({})", repo, commit, reference);
    write_output(output, &list.to_text())
}

/// Download the project requirements and print them patched
pub fn cmd_patch_requirements(
    config_path: Option<&str>,
    project_commit: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let repo = RepoId::parse(&config.project.repository)?;
    let host = GithubClient::new(&config.hosting)?;

    let list = fetch_project_requirements(&host, &repo, &config.project, project_commit)?;
    let patched = config.patch.apply(&list);
    write_output(output, &patched.to_text())
}
