// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber for logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Build {
            config,
            project_commit,
            seed_ref,
            python_versions,
            hardware_profile,
            output_dir,
            workspace,
            resolver,
        } => commands::cmd_build(
            config.as_deref(),
            commands::BuildOverrides {
                project_commit,
                seed_ref,
                python_versions,
                hardware_profiles: hardware_profile,
                output_dir,
                workspace,
                resolver,
            },
        ),
        Commands::ResolveRef {
            reference,
            repo,
            config,
        } => commands::cmd_resolve_ref(config.as_deref(), &reference, repo.as_deref()),
        Commands::FetchSeed {
            python_version,
            seed_ref,
            output,
            config,
        } => commands::cmd_fetch_seed(
            config.as_deref(),
            &python_version,
            seed_ref.as_deref(),
            output.as_deref(),
        ),
        Commands::PatchRequirements {
            project_commit,
            output,
            config,
        } => commands::cmd_patch_requirements(
            config.as_deref(),
            project_commit.as_deref(),
            output.as_deref(),
        ),
        Commands::LowerBound {
            lock_file,
            pyproject,
        } => commands::cmd_lower_bound(&lock_file, &pyproject),
        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
