// src/cli/mod.rs
//! CLI definitions for seedlock
//!
//! This module contains the command-line interface definitions using clap.
//! The actual command implementations are in the `commands` module.
//!
//! - `build` - Run the full pipeline over the build matrix
//! - `resolve-ref` - Resolve a tag or commit to a commit id
//! - `fetch-seed` - Download one seed lock list
//! - `patch-requirements` - Fetch and patch the project requirements
//! - `lower-bound` - Rewrite a manifest to lower bounds from a lock file
//! - `completions` - Shell completions

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use seedlock::HardwareProfile;

#[derive(Parser)]
#[command(name = "seedlock")]
#[command(author = "Seedlock Contributors")]
#[command(version)]
#[command(about = "Build reproducible Python dependency locks from an upstream seed environment", long_about = None)]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build seed environment lock files for every runtime version and profile
    Build {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<String>,

        /// Downstream project commit (defaults to the tip of the default branch)
        #[arg(long)]
        project_commit: Option<String>,

        /// Seed repository tag or commit
        #[arg(long)]
        seed_ref: Option<String>,

        /// Runtime versions to build, e.g. 3.11 3.12
        #[arg(long, num_args = 1.., value_name = "X.Y")]
        python_versions: Vec<String>,

        /// Hardware profiles to build
        #[arg(long, value_enum, num_args = 1..)]
        hardware_profile: Vec<HardwareProfile>,

        /// Archive root for the generated files
        #[arg(short, long)]
        output_dir: Option<String>,

        /// Persistent workspace directory (a temporary one when omitted)
        #[arg(long)]
        workspace: Option<String>,

        /// Resolver executable
        #[arg(long)]
        resolver: Option<String>,
    },

    /// Resolve a tag or commit to the commit it names
    ResolveRef {
        /// Tag name or 40-character commit hash
        reference: String,

        /// Repository in org/repo form (defaults to the seed repository)
        #[arg(long)]
        repo: Option<String>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Download the seed lock list for one runtime version
    FetchSeed {
        /// Runtime version, e.g. 3.12
        python_version: String,

        /// Seed repository tag or commit
        #[arg(long)]
        seed_ref: Option<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Fetch the project requirements and apply the patch rules
    PatchRequirements {
        /// Downstream project commit (defaults to the tip of the default branch)
        #[arg(long)]
        project_commit: Option<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Rewrite a manifest's dependencies as lower bounds of a lock file
    LowerBound {
        /// Exported lock file (name==version lines)
        lock_file: String,

        /// pyproject.toml to rewrite in place
        pyproject: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_build_flags() {
        let cli = Cli::try_parse_from([
            "seedlock",
            "build",
            "--python-versions",
            "3.11",
            "3.12",
            "--hardware-profile",
            "tpu",
            "--seed-ref",
            "jax-v0.6.2",
        ])
        .unwrap();

        match cli.command {
            Commands::Build {
                python_versions,
                hardware_profile,
                seed_ref,
                ..
            } => {
                assert_eq!(python_versions, vec!["3.11", "3.12"]);
                assert_eq!(hardware_profile, vec![HardwareProfile::Tpu]);
                assert_eq!(seed_ref.as_deref(), Some("jax-v0.6.2"));
            }
            _ => panic!("expected build"),
        }
    }

    #[test]
    fn test_unknown_profile_rejected() {
        assert!(Cli::try_parse_from(["seedlock", "build", "--hardware-profile", "cpu"]).is_err());
    }
}
