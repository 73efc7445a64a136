// src/commands/mod.rs
//! Command handlers for the seedlock CLI

mod build;
mod fetch;
mod lower_bound;

pub use build::{BuildOverrides, cmd_build};
pub use fetch::{cmd_fetch_seed, cmd_patch_requirements, cmd_resolve_ref};
pub use lower_bound::cmd_lower_bound;

use anyhow::{Context, Result};
use clap::CommandFactory;
use clap_complete::Shell;
use seedlock::BuildConfig;
use std::fs;
use std::io;
use std::path::Path;

/// Load the config file if one was given, defaults otherwise
pub(crate) fn load_config(path: Option<&str>) -> Result<BuildConfig> {
    match path {
        Some(path) => BuildConfig::load(Path::new(path))
            .with_context(|| format!("Failed to load config {}", path)),
        None => Ok(BuildConfig::default()),
    }
}

/// Write text to a file, or stdout when no path is given
pub(crate) fn write_output(output: Option<&str>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path))?;
            eprintln!("Wrote {}", path);
        }
        None => print!("{}", text),
    }
    Ok(())
}

/// Print shell completions to stdout
pub fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = crate::cli::Cli::command();
    clap_complete::generate(shell, &mut cmd, "seedlock", &mut io::stdout());
    Ok(())
}
