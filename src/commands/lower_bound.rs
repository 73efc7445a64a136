// src/commands/lower_bound.rs

//! `seedlock lower-bound`: standalone lock-to-lower-bound rewrite

use anyhow::{Context, Result};
use seedlock::lower_bound_project;
use std::path::Path;

pub fn cmd_lower_bound(lock_file: &str, pyproject: &str) -> Result<()> {
    let summary = lower_bound_project(Path::new(lock_file), Path::new(pyproject))
        .with_context(|| format!("Failed to lower-bound {} from {}", pyproject, lock_file))?;

    println!(
        "Updated {}: {} rewritten, {} added, {} duplicate(s) dropped",
        pyproject, summary.rewritten, summary.added, summary.dropped
    );
    if summary.skipped > 0 {
        println!("  {} malformed lock line(s) skipped", summary.skipped);
    }
    Ok(())
}
