// src/resolver/mod.rs

//! Package resolver abstraction
//!
//! Resolution itself is delegated to an external resolver that edits the
//! project manifest, keeps its own state file next to it, and exports a
//! flat `name==version` lock. `DependencyResolver` captures the four
//! operations the environment builder needs; `UvResolver` drives `uv`.

mod uv;

pub use uv::UvResolver;

use crate::error::Result;
use std::path::Path;
use strum_macros::{Display, EnumString};

/// Which version of each package the resolver prefers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ResolutionStrategy {
    /// Newest versions satisfying every constraint
    Highest,
    /// Oldest versions satisfying every constraint
    Lowest,
}

/// External resolver operations, all run inside a project directory
pub trait DependencyResolver {
    /// File name of the resolver's state file inside the project directory
    fn state_file(&self) -> &str;

    /// Add every requirement in `requirements` to the manifest and re-resolve
    ///
    /// With `allow_source_builds` false, packages that only ship source
    /// distributions make resolution fail instead of being built.
    fn add(
        &self,
        project_dir: &Path,
        requirements: &Path,
        strategy: ResolutionStrategy,
        allow_source_builds: bool,
    ) -> Result<()>;

    /// Remove a declared package from the manifest and re-resolve
    fn remove(&self, project_dir: &Path, package: &str, strategy: ResolutionStrategy) -> Result<()>;

    /// Write the resolved closure as a flat lock to `output`
    fn export(&self, project_dir: &Path, output: &Path, strategy: ResolutionStrategy) -> Result<()>;

    /// Re-resolve the manifest from scratch into a new state file
    fn relock(&self, project_dir: &Path, strategy: ResolutionStrategy) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_strategy_names() {
        assert_eq!(ResolutionStrategy::Highest.to_string(), "highest");
        assert_eq!(ResolutionStrategy::Lowest.to_string(), "lowest");
        assert_eq!(
            ResolutionStrategy::from_str("lowest").unwrap(),
            ResolutionStrategy::Lowest
        );
    }
}
