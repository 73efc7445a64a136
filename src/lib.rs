// src/lib.rs

//! Seedlock
//!
//! Builds reproducible Python dependency locks for a downstream project by
//! seeding its environment with the pinned dependency set an upstream project
//! uses in its own test matrix.
//!
//! # Architecture
//!
//! - Immutable inputs: every tag is resolved to a commit before download
//! - Two resolution passes: highest, then lowest after lower-bounding
//! - One isolated build directory per (runtime version, hardware profile)
//! - Nothing is archived unless every build in the run succeeded

pub mod archive;
pub mod config;
pub mod environment;
mod error;
pub mod hosting;
pub mod lockfile;
pub mod manifest;
pub mod pipeline;
pub mod profile;
pub mod progress;
pub mod project;
pub mod requirements;
pub mod resolver;
pub mod seed;
pub mod version;
pub mod workspace;

pub use config::{BuildConfig, BuildPlan, BuildTarget, RepoId};
pub use environment::{BuildArtifacts, EnvironmentBuilder};
pub use error::{Error, Result};
pub use hosting::{GithubClient, SourceHost};
pub use lockfile::{LockArtifact, LockEntry};
pub use manifest::{LowerBoundSummary, Manifest, lower_bound_project};
pub use pipeline::{Pipeline, RunReport};
pub use profile::{ExclusionList, HardwareProfile};
pub use progress::{CliProgress, LogProgress, ProgressTracker, SilentProgress};
pub use requirements::{DependencyList, RequirementPatch};
pub use resolver::{DependencyResolver, ResolutionStrategy, UvResolver};
pub use seed::{CommitId, SeedResolver};
pub use version::PythonVersion;
pub use workspace::Workspace;
