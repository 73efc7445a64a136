// src/seed.rs

//! Reference resolution and seed list retrieval
//!
//! A seed reference is a tag (`jax-v0.6.2`) or a full commit SHA. Either way
//! it is pinned to an immutable commit before anything is downloaded, so a
//! moved tag can never change what a run fetched.

use crate::config::{RepoId, SeedConfig};
use crate::error::{Error, Result};
use crate::hosting::SourceHost;
use crate::requirements::DependencyList;
use crate::version::PythonVersion;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static COMMIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{40}$").unwrap());

/// Whether a string has the shape of a full commit SHA
pub fn looks_like_commit(reference: &str) -> bool {
    COMMIT_RE.is_match(reference)
}

/// A verified 40-character commit identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommitId(String);

impl CommitId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves references against a hosting service
pub struct SeedResolver<'a, H: SourceHost + ?Sized> {
    host: &'a H,
}

impl<'a, H: SourceHost + ?Sized> SeedResolver<'a, H> {
    pub fn new(host: &'a H) -> Self {
        Self { host }
    }

    /// Confirm that `reference` is an existing commit
    ///
    /// Returns `Ok(false)` for strings that are not 40-hex or that the host
    /// does not know. Rate limiting and transport failures are errors.
    pub fn is_valid_commit(&self, repo: &RepoId, reference: &str) -> Result<bool> {
        if !looks_like_commit(reference) {
            debug!("'{}' does not look like a 40-character commit hash", reference);
            return Ok(false);
        }
        match self.host.commit(repo, reference)? {
            Some(_) => Ok(true),
            None => {
                warn!("'{}' is a 40-character hex string but not a commit in {}", reference, repo);
                Ok(false)
            }
        }
    }

    /// Verify a commit, failing with `ResolutionError` if it is unknown
    pub fn verify_commit(&self, repo: &RepoId, reference: &str) -> Result<CommitId> {
        if self.is_valid_commit(repo, reference)? {
            Ok(CommitId(reference.to_string()))
        } else {
            Err(Error::ResolutionError(format!(
                "'{}' is not a valid commit in {}",
                reference, repo
            )))
        }
    }

    /// Resolve a tag or commit to the commit it names
    pub fn resolve_reference(&self, repo: &RepoId, reference: &str) -> Result<CommitId> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(Error::ResolutionError("Empty reference".to_string()));
        }

        if looks_like_commit(reference) {
            let commit = self.verify_commit(repo, reference)?;
            info!("Reference {} is a commit in {}", commit, repo);
            return Ok(commit);
        }

        debug!("Treating '{}' as a tag in {}", reference, repo);
        let target = match self.host.tag_ref(repo, reference)? {
            Some(object) if object.is_annotated_tag() => {
                debug!("Peeling annotated tag object {}", object.sha);
                self.host.annotated_tag(repo, &object.sha)?
            }
            other => other,
        };

        match target {
            Some(object) if looks_like_commit(&object.sha) => {
                info!("Tag {} in {} resolves to commit {}", reference, repo, object.sha);
                Ok(CommitId(object.sha))
            }
            _ => {
                debug!("'{}' is not a tag in {}, checking whether it is a commit", reference, repo);
                self.verify_commit(repo, reference).map_err(|e| match e {
                    Error::ResolutionError(_) => Error::ResolutionError(format!(
                        "Could not determine commit hash for ref '{}' under '{}'",
                        reference, repo
                    )),
                    other => other,
                })
            }
        }
    }

    /// Download the seed lock list for a runtime version at a commit
    pub fn fetch_seed_list(
        &self,
        repo: &RepoId,
        seed: &SeedConfig,
        commit: &CommitId,
        python: PythonVersion,
    ) -> Result<DependencyList> {
        let path = seed.lock_path(python);
        let text = self.host.fetch_raw(repo, commit.as_str(), &path)?;
        let list = DependencyList::parse(&text);
        info!(
            "Fetched seed list {} at {} ({} requirement(s))",
            path,
            commit,
            list.requirements().count()
        );
        Ok(list)
    }
}
