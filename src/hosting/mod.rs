// src/hosting/mod.rs

//! Hosted version-control access
//!
//! The pipeline needs four things from the hosting service: look up a tag
//! reference, peel an annotated tag, confirm a commit exists, and fetch a raw
//! file at a ref. `SourceHost` is that seam; `GithubClient` implements it
//! over the GitHub REST API and raw content host.

mod client;

pub use client::{GithubClient, check_api_message};

use crate::config::RepoId;
use crate::error::Result;

/// Object a git reference points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitObject {
    pub sha: String,
    /// `commit` for lightweight tags, `tag` for annotated tags
    pub kind: String,
}

impl GitObject {
    pub fn is_annotated_tag(&self) -> bool {
        self.kind == "tag"
    }
}

/// Operations consumed from the hosting service
///
/// Lookups return `Ok(None)` when the object does not exist. Rate limiting
/// and transport failures are errors.
pub trait SourceHost {
    /// `GET /repos/{org}/{repo}/git/ref/tags/{tag}`
    fn tag_ref(&self, repo: &RepoId, tag: &str) -> Result<Option<GitObject>>;

    /// `GET /repos/{org}/{repo}/git/tags/{sha}`
    fn annotated_tag(&self, repo: &RepoId, sha: &str) -> Result<Option<GitObject>>;

    /// `GET /repos/{org}/{repo}/git/commits/{sha}`, returning the commit SHA
    fn commit(&self, repo: &RepoId, sha: &str) -> Result<Option<String>>;

    /// Raw file content at `reference`
    ///
    /// HTTP 404 is `NotFoundError`; any other non-200 is `TransportError`.
    fn fetch_raw(&self, repo: &RepoId, reference: &str, path: &str) -> Result<String>;
}
