// src/error.rs

//! Error types for seedlock
//!
//! Every error is fatal at the point where it first occurs. Nothing in the
//! pipeline retries or recovers; the command layer reports the error and
//! exits non-zero without archiving any artifacts.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the seedlock pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Non-200/404 HTTP response, or the request never completed
    #[error("Transport error: {0}")]
    TransportError(String),

    /// A required remote file or API object does not exist (HTTP 404)
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// The hosting API reported rate-limit exhaustion
    #[error("Hosting API rate limit exceeded: {0}")]
    RateLimitError(String),

    /// A reference is neither a resolvable tag nor a verifiable commit
    #[error("Resolution error: {0}")]
    ResolutionError(String),

    /// The external dependency resolver exited non-zero or could not start
    #[error("Resolver command `{command}` failed ({status}): {stderr}")]
    ResolverProcessError {
        command: String,
        status: String,
        stderr: String,
    },

    /// Malformed input detected before any network activity
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Another run holds the workspace lock
    #[error("Workspace {0} is locked by another seedlock run")]
    WorkspaceLocked(PathBuf),

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err.to_string())
    }
}

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, Error>;
