// src/hosting/client.rs

//! GitHub client for reference lookups and raw file downloads
//!
//! Thin wrapper around a blocking reqwest client. There is no retry: a rate
//! limit or transport failure is returned to the caller as-is.

use super::{GitObject, SourceHost};
use crate::config::{HostingConfig, RepoId};
use crate::error::{Error, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// Substring GitHub puts in the `message` of a rate-limited response
const RATE_LIMIT_MESSAGE: &str = "API rate limit exceeded";

const GITHUB_JSON: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct RefResponse {
    object: Option<RefObject>,
}

#[derive(Debug, Deserialize)]
struct RefObject {
    sha: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: Option<String>,
}

/// Fail with `RateLimitError` if an API body reports rate-limit exhaustion
pub fn check_api_message(body: &Value) -> Result<()> {
    if let Some(message) = body.get("message").and_then(Value::as_str) {
        if message.contains(RATE_LIMIT_MESSAGE) {
            return Err(Error::RateLimitError(message.to_string()));
        }
        debug!("Hosting API message: {}", message);
    }
    Ok(())
}

/// A SHA is usable when present and not the literal `null`
fn usable_sha(sha: Option<String>) -> Option<String> {
    sha.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "null")
}

impl RefObject {
    fn into_git_object(self) -> Option<GitObject> {
        usable_sha(self.sha).map(|sha| GitObject {
            sha,
            kind: self.kind.unwrap_or_else(|| "commit".to_string()),
        })
    }
}

/// Blocking client for the GitHub REST API and raw content host
pub struct GithubClient {
    client: Client,
    api_url: String,
    raw_url: String,
}

impl GithubClient {
    pub fn new(config: &HostingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            raw_url: config.raw_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET an API path, returning `None` for unknown objects
    fn api_get(&self, path: &str) -> Result<Option<Value>> {
        let url = format!("{}{}", self.api_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, GITHUB_JSON)
            .send()
            .map_err(|e| Error::TransportError(format!("Failed to fetch {url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::TransportError(format!("Failed to read response from {url}: {e}")))?;
        let json: Option<Value> = serde_json::from_str(&body).ok();

        if let Some(json) = &json {
            check_api_message(json)?;
        }

        // 422 is what the commits endpoint answers for a SHA it cannot find
        if status == StatusCode::NOT_FOUND || status == StatusCode::UNPROCESSABLE_ENTITY {
            debug!("HTTP {} from {}", status, url);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::TransportError(format!("HTTP {status} from {url}")));
        }

        json.map(Some)
            .ok_or_else(|| Error::ParseError(format!("Non-JSON response from {url}")))
    }
}

impl SourceHost for GithubClient {
    fn tag_ref(&self, repo: &RepoId, tag: &str) -> Result<Option<GitObject>> {
        let Some(body) = self.api_get(&format!("/repos/{repo}/git/ref/tags/{tag}"))? else {
            return Ok(None);
        };
        let parsed: RefResponse = serde_json::from_value(body)
            .map_err(|e| Error::ParseError(format!("Unexpected tag reference response: {e}")))?;
        Ok(parsed.object.and_then(RefObject::into_git_object))
    }

    fn annotated_tag(&self, repo: &RepoId, sha: &str) -> Result<Option<GitObject>> {
        let Some(body) = self.api_get(&format!("/repos/{repo}/git/tags/{sha}"))? else {
            return Ok(None);
        };
        let parsed: RefResponse = serde_json::from_value(body)
            .map_err(|e| Error::ParseError(format!("Unexpected tag object response: {e}")))?;
        Ok(parsed.object.and_then(RefObject::into_git_object))
    }

    fn commit(&self, repo: &RepoId, sha: &str) -> Result<Option<String>> {
        let Some(body) = self.api_get(&format!("/repos/{repo}/git/commits/{sha}"))? else {
            return Ok(None);
        };
        let parsed: CommitResponse = serde_json::from_value(body)
            .map_err(|e| Error::ParseError(format!("Unexpected commit response: {e}")))?;
        Ok(usable_sha(parsed.sha))
    }

    fn fetch_raw(&self, repo: &RepoId, reference: &str, path: &str) -> Result<String> {
        let url = format!("{}/{}/{}/{}", self.raw_url, repo, reference, path);
        info!("Downloading {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| Error::TransportError(format!("Failed to fetch {url}: {e}")))?;

        match response.status() {
            StatusCode::OK => response
                .text()
                .map_err(|e| Error::TransportError(format!("Failed to read {url}: {e}"))),
            StatusCode::NOT_FOUND => Err(Error::NotFoundError(format!("File not found (HTTP 404) at {url}"))),
            status => Err(Error::TransportError(format!(
                "Unexpected HTTP status {status} for {url}, expected 200 OK"
            ))),
        }
    }
}
