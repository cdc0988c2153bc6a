//! GitHub-backed [`ArchiveFetcher`].
//!
//! Metadata comes from the REST API (`size` is reported in KiB); archives are
//! gzip tarballs from codeload. Each call carries its own timeout, short for
//! metadata and long for the archive. There is no retry.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::contract::{ArchiveFetcher, RepoMetadata};
use crate::error::{AcquisitionError, FetchStage};
use crate::source::RemoteRepo;

pub const GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_ARCHIVE_BASE: &str = "https://codeload.github.com";
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);
pub const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(120);

const USER_AGENT: &str = concat!("repo-extract/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct RepoResponse {
    /// Repository size in KiB.
    size: u64,
    #[serde(default)]
    default_branch: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GithubFetcher {
    client: Client,
    api_base: String,
    archive_base: String,
    token: Option<String>,
    metadata_timeout: Duration,
    archive_timeout: Duration,
}

impl Default for GithubFetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

impl GithubFetcher {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: GITHUB_API_BASE.to_string(),
            archive_base: GITHUB_ARCHIVE_BASE.to_string(),
            token,
            metadata_timeout: METADATA_TIMEOUT,
            archive_timeout: ARCHIVE_TIMEOUT,
        }
    }

    /// Point the fetcher at other hosts (GitHub Enterprise, test servers).
    pub fn with_base_urls(mut self, api_base: impl Into<String>, archive_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.archive_base = archive_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeouts(mut self, metadata: Duration, archive: Duration) -> Self {
        self.metadata_timeout = metadata;
        self.archive_timeout = archive;
        self
    }

    fn get(&self, url: &str, timeout: Duration) -> RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(timeout);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

fn map_request_error(e: reqwest::Error, stage: FetchStage, repo: &RemoteRepo) -> AcquisitionError {
    if e.is_timeout() {
        error!(repo = %repo, %stage, "Request timed out");
        AcquisitionError::Timeout {
            stage,
            repo: repo.to_string(),
        }
    } else {
        error!(repo = %repo, %stage, error = ?e, "Request failed");
        AcquisitionError::Network {
            repo: repo.to_string(),
            message: e.to_string(),
        }
    }
}

#[async_trait]
impl ArchiveFetcher for GithubFetcher {
    async fn fetch_metadata(&self, repo: &RemoteRepo) -> Result<RepoMetadata, AcquisitionError> {
        let url = format!("{}/repos/{}/{}", self.api_base, repo.owner, repo.name);
        info!(url = %url, "Fetching repository metadata");

        let response = self
            .get(&url, self.metadata_timeout)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| map_request_error(e, FetchStage::Metadata, repo))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            error!(url = %url, "Repository not found");
            return Err(AcquisitionError::InvalidSource(format!(
                "https://github.com/{repo}"
            )));
        }
        if !status.is_success() {
            error!(url = %url, status = %status, "GitHub API returned error");
            return Err(AcquisitionError::Network {
                repo: repo.to_string(),
                message: format!("metadata request returned {status}"),
            });
        }

        let body: RepoResponse = response
            .json()
            .await
            .map_err(|e| map_request_error(e, FetchStage::Metadata, repo))?;
        debug!(repo = %repo, size_kib = body.size, default_branch = ?body.default_branch, "Parsed repository metadata");

        Ok(RepoMetadata {
            size_bytes: body.size.saturating_mul(1024),
            default_branch: body.default_branch,
        })
    }

    async fn fetch_archive(
        &self,
        repo: &RemoteRepo,
        branch: &str,
    ) -> Result<Option<Vec<u8>>, AcquisitionError> {
        let url = format!(
            "{}/{}/{}/tar.gz/refs/heads/{}",
            self.archive_base, repo.owner, repo.name, branch
        );
        info!(url = %url, "Fetching repository archive");

        let response = self
            .get(&url, self.archive_timeout)
            .send()
            .await
            .map_err(|e| map_request_error(e, FetchStage::Archive, repo))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(url = %url, "Archive not found for branch");
            return Ok(None);
        }
        if !status.is_success() {
            error!(url = %url, status = %status, "Archive download returned error");
            return Err(AcquisitionError::Network {
                repo: repo.to_string(),
                message: format!("archive request returned {status}"),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_request_error(e, FetchStage::Archive, repo))?;
        Ok(Some(bytes.to_vec()))
    }
}
