//! # contract: seams of the extraction pipeline
//!
//! This module defines the traits the pipeline is polymorphic over, plus the
//! plain data that flows between pipeline stages.
//!
//! ## Interface & Extensibility
//! - [`FileSource`]: a uniform `path → size/content` capability. Implemented by
//!   [`crate::source::LocalSource`] (filesystem) and
//!   [`crate::source::ArchiveSource`] (in-memory archive map).
//! - [`ArchiveFetcher`]: retrieves remote repository metadata and archives.
//!   [`crate::github::GithubFetcher`] is the production implementation.
//! - [`TokenEstimator`]: `text → token count`, so the estimator can change
//!   without touching pipeline logic.
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall` (behind the default
//!   `test-export-mocks` feature) so downstream tests can build deterministic mocks.

use async_trait::async_trait;
use serde::Serialize;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::AcquisitionError;
use crate::source::RemoteRepo;

/// A file that passed every gate and had its content loaded.
///
/// Field order is the serialised order in JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedFile {
    /// Relative to the source root, always `/`-separated.
    pub path: String,
    /// Original byte count from stat/archive metadata.
    pub size: u64,
    pub content: String,
}

/// Uniform access to a repository snapshot, whatever its backing store.
///
/// Paths passed in and returned are relative to the source root and use `/`.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Human-readable description of the root (directory or repository).
    fn describe(&self) -> String;

    /// Every regular file in the snapshot, in traversal/archive order.
    async fn list_files(&self) -> Result<Vec<String>, AcquisitionError>;

    /// Size in bytes as recorded by the backing store.
    async fn file_size(&self, path: &str) -> std::io::Result<u64>;

    /// Raw bytes of the file.
    async fn read_file(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

/// Repository metadata consulted before any archive download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMetadata {
    pub size_bytes: u64,
    pub default_branch: Option<String>,
}

/// Retrieves remote repository metadata and archives.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    async fn fetch_metadata(&self, repo: &RemoteRepo) -> Result<RepoMetadata, AcquisitionError>;

    /// Fetch the gzip tarball of `branch`. `Ok(None)` means the branch does not exist.
    async fn fetch_archive(
        &self,
        repo: &RemoteRepo,
        branch: &str,
    ) -> Result<Option<Vec<u8>>, AcquisitionError>;
}

/// Deterministic token estimation.
///
/// Implementations must return 0 for empty input and never decrease when text is appended.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}
