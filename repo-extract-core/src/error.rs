//! Error taxonomy for the extraction pipeline.
//!
//! - [`ConfigurationError`]: rejected before any I/O happens.
//! - [`AcquisitionError`]: the source could not be turned into a file listing; fatal.
//! - [`PerFileError`]: a single file could not be loaded; never escapes the loader.
//! - [`ExtractError`]: what [`crate::extract::extract`] returns.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("unsupported output format '{0}' (expected text, json or markdown)")]
    InvalidFormat(String),
    #[error("{name} must be greater than zero")]
    NonPositiveLimit { name: &'static str },
    #[error("invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("no source given: pass a local directory or a GitHub repository URL")]
    MissingSource,
}

/// Which remote call timed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStage {
    Metadata,
    Archive,
}

impl std::fmt::Display for FetchStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStage::Metadata => f.write_str("repository metadata"),
            FetchStage::Archive => f.write_str("repository archive"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("source must be either a local directory or a valid GitHub URL: '{0}'")]
    InvalidSource(String),
    #[error(
        "failed to download repository {repo}: none of the branches {tried:?} exist (default branch: {})",
        .default_branch.as_deref().unwrap_or("unknown")
    )]
    BranchNotFound {
        repo: String,
        tried: Vec<String>,
        /// Default branch reported by repository metadata, if any.
        default_branch: Option<String>,
    },
    #[error("repository {repo} is {size} bytes, above the limit of {limit} bytes")]
    ArchiveTooLarge { repo: String, size: u64, limit: u64 },
    #[error("timed out fetching {stage} for {repo}")]
    Timeout { stage: FetchStage, repo: String },
    #[error("network error fetching {repo}: {message}")]
    Network { repo: String, message: String },
    #[error("could not unpack repository archive: {0}")]
    Archive(String),
    #[error("failed to list files under {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Reason a single file was dropped by the loader.
#[derive(Debug, Error)]
pub enum PerFileError {
    #[error("{size} bytes exceeds size limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("contains unsafe content (null byte)")]
    UnsafeContent,
    #[error("appears to be binary")]
    Binary,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
    #[error("failed to write output to {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
