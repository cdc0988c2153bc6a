//! Source acquisition: turn a location string into a [`FileSource`].
//!
//! A local directory is served straight from the filesystem. A GitHub
//! reference is checked against repository metadata, downloaded once as a
//! gzip tarball and materialised into an in-memory [`ArchiveSource`]. Both are
//! handed downstream as `Box<dyn FileSource>` so the rest of the pipeline
//! never branches on where the files came from.
//!
//! The in-memory map lives as long as the returned value; dropping it releases it.

use async_trait::async_trait;
use flate2::read::GzDecoder;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::contract::{ArchiveFetcher, FileSource};
use crate::error::AcquisitionError;

/// Branches tried, in order, when downloading a remote archive.
pub const FALLBACK_BRANCHES: [&str; 2] = ["main", "master"];

static GITHUB_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com[/:]([^/\s]+)/([^/\s?#]+)").expect("valid GitHub reference regex")
});

/// A GitHub repository identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRepo {
    pub owner: String,
    pub name: String,
}

impl fmt::Display for RemoteRepo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl RemoteRepo {
    /// Recognise `https://github.com/owner/repo[.git]` and `git@github.com:owner/repo.git`.
    pub fn parse(reference: &str) -> Option<Self> {
        let caps = GITHUB_REF.captures(reference)?;
        let owner = caps.get(1)?.as_str().to_string();
        let raw_name = caps.get(2)?.as_str();
        let name = raw_name.strip_suffix(".git").unwrap_or(raw_name).to_string();
        if owner.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self { owner, name })
    }
}

/// Where the repository snapshot comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Local(PathBuf),
    Remote(RemoteRepo),
}

impl SourceLocation {
    /// An existing directory wins; otherwise the string must be a GitHub reference.
    pub fn parse(source: &str) -> Result<Self, AcquisitionError> {
        let path = Path::new(source);
        if path.is_dir() {
            return Ok(SourceLocation::Local(path.to_path_buf()));
        }
        RemoteRepo::parse(source)
            .map(SourceLocation::Remote)
            .ok_or_else(|| AcquisitionError::InvalidSource(source.to_string()))
    }
}

/// Files read lazily from a directory on disk.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn to_relative_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn walk_files(root: &Path) -> Result<Vec<String>, AcquisitionError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(AcquisitionError::Io {
                    path: root.to_path_buf(),
                    source: io::Error::from(e),
                });
            }
            Err(e) => {
                debug!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            files.push(to_relative_slash_path(rel));
        }
    }
    Ok(files)
}

#[async_trait]
impl FileSource for LocalSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    async fn list_files(&self) -> Result<Vec<String>, AcquisitionError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || walk_files(&root))
            .await
            .map_err(|e| AcquisitionError::Io {
                path: self.root.clone(),
                source: io::Error::other(e),
            })?
    }

    async fn file_size(&self, path: &str) -> io::Result<u64> {
        Ok(tokio::fs::metadata(self.root.join(path)).await?.len())
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.root.join(path)).await
    }
}

#[derive(Debug, Clone)]
struct ArchiveEntry {
    path: String,
    size: u64,
    content: Vec<u8>,
}

/// An unpacked archive held in memory, keyed by path with the archive root folder stripped.
#[derive(Debug, Clone, Default)]
pub struct ArchiveSource {
    label: String,
    entries: Vec<ArchiveEntry>,
    index: HashMap<String, usize>,
}

fn strip_archive_root(path: &Path) -> Option<String> {
    let rest: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .skip(1)
        .collect();
    if rest.is_empty() {
        None
    } else {
        Some(rest.join("/"))
    }
}

impl ArchiveSource {
    /// Build from `(path, content)` pairs; size is the content length.
    pub fn from_entries<I, P, C>(label: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = (P, C)>,
        P: Into<String>,
        C: Into<Vec<u8>>,
    {
        let mut source = Self {
            label: label.into(),
            ..Self::default()
        };
        for (path, content) in files {
            let content = content.into();
            source.insert(path.into(), content.len() as u64, content);
        }
        source
    }

    /// Decompress and unpack a gzip tarball. Only regular files are kept.
    pub fn from_tar_gz(label: impl Into<String>, bytes: &[u8]) -> Result<Self, AcquisitionError> {
        let archive_err = |e: io::Error| AcquisitionError::Archive(e.to_string());
        let mut source = Self {
            label: label.into(),
            ..Self::default()
        };
        let mut archive = tar::Archive::new(GzDecoder::new(bytes));
        for entry in archive.entries().map_err(archive_err)? {
            let mut entry = entry.map_err(archive_err)?;
            if !entry.header().entry_type().is_file() {
                continue;
            }
            let raw_path = entry.path().map_err(archive_err)?.into_owned();
            let Some(path) = strip_archive_root(&raw_path) else {
                continue;
            };
            // Declared size is untrusted; the buffer grows only with bytes actually read.
            let size = entry.size();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).map_err(archive_err)?;
            if content.len() as u64 != size {
                error!(path = %path, declared = size, read = content.len(), "Truncated archive entry");
                return Err(AcquisitionError::Archive(format!(
                    "entry {path} declares {size} bytes but only {} are present",
                    content.len()
                )));
            }
            source.insert(path, size, content);
        }
        info!(label = %source.label, files = source.entries.len(), "Unpacked repository archive");
        Ok(source)
    }

    fn insert(&mut self, path: String, size: u64, content: Vec<u8>) {
        let entry = ArchiveEntry {
            path: path.clone(),
            size,
            content,
        };
        match self.index.get(&path) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(path, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn get(&self, path: &str) -> io::Result<&ArchiveEntry> {
        self.index
            .get(path)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{path} not in archive")))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl FileSource for ArchiveSource {
    fn describe(&self) -> String {
        self.label.clone()
    }

    async fn list_files(&self) -> Result<Vec<String>, AcquisitionError> {
        Ok(self.entries.iter().map(|e| e.path.clone()).collect())
    }

    async fn file_size(&self, path: &str) -> io::Result<u64> {
        Ok(self.get(path)?.size)
    }

    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        Ok(self.get(path)?.content.clone())
    }
}

/// Resolve a location into a [`FileSource`].
///
/// Remote sources are size-checked against metadata before download, then the
/// branches in [`FALLBACK_BRANCHES`] are tried in order.
pub async fn acquire<F>(
    location: &SourceLocation,
    fetcher: &F,
    max_archive_size: u64,
) -> Result<Box<dyn FileSource>, AcquisitionError>
where
    F: ArchiveFetcher + ?Sized,
{
    match location {
        SourceLocation::Local(path) => {
            info!(path = %path.display(), "Using local directory as source");
            Ok(Box::new(LocalSource::new(path.clone())))
        }
        SourceLocation::Remote(repo) => {
            let metadata = fetcher.fetch_metadata(repo).await?;
            if metadata.size_bytes > max_archive_size {
                error!(
                    repo = %repo,
                    size = metadata.size_bytes,
                    limit = max_archive_size,
                    "Repository exceeds archive size limit"
                );
                return Err(AcquisitionError::ArchiveTooLarge {
                    repo: repo.to_string(),
                    size: metadata.size_bytes,
                    limit: max_archive_size,
                });
            }
            debug!(repo = %repo, size = metadata.size_bytes, "Repository metadata within limits");
            if let Some(default) = metadata
                .default_branch
                .as_deref()
                .filter(|b| !FALLBACK_BRANCHES.contains(b))
            {
                warn!(
                    repo = %repo,
                    default_branch = default,
                    tried = ?FALLBACK_BRANCHES,
                    "Default branch is not one of the fallback branches"
                );
            }

            for branch in FALLBACK_BRANCHES {
                let Some(bytes) = fetcher.fetch_archive(repo, branch).await? else {
                    debug!(repo = %repo, branch, "Branch not found, trying next");
                    continue;
                };
                if bytes.len() as u64 > max_archive_size {
                    return Err(AcquisitionError::ArchiveTooLarge {
                        repo: repo.to_string(),
                        size: bytes.len() as u64,
                        limit: max_archive_size,
                    });
                }
                info!(repo = %repo, branch, bytes = bytes.len(), "Downloaded repository archive");
                let label = format!("{repo}@{branch}");
                let source = tokio::task::spawn_blocking(move || {
                    ArchiveSource::from_tar_gz(label, &bytes)
                })
                .await
                .map_err(|e| AcquisitionError::Archive(e.to_string()))??;
                return Ok(Box::new(source));
            }

            error!(repo = %repo, "No fallback branch could be downloaded");
            Err(AcquisitionError::BranchNotFound {
                repo: repo.to_string(),
                tried: FALLBACK_BRANCHES.iter().map(|b| b.to_string()).collect(),
                default_branch: metadata.default_branch,
            })
        }
    }
}
