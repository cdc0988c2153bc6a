//! Content loading with size and safety gates.
//!
//! Every path is loaded independently and concurrently; a failure drops that
//! path only. Results come back in listing order regardless of completion order.

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use crate::contract::{FileSource, LoadedFile};
use crate::error::PerFileError;

/// Maximum number of files read at once.
pub const LOAD_CONCURRENCY: usize = 32;

/// Bytes inspected by the optional binary heuristic.
pub const BINARY_SAMPLE_LEN: usize = 24;

#[derive(Debug, Clone, Copy)]
pub struct LoadOptions {
    pub max_file_size: u64,
    /// Also reject files whose leading bytes contain control characters.
    pub detect_binary: bool,
}

/// Null bytes mark content that must never reach the output.
pub fn is_content_safe(content: &str) -> bool {
    !content.contains('\0')
}

/// Control bytes other than tab, LF and CR in the leading sample.
pub fn looks_binary(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .take(BINARY_SAMPLE_LEN)
        .any(|&b| b < 32 && b != b'\t' && b != b'\n' && b != b'\r')
}

pub async fn load_one<S>(
    source: &S,
    path: &str,
    options: LoadOptions,
) -> Result<LoadedFile, PerFileError>
where
    S: FileSource + ?Sized,
{
    let size = source.file_size(path).await?;
    if size > options.max_file_size {
        return Err(PerFileError::TooLarge {
            size,
            limit: options.max_file_size,
        });
    }

    let bytes = source.read_file(path).await?;
    // The file may have grown since it was stat'ed.
    if bytes.len() as u64 > options.max_file_size {
        return Err(PerFileError::TooLarge {
            size: bytes.len() as u64,
            limit: options.max_file_size,
        });
    }
    if options.detect_binary && looks_binary(&bytes) {
        return Err(PerFileError::Binary);
    }

    let content = String::from_utf8_lossy(&bytes).into_owned();
    if !is_content_safe(&content) {
        return Err(PerFileError::UnsafeContent);
    }

    Ok(LoadedFile {
        path: path.to_string(),
        size,
        content,
    })
}

/// Load every path in `listing`, dropping the ones that fail a gate.
pub async fn load<S>(source: &S, listing: &[String], options: LoadOptions) -> Vec<LoadedFile>
where
    S: FileSource + ?Sized,
{
    let loaded: Vec<Option<LoadedFile>> = stream::iter(listing)
        .map(|path| async move {
            match load_one(source, path, options).await {
                Ok(file) => Some(file),
                Err(e) => {
                    debug!(path = %path, reason = %e, "Skipping file");
                    None
                }
            }
        })
        .buffered(LOAD_CONCURRENCY)
        .collect()
        .await;

    let files: Vec<LoadedFile> = loaded.into_iter().flatten().collect();
    info!(
        requested = listing.len(),
        loaded = files.len(),
        skipped = listing.len() - files.len(),
        "Loaded file contents"
    );
    files
}
