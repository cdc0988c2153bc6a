//! High-level pipeline: acquire → filter → load → stats + format + chunk.
//!
//! This module orchestrates one extraction call as described by an
//! [`ExtractConfig`]:
//!   - Validates configuration and compiles patterns before any I/O
//!   - Acquires the source as a [`FileSource`] (local directory or remote archive)
//!   - Filters the listing twice: once unfiltered for the "files found"
//!     baseline, once with the real pattern set
//!   - Loads the accepted files concurrently, dropping oversized/unsafe/unreadable ones
//!   - Derives stats, renders the full document, chunks it, and optionally
//!     writes the output file
//!
//! # Error Handling
//! Configuration and acquisition errors abort the call. Per-file errors are
//! absorbed by the loader and only show up as `filesSkipped`.
//!
//! # Navigation
//! - Main entrypoint: [`extract`]
//! - Injectable variants: [`extract_with`], [`extract_from_source`]

use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::chunk;
use crate::config::{ExtractConfig, OutputFormat};
use crate::contract::{ArchiveFetcher, FileSource, LoadedFile, TokenEstimator};
use crate::error::ExtractError;
use crate::format;
use crate::github::GithubFetcher;
use crate::loader::{self, LoadOptions};
use crate::patterns::{self, PatternSet};
use crate::source::{self, SourceLocation};
use crate::stats::ExtractionStats;
use crate::tokens::HeuristicEstimator;

/// Separator between chunks in persisted text/markdown output.
pub const CHUNK_SEPARATOR: &str = "\n\n--- CHUNK ---\n\n";

/// Everything one extraction call produces.
#[derive(Debug, Clone)]
pub struct ExtractResult {
    pub summary: String,
    /// Flat manifest of the pattern-accepted paths.
    pub tree: String,
    pub full_content: String,
    pub chunks: Vec<String>,
    pub stats: ExtractionStats,
    pub files: Vec<LoadedFile>,
    /// Files left out of `chunks` because they alone exceed the chunk ceiling.
    pub oversized: Vec<String>,
    /// Where the output was written, if it was.
    pub output_path: Option<PathBuf>,
}

/// Run the pipeline against GitHub with the heuristic token estimator.
pub async fn extract(config: &ExtractConfig) -> Result<ExtractResult, ExtractError> {
    let fetcher = GithubFetcher::new(config.github_token.clone());
    extract_with(config, &fetcher, &HeuristicEstimator).await
}

pub async fn extract_with<F, E>(
    config: &ExtractConfig,
    fetcher: &F,
    estimator: &E,
) -> Result<ExtractResult, ExtractError>
where
    F: ArchiveFetcher + ?Sized,
    E: TokenEstimator + ?Sized,
{
    info!(source = %config.source, "[EXTRACT] Starting extraction pipeline");
    let patterns = config.validate()?;

    let location = SourceLocation::parse(&config.source).inspect_err(|e| {
        error!(error = %e, "[EXTRACT][ERROR] Unrecognised source");
    })?;
    let source = source::acquire(&location, fetcher, config.max_archive_size)
        .await
        .inspect_err(|e| error!(error = %e, "[EXTRACT][ERROR] Acquisition failed"))?;

    extract_from_source(config, &patterns, source.as_ref(), estimator).await
}

/// Run everything after acquisition against an already-acquired source.
pub async fn extract_from_source<S, E>(
    config: &ExtractConfig,
    patterns: &PatternSet,
    source: &S,
    estimator: &E,
) -> Result<ExtractResult, ExtractError>
where
    S: FileSource + ?Sized,
    E: TokenEstimator + ?Sized,
{
    let listing = source.list_files().await?;
    let found = patterns::filter(&listing, &PatternSet::empty());
    let filtered = patterns::filter(&listing, patterns);
    info!(
        root = %source.describe(),
        found = found.len(),
        accepted = filtered.len(),
        "[EXTRACT] Filtered file listing"
    );

    let files = loader::load(
        source,
        &filtered,
        LoadOptions {
            max_file_size: config.max_file_size,
            detect_binary: config.detect_binary,
        },
    )
    .await;

    let stats = ExtractionStats::compute(found.len(), filtered.len(), &files, estimator);
    let tree = format::render_tree(&filtered);
    let full_content = format::format(&files, &tree, &stats, config.format);

    let chunk::ChunkOutput { chunks, oversized } = chunk::chunk(
        &files,
        &tree,
        &stats,
        config.chunk_size,
        config.format,
        estimator,
    );

    let output_path = config.output_path();
    if let Some(path) = &output_path {
        write_output(path, config.format, &tree, &full_content, &chunks).await?;
    }

    info!(
        processed = files.len(),
        chunks = chunks.len(),
        total_tokens = stats.total_tokens,
        "[EXTRACT] Extraction complete"
    );

    Ok(ExtractResult {
        summary: stats.summary(),
        tree,
        full_content,
        chunks,
        stats,
        files,
        oversized,
        output_path,
    })
}

/// The exact bytes persisted for a given format.
///
/// JSON is the full document verbatim. Text is the manifest followed by the
/// chunks; Markdown is the chunks alone.
pub fn render_output(format: OutputFormat, tree: &str, full_content: &str, chunks: &[String]) -> String {
    match format {
        OutputFormat::Json => full_content.to_string(),
        OutputFormat::Markdown => chunks.join(CHUNK_SEPARATOR),
        OutputFormat::Text => format!("{tree}\n\n{}", chunks.join(CHUNK_SEPARATOR)),
    }
}

async fn write_output(
    path: &Path,
    format: OutputFormat,
    tree: &str,
    full_content: &str,
    chunks: &[String],
) -> Result<(), ExtractError> {
    let contents = render_output(format, tree, full_content, chunks);
    tokio::fs::write(path, contents.as_bytes())
        .await
        .map_err(|source| {
            error!(path = %path.display(), error = ?source, "[EXTRACT][ERROR] Failed to write output");
            ExtractError::Output {
                path: path.to_path_buf(),
                source,
            }
        })?;
    info!(path = %path.display(), bytes = contents.len(), "[EXTRACT] Wrote output file");
    Ok(())
}
