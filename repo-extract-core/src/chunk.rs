//! Token-bounded chunking.
//!
//! Greedy, single pass, no reordering: files are appended to the running
//! chunk until the next one would push it over the ceiling. A file that alone
//! exceeds the ceiling is left out of chunked output entirely and reported
//! through [`ChunkOutput::oversized`] and a warning.
//!
//! JSON output is never split; see [`chunk`].

use tracing::{info, warn};

use crate::config::OutputFormat;
use crate::contract::{LoadedFile, TokenEstimator};
use crate::format;
use crate::stats::ExtractionStats;

/// Chunk membership as indices into the input file slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkPlan {
    pub groups: Vec<Vec<usize>>,
    pub oversized: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkOutput {
    pub chunks: Vec<String>,
    /// Paths dropped because their own estimate exceeds the ceiling.
    pub oversized: Vec<String>,
}

pub fn plan_chunks<E>(files: &[LoadedFile], ceiling: usize, estimator: &E) -> ChunkPlan
where
    E: TokenEstimator + ?Sized,
{
    let mut plan = ChunkPlan::default();
    let mut current: Vec<usize> = Vec::new();
    let mut current_tokens = 0usize;

    for (i, file) in files.iter().enumerate() {
        let tokens = estimator.estimate(&file.content);
        if tokens > ceiling {
            warn!(
                path = %file.path,
                tokens,
                ceiling,
                "Skipping file (exceeds chunk size)"
            );
            plan.oversized.push(i);
            continue;
        }
        if current_tokens + tokens > ceiling {
            plan.groups.push(std::mem::take(&mut current));
            current_tokens = 0;
        }
        current.push(i);
        current_tokens += tokens;
    }
    if !current.is_empty() {
        plan.groups.push(current);
    }
    plan
}

/// Split `files` into rendered chunks of at most `ceiling` estimated tokens.
///
/// Chunk interiors carry no manifest and empty stats. In JSON mode the result
/// is a single chunk equal to the full document for `tree` and `stats`,
/// whatever the ceiling.
pub fn chunk<E>(
    files: &[LoadedFile],
    tree: &str,
    stats: &ExtractionStats,
    ceiling: usize,
    mode: OutputFormat,
    estimator: &E,
) -> ChunkOutput
where
    E: TokenEstimator + ?Sized,
{
    if mode == OutputFormat::Json {
        return ChunkOutput {
            chunks: vec![format::format_json(files, tree, stats)],
            oversized: Vec::new(),
        };
    }

    let empty_stats = ExtractionStats::default();
    let plan = plan_chunks(files, ceiling, estimator);
    let chunks: Vec<String> = plan
        .groups
        .iter()
        .map(|group| {
            let members: Vec<LoadedFile> = group.iter().map(|&i| files[i].clone()).collect();
            format::format(&members, "", &empty_stats, mode)
        })
        .collect();
    info!(
        chunks = chunks.len(),
        oversized = plan.oversized.len(),
        ceiling,
        "Chunked file set"
    );
    ChunkOutput {
        chunks,
        oversized: plan.oversized.iter().map(|&i| files[i].path.clone()).collect(),
    }
}
