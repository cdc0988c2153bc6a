//! Extraction statistics and their human-readable summary.

use serde::Serialize;

use crate::contract::{LoadedFile, TokenEstimator};

/// Derived on every run from the three file-set sizes; never mutated afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionStats {
    pub files_found: usize,
    pub files_excluded: usize,
    pub files_skipped: usize,
    pub total_size: u64,
    pub total_tokens: usize,
}

impl ExtractionStats {
    /// `found` is the unfiltered listing size, `filtered` the post-pattern
    /// size, and `loaded` the files that survived loading.
    pub fn compute<E>(found: usize, filtered: usize, loaded: &[LoadedFile], estimator: &E) -> Self
    where
        E: TokenEstimator + ?Sized,
    {
        let joined = loaded
            .iter()
            .map(|f| f.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        Self {
            files_found: found,
            files_excluded: found.saturating_sub(filtered),
            files_skipped: filtered.saturating_sub(loaded.len()),
            total_size: loaded.iter().map(|f| f.size).sum(),
            total_tokens: estimator.estimate(&joined),
        }
    }

    pub fn files_processed(&self) -> usize {
        self.files_found
            .saturating_sub(self.files_excluded)
            .saturating_sub(self.files_skipped)
    }

    pub fn summary(&self) -> String {
        [
            format!("Files found: {}", self.files_found),
            format!("Files excluded by patterns: {}", self.files_excluded),
            format!("Files skipped (size limit or unreadable): {}", self.files_skipped),
            format!("Files processed: {}", self.files_processed()),
            format!("Total size: {}", format_size(self.total_size)),
            format!("Estimated tokens: {}", format_tokens(self.total_tokens)),
        ]
        .join("\n")
    }
}

/// Binary multiples with one decimal: `512.0B`, `1.5KB`, `10.0MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1}{}", UNITS[unit])
}

/// Metric suffixes from a thousand up: `999`, `1.5k`, `2.0M`.
pub fn format_tokens(tokens: usize) -> String {
    if tokens >= 1_000_000 {
        format!("{:.1}M", tokens as f64 / 1_000_000.0)
    } else if tokens >= 1_000 {
        format!("{:.1}k", tokens as f64 / 1_000.0)
    } else {
        tokens.to_string()
    }
}
