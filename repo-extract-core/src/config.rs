use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::ConfigurationError;
use crate::patterns::PatternSet;

pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_CHUNK_SIZE: usize = 4000;
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 100 * 1024 * 1024;

/// Output encoding for the rendered document and its chunks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

impl OutputFormat {
    /// File name used when output is enabled without an explicit path.
    pub fn default_file_name(&self) -> &'static str {
        match self {
            OutputFormat::Text => "output.txt",
            OutputFormat::Json => "output.json",
            OutputFormat::Markdown => "output.md",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => Err(ConfigurationError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => f.write_str("text"),
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Markdown => f.write_str("markdown"),
        }
    }
}

/// Where (if anywhere) the rendered output is persisted.
///
/// Deserialises from `false`, `true` (default file name for the format) or a path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "OutputSetting")]
pub enum OutputTarget {
    #[default]
    None,
    DefaultFile,
    Path(PathBuf),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OutputSetting {
    Flag(bool),
    Path(PathBuf),
}

impl From<OutputSetting> for OutputTarget {
    fn from(setting: OutputSetting) -> Self {
        match setting {
            OutputSetting::Flag(false) => OutputTarget::None,
            OutputSetting::Flag(true) => OutputTarget::DefaultFile,
            OutputSetting::Path(p) => OutputTarget::Path(p),
        }
    }
}

impl OutputTarget {
    /// Resolve to a concrete path for the given format, if output is enabled.
    pub fn resolve(&self, format: OutputFormat) -> Option<PathBuf> {
        match self {
            OutputTarget::None => None,
            OutputTarget::DefaultFile => Some(PathBuf::from(format.default_file_name())),
            OutputTarget::Path(p) => Some(p.clone()),
        }
    }
}

/// Everything one extraction call needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractConfig {
    /// Local directory or GitHub repository reference.
    pub source: String,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default)]
    pub include_patterns: Vec<String>,
    /// Added to the built-in exclude set, never replacing it.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    #[serde(default)]
    pub output: OutputTarget,
    #[serde(default)]
    pub format: OutputFormat,
    /// Token ceiling per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Ceiling for remote repositories, checked against metadata before download.
    #[serde(default = "default_max_archive_size")]
    pub max_archive_size: u64,
    #[serde(default)]
    pub detect_binary: bool,
    #[serde(skip)]
    pub github_token: Option<String>,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_max_archive_size() -> u64 {
    DEFAULT_MAX_ARCHIVE_SIZE
}

impl ExtractConfig {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            output: OutputTarget::None,
            format: OutputFormat::Text,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_archive_size: DEFAULT_MAX_ARCHIVE_SIZE,
            detect_binary: false,
            github_token: None,
        }
    }

    /// Check limits and compile the pattern set. Runs before any I/O.
    pub fn validate(&self) -> Result<PatternSet, ConfigurationError> {
        if self.source.trim().is_empty() {
            return Err(ConfigurationError::MissingSource);
        }
        if self.max_file_size == 0 {
            return Err(ConfigurationError::NonPositiveLimit {
                name: "max_file_size",
            });
        }
        if self.chunk_size == 0 {
            return Err(ConfigurationError::NonPositiveLimit { name: "chunk_size" });
        }
        if self.max_archive_size == 0 {
            return Err(ConfigurationError::NonPositiveLimit {
                name: "max_archive_size",
            });
        }
        let patterns = PatternSet::with_defaults(&self.exclude_patterns, &self.include_patterns)?;
        debug!(format = %self.format, chunk_size = self.chunk_size, "Configuration validated");
        Ok(patterns)
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.output.resolve(self.format)
    }

    pub fn trace_loaded(&self) {
        info!(
            source = %self.source,
            format = %self.format,
            max_file_size = self.max_file_size,
            chunk_size = self.chunk_size,
            include = self.include_patterns.len(),
            exclude = self.exclude_patterns.len(),
            output = ?self.output_path(),
            "Loaded ExtractConfig"
        );
    }
}
