/// `load_config` module: reads an optional YAML config file and merges it with
/// command-line flags and environment secrets into a core `ExtractConfig`.
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into [`FileConfig`], where every key is optional
/// - Layer explicit CLI flags over file values ([`resolve_config`])
/// - Inject `GITHUB_TOKEN` from the environment; tokens are never read from YAML
///
/// # Errors
/// Everything here returns `anyhow::Error` with the file path in context, and
/// logs the failure before returning it.
use anyhow::{Context, Result};
use repo_extract_core::config::{ExtractConfig, OutputFormat, OutputTarget};
use repo_extract_core::error::ConfigurationError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Environment variable holding the optional GitHub token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// YAML-side mirror of `ExtractConfig`. Absent keys fall through to CLI flags
/// or built-in defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<String>,
    pub max_file_size: Option<u64>,
    pub include_patterns: Option<Vec<String>>,
    pub exclude_patterns: Option<Vec<String>>,
    pub output: Option<OutputTarget>,
    pub format: Option<OutputFormat>,
    pub chunk_size: Option<usize>,
    pub max_archive_size: Option<u64>,
    pub detect_binary: Option<bool>,
}

/// Values given explicitly on the command line. `None`/empty means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub source: Option<String>,
    pub output: Option<PathBuf>,
    pub max_file_size: Option<u64>,
    pub exclude_patterns: Vec<String>,
    pub include_patterns: Vec<String>,
    pub format: Option<OutputFormat>,
    pub chunk_size: Option<usize>,
    pub detect_binary: bool,
    pub dry_run: bool,
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let content = fs::read_to_string(path_ref)
        .inspect_err(|e| error!(error = ?e, config_path = ?path_ref, "Failed to read config file"))
        .with_context(|| format!("Failed to read config file {}", path_ref.display()))?;

    let parsed: FileConfig = match serde_yaml::from_str(&content) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!(
                "Failed to parse config YAML {}: {e}",
                path_ref.display()
            ));
        }
    };
    info!(config_path = ?path_ref, "Parsed config YAML successfully");
    Ok(parsed)
}

/// Merge file values, CLI overrides and environment into an `ExtractConfig`.
///
/// CLI output defaults to the format's default file name unless the file says
/// otherwise; `--dry-run` disables writing entirely.
pub fn resolve_config(file: FileConfig, overrides: Overrides) -> Result<ExtractConfig> {
    let source = overrides
        .source
        .or(file.source)
        .ok_or(ConfigurationError::MissingSource)?;

    let mut config = ExtractConfig::new(source);
    config.format = overrides.format.or(file.format).unwrap_or_default();
    if let Some(size) = overrides.max_file_size.or(file.max_file_size) {
        config.max_file_size = size;
    }
    if let Some(chunk_size) = overrides.chunk_size.or(file.chunk_size) {
        config.chunk_size = chunk_size;
    }
    if let Some(limit) = file.max_archive_size {
        config.max_archive_size = limit;
    }
    config.detect_binary = overrides.detect_binary || file.detect_binary.unwrap_or(false);

    // List flags extend file lists rather than replacing them.
    config.exclude_patterns = file.exclude_patterns.unwrap_or_default();
    config.exclude_patterns.extend(overrides.exclude_patterns);
    config.include_patterns = file.include_patterns.unwrap_or_default();
    config.include_patterns.extend(overrides.include_patterns);

    config.output = if overrides.dry_run {
        OutputTarget::None
    } else if let Some(path) = overrides.output {
        OutputTarget::Path(path)
    } else {
        file.output.unwrap_or(OutputTarget::DefaultFile)
    };

    config.github_token = std::env::var(GITHUB_TOKEN_ENV)
        .ok()
        .filter(|t| !t.trim().is_empty());

    config.trace_loaded();
    Ok(config)
}
