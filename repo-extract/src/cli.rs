/// # repo-extract CLI Interface (Module)
///
/// Command parsing and the async [`run`] entrypoint. All extraction logic
/// lives in `repo-extract-core`; this module only maps flags onto an
/// `ExtractConfig`, invokes the pipeline and prints the summary.
///
/// Logs go to stderr; stdout carries only the summary and the output path.
use crate::load_config::{load_config, resolve_config, FileConfig, Overrides};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use repo_extract_core::config::OutputFormat;
use repo_extract_core::patterns::DEFAULT_EXCLUDE_PATTERNS;
use std::path::PathBuf;

/// CLI for repo-extract: flatten a repository into LLM-ready text.
#[derive(Parser)]
#[clap(
    name = "repo-extract",
    version,
    about = "Extract a local directory or GitHub repository as text, JSON or Markdown for LLM ingestion"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract a repository and write the result to a file
    Extract(ExtractArgs),
    /// Print the built-in exclude patterns
    Patterns,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ExtractArgs {
    /// Local directory or GitHub URL (https://github.com/owner/repo or git@github.com:owner/repo)
    pub source: Option<String>,

    /// Output file (defaults to output.txt, output.json or output.md)
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum file size in bytes
    #[clap(short = 's', long = "max-size")]
    pub max_size: Option<u64>,

    /// Additional exclude pattern (repeatable)
    #[clap(short, long = "exclude")]
    pub exclude: Vec<String>,

    /// Include only paths matching this pattern (repeatable)
    #[clap(short, long = "include")]
    pub include: Vec<String>,

    /// Output format: text, json or markdown
    #[clap(short, long)]
    pub format: Option<OutputFormat>,

    /// Token ceiling per chunk
    #[clap(short = 'c', long = "chunk-size")]
    pub chunk_size: Option<usize>,

    /// YAML config file; explicit flags override its values
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Also skip files whose first bytes look binary
    #[clap(long)]
    pub binary_heuristic: bool,

    /// Run the pipeline without writing any file
    #[clap(long)]
    pub dry_run: bool,
}

impl From<ExtractArgs> for Overrides {
    fn from(args: ExtractArgs) -> Self {
        Overrides {
            source: args.source,
            output: args.output,
            max_file_size: args.max_size,
            exclude_patterns: args.exclude,
            include_patterns: args.include,
            format: args.format,
            chunk_size: args.chunk_size,
            detect_binary: args.binary_heuristic,
            dry_run: args.dry_run,
        }
    }
}

/// Async CLI entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Extract(args) => {
            let file = match &args.config {
                Some(path) => load_config(path)?,
                None => FileConfig::default(),
            };
            let config = resolve_config(file, args.into())?;
            tracing::info!(command = "extract", source = %config.source, "Starting extraction");

            let result = match repo_extract_core::extract(&config).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(command = "extract", error = %e, "Extraction failed");
                    return Err(e.into());
                }
            };

            println!("Summary:");
            println!("{}", result.summary);
            if !result.oversized.is_empty() {
                eprintln!(
                    "Warning: {} file(s) exceed the chunk size and were left out of the chunks",
                    result.oversized.len()
                );
            }
            if let Some(path) = &result.output_path {
                println!();
                println!("Analysis complete! Output written to: {}", path.display());
            }
            tracing::info!(command = "extract", chunks = result.chunks.len(), "Extraction complete");
            Ok(())
        }
        Commands::Patterns => {
            for pattern in DEFAULT_EXCLUDE_PATTERNS {
                println!("{pattern}");
            }
            Ok(())
        }
    }
}
