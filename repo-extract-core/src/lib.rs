#![doc = "repo-extract-core: core extraction pipeline for repo-extract."]

//! This crate contains the whole extraction pipeline: acquiring a repository
//! snapshot, filtering its paths, loading file contents, computing statistics
//! and rendering the result as text, JSON or Markdown, optionally split into
//! token-bounded chunks.
//!
//! The CLI crate (`repo-extract`) is a thin layer over [`extract::extract`].
//!
//! # Pipeline
//! `source::acquire` → `patterns::filter` (twice: baseline and real patterns)
//! → `loader::load` → `stats` + `format` + `chunk`.

pub mod chunk;
pub mod config;
pub mod contract;
pub mod error;
pub mod extract;
pub mod format;
pub mod github;
pub mod loader;
pub mod patterns;
pub mod source;
pub mod stats;
pub mod tokens;

pub use config::{ExtractConfig, OutputFormat, OutputTarget};
pub use contract::LoadedFile;
pub use error::{AcquisitionError, ConfigurationError, ExtractError, PerFileError};
pub use extract::{extract, extract_with, ExtractResult};
pub use stats::ExtractionStats;
