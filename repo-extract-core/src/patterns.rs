//! Path filtering with glob patterns.
//!
//! A path is accepted iff it matches no exclude pattern and, when include
//! patterns are given, at least one of them. Exclusion is checked first and
//! always wins. Exclude patterns are also tested against every ancestor
//! directory of a path, so `**/node_modules` drops the whole tree beneath it.
//!
//! Matching is case-sensitive on `/`-separated relative paths; `*` stays
//! within one segment and `**` spans any number of segments.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::error::ConfigurationError;

/// Built-in excludes, always applied. Callers can extend but not disable them.
///
/// Changing this list changes which files every extraction returns.
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    // Hidden files and directories
    ".*",
    "**/.*",
    // Build output and caches
    "**/*.{pyc,pyo,pyd}",
    "**/__pycache__",
    "**/node_modules",
    "**/bower_components",
    "**/dist",
    "**/build",
    "**/coverage",
    "**/out",
    "**/target",
    "**/vendor",
    // Version control
    "**/.git",
    "**/.svn",
    "**/.hg",
    "**/.gitattributes",
    "**/.gitignore",
    "**/.gitmodules",
    // Lockfiles
    "**/package-lock.json",
    "**/yarn.lock",
    "**/pnpm-lock.yaml",
    "**/poetry.lock",
    "**/Pipfile.lock",
    "**/Gemfile.lock",
    "**/composer.lock",
    "**/Cargo.lock",
    "**/cargo.lock",
    "**/mix.lock",
    "**/requirements.txt",
    "**/go.sum",
    // Images, fonts, source maps
    "**/*.{jpg,jpeg,png,gif,webp,avif,tiff,bmp,ico,svg,eps,raw}",
    "**/*.{woff,woff2,ttf,otf,eot}",
    "**/*.{css.map,js.map}",
    "**/assets",
    "**/public",
    "**/static",
    // Documents and archives
    "**/*.{pdf,doc,docx,xls,xlsx,zip,tar,gz,rar,7z}",
    // Media
    "**/*.{mov,mp4,avi,wmv,mp3,wav,flac,m4a}",
    // Executables and data stores
    "**/*.{exe,dll,so,dylib,o,a,class,jar,wasm}",
    "**/*.{data,db,sqlite,sqlite3}",
    "**/*.{csv,tsv}",
    // Minified assets
    "**/*.min.js",
    "**/*.min.css",
    // Config files
    "**/.env*",
    "**/.editorconfig",
    "**/.prettierrc*",
    "**/.eslintrc*",
    "**/tsconfig*.json",
    "**/jest.config.*",
    "**/babel.config.*",
    "**/webpack.config.*",
    "**/rollup.config.*",
    "**/vite.config.*",
    "**/.dockerignore",
    "**/Dockerfile*",
    "**/docker-compose*.yml",
    "**/*.toml",
    "**/*.yaml",
    "**/*.yml",
    "**/nginx.conf",
    // Logs and temporary files
    "**/*.{log,tmp}",
    "**/tmp",
    "**/temp",
    "**/logs",
    // IDE and OS artifacts
    "**/.DS_Store",
    "**/Thumbs.db",
    "**/.idea",
    "**/.vscode",
    "**/.vs",
    "**/*.sublime-*",
    "**/.project",
    "**/.settings",
    "**/.classpath",
];

/// Compiled exclude and include patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    exclude: GlobSet,
    include: Option<GlobSet>,
}

fn build(patterns: &[&str]) -> Result<GlobSet, ConfigurationError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let trimmed = pattern.trim_end_matches('/');
        let glob = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .build()
            .map_err(|e| ConfigurationError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.kind().to_string(),
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ConfigurationError::InvalidPattern {
        pattern: patterns.join(", "),
        reason: e.to_string(),
    })
}

impl PatternSet {
    /// Exactly the given patterns, no built-in excludes.
    pub fn new<E, I>(exclude: &[E], include: &[I]) -> Result<Self, ConfigurationError>
    where
        E: AsRef<str>,
        I: AsRef<str>,
    {
        let exclude: Vec<&str> = exclude.iter().map(AsRef::as_ref).collect();
        let include: Vec<&str> = include.iter().map(AsRef::as_ref).collect();
        Ok(Self {
            exclude: build(&exclude)?,
            include: if include.is_empty() {
                None
            } else {
                Some(build(&include)?)
            },
        })
    }

    /// The built-in excludes unioned with `extra_exclude`.
    pub fn with_defaults<E, I>(extra_exclude: &[E], include: &[I]) -> Result<Self, ConfigurationError>
    where
        E: AsRef<str>,
        I: AsRef<str>,
    {
        let exclude: Vec<&str> = DEFAULT_EXCLUDE_PATTERNS
            .iter()
            .copied()
            .chain(extra_exclude.iter().map(AsRef::as_ref))
            .collect();
        Self::new(&exclude, include)
    }

    /// Accepts everything. Used for the baseline "files found" pass.
    pub fn empty() -> Self {
        Self {
            exclude: GlobSet::empty(),
            include: None,
        }
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        if self.exclude.is_match(path) {
            return true;
        }
        path.match_indices('/')
            .any(|(i, _)| self.exclude.is_match(&path[..i]))
    }

    pub fn is_included(&self, path: &str) -> bool {
        match &self.include {
            Some(include) => include.is_match(path),
            None => true,
        }
    }

    pub fn accepts(&self, path: &str) -> bool {
        !self.is_excluded(path) && self.is_included(path)
    }
}

/// Keep the accepted paths, preserving input order.
pub fn filter(listing: &[String], patterns: &PatternSet) -> Vec<String> {
    let accepted: Vec<String> = listing
        .iter()
        .filter(|path| patterns.accepts(path))
        .cloned()
        .collect();
    debug!(
        input = listing.len(),
        accepted = accepted.len(),
        "Applied pattern filter"
    );
    accepted
}
