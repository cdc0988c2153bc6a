//! Rendering of a loaded file set into text, Markdown or JSON.
//!
//! All functions here are pure: the same files, manifest and stats always
//! produce the same bytes.

use serde::Serialize;

use crate::config::OutputFormat;
use crate::contract::LoadedFile;
use crate::stats::ExtractionStats;

pub const TREE_HEADER: &str = "Directory structure:";
pub const TREE_MARKER: &str = "└── ";
pub const MARKDOWN_TITLE: &str = "# Repository Analysis";
const SEPARATOR_WIDTH: usize = 48;

/// Flat manifest of paths under a header line. Not a hierarchy.
pub fn render_tree(paths: &[String]) -> String {
    std::iter::once(TREE_HEADER.to_string())
        .chain(paths.iter().map(|p| format!("{TREE_MARKER}{p}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fence language for a path, from its extension.
pub fn language_for(path: &str) -> Option<&'static str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = file_name.rsplit_once('.')?;
    let lang = match ext.to_ascii_lowercase().as_str() {
        "js" | "mjs" | "cjs" => "javascript",
        "jsx" => "jsx",
        "ts" | "mts" | "cts" => "typescript",
        "tsx" => "tsx",
        "py" => "python",
        "rb" => "ruby",
        "rs" => "rust",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "swift" => "swift",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" | "hh" => "cpp",
        "cs" => "csharp",
        "php" => "php",
        "scala" => "scala",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" => "scss",
        "sass" => "sass",
        "less" => "less",
        "vue" => "vue",
        "svelte" => "svelte",
        "json" => "json",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" | "markdown" => "markdown",
        "sh" | "bash" | "zsh" => "bash",
        "ps1" => "powershell",
        "sql" => "sql",
        "graphql" | "gql" => "graphql",
        "lua" => "lua",
        "dart" => "dart",
        "ex" | "exs" => "elixir",
        "hs" => "haskell",
        "r" => "r",
        _ => return None,
    };
    Some(lang)
}

/// A backtick fence longer than any backtick run inside `content`.
fn fence_for(content: &str) -> String {
    let longest = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}

pub fn format_text(files: &[LoadedFile], tree: &str) -> String {
    let sections = files
        .iter()
        .map(|f| {
            format!(
                "File: {}\n{}\n{}\n",
                f.path,
                "=".repeat(SEPARATOR_WIDTH),
                f.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    if tree.is_empty() {
        sections
    } else {
        format!("{tree}\n\n{sections}")
    }
}

pub fn format_markdown(files: &[LoadedFile], tree: &str) -> String {
    let mut out = format!("{MARKDOWN_TITLE}\n\n");
    if !tree.is_empty() {
        out.push_str(&format!("## Directory Structure\n\n```\n{tree}\n```\n\n"));
    }
    let sections = files
        .iter()
        .map(|f| {
            let fence = fence_for(&f.content);
            let lang = language_for(&f.path).unwrap_or("");
            let newline = if f.content.ends_with('\n') { "" } else { "\n" };
            format!(
                "## {}\n\n{fence}{lang}\n{}{newline}{fence}\n",
                f.path, f.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    out.push_str(&sections);
    out
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDocument<'a> {
    stats: &'a ExtractionStats,
    directory_structure: Vec<&'a str>,
    files: &'a [LoadedFile],
}

pub fn format_json(files: &[LoadedFile], tree: &str, stats: &ExtractionStats) -> String {
    let document = JsonDocument {
        stats,
        directory_structure: tree.lines().collect(),
        files,
    };
    // Only strings, integers and sequences with string keys: serialisation cannot fail.
    serde_json::to_string_pretty(&document).expect("JSON document of plain fields always serialises")
}

/// Render `files` in `mode`. An empty `tree` omits the manifest section.
pub fn format(
    files: &[LoadedFile],
    tree: &str,
    stats: &ExtractionStats,
    mode: OutputFormat,
) -> String {
    match mode {
        OutputFormat::Text => format_text(files, tree),
        OutputFormat::Markdown => format_markdown(files, tree),
        OutputFormat::Json => format_json(files, tree, stats),
    }
}
