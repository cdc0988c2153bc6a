//! Property-based tests for the filtering, accounting and chunking laws.

use proptest::prelude::*;
use repo_extract_core::chunk::plan_chunks;
use repo_extract_core::config::{ExtractConfig, OutputFormat};
use repo_extract_core::contract::{LoadedFile, TokenEstimator};
use repo_extract_core::extract::extract_from_source;
use repo_extract_core::patterns::{filter, PatternSet};
use repo_extract_core::source::ArchiveSource;
use repo_extract_core::tokens::HeuristicEstimator;

/// Relative paths built from a small alphabet so patterns actually hit.
fn path_strategy() -> impl Strategy<Value = String> {
    let segment = prop_oneof!["src", "lib", "docs", "node_modules", "build", "a", "b"];
    let file = prop_oneof![
        "[a-c]{1,3}\\.rs",
        "[a-c]{1,3}\\.js",
        "[a-c]{1,3}\\.md",
        "[a-c]{1,3}\\.css",
        "\\.[a-c]{1,3}",
    ];
    (prop::collection::vec(segment, 0..3), file).prop_map(|(dirs, file)| {
        let mut parts: Vec<String> = dirs.into_iter().map(String::from).collect();
        parts.push(file);
        parts.join("/")
    })
}

fn listing_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(path_strategy(), 0..24).prop_map(|set| set.into_iter().collect())
}

fn pattern_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("**/*.rs".to_string()),
        Just("**/*.js".to_string()),
        Just("**/*.css".to_string()),
        Just("src/**".to_string()),
        Just("**/docs".to_string()),
        Just("lib/*.md".to_string()),
        Just("**/a".to_string()),
    ]
}

fn content_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z ]{0,200}",
        "[a-z]{1,8}(\n[a-z ]{0,40}){0,6}",
        // Null bytes must be dropped by the loader.
        "[a-z]{0,10}\\x00[a-z]{0,10}",
    ]
}

fn loaded(path: &str, content: &str) -> LoadedFile {
    LoadedFile {
        path: path.to_string(),
        size: content.len() as u64,
        content: content.to_string(),
    }
}

proptest! {
    #[test]
    fn excludes_always_win_over_includes(
        listing in listing_strategy(),
        pattern in pattern_strategy(),
    ) {
        let patterns = PatternSet::new(&[pattern.as_str()], &[pattern.as_str()]).unwrap();
        prop_assert!(filter(&listing, &patterns).is_empty());
    }

    #[test]
    fn no_patterns_accept_everything_in_order(listing in listing_strategy()) {
        let none: [&str; 0] = [];
        let patterns = PatternSet::new(&none, &none).unwrap();
        prop_assert_eq!(filter(&listing, &patterns), listing.clone());
        prop_assert_eq!(filter(&listing, &PatternSet::empty()), listing);
    }

    #[test]
    fn filtered_listing_is_an_ordered_subsequence(
        listing in listing_strategy(),
        exclude in prop::collection::vec(pattern_strategy(), 0..3),
        include in prop::collection::vec(pattern_strategy(), 0..2),
    ) {
        let patterns = PatternSet::with_defaults(&exclude, &include).unwrap();
        let accepted = filter(&listing, &patterns);
        let mut rest = listing.iter();
        for path in &accepted {
            prop_assert!(rest.any(|p| p == path), "{} out of order", path);
            prop_assert!(patterns.accepts(path));
        }
    }

    #[test]
    fn chunk_plan_partitions_files_under_ceiling(
        contents in prop::collection::vec("[a-z ]{0,120}", 0..20),
        ceiling in 1usize..80,
    ) {
        let files: Vec<LoadedFile> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| loaded(&format!("f{i}.txt"), c))
            .collect();
        let estimator = HeuristicEstimator;
        let plan = plan_chunks(&files, ceiling, &estimator);

        let mut seen: Vec<usize> = plan.groups.iter().flatten().copied().collect();
        let in_order = seen.windows(2).all(|w| w[0] < w[1]);
        prop_assert!(in_order, "chunk order must follow input order");
        seen.extend(plan.oversized.iter().copied());
        seen.sort_unstable();
        prop_assert_eq!(seen, (0..files.len()).collect::<Vec<_>>());

        for group in &plan.groups {
            prop_assert!(!group.is_empty());
            let tokens: usize = group.iter().map(|&i| estimator.estimate(&files[i].content)).sum();
            prop_assert!(tokens <= ceiling);
        }
        for &i in &plan.oversized {
            prop_assert!(estimator.estimate(&files[i].content) > ceiling);
        }
    }

    #[test]
    fn estimator_is_monotone_under_append(a in ".{0,60}", b in ".{0,60}") {
        let estimator = HeuristicEstimator;
        prop_assert_eq!(estimator.estimate(""), 0);
        let joined = format!("{a}{b}");
        prop_assert!(estimator.estimate(&joined) >= estimator.estimate(&a));
    }

    #[test]
    fn stats_account_for_every_found_file(
        entries in prop::collection::btree_map(path_strategy(), content_strategy(), 0..16),
        exclude in prop::collection::vec(pattern_strategy(), 0..2),
        format in prop_oneof![
            Just(OutputFormat::Text),
            Just(OutputFormat::Markdown),
            Just(OutputFormat::Json),
        ],
    ) {
        let source = ArchiveSource::from_entries("prop", entries.clone());
        let mut config = ExtractConfig::new("prop");
        config.exclude_patterns = exclude;
        config.format = format;
        config.chunk_size = 30;
        let patterns = config.validate().unwrap();

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime
            .block_on(extract_from_source(&config, &patterns, &source, &HeuristicEstimator))
            .unwrap();

        let stats = result.stats;
        prop_assert_eq!(stats.files_found, entries.len());
        prop_assert_eq!(
            stats.files_excluded + stats.files_skipped + result.files.len(),
            stats.files_found
        );
        prop_assert_eq!(stats.files_processed(), result.files.len());
        prop_assert!(result.files.iter().all(|f| !f.content.contains('\0')));
        if format == OutputFormat::Json {
            prop_assert_eq!(result.chunks.len(), 1);
        } else {
            prop_assert!(result.chunks.len() + result.oversized.len() <= result.files.len().max(1));
        }
    }
}
