//! Heuristic token estimation.
//!
//! Text is split into word runs and single punctuation characters; each
//! piece costs one token per started group of four characters, so
//! punctuation costs one and whitespace is free. Appending text can only
//! grow the last word or add pieces, so the estimate never decreases.

use regex::Regex;
use std::sync::LazyLock;

use crate::contract::TokenEstimator;

static PIECES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+|[^\w\s]").expect("valid token piece regex"));

const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str) -> usize {
        PIECES
            .find_iter(text)
            .map(|piece| piece.as_str().chars().count().div_ceil(CHARS_PER_TOKEN))
            .sum()
    }
}
