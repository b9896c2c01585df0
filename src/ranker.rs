//! Word-proximity confidence for page matches.
//!
//! A single-word query always scores `1.0`. For a multi-word query the score
//! is computed once per page: take the first occurrence (char index in the
//! lower-cased page text) of each query word, let `spread = max - min`, and
//! score `1 / (1 + spread / 100)`. Every match on the page shares that score.
//!
//! # Known limitation
//!
//! A word that does not occur on the page contributes position `-1` to the
//! spread rather than disqualifying the page. A page where one word sits at
//! position 0 and another is missing therefore scores as if the words were
//! one character apart. Callers that need "all words present" semantics must
//! check for that themselves.

/// Position reported for a word that does not occur in the page.
pub const ABSENT: i64 = -1;

/// Confidence shared by every match of `query` on a page with `page_text`.
///
/// Always in `(0, 1]`.
pub fn page_confidence(query: &str, page_text: &str) -> f64 {
    let lowered_query = query.to_lowercase();
    let words: Vec<&str> = lowered_query.split_whitespace().collect();
    if words.len() <= 1 {
        return 1.0;
    }

    let lowered_page = page_text.to_lowercase();
    let positions: Vec<i64> = words
        .iter()
        .map(|w| first_occurrence(&lowered_page, w))
        .collect();

    let max = positions.iter().copied().max().unwrap_or(0);
    let min = positions.iter().copied().min().unwrap_or(0);
    confidence_for_spread(max - min)
}

/// `1 / (1 + spread / 100)`, monotonically non-increasing in `spread`.
pub fn confidence_for_spread(spread: i64) -> f64 {
    1.0 / (1.0 + spread.max(0) as f64 / 100.0)
}

/// Char index of the first occurrence of `needle`, or [`ABSENT`].
fn first_occurrence(haystack: &str, needle: &str) -> i64 {
    haystack
        .find(needle)
        .map(|byte| haystack[..byte].chars().count() as i64)
        .unwrap_or(ABSENT)
}
