//! Query matching over page text.
//!
//! Two granularities are supported:
//!
//! - **Page**: every non-overlapping, case-insensitive occurrence of the query
//!   in the page yields one match, with up to `window` characters of context
//!   on each side.
//! - **Line**: each trimmed, non-empty line that contains the query
//!   (case-insensitively) yields exactly one match, regardless of how many
//!   times the query occurs in it.
//!
//! The query is always a literal string. An empty query matches at every
//! character position in page mode and every line in line mode.

use crate::models::PageText;

/// Default number of context characters kept on each side of a page match.
pub const DEFAULT_CONTEXT_CHARS: usize = 50;

/// One located occurrence, before metadata and confidence are attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMatch {
    /// 1-based index into the page's non-empty lines (line mode only).
    pub line_number: Option<usize>,
    pub context: String,
}

/// Lower-cased copy of a text that remembers where each byte came from.
struct Folded {
    lowered: String,
    /// `origin[b]` is the char index in the source text that produced byte
    /// `b` of `lowered`; one extra trailing entry maps the end of the text.
    origin: Vec<usize>,
}

impl Folded {
    fn new(text: &str) -> Self {
        let mut lowered = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len() + 1);
        let mut char_count = 0;
        for (idx, c) in text.chars().enumerate() {
            for lc in c.to_lowercase() {
                lowered.push(lc);
                origin.extend(std::iter::repeat(idx).take(lc.len_utf8()));
            }
            char_count = idx + 1;
        }
        origin.push(char_count);
        Self { lowered, origin }
    }

    /// Source char range `[start, end)` covering lowered bytes `[from, to)`.
    fn source_span(&self, from: usize, to: usize) -> (usize, usize) {
        let start = self.origin[from];
        let end = if to > from {
            self.origin[to - 1] + 1
        } else {
            start
        };
        (start, end)
    }
}

/// Finds every occurrence of `query` in a page's full text.
pub fn find_page_matches(page: &PageText, query: &str, window: usize) -> Vec<RawMatch> {
    let text = &page.text;
    let folded = Folded::new(text);
    let needle = query.to_lowercase();
    let chars: Vec<char> = text.chars().collect();

    folded
        .lowered
        .match_indices(needle.as_str())
        .map(|(at, hit)| {
            let (start, end) = folded.source_span(at, at + hit.len());
            let from = start.saturating_sub(window);
            let to = end.saturating_add(window).min(chars.len());
            let context: String = chars[from..to]
                .iter()
                .map(|&c| if c == '\n' { ' ' } else { c })
                .collect();
            RawMatch {
                line_number: None,
                context: context.trim().to_string(),
            }
        })
        .collect()
}

/// Finds every line of a page that contains `keyword`.
///
/// The keyword is trimmed before matching; the context is the whole line.
pub fn find_line_matches(page: &PageText, keyword: &str) -> Vec<RawMatch> {
    let needle = keyword.trim().to_lowercase();
    page.lines()
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(needle.as_str()))
        .map(|(idx, line)| RawMatch {
            line_number: Some(idx + 1),
            context: line.to_string(),
        })
        .collect()
}
