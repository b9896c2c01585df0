//! Search orchestration.
//!
//! Drives a [`CorpusProvider`] through the matcher and ranker in one linear
//! pass. Issues are processed strictly one after another; an issue whose
//! text cannot be fetched or extracted is logged and skipped, so a single
//! bad document never fails the search.
//!
//! Two result contracts exist and are kept deliberately separate:
//!
//! | Function | Granularity | Ranked | Truncated | Count field |
//! |----------|-------------|--------|-----------|-------------|
//! | [`search_pages`] | every occurrence in a page | yes | to `limit` | `total_results` = returned count |
//! | [`search_lines`] | one per matching line | no | never | `total_matches` = full count |
//!
//! Ties in confidence keep discovery order (issue order from the provider,
//! then page order, then in-page order). Issue order follows the metadata
//! store's enumeration, so tie order is only as stable as that backend.

use crate::config::Config;
use crate::corpus::Backends;
use crate::error::Result;
use crate::matcher::{find_line_matches, find_page_matches};
use crate::models::{
    LineHit, LineSearchResponse, MagazineIssue, MatchRecord, PageHit, PageSearchResponse,
    PageText,
};
use crate::ranker::page_confidence;
use crate::traits::CorpusProvider;

/// Which corpus and result contract a search uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Ranked, page-granularity search over PDFs fetched from storage.
    #[default]
    Page,
    /// Every matching line across the local cache.
    Line,
}

/// Parameters for [`search_pages`].
#[derive(Debug, Clone, Copy)]
pub struct PageSearchOptions {
    /// Maximum number of results returned.
    pub limit: usize,
    /// Context characters kept on each side of a match.
    pub context_chars: usize,
}

impl Default for PageSearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            context_chars: crate::matcher::DEFAULT_CONTEXT_CHARS,
        }
    }
}

/// Ranked, page-granularity search.
pub async fn search_pages(
    provider: &dyn CorpusProvider,
    query: &str,
    options: PageSearchOptions,
) -> Result<PageSearchResponse> {
    let mut records = collect(provider, |issue, page| {
        let matches = find_page_matches(page, query, options.context_chars);
        if matches.is_empty() {
            return Vec::new();
        }
        let confidence = page_confidence(query, &page.text);
        matches
            .into_iter()
            .map(|m| record(issue, page, m.line_number, m.context, confidence))
            .collect()
    })
    .await?;

    // Vec::sort_by is stable: equal confidences keep discovery order.
    records.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    records.truncate(options.limit);

    let results: Vec<PageHit> = records.into_iter().map(PageHit::from).collect();
    Ok(PageSearchResponse {
        total_results: results.len(),
        results,
    })
}

/// Unranked, line-granularity search over the whole corpus.
pub async fn search_lines(
    provider: &dyn CorpusProvider,
    keyword: &str,
) -> Result<LineSearchResponse> {
    let records = collect(provider, |issue, page| {
        find_line_matches(page, keyword)
            .into_iter()
            .map(|m| record(issue, page, m.line_number, m.context, 1.0))
            .collect()
    })
    .await?;

    let results: Vec<LineHit> = records.into_iter().map(LineHit::from).collect();
    Ok(LineSearchResponse {
        total_matches: results.len(),
        results,
    })
}

/// Walks every issue and page, gathering the records `per_page` produces.
async fn collect<F>(provider: &dyn CorpusProvider, mut per_page: F) -> Result<Vec<MatchRecord>>
where
    F: FnMut(&MagazineIssue, &PageText) -> Vec<MatchRecord>,
{
    let issues = provider.list_issues().await?;
    tracing::debug!(provider = provider.name(), issues = issues.len(), "search pass");

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for issue in &issues {
        let pages = match provider.get_text(issue).await {
            Ok(pages) => pages,
            Err(e) => {
                tracing::warn!(
                    magazine = %issue.magazine_id,
                    source = %issue.source,
                    kind = e.kind(),
                    "skipping issue: {}",
                    e
                );
                skipped += 1;
                continue;
            }
        };
        for page in &pages {
            records.extend(per_page(issue, page));
        }
    }

    tracing::info!(
        provider = provider.name(),
        issues = issues.len(),
        skipped,
        matches = records.len(),
        "search complete"
    );
    Ok(records)
}

fn record(
    issue: &MagazineIssue,
    page: &PageText,
    line_number: Option<usize>,
    context: String,
    confidence: f64,
) -> MatchRecord {
    MatchRecord {
        magazine_id: issue.magazine_id.clone(),
        title: issue.title.clone(),
        issue_id: issue.issue_id.clone(),
        file_id: issue.file_id.clone(),
        page_number: page.page_number,
        line_number,
        context,
        confidence,
    }
}

/// CLI entry point for `magsearch search`.
pub async fn run_search(
    config: &Config,
    query: &str,
    mode: SearchMode,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let backends = Backends::from_config(config)?;

    match mode {
        SearchMode::Page => {
            let options = PageSearchOptions {
                limit: limit.unwrap_or(config.search.default_limit),
                context_chars: config.search.context_chars,
            };
            let response = search_pages(&backends.remote_corpus(), query, options).await?;
            if response.results.is_empty() {
                println!("No results.");
                return Ok(());
            }
            println!("Found {} results for '{}':\n", response.total_results, query);
            for (i, hit) in response.results.iter().enumerate() {
                println!(
                    "{}. [{:.2}] {} ({}), page {}",
                    i + 1,
                    hit.confidence,
                    hit.title,
                    hit.magazine_id,
                    hit.page_number
                );
                println!("    {}", hit.content_preview);
            }
        }
        SearchMode::Line => {
            if limit.is_some() {
                tracing::warn!("--limit is ignored in line mode");
            }
            let response = search_lines(&backends.cached_corpus(), query).await?;
            if response.results.is_empty() {
                println!("No results.");
                return Ok(());
            }
            println!("Found {} matching lines for '{}':\n", response.total_matches, query);
            for hit in &response.results {
                println!(
                    "{} ({}) issue {} p.{} l.{}: {}",
                    hit.magazine_title,
                    hit.magazine_id,
                    hit.issue_id,
                    hit.page_number,
                    hit.line_number,
                    hit.context
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CorpusError, SearchError};
    use crate::models::SourceRef;
    use async_trait::async_trait;

    /// One fake issue; `pages == None` stands for an issue that fails extraction.
    struct FakeIssue {
        id: String,
        title: String,
        pages: Option<Vec<String>>,
    }

    fn issue(id: &str, title: &str, pages: &[&str]) -> FakeIssue {
        FakeIssue {
            id: id.to_string(),
            title: title.to_string(),
            pages: Some(pages.iter().map(|p| p.to_string()).collect()),
        }
    }

    fn corrupt(id: &str) -> FakeIssue {
        FakeIssue {
            id: id.to_string(),
            title: "Corrupt".to_string(),
            pages: None,
        }
    }

    struct FakeCorpus(Vec<FakeIssue>);

    #[async_trait]
    impl CorpusProvider for FakeCorpus {
        fn name(&self) -> &str {
            "fake"
        }

        async fn list_issues(&self) -> Result<Vec<MagazineIssue>> {
            Ok(self
                .0
                .iter()
                .map(|fake| MagazineIssue {
                    magazine_id: fake.id.clone(),
                    issue_id: Some(format!("issue-{}", fake.id)),
                    issue_number: Some("1".to_string()),
                    title: fake.title.clone(),
                    file_id: Some(format!("file-{}", fake.id)),
                    source: SourceRef::Remote {
                        file_id: format!("file-{}", fake.id),
                    },
                })
                .collect())
        }

        async fn get_text(
            &self,
            issue: &MagazineIssue,
        ) -> std::result::Result<Vec<PageText>, CorpusError> {
            let fake = self
                .0
                .iter()
                .find(|f| f.id == issue.magazine_id)
                .ok_or_else(|| CorpusError::fetch(issue.magazine_id.as_str(), "unknown"))?;
            match &fake.pages {
                Some(pages) => Ok(pages
                    .iter()
                    .enumerate()
                    .map(|(i, t)| PageText::new(i + 1, t.as_str()))
                    .collect()),
                None => Err(CorpusError::extraction(fake.id.as_str(), "corrupt bytes")),
            }
        }
    }

    struct BrokenCatalog;

    #[async_trait]
    impl CorpusProvider for BrokenCatalog {
        fn name(&self) -> &str {
            "broken"
        }

        async fn list_issues(&self) -> Result<Vec<MagazineIssue>> {
            Err(SearchError::metadata("connection refused"))
        }

        async fn get_text(
            &self,
            _issue: &MagazineIssue,
        ) -> std::result::Result<Vec<PageText>, CorpusError> {
            unreachable!()
        }
    }

    fn opts(limit: usize) -> PageSearchOptions {
        PageSearchOptions {
            limit,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn phrase_must_occur_literally() {
        let corpus = FakeCorpus(vec![issue("m1", "Nature", &["the quick brown fox"])]);
        let response = search_pages(&corpus, "quick fox", opts(10)).await.unwrap();
        assert_eq!(response.total_results, 0);

        let response = search_pages(&corpus, "quick", opts(10)).await.unwrap();
        assert_eq!(response.total_results, 1);
        assert_eq!(response.results[0].confidence, 1.0);
        assert_eq!(response.results[0].title, "Nature");
        assert_eq!(response.results[0].content_preview, "...the quick brown fox...");
    }

    #[tokio::test]
    async fn multi_word_confidence_is_shared_per_page() {
        let corpus = FakeCorpus(vec![issue(
            "m1",
            "Nature",
            &["quick fox here, and another quick fox there"],
        )]);
        let response = search_pages(&corpus, "quick fox", opts(10)).await.unwrap();
        assert_eq!(response.total_results, 2);
        // quick at 0, fox at 6
        let expected = 1.0 / 1.06;
        for hit in &response.results {
            assert!((hit.confidence - expected).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn higher_confidence_sorts_first() {
        // "green" at 0, "red" at 101: spread 101.
        let spread = format!("green {} red green", "x".repeat(94));
        let corpus = FakeCorpus(vec![
            issue("far", "Far", &[spread.as_str()]),
            issue("near", "Near", &["red green"]),
        ]);
        let response = search_pages(&corpus, "red green", opts(10)).await.unwrap();
        let ids: Vec<_> = response.results.iter().map(|h| h.magazine_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
        assert!((response.results[0].confidence - 1.0 / 1.04).abs() < 1e-9);
        assert!((response.results[1].confidence - 1.0 / 2.01).abs() < 1e-9);
    }

    #[tokio::test]
    async fn ties_keep_discovery_order() {
        // Every page has "alpha" at 0 and "beta" at 6.
        let long = format!("alpha beta {} beta alpha", "x".repeat(200));
        let corpus = FakeCorpus(vec![
            issue("m1", "First", &[long.as_str()]),
            issue("m2", "Second", &["alpha beta", "alpha beta again"]),
        ]);
        let response = search_pages(&corpus, "alpha beta", opts(10)).await.unwrap();
        let order: Vec<_> = response
            .results
            .iter()
            .map(|h| (h.magazine_id.as_str(), h.page_number))
            .collect();
        assert_eq!(order, vec![("m1", 1), ("m2", 1), ("m2", 2)]);
    }

    #[tokio::test]
    async fn results_are_truncated_to_limit() {
        let corpus = FakeCorpus(vec![issue("m1", "Echo", &["echo echo echo", "echo echo"])]);
        let response = search_pages(&corpus, "echo", opts(3)).await.unwrap();
        assert_eq!(response.results.len(), 3);
        assert_eq!(response.total_results, 3);

        let response = search_pages(&corpus, "echo", opts(0)).await.unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.total_results, 0);
    }

    #[tokio::test]
    async fn absent_word_gives_empty_results() {
        let corpus = FakeCorpus(vec![issue("m1", "Nature", &["the quick brown fox"])]);
        let response = search_pages(&corpus, "zebra", opts(10)).await.unwrap();
        assert!(response.results.is_empty());
        assert_eq!(response.total_results, 0);

        let response = search_lines(&corpus, "zebra").await.unwrap();
        assert_eq!(response.total_matches, 0);
    }

    #[tokio::test]
    async fn failing_issue_is_skipped() {
        let corpus = FakeCorpus(vec![
            issue("good1", "Good One", &["rust news"]),
            corrupt("bad"),
            issue("good2", "Good Two", &["more rust"]),
        ]);
        let response = search_pages(&corpus, "rust", opts(10)).await.unwrap();
        let ids: Vec<_> = response.results.iter().map(|h| h.magazine_id.as_str()).collect();
        assert_eq!(ids, vec!["good1", "good2"]);

        let response = search_lines(&corpus, "rust").await.unwrap();
        assert_eq!(response.total_matches, 2);
    }

    #[tokio::test]
    async fn metadata_failure_is_surfaced() {
        let err = search_pages(&BrokenCatalog, "rust", opts(10)).await.unwrap_err();
        assert!(matches!(err, SearchError::MetadataUnavailable(_)));
        assert!(search_lines(&BrokenCatalog, "rust").await.is_err());
    }

    #[tokio::test]
    async fn line_search_is_untruncated_and_one_per_line() {
        let page = "Rust and rust\nnothing\nrust again";
        let corpus = FakeCorpus(vec![
            issue("m1", "One", &[page, page]),
            issue("m2", "Two", &[page]),
        ]);
        let response = search_lines(&corpus, "RUST").await.unwrap();
        assert_eq!(response.total_matches, 6);
        assert_eq!(response.results.len(), 6);

        let first = &response.results[0];
        assert_eq!(first.magazine_title, "One");
        assert_eq!(first.issue_id, "issue-m1");
        assert_eq!(first.file_id, "file-m1");
        assert_eq!(first.page_number, 1);
        assert_eq!(first.line_number, 1);
        assert_eq!(first.context, "Rust and rust");
        assert_eq!(response.results[1].line_number, 3);

        let mut triples: Vec<_> = response
            .results
            .iter()
            .map(|h| (h.magazine_id.clone(), h.page_number, h.line_number))
            .collect();
        triples.dedup();
        assert_eq!(triples.len(), 6);
    }

    #[tokio::test]
    async fn confidence_always_in_unit_interval() {
        let corpus = FakeCorpus(vec![issue(
            "m1",
            "Mixed",
            &["a b", "b only here", "a then much later b"],
        )]);
        for query in ["a", "b", "a b", "b a", "only here"] {
            let response = search_pages(&corpus, query, opts(100)).await.unwrap();
            for hit in response.results {
                assert!(hit.confidence > 0.0 && hit.confidence <= 1.0);
            }
        }
    }

    #[test]
    fn page_mode_is_the_default() {
        assert_eq!(SearchMode::default(), SearchMode::Page);
    }
}
