//! Seams between the search core and its external collaborators.
//!
//! The search core never talks to the network, the filesystem, or a PDF
//! library directly. It receives these collaborators as trait objects,
//! constructed once at startup and injected into the corpus providers:
//!
//! ```text
//! ┌───────────────┐  ┌───────────┐  ┌───────────────┐
//! │ MetadataStore │  │ BlobStore │  │ TextExtractor │
//! │  (catalog)    │  │ (PDF bytes│  │ (bytes→pages) │
//! └──────┬────────┘  └─────┬─────┘  └──────┬────────┘
//!        └────────────┬────┴───────────────┘
//!                     ▼
//!             ┌────────────────┐
//!             │ CorpusProvider │  RemoteCorpus / CachedCorpus
//!             └───────┬────────┘
//!                     ▼
//!            search_pages / search_lines
//! ```
//!
//! Tests substitute in-memory implementations for all four.

use async_trait::async_trait;

use crate::error::{CorpusError, Result};
use crate::extract::ExtractError;
use crate::models::{Catalog, MagazineIssue, PageText};

/// Source of magazine and issue metadata.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Reads the full catalog.
    ///
    /// Returns [`SearchError::MetadataUnavailable`](crate::error::SearchError::MetadataUnavailable)
    /// when the store cannot be read. An empty store is returned as an empty
    /// [`Catalog`]; callers decide whether that is an error.
    async fn catalog(&self) -> Result<Catalog>;
}

/// Source of PDF bytes, addressed by storage file id.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn download(&self, file_id: &str) -> std::result::Result<Vec<u8>, CorpusError>;
}

/// Turns PDF bytes into per-page text.
///
/// Implementations are synchronous and may be CPU-heavy; callers run them
/// on the blocking pool (see [`crate::extract::extract_blocking`]).
pub trait TextExtractor: Send + Sync {
    fn extract_pages(&self, bytes: &[u8]) -> std::result::Result<Vec<PageText>, ExtractError>;
}

/// Supplies the documents considered by one search pass.
#[async_trait]
pub trait CorpusProvider: Send + Sync {
    /// Short label used in log lines (e.g. `"remote"`, `"cache"`).
    fn name(&self) -> &str;

    /// Lists every issue available for search, in discovery order.
    async fn list_issues(&self) -> Result<Vec<MagazineIssue>>;

    /// Fetches and extracts the text of one issue.
    ///
    /// Failures are per-issue: the orchestrator skips the issue and carries on.
    async fn get_text(&self, issue: &MagazineIssue)
        -> std::result::Result<Vec<PageText>, CorpusError>;
}
