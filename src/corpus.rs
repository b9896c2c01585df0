//! Corpus providers: where the text being searched comes from.
//!
//! - [`RemoteCorpus`] lists issues from the metadata store and downloads
//!   each PDF from object storage on demand.
//! - [`CachedCorpus`] lists the PDFs already synced into the local cache
//!   and reads them from disk.
//!
//! Both extract text with the injected [`TextExtractor`] on the blocking pool.

use async_trait::async_trait;
use std::sync::Arc;

use crate::cache::PdfCache;
use crate::config::Config;
use crate::error::{CorpusError, Result, SearchError};
use crate::extract::{extract_blocking, PdfExtractor};
use crate::metadata::FirebaseStore;
use crate::models::{MagazineIssue, PageText, SourceRef, UNKNOWN};
use crate::storage::{build_http_client, AppwriteStorage};
use crate::traits::{BlobStore, CorpusProvider, MetadataStore, TextExtractor};

/// The external collaborators, constructed once and shared.
#[derive(Clone)]
pub struct Backends {
    pub metadata: Arc<dyn MetadataStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub extractor: Arc<dyn TextExtractor>,
    pub cache: PdfCache,
}

impl Backends {
    /// Builds the production clients from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_http_client(&config.storage)?;
        Ok(Self {
            metadata: Arc::new(FirebaseStore::new(client.clone(), &config.metadata)),
            blobs: Arc::new(AppwriteStorage::new(client, &config.storage)),
            extractor: Arc::new(PdfExtractor),
            cache: PdfCache::new(config.cache.dir.clone()),
        })
    }

    pub fn remote_corpus(&self) -> RemoteCorpus {
        RemoteCorpus {
            metadata: self.metadata.clone(),
            blobs: self.blobs.clone(),
            extractor: self.extractor.clone(),
        }
    }

    pub fn cached_corpus(&self) -> CachedCorpus {
        CachedCorpus {
            metadata: self.metadata.clone(),
            extractor: self.extractor.clone(),
            cache: self.cache.clone(),
        }
    }
}

/// Fetches every issue's PDF from object storage per search.
pub struct RemoteCorpus {
    metadata: Arc<dyn MetadataStore>,
    blobs: Arc<dyn BlobStore>,
    extractor: Arc<dyn TextExtractor>,
}

#[async_trait]
impl CorpusProvider for RemoteCorpus {
    fn name(&self) -> &str {
        "remote"
    }

    async fn list_issues(&self) -> Result<Vec<MagazineIssue>> {
        let catalog = self.metadata.catalog().await?;
        if catalog.is_empty() {
            return Err(SearchError::metadata("no magazines in metadata store"));
        }
        Ok(catalog.remote_issues())
    }

    async fn get_text(
        &self,
        issue: &MagazineIssue,
    ) -> std::result::Result<Vec<PageText>, CorpusError> {
        let file_id = match &issue.source {
            SourceRef::Remote { file_id } => file_id,
            SourceRef::Local(path) => {
                return Err(CorpusError::fetch(
                    path.display().to_string(),
                    "remote corpus cannot read local files",
                ))
            }
        };
        let bytes = self.blobs.download(file_id).await?;
        extract_blocking(self.extractor.clone(), bytes)
            .await
            .map_err(|e| CorpusError::extraction(file_id.as_str(), e))
    }
}

/// Reads PDFs from the local cache directory.
pub struct CachedCorpus {
    metadata: Arc<dyn MetadataStore>,
    extractor: Arc<dyn TextExtractor>,
    cache: PdfCache,
}

#[async_trait]
impl CorpusProvider for CachedCorpus {
    fn name(&self) -> &str {
        "cache"
    }

    async fn list_issues(&self) -> Result<Vec<MagazineIssue>> {
        let catalog = self.metadata.catalog().await?;
        if catalog.is_empty() {
            return Err(SearchError::metadata("no magazines in metadata store"));
        }
        let index = catalog.issue_index();

        let issues = self
            .cache
            .list()
            .await?
            .into_iter()
            .map(|entry| {
                let key = format!("{}_{}", entry.magazine_id, entry.issue_number);
                let (issue_id, file_id) = index
                    .get(&key)
                    .cloned()
                    .unwrap_or_else(|| (UNKNOWN.to_string(), UNKNOWN.to_string()));
                MagazineIssue {
                    title: catalog.title_of(&entry.magazine_id).to_string(),
                    magazine_id: entry.magazine_id,
                    issue_id: Some(issue_id),
                    issue_number: Some(entry.issue_number),
                    file_id: Some(file_id),
                    source: SourceRef::Local(entry.path),
                }
            })
            .collect();
        Ok(issues)
    }

    async fn get_text(
        &self,
        issue: &MagazineIssue,
    ) -> std::result::Result<Vec<PageText>, CorpusError> {
        let path = match &issue.source {
            SourceRef::Local(path) => path,
            SourceRef::Remote { file_id } => {
                return Err(CorpusError::fetch(
                    file_id.as_str(),
                    "cached corpus cannot download remote files",
                ))
            }
        };
        let reference = path.display().to_string();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CorpusError::fetch(reference.as_str(), e))?;
        extract_blocking(self.extractor.clone(), bytes)
            .await
            .map_err(|e| CorpusError::extraction(reference, e))
    }
}
