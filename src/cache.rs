//! Local PDF cache and the sync that fills it.
//!
//! The cache is a flat directory of `{magazine_id}_{issue_number}.pdf`
//! files. Presence of a file is the only state: sync downloads an issue if
//! and only if its file is absent, and never rewrites, verifies, or deletes
//! an existing one.

use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::{CorpusError, Result, SearchError};
use crate::models::SyncStats;
use crate::traits::{BlobStore, MetadataStore};

/// File name for one issue in the cache directory.
pub fn cache_file_name(magazine_id: &str, issue_number: &str) -> String {
    format!("{}_{}.pdf", magazine_id, issue_number)
}

/// Splits a cache file name back into `(magazine_id, issue_number)`.
///
/// The magazine id is the text before the first `_`; the issue number is the
/// second `_`-separated segment with `.pdf` removed. Returns `None` for
/// names that are not `.pdf` files or have no `_`.
pub fn parse_cache_file_name(name: &str) -> Option<(String, String)> {
    if !name.ends_with(".pdf") {
        return None;
    }
    let mut parts = name.split('_');
    let magazine_id = parts.next()?;
    let issue_number = parts.next()?.replace(".pdf", "");
    Some((magazine_id.to_string(), issue_number))
}

/// A PDF found in the cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub magazine_id: String,
    pub issue_number: String,
}

/// Handle on the cache directory.
#[derive(Debug, Clone)]
pub struct PdfCache {
    dir: PathBuf,
}

impl PdfCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, magazine_id: &str, issue_number: &str) -> PathBuf {
        self.dir.join(cache_file_name(magazine_id, issue_number))
    }

    /// Lists cached PDFs sorted by file name. A missing directory is empty.
    pub fn entries(&self) -> Result<Vec<CacheEntry>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| SearchError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.ends_with(".pdf") {
                continue;
            }
            match parse_cache_file_name(&name) {
                Some((magazine_id, issue_number)) => entries.push(CacheEntry {
                    path: entry.path().to_path_buf(),
                    magazine_id,
                    issue_number,
                }),
                None => tracing::warn!(file = %name, "skipping cache file without issue number"),
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    /// [`entries`](Self::entries) on the blocking pool.
    pub async fn list(&self) -> Result<Vec<CacheEntry>> {
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.entries())
            .await
            .map_err(|e| SearchError::Io(std::io::Error::other(e)))?
    }

    /// Writes `bytes` to `path` through a uniquely named temporary file in
    /// the cache directory, then renames it into place.
    ///
    /// Concurrent writers of the same path each get their own temporary
    /// file; the last rename wins and readers only ever see whole files.
    async fn store(&self, path: &Path, bytes: Vec<u8>) -> std::io::Result<()> {
        let dir = self.dir.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut partial = tempfile::Builder::new()
                .prefix(".download-")
                .suffix(".part")
                .tempfile_in(&dir)?;
            partial.write_all(&bytes)?;
            partial.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)?
    }
}

/// Downloads every catalogued issue whose PDF is not yet in the cache.
///
/// `total_magazines` counts every issue record, with or without a file.
/// A failed download is logged and skipped; the file stays absent so the
/// next sync retries it.
pub async fn sync(
    metadata: &dyn MetadataStore,
    blobs: &dyn BlobStore,
    cache: &PdfCache,
) -> Result<SyncStats> {
    let catalog = metadata.catalog().await?;
    let mut stats = SyncStats::default();

    if catalog.issues.is_empty() {
        return Ok(stats);
    }
    stats.total_magazines = catalog.issues.len();

    tokio::fs::create_dir_all(cache.dir()).await?;

    for (issue_id, issue) in &catalog.issues {
        let Some(file_id) = issue.file_id() else {
            continue;
        };
        let path = cache.path_for(&issue.magazine_id, &issue.issue_number);
        if tokio::fs::try_exists(&path).await? {
            tracing::debug!(path = %path.display(), "already cached");
            continue;
        }

        match download_to(blobs, cache, file_id, &path).await {
            Ok(()) => {
                tracing::info!(issue = %issue_id, path = %path.display(), "downloaded");
                stats.new_downloads += 1;
            }
            Err(e) => tracing::warn!(issue = %issue_id, "download skipped: {}", e),
        }
    }

    Ok(stats)
}

async fn download_to(
    blobs: &dyn BlobStore,
    cache: &PdfCache,
    file_id: &str,
    path: &Path,
) -> std::result::Result<(), CorpusError> {
    let bytes = blobs.download(file_id).await?;
    cache
        .store(path, bytes)
        .await
        .map_err(|e| CorpusError::fetch(file_id, format!("write {}: {}", path.display(), e)))
}

/// CLI entry point for `magsearch sync`.
pub async fn run_sync(config: &Config) -> anyhow::Result<()> {
    let backends = crate::corpus::Backends::from_config(config)?;
    let stats = sync(
        backends.metadata.as_ref(),
        backends.blobs.as_ref(),
        &backends.cache,
    )
    .await?;

    println!("Sync complete:");
    println!("  new downloads:   {}", stats.new_downloads);
    println!("  total magazines: {}", stats.total_magazines);
    println!("  cache dir:       {}", backends.cache.dir().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_round_trips() {
        let name = cache_file_name("mag42", "7");
        assert_eq!(name, "mag42_7.pdf");
        assert_eq!(
            parse_cache_file_name(&name),
            Some(("mag42".to_string(), "7".to_string()))
        );
    }

    #[test]
    fn parse_uses_first_two_segments() {
        assert_eq!(
            parse_cache_file_name("a_b_c.pdf"),
            Some(("a".to_string(), "b".to_string()))
        );
    }

    #[test]
    fn parse_rejects_non_pdf_and_unseparated_names() {
        assert_eq!(parse_cache_file_name("mag_1.txt"), None);
        assert_eq!(parse_cache_file_name("standalone.pdf"), None);
    }

    #[test]
    fn entries_of_missing_directory_is_empty() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = PdfCache::new(tmp.path().join("nope"));
        assert!(cache.entries().unwrap().is_empty());
    }

    #[test]
    fn entries_are_sorted_and_filtered() {
        let tmp = tempfile::TempDir::new().unwrap();
        for name in ["m2_1.pdf", "m1_3.pdf", "notes.txt", "orphan.pdf", "m1_2.pdf.part"] {
            std::fs::write(tmp.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(tmp.path().join("sub_1.pdf")).unwrap();

        let cache = PdfCache::new(tmp.path());
        let entries = cache.entries().unwrap();
        let ids: Vec<_> = entries
            .iter()
            .map(|e| format!("{}/{}", e.magazine_id, e.issue_number))
            .collect();
        assert_eq!(ids, vec!["m1/3", "m2/1"]);
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn store_leaves_no_partial_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = PdfCache::new(tmp.path());
        let path = cache.path_for("m", "1");
        cache.store(&path, b"%PDF-1.4".to_vec()).await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4");
        assert_eq!(dir_names(tmp.path()), vec!["m_1.pdf"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_stores_of_one_path_both_succeed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cache = PdfCache::new(tmp.path());
        let path = cache.path_for("m", "1");
        let body = vec![b'%'; 4 * 1024 * 1024];

        for _ in 0..20 {
            let (a, b) = tokio::join!(
                cache.store(&path, body.clone()),
                cache.store(&path, body.clone())
            );
            a.unwrap();
            b.unwrap();
            assert_eq!(std::fs::metadata(&path).unwrap().len(), body.len() as u64);
        }
        assert_eq!(dir_names(tmp.path()), vec!["m_1.pdf"]);
    }

    #[tokio::test]
    async fn list_matches_entries() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("m1_1.pdf"), b"x").unwrap();
        let cache = PdfCache::new(tmp.path());
        assert_eq!(cache.list().await.unwrap(), cache.entries().unwrap());
    }
}
