//! Object-storage client for PDF downloads.
//!
//! Files are addressed by id within one bucket:
//!
//! ```text
//! GET {endpoint}/storage/buckets/{bucket_id}/files/{file_id}/download?project={project_id}
//! X-Appwrite-Project: {project_id}
//! X-Appwrite-Key: {api_key}        (only when APPWRITE_API_KEY is set)
//! ```

use async_trait::async_trait;
use std::time::Duration;

use crate::config::StorageConfig;
use crate::error::{CorpusError, Result, SearchError};
use crate::traits::BlobStore;

/// Builds the HTTP client shared by the metadata store and object storage.
///
/// No timeout is applied unless `storage.timeout_secs` is set.
pub fn build_http_client(config: &StorageConfig) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(concat!("magsearch/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = config.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| SearchError::config(format!("failed to build HTTP client: {}", e)))
}

/// [`BlobStore`] backed by an Appwrite-compatible storage bucket.
pub struct AppwriteStorage {
    client: reqwest::Client,
    endpoint: String,
    project_id: String,
    bucket_id: String,
    api_key: Option<String>,
}

impl AppwriteStorage {
    pub fn new(client: reqwest::Client, config: &StorageConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            bucket_id: config.bucket_id.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn download_url(&self, file_id: &str) -> String {
        format!(
            "{}/storage/buckets/{}/files/{}/download",
            self.endpoint, self.bucket_id, file_id
        )
    }
}

#[async_trait]
impl BlobStore for AppwriteStorage {
    async fn download(&self, file_id: &str) -> std::result::Result<Vec<u8>, CorpusError> {
        let mut request = self
            .client
            .get(self.download_url(file_id))
            .query(&[("project", &self.project_id)])
            .header("X-Appwrite-Project", &self.project_id);
        if let Some(ref key) = self.api_key {
            request = request.header("X-Appwrite-Key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CorpusError::fetch(file_id, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CorpusError::fetch(file_id, format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CorpusError::fetch(file_id, e))?;
        tracing::debug!(file_id, bytes = bytes.len(), "downloaded");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage_config() -> StorageConfig {
        StorageConfig {
            endpoint: "https://cloud.example.io/v1/".to_string(),
            project_id: "proj".to_string(),
            bucket_id: "mags".to_string(),
            timeout_secs: Some(5),
            api_key: None,
        }
    }

    #[test]
    fn download_url_layout() {
        let storage = AppwriteStorage::new(reqwest::Client::new(), &storage_config());
        assert_eq!(
            storage.download_url("abc123"),
            "https://cloud.example.io/v1/storage/buckets/mags/files/abc123/download"
        );
    }

    #[test]
    fn client_builds_with_timeout() {
        assert!(build_http_client(&storage_config()).is_ok());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_fetch_error() {
        let cfg = StorageConfig {
            endpoint: "http://127.0.0.1:1".to_string(),
            ..storage_config()
        };
        let storage = AppwriteStorage::new(build_http_client(&cfg).unwrap(), &cfg);
        let err = storage.download("missing").await.unwrap_err();
        assert!(matches!(err, CorpusError::Fetch { .. }));
    }
}
