//! Realtime-database metadata store.
//!
//! Reads the magazines and magazine-issues nodes over the database's REST
//! interface:
//!
//! ```text
//! GET {database_url}/{magazines_path}.json[?auth=<token>]
//! GET {database_url}/{issues_path}.json[?auth=<token>]
//! ```
//!
//! Each node is a JSON object keyed by record id, or `null` when the node
//! does not exist. Records that do not decode are skipped with a warning so
//! one malformed entry cannot hide the rest of the catalog.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::config::MetadataConfig;
use crate::error::{Result, SearchError};
use crate::models::Catalog;
use crate::traits::MetadataStore;

/// [`MetadataStore`] backed by the realtime database REST API.
pub struct FirebaseStore {
    client: reqwest::Client,
    base_url: String,
    magazines_path: String,
    issues_path: String,
    auth_token: Option<String>,
}

impl FirebaseStore {
    pub fn new(client: reqwest::Client, config: &MetadataConfig) -> Self {
        Self {
            client,
            base_url: config.database_url.trim_end_matches('/').to_string(),
            magazines_path: config.magazines_path.trim_matches('/').to_string(),
            issues_path: config.issues_path.trim_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
        }
    }

    fn node_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path)
    }

    async fn read_node<T: DeserializeOwned>(&self, path: &str) -> Result<BTreeMap<String, T>> {
        let mut request = self.client.get(self.node_url(path));
        if let Some(ref token) = self.auth_token {
            request = request.query(&[("auth", token)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SearchError::metadata(format!("GET /{}: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::metadata(format!(
                "GET /{} returned HTTP {}",
                path, status
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| SearchError::metadata(format!("GET /{}: invalid JSON: {}", path, e)))?;

        decode_node(path, body)
    }
}

#[async_trait]
impl MetadataStore for FirebaseStore {
    async fn catalog(&self) -> Result<Catalog> {
        let magazines = self.read_node(&self.magazines_path).await?;
        let issues = self.read_node(&self.issues_path).await?;
        tracing::debug!(
            magazines = magazines.len(),
            issues = issues.len(),
            "catalog loaded"
        );
        Ok(Catalog { magazines, issues })
    }
}

/// Decodes one node body. `null` is an empty node; a non-object is an error.
fn decode_node<T: DeserializeOwned>(
    path: &str,
    body: serde_json::Value,
) -> Result<BTreeMap<String, T>> {
    let entries = match body {
        serde_json::Value::Null => return Ok(BTreeMap::new()),
        serde_json::Value::Object(map) => map,
        other => {
            return Err(SearchError::metadata(format!(
                "/{} is not an object (got {})",
                path,
                json_kind(&other)
            )))
        }
    };

    let mut out = BTreeMap::new();
    for (id, value) in entries {
        match serde_json::from_value::<T>(value) {
            Ok(record) => {
                out.insert(id, record);
            }
            Err(e) => tracing::warn!(node = path, record = %id, "skipping malformed record: {}", e),
        }
    }
    Ok(out)
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
