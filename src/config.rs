use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{Result, SearchError};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub metadata: MetadataConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetadataConfig {
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_magazines_path")]
    pub magazines_path: String,
    #[serde(default = "default_issues_path")]
    pub issues_path: String,
    /// Read from `FIREBASE_AUTH_TOKEN`, never from the file.
    #[serde(skip)]
    pub auth_token: Option<String>,
}

fn default_magazines_path() -> String {
    "magazines".to_string()
}
fn default_issues_path() -> String {
    "magazine_issues".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub bucket_id: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Read from `APPWRITE_API_KEY`, never from the file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_storage_endpoint() -> String {
    "https://cloud.appwrite.io/v1".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
        }
    }
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./magazines")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "default_context_chars")]
    pub context_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            context_chars: default_context_chars(),
        }
    }
}

fn default_limit() -> usize {
    10
}
fn default_context_chars() -> usize {
    50
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        SearchError::config(format!(
            "failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&content, |key| std::env::var(key).ok())?;
    tracing::debug!(path = %path.display(), "configuration loaded");
    Ok(config)
}

/// Parses and validates a config document, overlaying values from `env`.
///
/// `env` is a lookup function so tests can supply a fixed environment.
pub fn parse_config(content: &str, env: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let mut config: Config = toml::from_str(content)
        .map_err(|e| SearchError::config(format!("failed to parse config file: {}", e)))?;

    apply_env(&mut config, env);
    validate(&config)?;
    Ok(config)
}

fn apply_env(config: &mut Config, env: impl Fn(&str) -> Option<String>) {
    let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_empty("FIREBASE_DATABASE_URL") {
        config.metadata.database_url = url;
    }
    if let Some(project) = non_empty("APPWRITE_PROJECT_ID") {
        config.storage.project_id = project;
    }
    if let Some(bucket) = non_empty("APPWRITE_BUCKET_ID") {
        config.storage.bucket_id = bucket;
    }
    config.metadata.auth_token = non_empty("FIREBASE_AUTH_TOKEN");
    config.storage.api_key = non_empty("APPWRITE_API_KEY");
}

fn validate(config: &Config) -> Result<()> {
    if config.metadata.database_url.trim().is_empty() {
        return Err(SearchError::config(
            "metadata.database_url must be set (or FIREBASE_DATABASE_URL)",
        ));
    }
    if config.storage.endpoint.trim().is_empty() {
        return Err(SearchError::config("storage.endpoint must not be empty"));
    }
    if config.storage.project_id.trim().is_empty() {
        return Err(SearchError::config(
            "storage.project_id must be set (or APPWRITE_PROJECT_ID)",
        ));
    }
    if config.storage.bucket_id.trim().is_empty() {
        return Err(SearchError::config(
            "storage.bucket_id must be set (or APPWRITE_BUCKET_ID)",
        ));
    }
    if config.search.default_limit == 0 {
        return Err(SearchError::config("search.default_limit must be >= 1"));
    }
    if config.storage.timeout_secs == Some(0) {
        return Err(SearchError::config("storage.timeout_secs must be > 0"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const MINIMAL: &str = r#"
[metadata]
database_url = "https://example.firebasedatabase.app"

[storage]
project_id = "proj"
bucket_id = "bucket"
"#;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_are_applied() {
        let cfg = parse_config(MINIMAL, no_env).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:8000");
        assert_eq!(cfg.metadata.magazines_path, "magazines");
        assert_eq!(cfg.metadata.issues_path, "magazine_issues");
        assert_eq!(cfg.storage.endpoint, "https://cloud.appwrite.io/v1");
        assert_eq!(cfg.storage.timeout_secs, None);
        assert_eq!(cfg.cache.dir, PathBuf::from("./magazines"));
        assert_eq!(cfg.search.default_limit, 10);
        assert_eq!(cfg.search.context_chars, 50);
        assert!(cfg.metadata.auth_token.is_none());
        assert!(cfg.storage.api_key.is_none());
    }

    #[test]
    fn environment_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("FIREBASE_DATABASE_URL", "https://other.app"),
            ("APPWRITE_BUCKET_ID", "b2"),
            ("FIREBASE_AUTH_TOKEN", "secret"),
            ("APPWRITE_API_KEY", "key"),
        ]
        .into_iter()
        .collect();
        let cfg = parse_config(MINIMAL, |k| env.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(cfg.metadata.database_url, "https://other.app");
        assert_eq!(cfg.storage.project_id, "proj");
        assert_eq!(cfg.storage.bucket_id, "b2");
        assert_eq!(cfg.metadata.auth_token.as_deref(), Some("secret"));
        assert_eq!(cfg.storage.api_key.as_deref(), Some("key"));
    }

    #[test]
    fn missing_database_url_is_a_configuration_error() {
        let content = r#"
[metadata]

[storage]
project_id = "proj"
bucket_id = "bucket"
"#;
        let err = parse_config(content, no_env).unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
        assert!(err.to_string().contains("database_url"));
    }

    #[test]
    fn missing_bucket_is_a_configuration_error() {
        let content = r#"
[metadata]
database_url = "https://example.app"

[storage]
project_id = "proj"
"#;
        let err = parse_config(content, no_env).unwrap_err();
        assert!(err.to_string().contains("bucket_id"));
    }

    #[test]
    fn zero_default_limit_is_rejected() {
        let content = format!("{}\n[search]\ndefault_limit = 0\n", MINIMAL);
        let err = parse_config(&content, no_env).unwrap_err();
        assert!(err.to_string().contains("default_limit"));
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        let err = parse_config("[metadata", no_env).unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
    }

    #[test]
    fn unreadable_file_is_a_configuration_error() {
        let err = load_config(Path::new("/nonexistent/magsearch.toml")).unwrap_err();
        assert!(matches!(err, SearchError::Configuration(_)));
    }
}
