//! Core data models used throughout the search service.
//!
//! Catalog records mirror what the metadata store holds; everything else is
//! rebuilt from scratch on every search request and discarded afterwards.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Title used when an issue references a magazine the store does not know.
pub const UNKNOWN_MAGAZINE: &str = "Unknown Magazine";

/// Placeholder for issue/file ids that cannot be resolved from the catalog.
pub const UNKNOWN: &str = "unknown";

/// A magazine record from the metadata store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MagazineRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub pdf_file_id: Option<String>,
}

/// An issue record from the metadata store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRecord {
    pub magazine_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub issue_number: String,
    #[serde(default)]
    pub pdf_file_id: Option<String>,
}

impl IssueRecord {
    /// The file id, if the issue has a non-empty one.
    pub fn file_id(&self) -> Option<&str> {
        self.pdf_file_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Key shared with the cache file naming: `{magazineId}_{issueNumber}`.
    pub fn cache_key(&self) -> String {
        format!("{}_{}", self.magazine_id, self.issue_number)
    }
}

/// Issue numbers are stored as either strings or integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "issueNumber must be a string or number, got {}",
            other
        ))),
    }
}

/// Snapshot of the metadata store taken at the start of one operation.
///
/// Both maps are keyed by record id and iterate in key order, which is the
/// order the store enumerates them in.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub magazines: BTreeMap<String, MagazineRecord>,
    pub issues: BTreeMap<String, IssueRecord>,
}

impl Catalog {
    pub fn is_empty(&self) -> bool {
        self.magazines.is_empty() && self.issues.is_empty()
    }

    pub fn title_of(&self, magazine_id: &str) -> &str {
        self.magazines
            .get(magazine_id)
            .and_then(|m| m.title.as_deref())
            .unwrap_or(UNKNOWN_MAGAZINE)
    }

    /// Issues that can be fetched from object storage, in enumeration order.
    ///
    /// Magazines carrying their own `pdfFileId` come first (one document per
    /// magazine, no issue id), then every issue record with a file.
    pub fn remote_issues(&self) -> Vec<MagazineIssue> {
        let standalone = self.magazines.iter().filter_map(|(id, mag)| {
            let file_id = mag.pdf_file_id.as_deref().filter(|f| !f.is_empty())?;
            Some(MagazineIssue {
                magazine_id: id.clone(),
                issue_id: None,
                issue_number: None,
                title: self.title_of(id).to_string(),
                file_id: Some(file_id.to_string()),
                source: SourceRef::Remote {
                    file_id: file_id.to_string(),
                },
            })
        });

        let issues = self.issues.iter().filter_map(|(issue_id, issue)| {
            let file_id = issue.file_id()?;
            Some(MagazineIssue {
                magazine_id: issue.magazine_id.clone(),
                issue_id: Some(issue_id.clone()),
                issue_number: Some(issue.issue_number.clone()),
                title: self.title_of(&issue.magazine_id).to_string(),
                file_id: Some(file_id.to_string()),
                source: SourceRef::Remote {
                    file_id: file_id.to_string(),
                },
            })
        });

        standalone.chain(issues).collect()
    }

    /// Maps `{magazineId}_{issueNumber}` to `(issue_id, file_id)` for issues
    /// that declare a file.
    pub fn issue_index(&self) -> HashMap<String, (String, String)> {
        self.issues
            .iter()
            .filter_map(|(issue_id, issue)| {
                let file_id = issue.pdf_file_id.as_ref()?;
                Some((issue.cache_key(), (issue_id.clone(), file_id.clone())))
            })
            .collect()
    }
}

/// Where the PDF bytes of an issue live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRef {
    /// A file id in the object-storage bucket.
    Remote { file_id: String },
    /// A file in the local cache directory.
    Local(PathBuf),
}

impl std::fmt::Display for SourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceRef::Remote { file_id } => write!(f, "storage:{}", file_id),
            SourceRef::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// One searchable document.
#[derive(Debug, Clone)]
pub struct MagazineIssue {
    pub magazine_id: String,
    pub issue_id: Option<String>,
    pub issue_number: Option<String>,
    pub title: String,
    pub file_id: Option<String>,
    pub source: SourceRef,
}

/// Extracted text of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// 1-based.
    pub page_number: usize,
    pub text: String,
}

impl PageText {
    pub fn new(page_number: usize, text: impl Into<String>) -> Self {
        Self {
            page_number,
            text: text.into(),
        }
    }

    /// Non-empty, whitespace-trimmed lines in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n').map(str::trim).filter(|l| !l.is_empty())
    }
}

/// One located occurrence of the query.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    pub magazine_id: String,
    pub title: String,
    pub issue_id: Option<String>,
    pub file_id: Option<String>,
    pub page_number: usize,
    /// Present only for line-granularity matches.
    pub line_number: Option<usize>,
    pub context: String,
    pub confidence: f64,
}

/// One entry of `GET /api/search/{query}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageHit {
    pub magazine_id: String,
    pub title: String,
    pub page_number: usize,
    pub content_preview: String,
    pub confidence: f64,
}

/// Response body of `GET /api/search/{query}`.
///
/// `total_results` is the length of the already-truncated `results`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PageSearchResponse {
    pub results: Vec<PageHit>,
    pub total_results: usize,
}

/// One entry of `GET /search/{keyword}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineHit {
    pub magazine_id: String,
    pub magazine_title: String,
    pub file_id: String,
    pub page_number: usize,
    pub line_number: usize,
    pub context: String,
    pub issue_id: String,
}

/// Response body of `GET /search/{keyword}`. Never truncated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineSearchResponse {
    pub results: Vec<LineHit>,
    pub total_matches: usize,
}

impl From<MatchRecord> for PageHit {
    fn from(record: MatchRecord) -> Self {
        PageHit {
            magazine_id: record.magazine_id,
            title: record.title,
            page_number: record.page_number,
            content_preview: format!("...{}...", record.context),
            confidence: record.confidence,
        }
    }
}

impl From<MatchRecord> for LineHit {
    fn from(record: MatchRecord) -> Self {
        LineHit {
            magazine_id: record.magazine_id,
            magazine_title: record.title,
            file_id: record.file_id.unwrap_or_else(|| UNKNOWN.to_string()),
            page_number: record.page_number,
            line_number: record.line_number.unwrap_or_default(),
            context: record.context,
            issue_id: record.issue_id.unwrap_or_else(|| UNKNOWN.to_string()),
        }
    }
}

/// Outcome of one cache sync.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStats {
    pub new_downloads: usize,
    pub total_magazines: usize,
}
