//! Error taxonomy for the search service.
//!
//! Two layers of failure exist. [`CorpusError`] describes a problem with a
//! single issue (its PDF could not be fetched or parsed); the search
//! orchestrator logs it and moves on to the next issue. [`SearchError`]
//! describes a problem with the whole request (the metadata store is down,
//! the configuration is unusable) and is surfaced to the caller.

use thiserror::Error;

/// Result type alias for request-level operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Request-level failure. Never recovered locally.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The metadata store could not be reached, answered with an error, or
    /// holds no magazines at all.
    #[error("metadata store unavailable: {0}")]
    MetadataUnavailable(String),

    /// A required configuration value or credential is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Local filesystem failure outside of a single issue (e.g. the cache
    /// directory cannot be created or listed).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A per-issue failure that had to be surfaced.
    #[error(transparent)]
    Corpus(#[from] CorpusError),
}

impl SearchError {
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::MetadataUnavailable(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

/// Failure to produce the text of one issue.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// Object storage, network, or local file read failed.
    #[error("failed to fetch {reference}: {message}")]
    Fetch { reference: String, message: String },

    /// The bytes were retrieved but are not a readable PDF.
    #[error("failed to extract text from {reference}: {message}")]
    Extraction { reference: String, message: String },
}

impl CorpusError {
    pub fn fetch(reference: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Fetch {
            reference: reference.into(),
            message: message.to_string(),
        }
    }

    pub fn extraction(reference: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Extraction {
            reference: reference.into(),
            message: message.to_string(),
        }
    }

    /// Short tag used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            CorpusError::Fetch { .. } => "fetch",
            CorpusError::Extraction { .. } => "extraction",
        }
    }
}
