//! PDF text extraction.
//!
//! The extractor is treated as a black box: bytes in, one string per page
//! out. Layout reconstruction is whatever `pdf-extract` produces.

use std::sync::Arc;

use thiserror::Error;

use crate::models::PageText;
use crate::traits::TextExtractor;

/// Extraction error. Never a panic: the caller skips the document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("PDF extraction aborted: {0}")]
    Aborted(String),
}

/// [`TextExtractor`] backed by `pdf-extract`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract_pages(&self, bytes: &[u8]) -> Result<Vec<PageText>, ExtractError> {
        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        Ok(pages
            .into_iter()
            .enumerate()
            .map(|(idx, text)| PageText::new(idx + 1, text))
            .collect())
    }
}

/// Runs `extractor` on the blocking pool.
///
/// A panic inside the extractor (the PDF parser can panic on hostile input)
/// is reported as [`ExtractError::Aborted`] instead of tearing down the task.
pub async fn extract_blocking(
    extractor: Arc<dyn TextExtractor>,
    bytes: Vec<u8>,
) -> Result<Vec<PageText>, ExtractError> {
    tokio::task::spawn_blocking(move || extractor.extract_pages(&bytes))
        .await
        .map_err(|e| ExtractError::Aborted(e.to_string()))?
}
