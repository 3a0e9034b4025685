//! Error types for the extraction pipeline.

use thiserror::Error;

/// Errors raised while extracting a conversation from a page.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The page is not a conversation on a supported host.
    #[error("Not a supported chat page: {0}. Open a Gemini conversation first")]
    UnsupportedPage(String),

    /// Interacting with the page failed (scroll, click, lookup).
    #[error("Page interaction failed: {0}")]
    Page(String),

    /// The DOM snapshot could not be understood.
    #[error("Invalid snapshot: {0}")]
    Snapshot(String),

    /// An extraction session is single-use.
    #[error("Extraction session has already run")]
    SessionUsed,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;
