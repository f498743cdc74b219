//! Error types for the search module.
//!
//! These never escape the augmenter: every failure degrades to "no
//! augmentation" before reaching the orchestrator.

use thiserror::Error;

/// Errors that can occur during a search lookup.
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// HTML parsing error.
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// Provider answered with a non-success status.
    #[error("search provider returned status {0}")]
    Status(u16),
}
