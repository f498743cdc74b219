//! Core types for web search.

use serde::{Deserialize, Serialize};

/// A search query with parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchQuery {
    /// The search query string.
    pub query: String,
    /// Maximum number of results to return.
    pub max_results: usize,
}

impl SearchQuery {
    /// Create a new search query with default settings.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_results: 5,
        }
    }

    /// Set max results.
    #[must_use]
    pub const fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Generate a cache key for this query.
    #[must_use]
    pub fn cache_key(&self) -> String {
        format!("search:{}:{}", self.query, self.max_results)
    }
}

/// A single search result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    /// Title of the result.
    pub title: String,
    /// URL of the result.
    pub url: String,
    /// Description or snippet.
    pub snippet: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = SearchQuery::new("rust programming").with_max_results(3);
        assert_eq!(query.query, "rust programming");
        assert_eq!(query.max_results, 3);
    }

    #[test]
    fn test_cache_key_distinguishes_limits() {
        let a = SearchQuery::new("q").with_max_results(3);
        let b = SearchQuery::new("q").with_max_results(5);
        assert_ne!(a.cache_key(), b.cache_key());
        assert!(a.cache_key().starts_with("search:"));
    }
}
