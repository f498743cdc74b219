//! Web search augmentation.
//!
//! The augmenter performs a best-effort lookup against a search provider and
//! reduces the top results into a compact text block for prompt inclusion.
//! Every failure mode (transport error, non-success status, timeout, empty
//! result set) yields "no augmentation" rather than an error, so a chat turn
//! can never fail because search did.

pub mod duckduckgo;
pub mod error;
pub mod types;

pub use error::SearchError;
pub use types::{SearchQuery, SearchResult};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use rand::Rng;

use crate::chat::config::SearchConfig;

/// Boxed future type for provider lookups.
pub type SearchFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A web-search provider: one query in, a page of results out.
pub trait SearchProvider: Send + Sync {
    /// Run one search against the provider.
    fn search(&self, query: &SearchQuery) -> SearchFuture<'_, Result<Vec<SearchResult>, SearchError>>;
}

/// DuckDuckGo-backed [`SearchProvider`].
pub struct DuckDuckGoProvider {
    client: reqwest::Client,
}

impl DuckDuckGoProvider {
    /// Create a provider with an HTTP client tuned for HTML search.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = build_client(config)?;
        Ok(Self { client })
    }
}

impl SearchProvider for DuckDuckGoProvider {
    fn search(&self, query: &SearchQuery) -> SearchFuture<'_, Result<Vec<SearchResult>, SearchError>> {
        let query = query.clone();
        Box::pin(async move { duckduckgo::search(&self.client, &query).await })
    }
}

/// Build an HTTP client with appropriate headers and settings.
fn build_client(config: &SearchConfig) -> Result<reqwest::Client, SearchError> {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

    let mut headers = HeaderMap::new();

    // Rotate user agents to avoid detection
    let ua = random_user_agent(&config.user_agents);
    if let Ok(ua_value) = HeaderValue::from_str(&ua) {
        headers.insert(USER_AGENT, ua_value);
    }

    if let Ok(accept) = HeaderValue::from_str(
        "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
    ) {
        headers.insert(ACCEPT, accept);
    }

    if let Ok(lang) = HeaderValue::from_str("en-US,en;q=0.5") {
        headers.insert(ACCEPT_LANGUAGE, lang);
    }

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .build()
        .map_err(|e| SearchError::HttpClient(e.to_string()))
}

/// Pick a random user agent from the rotation list.
fn random_user_agent(user_agents: &[String]) -> String {
    if user_agents.is_empty() {
        return "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
                Chrome/120.0.0.0 Safari/537.36"
            .to_string();
    }
    let mut rng = rand::thread_rng();
    let idx = rng.gen_range(0..user_agents.len());
    user_agents[idx].clone()
}

/// Cache entry with TTL.
struct CacheEntry {
    block: String,
    expires_at: Instant,
}

impl CacheEntry {
    fn new(block: String, ttl: Duration) -> Self {
        Self {
            block,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Best-effort search augmentation over a [`SearchProvider`].
pub struct SearchAugmenter {
    provider: Arc<dyn SearchProvider>,
    cache: DashMap<String, CacheEntry>,
    config: SearchConfig,
}

impl SearchAugmenter {
    /// Create an augmenter over the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn SearchProvider>, config: SearchConfig) -> Self {
        Self {
            provider,
            cache: DashMap::new(),
            config,
        }
    }

    /// Look up the query and reduce the results to a prompt-ready block.
    ///
    /// Returns `None` on provider failure, timeout, or an empty result set.
    /// Mutates no persisted state; the in-memory result cache is the only
    /// side effect.
    pub async fn augment(&self, query: &str) -> Option<String> {
        let search_query = SearchQuery::new(query).with_max_results(self.config.max_results);
        let cache_key = search_query.cache_key();

        if let Some(block) = self.cache_get(&cache_key) {
            tracing::debug!("search cache hit: {query}");
            return Some(block);
        }

        let lookup = self.provider.search(&search_query);
        let results = match tokio::time::timeout(self.config.timeout, lookup).await {
            Ok(Ok(results)) => results,
            Ok(Err(err)) => {
                tracing::warn!("search lookup failed, continuing without context: {err}");
                return None;
            }
            Err(_) => {
                tracing::warn!(
                    "search lookup timed out after {:?}, continuing without context",
                    self.config.timeout
                );
                return None;
            }
        };

        if results.is_empty() {
            return None;
        }

        let block = reduce_results(&results, self.config.snippet_chars);
        self.cache_put(&cache_key, &block);
        Some(block)
    }

    fn cache_get(&self, key: &str) -> Option<String> {
        if !self.config.cache.enabled {
            return None;
        }

        self.cache.get(key).and_then(|entry| {
            if entry.is_expired() {
                drop(entry);
                self.cache.remove(key);
                None
            } else {
                Some(entry.block.clone())
            }
        })
    }

    fn cache_put(&self, key: &str, block: &str) {
        if !self.config.cache.enabled {
            return;
        }

        if self.cache.len() >= self.config.cache.max_entries {
            self.cache.retain(|_, entry| !entry.is_expired());
            if self.cache.len() >= self.config.cache.max_entries {
                return;
            }
        }

        let ttl = Duration::from_secs(self.config.cache.ttl_seconds);
        self.cache
            .insert(key.to_string(), CacheEntry::new(block.to_string(), ttl));
    }
}

/// Reduce search results to a bounded, numbered text block.
fn reduce_results(results: &[SearchResult], snippet_chars: usize) -> String {
    let mut block = String::new();
    for (index, result) in results.iter().enumerate() {
        block.push_str(&format!(
            "{}. {}: {} ({})\n",
            index + 1,
            result.title,
            truncate_snippet(&result.snippet, snippet_chars),
            result.url
        ));
    }
    block
}

/// Truncate a snippet to at most `max_chars` characters.
fn truncate_snippet(snippet: &str, max_chars: usize) -> String {
    if snippet.chars().count() <= max_chars {
        snippet.to_string()
    } else {
        let mut truncated: String = snippet.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    }
}
