//! Configuration for the chat backend.
//!
//! Defaults work out of the box against a local Ollama instance; every knob
//! can be overridden from the environment (`SKALD_*` variables). None of the
//! options change the service's logical contracts, only operational behavior.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::chat::errors::{ChatError, ChatResult};

/// Environment variable for a custom Ollama URL (e.g. `http://10.0.0.4:11434`).
pub const OLLAMA_URL_ENV: &str = "SKALD_OLLAMA_URL";
/// Environment variable for the default model identifier.
pub const MODEL_ENV: &str = "SKALD_MODEL";
/// Environment variable for the SQLite database path.
pub const DB_PATH_ENV: &str = "SKALD_DB_PATH";
/// Environment variable for the HTTP listen port.
pub const PORT_ENV: &str = "SKALD_PORT";
/// Environment variable for the search-enable default (`1`/`true` to enable).
pub const SEARCH_ENABLED_ENV: &str = "SKALD_SEARCH_ENABLED";
/// Environment variable for the prompt character cap.
pub const PROMPT_MAX_CHARS_ENV: &str = "SKALD_PROMPT_MAX_CHARS";
/// Environment variable for the per-call request timeout in seconds.
pub const REQUEST_TIMEOUT_ENV: &str = "SKALD_REQUEST_TIMEOUT_SECS";

/// Top-level configuration for the chat backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Inference engine settings.
    pub ollama: OllamaConfig,
    /// Search augmentation settings.
    pub search: SearchConfig,
    /// Prompt construction settings.
    pub prompt: PromptConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

impl ChatConfig {
    /// Build a configuration from defaults overridden by the environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var(OLLAMA_URL_ENV) {
            config.ollama.base_url = url;
        }
        if let Ok(model) = std::env::var(MODEL_ENV) {
            config.ollama.default_model = model;
        }
        if let Some(secs) = env_u64(REQUEST_TIMEOUT_ENV) {
            config.ollama.request_timeout = Duration::from_secs(secs);
        }
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            config.storage.sqlite_path = PathBuf::from(path);
        }
        if let Some(port) = env_u64(PORT_ENV).and_then(|p| u16::try_from(p).ok()) {
            config.server.port = port;
        }
        if let Ok(flag) = std::env::var(SEARCH_ENABLED_ENV) {
            config.search.enabled_default = matches!(flag.as_str(), "1" | "true" | "yes");
        }
        if let Some(max) = env_u64(PROMPT_MAX_CHARS_ENV) {
            config.prompt.max_chars = usize::try_from(max).unwrap_or(usize::MAX);
        }

        config
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ChatResult<()> {
        Url::parse(&self.ollama.base_url)?;

        if self.ollama.default_model.trim().is_empty() {
            return Err(ChatError::InvalidConfig(
                "ollama.default_model must not be blank".to_string(),
            ));
        }

        if self.ollama.request_timeout.is_zero() {
            return Err(ChatError::InvalidConfig(
                "ollama.request_timeout must be > 0".to_string(),
            ));
        }

        if self.prompt.max_chars == 0 {
            return Err(ChatError::InvalidConfig(
                "prompt.max_chars must be > 0".to_string(),
            ));
        }

        if self.prompt.title_max_chars < 4 {
            return Err(ChatError::InvalidConfig(
                "prompt.title_max_chars must be >= 4".to_string(),
            ));
        }

        if self.search.max_results == 0 {
            return Err(ChatError::InvalidConfig(
                "search.max_results must be > 0".to_string(),
            ));
        }

        if self.search.snippet_chars == 0 {
            return Err(ChatError::InvalidConfig(
                "search.snippet_chars must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Inference engine settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Base URL of the Ollama HTTP API.
    pub base_url: String,
    /// Model substituted when a request carries no (or a blank) model field.
    pub default_model: String,
    /// Connection timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// End-to-end request timeout for a single generation call.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// How long the engine should keep the model resident after a call.
    pub keep_alive: String,
    /// Context window hint passed with each generation request.
    pub num_ctx: u32,
    /// Token budget hint passed with each generation request.
    pub num_predict: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            default_model: "phi3:mini".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(120),
            keep_alive: "5m".to_string(),
            num_ctx: 8_192,
            num_predict: 512,
        }
    }
}

/// Search augmentation settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Applied when a chat request omits `enable_search`.
    pub enabled_default: bool,
    /// Number of results reduced into the prompt block.
    pub max_results: usize,
    /// Per-result snippet cap in characters.
    pub snippet_chars: usize,
    /// Total budget for one provider lookup; overruns degrade to no
    /// augmentation rather than failing the turn.
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
    /// Connection timeout for the provider client.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Result cache settings.
    pub cache: SearchCacheConfig,
    /// User agents to rotate across provider requests.
    pub user_agents: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled_default: false,
            max_results: 3,
            snippet_chars: 200,
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            cache: SearchCacheConfig::default(),
            user_agents: default_user_agents(),
        }
    }
}

/// Search result cache settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchCacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,
    /// TTL for cached result blocks (seconds).
    pub ttl_seconds: u64,
    /// Maximum cache size (number of entries).
    pub max_entries: usize,
}

impl Default for SearchCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: 3600,
            max_entries: 256,
        }
    }
}

/// Prompt construction settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Maximum prompt size in characters. Oldest history is dropped first;
    /// the new user message and the search block are never trimmed.
    pub max_chars: usize,
    /// Maximum derived conversation title length in characters.
    pub title_max_chars: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_chars: 12_000,
            title_max_chars: 50,
        }
    }
}

/// Storage settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/conversations.db"),
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8000 }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

/// Default user agents for rotation.
fn default_user_agents() -> Vec<String> {
    vec![
        // Chrome on Windows
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        // Chrome on macOS
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        // Firefox on Windows
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
        // Firefox on Linux
        "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0".to_string(),
        // Safari on macOS
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15".to_string(),
    ]
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
