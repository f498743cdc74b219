//! Application state shared across all request handlers.

use std::sync::Arc;

use anyhow::Context;
use tokio_rusqlite::Connection;

use crate::chat::config::ChatConfig;
use crate::chat::service::{ChatService, ServiceOptions};
use crate::llm::{InferenceClient, OllamaClient};
use crate::search::{DuckDuckGoProvider, SearchAugmenter, SearchProvider};
use crate::store::{ConversationStore, SqliteConversationStore};

/// Shared application state.
pub struct AppState {
    /// The orchestrator handling every request.
    pub service: ChatService,
}

impl AppState {
    /// Wire up the store, inference client, and search augmenter from
    /// configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or a collaborator
    /// cannot be constructed.
    pub async fn new(config: ChatConfig) -> anyhow::Result<Arc<Self>> {
        config.validate().context("invalid configuration")?;

        if let Some(parent) = config.storage.sqlite_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
        }

        let conn = Connection::open(&config.storage.sqlite_path)
            .await
            .context("opening sqlite database")?;
        let store = SqliteConversationStore::new(conn)
            .await
            .context("initializing conversation store")?;

        let llm = OllamaClient::new(&config.ollama).context("building ollama client")?;
        let provider =
            DuckDuckGoProvider::new(&config.search).context("building search provider")?;

        let options = ServiceOptions::from(&config);
        let store: Arc<dyn ConversationStore> = Arc::new(store);
        let llm: Arc<dyn InferenceClient> = Arc::new(llm);
        let provider: Arc<dyn SearchProvider> = Arc::new(provider);
        let augmenter = SearchAugmenter::new(provider, config.search);

        let service = ChatService::new(store, llm, augmenter, options);
        Ok(Arc::new(Self { service }))
    }
}
