//! Turn orchestration.
//!
//! `ChatService` sequences one chat turn: resolve the model, resolve or
//! create the conversation, take the per-conversation turn lock, durably
//! record the user message, optionally augment with search context, compose
//! the prompt, call the inference engine, and record the assistant reply.
//! It also owns the conversation lifecycle operations exposed over HTTP.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::chat::config::ChatConfig;
use crate::chat::errors::{ChatError, ChatResult};
use crate::chat::ids::ConversationId;
use crate::chat::prompt;
use crate::chat::types::{ChatTurn, Conversation, ConversationSummary, Message, ModelDescriptor};
use crate::llm::InferenceClient;
use crate::search::SearchAugmenter;
use crate::store::ConversationStore;

/// Operational knobs the orchestrator needs, cut from [`ChatConfig`].
#[derive(Clone, Debug)]
pub struct ServiceOptions {
    /// Substituted when a request carries no (or a blank) model.
    pub default_model: String,
    /// Prompt character budget.
    pub prompt_max_chars: usize,
    /// Derived title length cap.
    pub title_max_chars: usize,
    /// Applied when a request omits `enable_search`.
    pub search_enabled_default: bool,
}

impl From<&ChatConfig> for ServiceOptions {
    fn from(config: &ChatConfig) -> Self {
        Self {
            default_model: config.ollama.default_model.clone(),
            prompt_max_chars: config.prompt.max_chars,
            title_max_chars: config.prompt.title_max_chars,
            search_enabled_default: config.search.enabled_default,
        }
    }
}

/// One inbound chat turn, before normalization.
#[derive(Clone, Debug)]
pub struct TurnRequest {
    /// The user's message.
    pub message: String,
    /// Conversation to continue; absent starts a new one.
    pub conversation_id: Option<ConversationId>,
    /// Requested model; blank or absent falls back to the default.
    pub model: Option<String>,
    /// Whether to augment with web search; absent uses the configured default.
    pub enable_search: Option<bool>,
}

/// The request-handling core of the chat backend.
pub struct ChatService {
    store: Arc<dyn ConversationStore>,
    llm: Arc<dyn InferenceClient>,
    augmenter: SearchAugmenter,
    options: ServiceOptions,
    turn_locks: DashMap<ConversationId, Arc<Mutex<()>>>,
}

impl ChatService {
    /// Assemble the orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn ConversationStore>,
        llm: Arc<dyn InferenceClient>,
        augmenter: SearchAugmenter,
        options: ServiceOptions,
    ) -> Self {
        Self {
            store,
            llm,
            augmenter,
            options,
            turn_locks: DashMap::new(),
        }
    }

    /// Run one chat turn, creating the conversation when no id is given.
    ///
    /// The user message is persisted before inference is attempted, so an
    /// inference failure leaves it durably recorded; there is no rollback.
    ///
    /// # Errors
    /// `NotFound` for an unknown conversation id, `UpstreamUnavailable` or
    /// `ModelNotFound` from the inference engine, `Storage` from the store.
    /// Search failures never surface here.
    pub async fn chat(&self, request: TurnRequest) -> ChatResult<ChatTurn> {
        let model = self.resolve_model(request.model.as_deref());
        let enable_search = request
            .enable_search
            .unwrap_or(self.options.search_enabled_default);

        let conversation = match request.conversation_id {
            Some(id) => self
                .store
                .get(id)
                .await?
                .ok_or(ChatError::NotFound(id))?,
            None => self.store.create(Utc::now()).await?,
        };
        let id = conversation.id;

        // Whole-turn serialization per conversation: a concurrent turn on the
        // same id waits here, so histories never interleave.
        let lock = self.turn_lock(id);
        let _guard = lock.lock().await;

        let history = self
            .store
            .messages(id)
            .await?
            .ok_or(ChatError::NotFound(id))?;

        let appended = self
            .store
            .append_message(id, Message::user(request.message.clone()))
            .await?;
        if !appended {
            return Err(ChatError::NotFound(id));
        }

        let search_context = if enable_search {
            self.augmenter.augment(&request.message).await
        } else {
            None
        };

        let prompt_text = prompt::compose(
            &history,
            &request.message,
            search_context.as_deref(),
            Utc::now(),
            self.options.prompt_max_chars,
        );

        tracing::debug!(conversation = %id, model = %model, "dispatching generation request");
        let completion = self.llm.generate(&prompt_text, &model).await?;

        let _ = self
            .store
            .append_message(id, Message::assistant(completion.clone()))
            .await?;

        if conversation.title.is_empty() {
            let title = derive_title(&request.message, self.options.title_max_chars);
            let _ = self.store.set_title(id, &title).await?;
        }

        Ok(ChatTurn {
            response: completion,
            conversation_id: id,
            model,
            timestamp: Utc::now(),
        })
    }

    /// List conversation summaries, most recently active first.
    pub async fn list_conversations(
        &self,
        limit: usize,
        offset: usize,
    ) -> ChatResult<Vec<ConversationSummary>> {
        Ok(self.store.list_summaries(limit, offset).await?)
    }

    /// Fetch one conversation record.
    ///
    /// # Errors
    /// `NotFound` if the id is unknown.
    pub async fn conversation(&self, id: ConversationId) -> ChatResult<Conversation> {
        self.store
            .get(id)
            .await?
            .ok_or(ChatError::NotFound(id))
    }

    /// Load a conversation's messages in append order.
    ///
    /// # Errors
    /// `NotFound` if the id is unknown.
    pub async fn messages(&self, id: ConversationId) -> ChatResult<Vec<Message>> {
        self.store
            .messages(id)
            .await?
            .ok_or(ChatError::NotFound(id))
    }

    /// Delete a conversation and all its messages.
    ///
    /// # Errors
    /// `NotFound` if the id is unknown.
    pub async fn delete_conversation(&self, id: ConversationId) -> ChatResult<()> {
        if !self.store.delete_all(id).await? {
            return Err(ChatError::NotFound(id));
        }
        self.turn_locks.remove(&id);
        Ok(())
    }

    /// Clear a conversation's messages, retaining the record itself.
    ///
    /// # Errors
    /// `NotFound` if the id is unknown.
    pub async fn clear_messages(&self, id: ConversationId) -> ChatResult<()> {
        if !self.store.clear_messages(id, Utc::now()).await? {
            return Err(ChatError::NotFound(id));
        }
        Ok(())
    }

    /// Enumerate the inference engine's model catalog.
    ///
    /// # Errors
    /// `UpstreamUnavailable` when the engine cannot be reached; callers are
    /// expected to fall back to the configured default identifier.
    pub async fn list_models(&self) -> ChatResult<Vec<ModelDescriptor>> {
        Ok(self.llm.list_models().await?)
    }

    /// The single place where a blank model becomes the configured default,
    /// so inference is never called with an empty model field.
    fn resolve_model(&self, requested: Option<&str>) -> String {
        match requested {
            Some(model) if !model.trim().is_empty() => model.trim().to_string(),
            _ => self.options.default_model.clone(),
        }
    }

    fn turn_lock(&self, id: ConversationId) -> Arc<Mutex<()>> {
        self.turn_locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }
}

/// Derive a conversation title from the first user message.
///
/// Whitespace is collapsed; long messages are cut at a word boundary and
/// suffixed with `...`.
fn derive_title(message: &str, max_chars: usize) -> String {
    let clean = message.split_whitespace().collect::<Vec<_>>().join(" ");
    if clean.chars().count() <= max_chars {
        return clean;
    }

    let budget = max_chars.saturating_sub(3);
    let mut title = String::new();
    for word in clean.split(' ') {
        let sep = usize::from(!title.is_empty());
        if title.chars().count() + sep + word.chars().count() > budget {
            break;
        }
        if sep == 1 {
            title.push(' ');
        }
        title.push_str(word);
    }
    title.push_str("...");
    title
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::config::SearchConfig;
    use crate::chat::types::Role;
    use crate::llm::{LlmError, LlmFuture, LlmResult};
    use crate::search::{
        SearchError, SearchFuture, SearchProvider, SearchQuery, SearchResult,
    };
    use crate::store::{StoreFuture, StoreResult};
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // ----- stubs -----------------------------------------------------------

    #[derive(Default)]
    struct MemoryStore {
        inner: StdMutex<HashMap<ConversationId, (Conversation, Vec<Message>)>>,
    }

    impl MemoryStore {
        fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ConversationId, (Conversation, Vec<Message>)>> {
            match self.inner.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            }
        }
    }

    impl ConversationStore for MemoryStore {
        fn create(&self, now: DateTime<Utc>) -> StoreFuture<'_, StoreResult<Conversation>> {
            Box::pin(async move {
                let conversation = Conversation {
                    id: ConversationId::new(),
                    title: String::new(),
                    created_at: now,
                    updated_at: now,
                };
                self.lock()
                    .insert(conversation.id, (conversation.clone(), Vec::new()));
                Ok(conversation)
            })
        }

        fn get(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<Option<Conversation>>> {
            Box::pin(async move { Ok(self.lock().get(&id).map(|(c, _)| c.clone())) })
        }

        fn list_summaries(
            &self,
            limit: usize,
            offset: usize,
        ) -> StoreFuture<'_, StoreResult<Vec<ConversationSummary>>> {
            Box::pin(async move {
                let mut rows: Vec<ConversationSummary> = self
                    .lock()
                    .values()
                    .map(|(c, _)| ConversationSummary {
                        id: c.id,
                        title: c.title.clone(),
                        created_at: c.created_at,
                        updated_at: c.updated_at,
                    })
                    .collect();
                rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                Ok(rows.into_iter().skip(offset).take(limit).collect())
            })
        }

        fn messages(
            &self,
            id: ConversationId,
        ) -> StoreFuture<'_, StoreResult<Option<Vec<Message>>>> {
            Box::pin(async move { Ok(self.lock().get(&id).map(|(_, m)| m.clone())) })
        }

        fn append_message(
            &self,
            id: ConversationId,
            message: Message,
        ) -> StoreFuture<'_, StoreResult<bool>> {
            Box::pin(async move {
                let mut inner = self.lock();
                let Some((conversation, messages)) = inner.get_mut(&id) else {
                    return Ok(false);
                };
                conversation.updated_at = message.timestamp;
                messages.push(message);
                Ok(true)
            })
        }

        fn set_title(
            &self,
            id: ConversationId,
            title: &str,
        ) -> StoreFuture<'_, StoreResult<bool>> {
            let title = title.to_string();
            Box::pin(async move {
                let mut inner = self.lock();
                let Some((conversation, _)) = inner.get_mut(&id) else {
                    return Ok(false);
                };
                conversation.title = title;
                Ok(true)
            })
        }

        fn delete_all(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<bool>> {
            Box::pin(async move { Ok(self.lock().remove(&id).is_some()) })
        }

        fn clear_messages(
            &self,
            id: ConversationId,
            now: DateTime<Utc>,
        ) -> StoreFuture<'_, StoreResult<bool>> {
            Box::pin(async move {
                let mut inner = self.lock();
                let Some((conversation, messages)) = inner.get_mut(&id) else {
                    return Ok(false);
                };
                conversation.title.clear();
                conversation.updated_at = now;
                messages.clear();
                Ok(true)
            })
        }
    }

    #[derive(Clone, Copy)]
    enum LlmMode {
        Reply(&'static str),
        Unavailable,
        UnknownModel,
    }

    struct StubLlm {
        mode: LlmMode,
        calls: StdMutex<Vec<(String, String)>>,
    }

    impl StubLlm {
        fn replying(reply: &'static str) -> Self {
            Self {
                mode: LlmMode::Reply(reply),
                calls: StdMutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            match self.calls.lock() {
                Ok(guard) => guard.clone(),
                Err(poisoned) => poisoned.into_inner().clone(),
            }
        }
    }

    impl InferenceClient for StubLlm {
        fn generate(&self, prompt: &str, model: &str) -> LlmFuture<'_, LlmResult<String>> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push((prompt.to_string(), model.to_string()));
            }
            let model = model.to_string();
            let outcome = match self.mode {
                LlmMode::Reply(reply) => Ok(reply.to_string()),
                LlmMode::Unavailable => Err(LlmError::Status(503)),
                LlmMode::UnknownModel => Err(LlmError::ModelNotFound(model)),
            };
            Box::pin(async move { outcome })
        }

        fn list_models(&self) -> LlmFuture<'_, LlmResult<Vec<ModelDescriptor>>> {
            let outcome = match self.mode {
                LlmMode::Unavailable => Err(LlmError::Status(503)),
                _ => Ok(vec![ModelDescriptor {
                    name: "phi3:mini".to_string(),
                    size: None,
                    digest: None,
                    modified_at: None,
                }]),
            };
            Box::pin(async move { outcome })
        }
    }

    struct CountingProvider {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingProvider {
        fn working() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SearchProvider for CountingProvider {
        fn search(
            &self,
            _query: &SearchQuery,
        ) -> SearchFuture<'_, Result<Vec<SearchResult>, SearchError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let fail = self.fail;
            Box::pin(async move {
                if fail {
                    Err(SearchError::HttpClient("stub outage".to_string()))
                } else {
                    Ok(vec![SearchResult {
                        title: "Result".to_string(),
                        url: "https://example.com".to_string(),
                        snippet: "A snippet.".to_string(),
                    }])
                }
            })
        }
    }

    struct Fixture {
        service: ChatService,
        store: Arc<MemoryStore>,
        llm: Arc<StubLlm>,
        provider: Arc<CountingProvider>,
    }

    fn fixture(llm: StubLlm, provider: CountingProvider) -> Fixture {
        let store = Arc::new(MemoryStore::default());
        let llm = Arc::new(llm);
        let provider = Arc::new(provider);
        let shared_provider: Arc<dyn SearchProvider> = provider.clone();
        let augmenter = SearchAugmenter::new(shared_provider, SearchConfig::default());

        let options = ServiceOptions {
            default_model: "phi3:mini".to_string(),
            prompt_max_chars: 12_000,
            title_max_chars: 50,
            search_enabled_default: false,
        };

        let shared_store: Arc<dyn ConversationStore> = store.clone();
        let shared_llm: Arc<dyn InferenceClient> = llm.clone();
        let service = ChatService::new(shared_store, shared_llm, augmenter, options);

        Fixture {
            service,
            store,
            llm,
            provider,
        }
    }

    fn turn(message: &str, conversation_id: Option<ConversationId>) -> TurnRequest {
        TurnRequest {
            message: message.to_string(),
            conversation_id,
            model: Some("phi3:mini".to_string()),
            enable_search: Some(false),
        }
    }

    // ----- turn flow -------------------------------------------------------

    #[tokio::test]
    async fn test_first_turn_creates_conversation_and_records_both_roles() -> ChatResult<()> {
        let fx = fixture(StubLlm::replying("Hi there!"), CountingProvider::working());

        let outcome = fx.service.chat(turn("Hello", None)).await?;
        assert_eq!(outcome.response, "Hi there!");

        let messages = fx.service.messages(outcome.conversation_id).await?;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hi there!");
        Ok(())
    }

    #[tokio::test]
    async fn test_conversation_id_is_stable_across_turns() -> ChatResult<()> {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());

        let first = fx.service.chat(turn("one", None)).await?;
        let id = first.conversation_id;

        let second = fx.service.chat(turn("two", Some(id))).await?;
        assert_eq!(second.conversation_id, id);

        let messages = fx.service.messages(id).await?;
        assert_eq!(messages.len(), 4);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_conversation_id_is_not_found() {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());
        let ghost = ConversationId::new();

        let result = fx.service.chat(turn("hi", Some(ghost))).await;
        assert!(matches!(result, Err(ChatError::NotFound(id)) if id == ghost));
    }

    #[tokio::test]
    async fn test_blank_model_resolves_to_default_before_inference() {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());

        let request = TurnRequest {
            message: "hi".to_string(),
            conversation_id: None,
            model: Some("   ".to_string()),
            enable_search: Some(false),
        };
        let result = fx.service.chat(request).await;
        assert!(result.is_ok_and(|t| t.model == "phi3:mini"));

        let calls = fx.llm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, "phi3:mini");
    }

    #[tokio::test]
    async fn test_explicit_model_passes_through() {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());

        let request = TurnRequest {
            message: "hi".to_string(),
            conversation_id: None,
            model: Some("llama3:8b".to_string()),
            enable_search: Some(false),
        };
        let _ = fx.service.chat(request).await;

        let calls = fx.llm.calls();
        assert_eq!(calls[0].1, "llama3:8b");
    }

    #[tokio::test]
    async fn test_search_disabled_never_touches_the_provider() {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());

        let result = fx.service.chat(turn("hello", None)).await;
        assert!(result.is_ok());
        assert_eq!(fx.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_omitted_search_flag_uses_configured_default() {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());

        let request = TurnRequest {
            message: "hello".to_string(),
            conversation_id: None,
            model: None,
            enable_search: None,
        };
        let result = fx.service.chat(request).await;
        assert!(result.is_ok());
        // Fixture configures the default off.
        assert_eq!(fx.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_search_context_reaches_the_prompt() {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());

        let request = TurnRequest {
            message: "what is new".to_string(),
            conversation_id: None,
            model: None,
            enable_search: Some(true),
        };
        let result = fx.service.chat(request).await;
        assert!(result.is_ok());
        assert_eq!(fx.provider.call_count(), 1);

        let calls = fx.llm.calls();
        assert!(calls[0].0.contains("[SEARCH_RESULTS]"));
        assert!(calls[0].0.contains("1. Result: A snippet. (https://example.com)"));
    }

    #[tokio::test]
    async fn test_search_failure_degrades_to_plain_turn() {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::failing());

        let request = TurnRequest {
            message: "hi".to_string(),
            conversation_id: None,
            model: None,
            enable_search: Some(true),
        };
        let result = fx.service.chat(request).await;
        assert!(result.is_ok());
        assert_eq!(fx.provider.call_count(), 1);

        let calls = fx.llm.calls();
        assert!(!calls[0].0.contains("[SEARCH_RESULTS]"));
    }

    #[tokio::test]
    async fn test_inference_failure_keeps_user_message() -> ChatResult<()> {
        let fx = fixture(
            StubLlm {
                mode: LlmMode::Unavailable,
                calls: StdMutex::new(Vec::new()),
            },
            CountingProvider::working(),
        );

        // Seed a conversation so we know its id even though the turn fails.
        let seeded = fx.store.create(Utc::now()).await?;

        let result = fx.service.chat(turn("remember me", Some(seeded.id))).await;
        assert!(matches!(result, Err(ChatError::UpstreamUnavailable(_))));

        let messages = fx.service.messages(seeded.id).await?;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "remember me");
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_model_surfaces_as_model_not_found() {
        let fx = fixture(
            StubLlm {
                mode: LlmMode::UnknownModel,
                calls: StdMutex::new(Vec::new()),
            },
            CountingProvider::working(),
        );

        let request = TurnRequest {
            message: "hi".to_string(),
            conversation_id: None,
            model: Some("nope:latest".to_string()),
            enable_search: Some(false),
        };
        let result = fx.service.chat(request).await;
        assert!(matches!(result, Err(ChatError::ModelNotFound(m)) if m == "nope:latest"));
    }

    #[tokio::test]
    async fn test_title_derived_from_first_user_message() -> ChatResult<()> {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());

        let outcome = fx.service.chat(turn("How do lifetimes work?", None)).await?;

        let conversation = fx.service.conversation(outcome.conversation_id).await?;
        assert_eq!(conversation.title, "How do lifetimes work?");
        Ok(())
    }

    // ----- lifecycle -------------------------------------------------------

    #[tokio::test]
    async fn test_delete_removes_conversation_and_messages() -> ChatResult<()> {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());

        let outcome = fx.service.chat(turn("hello", None)).await?;
        let id = outcome.conversation_id;

        fx.service.delete_conversation(id).await?;
        assert!(matches!(
            fx.service.messages(id).await,
            Err(ChatError::NotFound(_))
        ));
        assert!(fx.service.list_conversations(50, 0).await?.is_empty());
        assert!(matches!(
            fx.service.delete_conversation(id).await,
            Err(ChatError::NotFound(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_clear_keeps_id_but_empties_history() -> ChatResult<()> {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());

        let outcome = fx.service.chat(turn("hello", None)).await?;
        let id = outcome.conversation_id;

        fx.service.clear_messages(id).await?;
        assert!(fx.service.messages(id).await?.is_empty());
        assert!(fx.service.conversation(id).await?.title.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_listing_follows_recency_of_updates() -> ChatResult<()> {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());

        let a = fx.service.chat(turn("a1", None)).await?;
        let b = fx.service.chat(turn("b1", None)).await?;
        let _ = fx.service.chat(turn("a2", Some(a.conversation_id))).await?;

        let listed = fx.service.list_conversations(50, 0).await?;
        let ids: Vec<ConversationId> = listed.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.conversation_id, b.conversation_id]);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_models_maps_outage_to_upstream_unavailable() {
        let fx = fixture(
            StubLlm {
                mode: LlmMode::Unavailable,
                calls: StdMutex::new(Vec::new()),
            },
            CountingProvider::working(),
        );
        assert!(matches!(
            fx.service.list_models().await,
            Err(ChatError::UpstreamUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_list_models_returns_catalog() {
        let fx = fixture(StubLlm::replying("ok"), CountingProvider::working());
        let models = fx.service.list_models().await;
        assert!(models.is_ok_and(|m| m.len() == 1 && m[0].name == "phi3:mini"));
    }

    // ----- title derivation ------------------------------------------------

    #[test]
    fn test_short_titles_pass_through() {
        assert_eq!(derive_title("Hello world", 50), "Hello world");
    }

    #[test]
    fn test_title_whitespace_is_collapsed() {
        assert_eq!(derive_title("  Hello \n  world  ", 50), "Hello world");
    }

    #[test]
    fn test_long_titles_cut_at_word_boundary() {
        let message = "this is a fairly long first message that keeps going well past the cap";
        let title = derive_title(message, 30);
        assert!(title.ends_with("..."));
        assert!(title.chars().count() <= 30);
        // Never cut mid-word.
        let stem = title.trim_end_matches("...");
        assert!(message.starts_with(stem));
        assert!(stem.ends_with(|c: char| !c.is_whitespace()));
    }

    #[test]
    fn test_oversized_first_word_degrades_to_ellipsis() {
        let title = derive_title("supercalifragilisticexpialidocious indeed", 10);
        assert_eq!(title, "...");
    }
}
