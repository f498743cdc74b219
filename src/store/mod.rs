//! Durable conversation and message storage.
//!
//! Two tables linked by conversation id: `conversations` (metadata) and
//! `messages` (append-ordered history). Multi-statement mutations run inside
//! one transaction so partial effects are never observable.

pub mod sqlite;

pub use sqlite::SqliteConversationStore;

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::chat::ids::ConversationId;
use crate::chat::types::{Conversation, ConversationSummary, Message};

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Storage layer error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// A persisted row could not be decoded.
    #[error("corrupt row: {0}")]
    InvalidRow(String),
}

/// Convenience result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable CRUD over conversations and their messages.
///
/// Operations addressing an existing conversation report whether the id was
/// known (`false` means "no such conversation") so callers can map absence
/// to their own not-found error without a second lookup.
pub trait ConversationStore: Send + Sync {
    /// Create a new empty conversation stamped at `now`.
    fn create(&self, now: DateTime<Utc>) -> StoreFuture<'_, StoreResult<Conversation>>;

    /// Fetch a conversation record by id.
    fn get(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<Option<Conversation>>>;

    /// List conversations ordered by `updated_at` DESC.
    fn list_summaries(
        &self,
        limit: usize,
        offset: usize,
    ) -> StoreFuture<'_, StoreResult<Vec<ConversationSummary>>>;

    /// Load a conversation's messages in append order.
    fn messages(
        &self,
        id: ConversationId,
    ) -> StoreFuture<'_, StoreResult<Option<Vec<Message>>>>;

    /// Append a message and refresh `updated_at` atomically.
    ///
    /// A failed append never refreshes `updated_at`: both statements commit
    /// together or not at all.
    fn append_message(
        &self,
        id: ConversationId,
        message: Message,
    ) -> StoreFuture<'_, StoreResult<bool>>;

    /// Set the conversation title.
    fn set_title(&self, id: ConversationId, title: &str) -> StoreFuture<'_, StoreResult<bool>>;

    /// Delete the conversation and all its messages atomically.
    fn delete_all(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<bool>>;

    /// Delete all messages, reset the title, and refresh `updated_at`,
    /// retaining the conversation record.
    fn clear_messages(
        &self,
        id: ConversationId,
        now: DateTime<Utc>,
    ) -> StoreFuture<'_, StoreResult<bool>>;
}
