//! SQLite-backed conversation store.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use crate::chat::ids::ConversationId;
use crate::chat::types::{Conversation, ConversationSummary, Message, Role};

use super::{ConversationStore, StoreError, StoreFuture, StoreResult};

/// `SQLite` implementation of [`ConversationStore`].
///
/// All statements run on the connection's single background worker, which
/// serializes individual mutations; turn-level ordering on one conversation
/// is the orchestrator's job.
pub struct SqliteConversationStore {
    conn: Connection,
}

impl SqliteConversationStore {
    /// Initialize the store and create the tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if database operations fail.
    pub async fn new(conn: Connection) -> StoreResult<Self> {
        conn.call(|conn| {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS conversations (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL DEFAULT '',
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_conversations_updated
                    ON conversations (updated_at DESC);
                CREATE TABLE IF NOT EXISTS messages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    conversation_id TEXT NOT NULL,
                    role TEXT NOT NULL,
                    content TEXT NOT NULL,
                    ts INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_messages_conversation
                    ON messages (conversation_id, id);",
            )?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }
}

impl ConversationStore for SqliteConversationStore {
    fn create(&self, now: DateTime<Utc>) -> StoreFuture<'_, StoreResult<Conversation>> {
        Box::pin(async move {
            let id = ConversationId::new();
            let id_str = id.to_string();
            let now_ms = now.timestamp_millis();

            self.conn
                .call(move |conn| {
                    conn.execute(
                        "INSERT INTO conversations (id, title, created_at, updated_at)
                         VALUES (?1, '', ?2, ?2)",
                        rusqlite::params![id_str, now_ms],
                    )?;
                    Ok(())
                })
                .await?;

            Ok(Conversation {
                id,
                title: String::new(),
                created_at: datetime_from_millis(now_ms)?,
                updated_at: datetime_from_millis(now_ms)?,
            })
        })
    }

    fn get(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<Option<Conversation>>> {
        Box::pin(async move {
            let id_str = id.to_string();
            let row = self
                .conn
                .call(move |conn| {
                    let row = conn
                        .query_row(
                            "SELECT title, created_at, updated_at
                             FROM conversations WHERE id = ?1",
                            [&id_str],
                            |row| {
                                Ok((
                                    row.get::<_, String>(0)?,
                                    row.get::<_, i64>(1)?,
                                    row.get::<_, i64>(2)?,
                                ))
                            },
                        )
                        .optional()?;
                    Ok(row)
                })
                .await?;

            match row {
                Some((title, created_ms, updated_ms)) => Ok(Some(Conversation {
                    id,
                    title,
                    created_at: datetime_from_millis(created_ms)?,
                    updated_at: datetime_from_millis(updated_ms)?,
                })),
                None => Ok(None),
            }
        })
    }

    fn list_summaries(
        &self,
        limit: usize,
        offset: usize,
    ) -> StoreFuture<'_, StoreResult<Vec<ConversationSummary>>> {
        Box::pin(async move {
            let limit = i64::try_from(limit).unwrap_or(i64::MAX);
            let offset = i64::try_from(offset).unwrap_or(0);
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(
                        "SELECT id, title, created_at, updated_at
                         FROM conversations
                         ORDER BY updated_at DESC
                         LIMIT ?1 OFFSET ?2",
                    )?;
                    let rows = stmt
                        .query_map(rusqlite::params![limit, offset], |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, i64>(2)?,
                                row.get::<_, i64>(3)?,
                            ))
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(rows)
                })
                .await?;

            let mut summaries = Vec::with_capacity(rows.len());
            for (id, title, created_ms, updated_ms) in rows {
                summaries.push(ConversationSummary {
                    id: id
                        .parse()
                        .map_err(|err| StoreError::InvalidRow(format!("conversation id: {err}")))?,
                    title,
                    created_at: datetime_from_millis(created_ms)?,
                    updated_at: datetime_from_millis(updated_ms)?,
                });
            }
            Ok(summaries)
        })
    }

    fn messages(
        &self,
        id: ConversationId,
    ) -> StoreFuture<'_, StoreResult<Option<Vec<Message>>>> {
        Box::pin(async move {
            let id_str = id.to_string();
            let rows = self
                .conn
                .call(move |conn| {
                    let known: i64 = conn.query_row(
                        "SELECT COUNT(*) FROM conversations WHERE id = ?1",
                        [&id_str],
                        |row| row.get(0),
                    )?;
                    if known == 0 {
                        return Ok(None);
                    }

                    let mut stmt = conn.prepare(
                        "SELECT role, content, ts FROM messages
                         WHERE conversation_id = ?1
                         ORDER BY id",
                    )?;
                    let rows = stmt
                        .query_map([&id_str], |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, i64>(2)?,
                            ))
                        })?
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Some(rows))
                })
                .await?;

            let Some(rows) = rows else {
                return Ok(None);
            };

            let mut messages = Vec::with_capacity(rows.len());
            for (role, content, ts) in rows {
                let role: Role = role
                    .parse()
                    .map_err(|err| StoreError::InvalidRow(format!("role: {err}")))?;
                messages.push(Message {
                    role,
                    content,
                    timestamp: datetime_from_millis(ts)?,
                });
            }
            Ok(Some(messages))
        })
    }

    fn append_message(
        &self,
        id: ConversationId,
        message: Message,
    ) -> StoreFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let id_str = id.to_string();
            let role = message.role.as_str();
            let content = message.content;
            let ts = message.timestamp.timestamp_millis();

            let appended = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    let touched = tx.execute(
                        "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
                        rusqlite::params![ts, id_str],
                    )?;
                    if touched == 0 {
                        // Dropping the transaction rolls back.
                        return Ok(false);
                    }
                    tx.execute(
                        "INSERT INTO messages (conversation_id, role, content, ts)
                         VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![id_str, role, content, ts],
                    )?;
                    tx.commit()?;
                    Ok(true)
                })
                .await?;
            Ok(appended)
        })
    }

    fn set_title(&self, id: ConversationId, title: &str) -> StoreFuture<'_, StoreResult<bool>> {
        let title = title.to_string();
        Box::pin(async move {
            let id_str = id.to_string();
            let touched = self
                .conn
                .call(move |conn| {
                    let touched = conn.execute(
                        "UPDATE conversations SET title = ?1 WHERE id = ?2",
                        rusqlite::params![title, id_str],
                    )?;
                    Ok(touched)
                })
                .await?;
            Ok(touched > 0)
        })
    }

    fn delete_all(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let id_str = id.to_string();
            let removed = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute(
                        "DELETE FROM messages WHERE conversation_id = ?1",
                        [&id_str],
                    )?;
                    let removed =
                        tx.execute("DELETE FROM conversations WHERE id = ?1", [&id_str])?;
                    tx.commit()?;
                    Ok(removed)
                })
                .await?;
            Ok(removed > 0)
        })
    }

    fn clear_messages(
        &self,
        id: ConversationId,
        now: DateTime<Utc>,
    ) -> StoreFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let id_str = id.to_string();
            let now_ms = now.timestamp_millis();
            let cleared = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    let touched = tx.execute(
                        "UPDATE conversations SET title = '', updated_at = ?1 WHERE id = ?2",
                        rusqlite::params![now_ms, id_str],
                    )?;
                    if touched == 0 {
                        return Ok(false);
                    }
                    tx.execute(
                        "DELETE FROM messages WHERE conversation_id = ?1",
                        [&id_str],
                    )?;
                    tx.commit()?;
                    Ok(true)
                })
                .await?;
            Ok(cleared)
        })
    }
}

fn datetime_from_millis(ms: i64) -> StoreResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or_else(|| StoreError::InvalidRow(format!("timestamp: {ms}")))
}
