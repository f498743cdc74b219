//! Core types for conversations and messages.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chat::ids::ConversationId;

/// Who produced a message. Closed set; anything else is rejected at the edges.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The model side of the conversation.
    Assistant,
}

impl Role {
    /// Stable string form used for storage and wire payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown role string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0:?}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// A single turn in a conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Who produced the message.
    pub role: Role,
    /// Text payload. Unbounded; the service never truncates stored content.
    pub content: String,
    /// When the message was accepted (user) or produced (assistant).
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Build a user message stamped now.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Build an assistant message stamped now.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A conversation record with its metadata.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique, immutable identifier.
    pub id: ConversationId,
    /// Display title. Empty until derived from the first user message.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp, refreshed on every appended message.
    pub updated_at: DateTime<Utc>,
}

/// Summary row for conversation listings, ordered by `updated_at` DESC.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Display title. Empty until derived.
    pub title: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp.
    pub updated_at: DateTime<Utc>,
}

/// A model catalog entry as reported by the inference engine.
///
/// Read-only, enumerated live; never persisted by this service. The name is
/// an opaque identifier passed back verbatim on generation requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model identifier (e.g. `phi3:mini`). No internal structure is assumed.
    pub name: String,
    /// On-disk size in bytes, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Content digest, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Last modification time as reported by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}

/// Outcome of one completed chat turn.
#[derive(Clone, Debug, Serialize)]
pub struct ChatTurn {
    /// The assistant's completion.
    pub response: String,
    /// Conversation the turn belongs to; callers reuse it on later turns.
    pub conversation_id: ConversationId,
    /// The model that produced the completion, after default substitution.
    pub model: String,
    /// When the turn completed.
    pub timestamp: DateTime<Utc>,
}
