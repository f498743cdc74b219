//! Error types for the conversation domain.

use thiserror::Error;

use crate::chat::ids::ConversationId;
use crate::llm::LlmError;
use crate::store::StoreError;

/// Conversation domain error type.
///
/// These are the caller-visible failure kinds; search augmentation failures
/// never surface here (the augmenter absorbs them).
#[derive(Debug, Error)]
pub enum ChatError {
    /// The referenced conversation does not exist.
    #[error("conversation not found: {0}")]
    NotFound(ConversationId),
    /// The inference engine was unreachable, timed out, or answered with a
    /// non-success status.
    #[error("inference engine unavailable: {0}")]
    UpstreamUnavailable(String),
    /// The inference engine rejected the model identifier.
    #[error("model not found: {0}")]
    ModelNotFound(String),
    /// Persistence layer failure.
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// URL parse error.
    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl From<LlmError> for ChatError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ModelNotFound(model) => Self::ModelNotFound(model),
            other => Self::UpstreamUnavailable(other.to_string()),
        }
    }
}

/// Convenience result alias for conversation operations.
pub type ChatResult<T> = Result<T, ChatError>;
