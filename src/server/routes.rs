//! HTTP route handlers for the chat backend API.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chat::errors::ChatError;
use crate::chat::ids::ConversationId;
use crate::chat::service::TurnRequest;
use crate::chat::types::{Conversation, ConversationSummary, Message, ModelDescriptor, Role};

use super::state::AppState;

/// Default page size for conversation listings.
const DEFAULT_LIST_LIMIT: usize = 50;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_turn))
        .route("/api/models", get(list_models))
        .route("/api/conversations", get(list_conversations))
        .route(
            "/api/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route(
            "/api/conversations/{id}/messages",
            get(get_messages).delete(clear_messages),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "skald-chat",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Chat turn request body.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's message.
    pub message: String,
    /// Conversation to continue; omit to start a new one.
    #[serde(default)]
    pub conversation_id: Option<ConversationId>,
    /// Model identifier; blank or omitted falls back to the default.
    #[serde(default)]
    pub model: Option<String>,
    /// Whether to augment with web search; omitted uses the configured
    /// default.
    #[serde(default)]
    pub enable_search: Option<bool>,
}

/// Chat turn response body.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// The assistant's reply.
    pub response: String,
    /// Conversation id to replay on later turns.
    pub conversation_id: ConversationId,
    /// Model used after default substitution.
    pub model: String,
    /// When the turn completed.
    pub timestamp: DateTime<Utc>,
}

/// Conversation DTO; an empty title serializes as null.
#[derive(Debug, Serialize)]
pub struct ConversationDto {
    /// Conversation identifier.
    pub id: ConversationId,
    /// Display title, null until derived.
    pub title: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last activity timestamp.
    pub updated_at: DateTime<Utc>,
}

impl From<Conversation> for ConversationDto {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            title: none_if_empty(c.title),
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<ConversationSummary> for ConversationDto {
    fn from(s: ConversationSummary) -> Self {
        Self {
            id: s.id,
            title: none_if_empty(s.title),
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Message DTO.
#[derive(Debug, Serialize)]
pub struct MessageDto {
    /// `user` or `assistant`.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// When the message was recorded.
    pub timestamp: DateTime<Utc>,
}

impl From<Message> for MessageDto {
    fn from(m: Message) -> Self {
        Self {
            role: m.role,
            content: m.content,
            timestamp: m.timestamp,
        }
    }
}

/// Generic status payload for delete/clear acknowledgements.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Human-readable outcome.
    pub message: String,
}

/// Pagination query parameters for listings.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Page size; defaults to 50.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Rows to skip; defaults to 0.
    #[serde(default)]
    pub offset: Option<usize>,
}

/// Handle one chat turn.
async fn chat_turn(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, String)> {
    let turn = state
        .service
        .chat(TurnRequest {
            message: request.message,
            conversation_id: request.conversation_id,
            model: request.model,
            enable_search: request.enable_search,
        })
        .await
        .map_err(|e| error_response(&e))?;

    Ok(Json(ChatResponse {
        response: turn.response,
        conversation_id: turn.conversation_id,
        model: turn.model,
        timestamp: turn.timestamp,
    }))
}

/// List models available on the inference engine.
async fn list_models(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ModelDescriptor>>, (StatusCode, String)> {
    let models = state
        .service
        .list_models()
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(models))
}

/// List conversations, most recently active first.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ConversationDto>>, (StatusCode, String)> {
    let summaries = state
        .service
        .list_conversations(
            params.limit.unwrap_or(DEFAULT_LIST_LIMIT),
            params.offset.unwrap_or(0),
        )
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(summaries.into_iter().map(ConversationDto::from).collect()))
}

/// Fetch a single conversation record.
async fn get_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
) -> Result<Json<ConversationDto>, (StatusCode, String)> {
    let conversation = state
        .service
        .conversation(id)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(ConversationDto::from(conversation)))
}

/// Fetch a conversation's messages in append order.
async fn get_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
) -> Result<Json<Vec<MessageDto>>, (StatusCode, String)> {
    let messages = state
        .service
        .messages(id)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(messages.into_iter().map(MessageDto::from).collect()))
}

/// Delete a conversation and all its messages.
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    state
        .service
        .delete_conversation(id)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(StatusResponse {
        message: "Conversation deleted successfully".to_string(),
    }))
}

/// Clear a conversation's messages, retaining the record.
async fn clear_messages(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ConversationId>,
) -> Result<Json<StatusResponse>, (StatusCode, String)> {
    state
        .service
        .clear_messages(id)
        .await
        .map_err(|e| error_response(&e))?;
    Ok(Json(StatusResponse {
        message: "Conversation cleared successfully".to_string(),
    }))
}

fn none_if_empty(title: String) -> Option<String> {
    if title.is_empty() { None } else { Some(title) }
}

fn error_response(err: &ChatError) -> (StatusCode, String) {
    let status = match err {
        ChatError::NotFound(_) | ChatError::ModelNotFound(_) => StatusCode::NOT_FOUND,
        ChatError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        ChatError::Storage(_) | ChatError::InvalidConfig(_) | ChatError::Url(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = error_response(&ChatError::NotFound(ConversationId::new()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response(&ChatError::ModelNotFound("x".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = error_response(&ChatError::UpstreamUnavailable("down".to_string()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_empty_title_serializes_as_null() {
        let dto = ConversationDto {
            id: ConversationId::new(),
            title: none_if_empty(String::new()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&dto).ok();
        assert!(json.is_some_and(|j| j["title"].is_null()));
    }

    #[test]
    fn test_chat_request_accepts_minimal_body() -> Result<(), serde_json::Error> {
        let decoded: ChatRequest = serde_json::from_str(r#"{"message": "hi"}"#)?;
        assert_eq!(decoded.message, "hi");
        assert!(decoded.conversation_id.is_none());
        assert!(decoded.model.is_none());
        assert!(decoded.enable_search.is_none());
        Ok(())
    }
}
