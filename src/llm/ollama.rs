//! Async client for the Ollama HTTP API.
//!
//! Two endpoints are consumed: `POST /api/generate` for completions and
//! `GET /api/tags` for the model catalog. Requests are non-streaming and
//! carry conservative runtime options plus a `keep_alive` hint so the model
//! stays resident between turns.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::chat::config::OllamaConfig;
use crate::chat::types::ModelDescriptor;

use super::{InferenceClient, LlmError, LlmFuture, LlmResult};

#[derive(Serialize)]
struct GenerateOptions {
    num_ctx: u32,
    num_predict: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    keep_alive: &'a str,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: Option<String>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagModel>,
}

#[derive(Deserialize)]
struct TagModel {
    // Older engine versions report "model" instead of "name".
    #[serde(alias = "model")]
    name: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    digest: Option<String>,
    #[serde(default)]
    modified_at: Option<String>,
}

/// Async Ollama client with configured connect and request timeouts.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    keep_alive: String,
    num_ctx: u32,
    num_predict: u32,
}

impl OllamaClient {
    /// Create a client for the configured Ollama endpoint.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &OllamaConfig) -> LlmResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            keep_alive: config.keep_alive.clone(),
            num_ctx: config.num_ctx,
            num_predict: config.num_predict,
        })
    }

    async fn post_generate(&self, model: &str, prompt: &str) -> LlmResult<String> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
            keep_alive: &self.keep_alive,
            options: GenerateOptions {
                num_ctx: self.num_ctx,
                num_predict: self.num_predict,
            },
        };

        let url = format!("{}/api/generate", self.base_url);
        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            // Ollama answers 404 when the requested model is not installed.
            return Err(LlmError::ModelNotFound(model.to_string()));
        }
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let body: GenerateResponse = response.json().await?;
        body.response.ok_or(LlmError::MalformedResponse)
    }

    async fn get_tags(&self) -> LlmResult<Vec<ModelDescriptor>> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let body: TagsResponse = response.json().await?;
        Ok(body
            .models
            .into_iter()
            .map(|m| ModelDescriptor {
                name: m.name,
                size: m.size,
                digest: m.digest,
                modified_at: m.modified_at,
            })
            .collect())
    }
}

impl InferenceClient for OllamaClient {
    fn generate(&self, prompt: &str, model: &str) -> LlmFuture<'_, LlmResult<String>> {
        let prompt = prompt.to_string();
        let model = model.to_string();
        Box::pin(async move { self.post_generate(&model, &prompt).await })
    }

    fn list_models(&self) -> LlmFuture<'_, LlmResult<Vec<ModelDescriptor>>> {
        Box::pin(async move { self.get_tags().await })
    }
}
