//! Client for the external LLM inference engine.

pub mod ollama;

pub use ollama::OllamaClient;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::chat::types::ModelDescriptor;

/// Boxed future type for inference operations.
pub type LlmFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors produced by the inference client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport failure: connection refused, DNS, timeout.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The engine answered with a non-success status.
    #[error("inference engine returned status {0}")]
    Status(u16),
    /// The engine reported the model identifier as unknown.
    #[error("model not found: {0}")]
    ModelNotFound(String),
    /// The response body could not be interpreted.
    #[error("malformed response from inference engine")]
    MalformedResponse,
}

/// Convenience result alias for inference operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Contract with the model-serving endpoint.
///
/// Implementations perform exactly one attempt per call; retry, if any, is a
/// caller policy.
pub trait InferenceClient: Send + Sync {
    /// Send a composed prompt and return the generated completion.
    fn generate(&self, prompt: &str, model: &str) -> LlmFuture<'_, LlmResult<String>>;

    /// Enumerate the engine's model catalog.
    fn list_models(&self) -> LlmFuture<'_, LlmResult<Vec<ModelDescriptor>>>;
}
