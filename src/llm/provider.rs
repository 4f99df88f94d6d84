use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::ApiError;

/// Port for the chat and embedding model boundary. Production uses an
/// OpenAI-compatible endpoint; tests substitute deterministic fakes.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// chat completion (non-streaming); one call per user turn
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, ApiError>;

    /// generate one embedding per input, deterministic for identical input
    async fn embed(&self, inputs: &[String], model_id: &str)
        -> Result<Vec<Vec<f32>>, ApiError>;
}
