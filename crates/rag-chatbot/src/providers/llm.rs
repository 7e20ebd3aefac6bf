//! LLM provider trait for generating answers

use async_trait::async_trait;
use crate::error::Result;

/// Trait for text generation from a single user prompt
///
/// Implementations:
/// - `HuggingFaceLlm`: Hugging Face chat-completions router
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send `prompt` as one user turn and return the model's reply verbatim
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
