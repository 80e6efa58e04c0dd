//! LLM provider trait for prompt completion and tool-calling chat

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{ChatResponse, ConversationMessage, ToolDefinition};

/// Trait for language-model calls
///
/// Implementations:
/// - `OllamaLlm`: Local Ollama server
/// - `OpenAiLlm`: OpenAI-compatible chat completions (OpenAI, Azure OpenAI)
///
/// Implementations retry transient failures themselves; an `Err` returned
/// from here is terminal for that call.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a single prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Run one chat turn with the given tool registry
    async fn chat(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
