//! OpenAI-compatible implementation of `LlmProvider`

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::Result;
use crate::generation::{OpenAiClient, UsageStats};
use crate::types::{ChatResponse, ConversationMessage, ToolDefinition};

use super::llm::LlmProvider;

/// Chat completions provider (OpenAI or an Azure OpenAI deployment)
pub struct OpenAiLlm {
    client: Arc<OpenAiClient>,
}

impl OpenAiLlm {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: Arc::new(OpenAiClient::new(config)?),
        })
    }

    /// Token usage accumulated by this provider
    pub fn usage_stats(&self) -> UsageStats {
        self.client.usage_stats()
    }
}

#[async_trait]
impl LlmProvider for OpenAiLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.client.generate(prompt).await
    }

    async fn chat(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse> {
        self.client.chat(messages, tools).await
    }

    // No cheap probe endpoint; a configured client is assumed reachable
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        self.client.model()
    }
}
