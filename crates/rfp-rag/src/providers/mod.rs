//! Provider abstractions for embeddings and language-model calls
//!
//! Trait-based so the pipeline can switch between a local Ollama server, an
//! OpenAI-compatible endpoint and the offline hashing embedder.

pub mod embedding;
pub mod llm;
pub mod ollama;
pub mod openai;
pub mod retry;

#[cfg(test)]
pub mod mock;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, LlmBackend, LlmConfig, RagConfig};
use crate::embeddings::HashingEmbedder;
use crate::error::Result;
use crate::generation::OllamaClient;

pub use embedding::EmbeddingProvider;
pub use llm::LlmProvider;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use openai::OpenAiLlm;
pub use retry::RetryPolicy;

/// Build the configured language-model provider
pub fn build_llm(config: &RagConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.llm.backend {
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(&config.llm)?),
        LlmBackend::OpenAi => Arc::new(OpenAiLlm::new(&config.llm)?),
    };
    tracing::info!("Using LLM provider: {} ({})", llm.name(), llm.model());
    Ok(llm)
}

/// Build the configured embedding provider
pub fn build_embedder(config: &RagConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.embeddings.backend {
        EmbeddingBackend::Ollama => {
            let mut llm = config.llm.clone();
            llm.embed_model = config.embeddings.model.clone();
            if let Some(url) = &config.embeddings.base_url {
                llm.base_url = url.clone();
            } else if llm.backend != LlmBackend::Ollama {
                llm.base_url = LlmConfig::default().base_url;
            }
            let client = Arc::new(OllamaClient::new(&llm)?);
            Arc::new(OllamaEmbedder::from_client(client, config.embeddings.dimensions))
        }
        EmbeddingBackend::Hashing => Arc::new(HashingEmbedder::new(config.embeddings.dimensions)?),
    };
    tracing::info!(
        "Using embedding provider: {} ({} dimensions)",
        embedder.name(),
        embedder.dimensions()
    );
    Ok(embedder)
}
