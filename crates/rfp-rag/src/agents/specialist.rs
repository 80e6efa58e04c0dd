//! Specialist agent contract and the prompt-driven implementation

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::LlmProvider;

use super::catalog::AgentSpec;
use super::template::PromptTemplate;

/// A single-purpose text-to-text extraction step
#[async_trait]
pub trait SpecialistAgent: Send + Sync {
    fn name(&self) -> &str;

    /// Analyse `text` and return the model's answer
    async fn extract(&self, text: &str) -> Result<String>;
}

/// Fills a prompt template and asks the language model.
///
/// Either binding may be absent; `extract` then fails with a configuration
/// error instead of calling anything.
pub struct PromptAgent {
    name: String,
    template: Option<PromptTemplate>,
    llm: Option<Arc<dyn LlmProvider>>,
}

impl PromptAgent {
    pub fn new(
        name: impl Into<String>,
        template: Option<PromptTemplate>,
        llm: Option<Arc<dyn LlmProvider>>,
    ) -> Self {
        Self {
            name: name.into(),
            template,
            llm,
        }
    }

    /// Agent for a catalog entry bound to `llm`
    pub fn from_spec(spec: AgentSpec, llm: Arc<dyn LlmProvider>) -> Self {
        Self::new(spec.name, Some(spec.template), Some(llm))
    }
}

#[async_trait]
impl SpecialistAgent for PromptAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn extract(&self, text: &str) -> Result<String> {
        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| Error::config("LLM not configured"))?;
        let template = self
            .template
            .as_ref()
            .ok_or_else(|| Error::config("Prompt template not configured"))?;

        if text.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "agent '{}' received empty text",
                self.name
            )));
        }

        let prompt = template.render(text);
        tracing::debug!("Agent {} prompting {} ({} chars)", self.name, llm.model(), prompt.len());

        llm.generate(&prompt)
            .await
            .map_err(|e| Error::execution(format!("{} ({})", e, e.kind())))
    }
}
