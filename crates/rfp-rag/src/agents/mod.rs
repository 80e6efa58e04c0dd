//! Specialist extraction agents and their orchestration

mod catalog;
mod knowledge;
mod orchestrator;
mod specialist;
mod template;

pub use catalog::{AgentCatalog, AgentSpec};
pub use knowledge::KnowledgeDocument;
pub use orchestrator::{AgentResult, AgentStatus, ExtractionOrchestrator, OrchestrationReport};
pub use specialist::{PromptAgent, SpecialistAgent};
pub use template::{PromptTemplate, INPUT_PLACEHOLDER};

use serde::{Deserialize, Serialize};

/// Which text the agents are run on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisScope {
    /// Only the first chunk of the document
    #[default]
    FirstChunk,
    /// The whole document text
    FullText,
}
