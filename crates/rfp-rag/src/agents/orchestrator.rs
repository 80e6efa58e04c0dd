//! Runs specialist agents over one text unit and collects their results

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::LlmProvider;

use super::catalog::AgentSpec;
use super::specialist::{PromptAgent, SpecialistAgent};

/// Outcome tag of one agent run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AgentStatus {
    Completed,
    /// `kind` is the error label, see `Error::kind`
    Failed { kind: String },
}

/// Output of one agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentResult {
    pub agent_name: String,
    /// Model answer, or a readable description of the failure
    pub text: String,
    #[serde(flatten)]
    pub status: AgentStatus,
}

impl AgentResult {
    pub fn completed(agent_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            text: text.into(),
            status: AgentStatus::Completed,
        }
    }

    pub fn failed(agent_name: impl Into<String>, error: &Error) -> Self {
        let text = match error {
            Error::Config(message) => format!("Error: {}", message),
            other => format!("Error during analysis: {}", other),
        };
        Self {
            agent_name: agent_name.into(),
            text,
            status: AgentStatus::Failed {
                kind: error.kind().to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AgentStatus::Completed
    }
}

/// Results of one orchestration pass, keyed by agent name in first-seen order
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrchestrationReport {
    results: Vec<AgentResult>,
}

impl OrchestrationReport {
    /// Store a result; a result with the same agent name is overwritten in place
    pub fn insert(&mut self, result: AgentResult) {
        match self
            .results
            .iter_mut()
            .find(|r| r.agent_name == result.agent_name)
        {
            Some(existing) => *existing = result,
            None => self.results.push(result),
        }
    }

    pub fn get(&self, agent_name: &str) -> Option<&AgentResult> {
        self.results.iter().find(|r| r.agent_name == agent_name)
    }

    pub fn results(&self) -> &[AgentResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &AgentResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    pub fn into_results(self) -> Vec<AgentResult> {
        self.results
    }
}

/// Runs an ordered list of agents. One agent failing never stops the others.
pub struct ExtractionOrchestrator {
    parallelism: usize,
}

impl ExtractionOrchestrator {
    /// Strictly sequential orchestrator
    pub fn new() -> Self {
        Self { parallelism: 1 }
    }

    /// Allow up to `parallelism` agents in flight; results are still stored
    /// in the supplied order
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism.max(1);
        self
    }

    /// Bind catalog entries to a language model
    pub fn agents_for(specs: Vec<AgentSpec>, llm: Arc<dyn LlmProvider>) -> Vec<Arc<dyn SpecialistAgent>> {
        specs
            .into_iter()
            .map(|spec| Arc::new(PromptAgent::from_spec(spec, Arc::clone(&llm))) as Arc<dyn SpecialistAgent>)
            .collect()
    }

    /// Run every agent on `text` in order
    pub async fn run(&self, text: &str, agents: &[Arc<dyn SpecialistAgent>]) -> OrchestrationReport {
        let started = Instant::now();
        tracing::info!("Running {} agents ({} in parallel)", agents.len(), self.parallelism);

        let outcomes: Vec<(String, Result<String>)> = stream::iter(agents.iter())
            .map(|agent| async move {
                tracing::info!("Running {} agent...", agent.name());
                let outcome = agent.extract(text).await;
                (agent.name().to_string(), outcome)
            })
            .buffered(self.parallelism)
            .collect()
            .await;

        let mut report = OrchestrationReport::default();
        for (name, outcome) in outcomes {
            let result = match outcome {
                Ok(output) => AgentResult::completed(name, output),
                Err(e) => {
                    tracing::warn!("Agent {} failed: {}", name, e);
                    AgentResult::failed(name, &e)
                }
            };
            report.insert(result);
        }

        tracing::info!(
            "Orchestration finished in {:.1}s: {} results, {} failed",
            started.elapsed().as_secs_f64(),
            report.len(),
            report.failures().count()
        );
        report
    }
}

impl Default for ExtractionOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
