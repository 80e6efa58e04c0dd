//! Tool-calling conversational agent over a knowledge document and memory log

use std::path::Path;
use std::sync::Arc;

use crate::config::ConversationConfig;
use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::LlmProvider;
use crate::types::{ConversationMessage, Role};

use super::knowledge_base::KnowledgeBase;
use super::memory_log::MemoryLog;
use super::tools::{ToolContext, ToolRegistry};

/// Answer used when the round cap is hit before the model produced any text
pub const ROUND_LIMIT_MESSAGE: &str = "I could not finish answering within the allowed number of tool calls. Please rephrase or narrow the question.";

/// Final answer of one `chat` call
#[derive(Debug, Clone)]
pub struct ChatReply {
    pub answer: String,
    /// Model calls whose tool requests were executed
    pub rounds: usize,
    /// The round cap stopped the loop
    pub truncated: bool,
    /// Messages of this exchange after the system prompt, including the
    /// caller's history; pass it back as the next call's history
    pub transcript: Vec<ConversationMessage>,
}

/// Answers questions by letting the model call knowledge and memory tools
pub struct ConversationalAgent {
    llm: Arc<dyn LlmProvider>,
    registry: ToolRegistry,
    context: ToolContext,
    max_tool_rounds: usize,
}

impl ConversationalAgent {
    pub fn new(llm: Arc<dyn LlmProvider>, knowledge: KnowledgeBase, memory: MemoryLog) -> Self {
        Self {
            llm,
            registry: ToolRegistry::standard(),
            context: ToolContext::new(knowledge, memory),
            max_tool_rounds: ConversationConfig::default().max_tool_rounds,
        }
    }

    /// Load the knowledge document and open the configured memory log
    pub fn from_config(
        llm: Arc<dyn LlmProvider>,
        config: &ConversationConfig,
        knowledge_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let knowledge = KnowledgeBase::from_file(knowledge_path)?;
        let memory = MemoryLog::open(&config.memory_path)?;
        Self::new(llm, knowledge, memory).with_max_tool_rounds(config.max_tool_rounds)
    }

    pub fn with_max_tool_rounds(mut self, max_tool_rounds: usize) -> Result<Self> {
        if max_tool_rounds == 0 {
            return Err(Error::config("max_tool_rounds must be greater than 0"));
        }
        self.max_tool_rounds = max_tool_rounds;
        Ok(self)
    }

    /// Replace the knowledge document (sections are rebuilt from scratch)
    pub fn set_knowledge(&mut self, knowledge: KnowledgeBase) {
        self.context.knowledge = knowledge;
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.context.knowledge
    }

    pub fn memory(&self) -> &MemoryLog {
        &self.context.memory
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Answer `question`, dispatching tool calls until the model gives a
    /// plain answer or the round cap is reached
    pub async fn chat(&mut self, question: &str, history: &[ConversationMessage]) -> Result<ChatReply> {
        let definitions = self.registry.definitions();

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ConversationMessage::system(PromptBuilder::chat_system_prompt(&definitions)));
        messages.extend(history.iter().filter(|m| m.role != Role::System).cloned());
        messages.push(ConversationMessage::user(PromptBuilder::annotate_question(question)));

        let mut rounds = 0;
        let mut last_text = String::new();

        loop {
            let response = self.llm.chat(&messages, &definitions).await?;
            if !response.content.trim().is_empty() {
                last_text = response.content.clone();
            }

            if !response.has_tool_calls() {
                messages.push(ConversationMessage::assistant(response.content.clone()));
                return Ok(finish(messages, response.content, rounds, false));
            }

            if rounds >= self.max_tool_rounds {
                tracing::warn!(
                    "Stopping after {} tool rounds; model still requested {} tool calls",
                    rounds,
                    response.tool_calls.len()
                );
                let answer = if last_text.is_empty() {
                    ROUND_LIMIT_MESSAGE.to_string()
                } else {
                    last_text
                };
                // Unanswered tool calls are left out so the transcript stays valid history
                messages.push(ConversationMessage::assistant(answer.clone()));
                return Ok(finish(messages, answer, rounds, true));
            }

            rounds += 1;
            let calls = response.tool_calls.clone();
            messages.push(response.into_message());

            for call in &calls {
                tracing::info!("Calling tool {} with {}", call.name, call.arguments);
                let outcome = self.registry.dispatch(&mut self.context, call);
                tracing::debug!(
                    "Tool {} returned {} chars (success: {})",
                    call.name,
                    outcome.content.len(),
                    outcome.success
                );
                messages.push(ConversationMessage::tool(call.id.clone(), outcome.content));
            }
        }
    }
}

fn finish(mut messages: Vec<ConversationMessage>, answer: String, rounds: usize, truncated: bool) -> ChatReply {
    messages.remove(0);
    ChatReply {
        answer,
        rounds,
        truncated,
        transcript: messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{tool_reply, ScriptedLlm};
    use crate::types::ChatResponse;
    use serde_json::json;

    const KB: &str = "## Pricing Details\nFixed price of $500,000.\n\n## Timeline\nGo-live in Q3.\n";

    fn agent(llm: Arc<ScriptedLlm>) -> ConversationalAgent {
        ConversationalAgent::new(llm, KnowledgeBase::parse(KB), MemoryLog::in_memory())
    }

    #[tokio::test]
    async fn test_plain_answer() {
        let llm = Arc::new(ScriptedLlm::new().reply(ChatResponse::text("Hello!")));
        let mut agent = agent(llm.clone());

        let reply = agent.chat("Hi", &[]).await.unwrap();
        assert_eq!(reply.answer, "Hello!");
        assert_eq!(reply.rounds, 0);
        assert!(!reply.truncated);

        let request = &llm.requests()[0];
        assert_eq!(request[0].role, Role::System);
        assert!(request[0].content.contains("get_section_content"));
        assert!(request[1].content.starts_with("Hi. Think step-by-step"));
    }

    #[tokio::test]
    async fn test_tool_round_then_answer() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(tool_reply("call_1", "get_section_content", json!({"section_name": "timeline"})))
                .reply(ChatResponse::text("Go-live is planned for Q3.")),
        );
        let mut agent = agent(llm.clone());

        let reply = agent.chat("When is go-live?", &[]).await.unwrap();
        assert_eq!(reply.answer, "Go-live is planned for Q3.");
        assert_eq!(reply.rounds, 1);

        let second = &llm.requests()[1];
        let tool_message = second.last().unwrap();
        assert_eq!(tool_message.role, Role::Tool);
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool_message.content, "Go-live in Q3.");

        // user, assistant(tool call), tool, assistant(answer)
        assert_eq!(reply.transcript.len(), 4);
        assert_eq!(reply.transcript[3].content, "Go-live is planned for Q3.");
    }

    #[tokio::test]
    async fn test_unknown_tool_does_not_break_loop() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(tool_reply("call_1", "drop_tables", json!({})))
                .reply(ChatResponse::text("Sorry, I can't do that.")),
        );
        let mut agent = agent(llm.clone());

        let reply = agent.chat("Delete it", &[]).await.unwrap();
        assert_eq!(reply.answer, "Sorry, I can't do that.");
        assert_eq!(llm.requests()[1].last().unwrap().content, "Unknown function: drop_tables");
    }

    #[tokio::test]
    async fn test_round_cap_is_enforced() {
        let llm = Arc::new(ScriptedLlm::new().repeat(tool_reply("call_x", "list_sections", json!({}))));
        let mut agent = agent(llm.clone()).with_max_tool_rounds(3).unwrap();

        let reply = agent.chat("Loop forever", &[]).await.unwrap();
        assert!(reply.truncated);
        assert_eq!(reply.rounds, 3);
        assert_eq!(reply.answer, ROUND_LIMIT_MESSAGE);
        assert_eq!(llm.requests().len(), 4);
    }

    #[tokio::test]
    async fn test_round_cap_returns_last_text() {
        let mut thinking = tool_reply("call_x", "get_memory", json!({}));
        thinking.content = "Checking memory first.".to_string();
        let llm = Arc::new(ScriptedLlm::new().repeat(thinking));
        let mut agent = agent(llm).with_max_tool_rounds(1).unwrap();

        let reply = agent.chat("Anything?", &[]).await.unwrap();
        assert!(reply.truncated);
        assert_eq!(reply.answer, "Checking memory first.");
    }

    #[tokio::test]
    async fn test_record_memory_persists_between_chats() {
        let llm = Arc::new(
            ScriptedLlm::new()
                .reply(tool_reply(
                    "call_1",
                    "record_memory",
                    json!({"category": "User Preferences", "content": "Wants answers in bullets"}),
                ))
                .reply(ChatResponse::text("Noted."))
                .reply(tool_reply("call_2", "get_memory", json!({})))
                .reply(ChatResponse::text("You like bullets.")),
        );
        let mut agent = agent(llm.clone());

        let first = agent.chat("Use bullets please", &[]).await.unwrap();
        let second = agent.chat("What do I like?", &first.transcript).await.unwrap();
        assert_eq!(second.answer, "You like bullets.");
        assert!(agent.memory().text().contains("Wants answers in bullets"));

        let requests = llm.requests();
        let memory_result = requests[3].last().unwrap();
        assert!(memory_result.content.contains("### User Preferences"));
        // history from the first chat precedes the new question
        assert_eq!(requests[2].len(), 1 + first.transcript.len() + 1);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let llm = Arc::new(ScriptedLlm::new().fail("HTTP 503"));
        let mut agent = agent(llm);
        assert!(matches!(agent.chat("Hi", &[]).await, Err(Error::Llm(_))));
    }

    #[test]
    fn test_zero_round_cap_rejected() {
        let llm = Arc::new(ScriptedLlm::new());
        assert!(agent(llm).with_max_tool_rounds(0).is_err());
    }
}
