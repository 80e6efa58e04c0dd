//! Scripted `LlmProvider` for tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::error::{Error, Result};
use crate::types::{ChatResponse, ConversationMessage, ToolCall, ToolDefinition};

use super::llm::LlmProvider;

type Responder = Box<dyn Fn(&str) -> Result<String> + Send + Sync>;

/// Replays queued chat replies and answers `generate` through a closure.
///
/// Every chat request and prompt is recorded for assertions.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<std::result::Result<ChatResponse, String>>>,
    /// Returned once the queue is drained; `None` means error
    repeat: Option<ChatResponse>,
    responder: Responder,
    requests: Mutex<Vec<Vec<ConversationMessage>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            repeat: None,
            responder: Box::new(|prompt| Ok(format!("analysis ({} chars)", prompt.len()))),
            requests: Mutex::new(Vec::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a chat reply
    pub fn reply(self, response: ChatResponse) -> Self {
        self.replies.lock().push_back(Ok(response));
        self
    }

    /// Queue a chat failure
    pub fn fail(self, message: &str) -> Self {
        self.replies.lock().push_back(Err(message.to_string()));
        self
    }

    /// Answer with this reply forever once the queue is empty
    pub fn repeat(mut self, response: ChatResponse) -> Self {
        self.repeat = Some(response);
        self
    }

    /// Answer `generate` calls with `responder`
    pub fn on_generate(
        mut self,
        responder: impl Fn(&str) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        self.responder = Box::new(responder);
        self
    }

    /// Chat requests seen so far
    pub fn requests(&self) -> Vec<Vec<ConversationMessage>> {
        self.requests.lock().clone()
    }

    /// Prompts passed to `generate`
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl Default for ScriptedLlm {
    fn default() -> Self {
        Self::new()
    }
}

/// Reply requesting a single tool call
pub fn tool_reply(id: &str, name: &str, arguments: serde_json::Value) -> ChatResponse {
    ChatResponse {
        content: String::new(),
        tool_calls: vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }],
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        (self.responder)(prompt)
    }

    async fn chat(
        &self,
        messages: &[ConversationMessage],
        _tools: &[ToolDefinition],
    ) -> Result<ChatResponse> {
        self.requests.lock().push(messages.to_vec());
        match self.replies.lock().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(Error::llm(message)),
            None => self
                .repeat
                .clone()
                .ok_or_else(|| Error::llm("script exhausted")),
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
