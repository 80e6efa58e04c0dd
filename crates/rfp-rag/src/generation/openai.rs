//! OpenAI-compatible chat completions client (OpenAI and Azure OpenAI deployments)

use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::RetryPolicy;
use crate::types::{ChatResponse, ConversationMessage, Role, ToolCall, ToolDefinition};

use super::status_error;

/// Running token usage across all calls made by one client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UsageStats {
    pub calls: u64,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[derive(Default)]
struct UsageCounters {
    calls: AtomicU64,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
}

impl UsageCounters {
    fn record(&self, usage: &WireUsage) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.prompt_tokens.fetch_add(usage.prompt_tokens, Ordering::Relaxed);
        self.completion_tokens
            .fetch_add(usage.completion_tokens, Ordering::Relaxed);
    }

    fn snapshot(&self) -> UsageStats {
        let prompt_tokens = self.prompt_tokens.load(Ordering::Relaxed);
        let completion_tokens = self.completion_tokens.load(Ordering::Relaxed);
        UsageStats {
            calls: self.calls.load(Ordering::Relaxed),
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Chat completions client.
///
/// With `api_version` set the client speaks the Azure dialect: the model name
/// is the deployment, the key goes in the `api-key` header and the version is
/// a query parameter. Otherwise it uses `Authorization: Bearer`.
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
    api_key: String,
    retry: RetryPolicy,
    usage: UsageCounters,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a str>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: Role,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    /// JSON-encoded argument object
    #[serde(default)]
    arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl OpenAiClient {
    /// Create a client; fails without an API key
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::config("llm.api_key is required for the openai backend"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized OpenAI-compatible client for model/deployment {}",
            config.generate_model
        );

        Ok(Self {
            client,
            api_key,
            retry: RetryPolicy::from_config(config),
            config: config.clone(),
            usage: UsageCounters::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn model(&self) -> &str {
        &self.config.generate_model
    }

    /// Token usage so far
    pub fn usage_stats(&self) -> UsageStats {
        self.usage.snapshot()
    }

    fn is_azure(&self) -> bool {
        self.config.api_version.is_some()
    }

    fn completions_url(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        match &self.config.api_version {
            Some(version) => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base, self.config.generate_model, version
            ),
            None => format!("{}/chat/completions", base),
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        if self.is_azure() {
            request.header("api-key", &self.api_key)
        } else {
            request.bearer_auth(&self.api_key)
        }
    }

    /// Single-prompt completion
    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .chat(&[ConversationMessage::user(prompt)], &[])
            .await?;
        Ok(response.content)
    }

    /// One chat turn with tool definitions, with retry
    pub async fn chat(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse> {
        let url = self.completions_url();
        let request = CompletionRequest {
            model: (!self.is_azure()).then_some(self.config.generate_model.as_str()),
            messages: messages.iter().map(to_wire).collect(),
            tools: tools.iter().map(ToolDefinition::to_function_json).collect(),
            tool_choice: (!tools.is_empty()).then_some("auto"),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let started = Instant::now();
        let body: CompletionResponse = self
            .retry
            .run("chat completion", || async {
                let response = self
                    .authorize(self.client.post(&url))
                    .json(&request)
                    .send()
                    .await
                    .map_err(|e| Error::llm(format!("Chat completion request failed: {}", e)))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(status_error("Chat completion", status, &body));
                }

                response
                    .json::<CompletionResponse>()
                    .await
                    .map_err(|e| Error::llm(format!("Failed to parse completion response: {}", e)))
            })
            .await?;

        let usage = body.usage.unwrap_or_default();
        self.usage.record(&usage);
        tracing::info!(
            "Chat completion finished in {:.2}s (tokens in: {}, out: {})",
            started.elapsed().as_secs_f64(),
            usage.prompt_tokens,
            usage.completion_tokens
        );

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::llm("Chat completion returned no choices"))?;

        Ok(from_wire(choice.message))
    }
}

fn to_wire(message: &ConversationMessage) -> WireMessage {
    let tool_calls: Vec<WireToolCall> = message
        .tool_calls
        .iter()
        .map(|call| WireToolCall {
            id: call.id.clone(),
            kind: function_type(),
            function: WireFunction {
                name: call.name.clone(),
                arguments: match &call.arguments {
                    serde_json::Value::String(raw) => raw.clone(),
                    other => other.to_string(),
                },
            },
        })
        .collect();

    // Assistant messages that only carry tool calls are sent with null content
    let content = if message.content.is_empty() && !tool_calls.is_empty() {
        None
    } else {
        Some(message.content.clone())
    };

    WireMessage {
        role: message.role,
        content,
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    }
}

fn from_wire(message: WireMessage) -> ChatResponse {
    ChatResponse {
        content: message.content.unwrap_or_default(),
        tool_calls: message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                arguments: serde_json::Value::String(call.function.arguments),
            })
            .collect(),
    }
}
