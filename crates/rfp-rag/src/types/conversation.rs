//! Chat message types shared by providers and the conversational agent

use serde::{Deserialize, Serialize};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call identifier; tool results are tagged with it
    pub id: String,
    /// Tool name
    pub name: String,
    /// Arguments, a JSON object (some providers send a JSON-encoded string)
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Arguments as a JSON object, decoding string-encoded payloads
    pub fn argument_object(&self) -> std::result::Result<serde_json::Map<String, serde_json::Value>, String> {
        match &self.arguments {
            serde_json::Value::Object(map) => Ok(map.clone()),
            serde_json::Value::Null => Ok(serde_json::Map::new()),
            serde_json::Value::String(raw) if raw.trim().is_empty() => Ok(serde_json::Map::new()),
            serde_json::Value::String(raw) => match serde_json::from_str(raw) {
                Ok(serde_json::Value::Object(map)) => Ok(map),
                Ok(other) => Err(format!("arguments must be a JSON object, got {}", other)),
                Err(e) => Err(format!("arguments are not valid JSON: {}", e)),
            },
            other => Err(format!("arguments must be a JSON object, got {}", other)),
        }
    }
}

/// One entry of an LLM call's context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    /// Tool calls requested by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Call this tool message answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }

    /// Assistant message carrying tool requests
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Tool result tagged to the call it answers
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }

    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }
}

/// Tool schema advertised to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON schema of the parameters object
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// OpenAI/Ollama function-calling representation
    pub fn to_function_json(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Model reply: final text, tool requests, or both
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    /// Plain answer with no tool requests
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Convert into the assistant message appended to the transcript
    pub fn into_message(self) -> ConversationMessage {
        ConversationMessage::assistant_with_tools(self.content, self.tool_calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_encoded_arguments() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "get_section_content".to_string(),
            arguments: json!("{\"section_name\": \"Budget\"}"),
        };
        let args = call.argument_object().unwrap();
        assert_eq!(args["section_name"], "Budget");
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let call = ToolCall {
            id: "call_1".to_string(),
            name: "list_sections".to_string(),
            arguments: json!([1, 2]),
        };
        assert!(call.argument_object().is_err());
    }

    #[test]
    fn test_role_serialization() {
        let msg = ConversationMessage::tool("call_7", "ok");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "call_7");
        assert!(value.get("tool_calls").is_none());
    }
}
