//! Prompt text for the conversational agent

use crate::types::ToolDefinition;

/// Appended to every user question before it reaches the model
pub const QUESTION_SUFFIX: &str =
    ". Think step-by-step and use the tools when necessary and derive the answer based on the available information.";

/// Prompt builder for tool-assisted chat
pub struct PromptBuilder;

impl PromptBuilder {
    /// System prompt listing the registered tools
    pub fn chat_system_prompt(tools: &[ToolDefinition]) -> String {
        let tool_list = tools
            .iter()
            .map(|tool| format!("- {}: {}", tool.name, tool.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are a helpful assistant that answers questions based on a context document.

# Tools:
{tools}

# Instructions:
- You can use the provided tools to retrieve information from the context.
- You also have access to memory of past interactions.
- When you don't have the information, use the available tools to retrieve it from the context and memory to answer user questions accurately.
- Record important facts, user preferences, common questions and insights in memory to improve your responses over time.
- Always check memory at the start of conversations to provide personalized and context-aware responses."#,
            tools = tool_list
        )
    }

    /// User question with the tool-use instruction attached
    pub fn annotate_question(question: &str) -> String {
        format!("{}{}", question.trim_end(), QUESTION_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_prompt_lists_tools() {
        let tools = vec![
            ToolDefinition {
                name: "list_sections".to_string(),
                description: "List all section names".to_string(),
                parameters: json!({"type": "object", "properties": {}}),
            },
            ToolDefinition {
                name: "get_memory".to_string(),
                description: "Read the memory log".to_string(),
                parameters: json!({"type": "object", "properties": {}}),
            },
        ];

        let prompt = PromptBuilder::chat_system_prompt(&tools);
        assert!(prompt.contains("- list_sections: List all section names"));
        assert!(prompt.contains("- get_memory: Read the memory log"));
    }

    #[test]
    fn test_annotate_question() {
        let annotated = PromptBuilder::annotate_question("What is the budget?  ");
        assert!(annotated.starts_with("What is the budget?. Think step-by-step"));
        assert!(annotated.ends_with(QUESTION_SUFFIX));
    }
}
