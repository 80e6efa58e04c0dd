//! Static registry of the tools offered to the conversational model

use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::types::{ToolCall, ToolDefinition};

use super::knowledge_base::KnowledgeBase;
use super::memory_log::MemoryLog;

/// State the tools read and write, owned by one conversational agent
#[derive(Debug)]
pub struct ToolContext {
    pub knowledge: KnowledgeBase,
    pub memory: MemoryLog,
}

impl ToolContext {
    pub fn new(knowledge: KnowledgeBase, memory: MemoryLog) -> Self {
        Self { knowledge, memory }
    }
}

/// JSON schema type of a parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    fn schema_name(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Boolean => "boolean",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Integer => value.is_i64() || value.is_u64(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    pub required: bool,
}

/// Tool implementation; arguments are already checked against the declared parameters
pub type ToolHandler = fn(&mut ToolContext, &Map<String, Value>) -> Result<String>;

#[derive(Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [ParamSpec],
    pub handler: ToolHandler,
}

impl ToolSpec {
    pub fn definition(&self) -> ToolDefinition {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.params {
            properties.insert(
                param.name.to_string(),
                json!({
                    "type": param.kind.schema_name(),
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.to_string()));
            }
        }

        ToolDefinition {
            name: self.name.to_string(),
            description: self.description.to_string(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }

    fn validate(&self, args: &Map<String, Value>) -> Result<()> {
        for param in self.params {
            match args.get(param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(Error::InvalidInput(format!(
                        "missing required argument '{}'",
                        param.name
                    )));
                }
                Some(value) if !value.is_null() && !param.kind.accepts(value) => {
                    return Err(Error::InvalidInput(format!(
                        "argument '{}' must be a {}",
                        param.name,
                        param.kind.schema_name()
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Result of one tool call as fed back to the model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    pub content: String,
    pub success: bool,
}

impl ToolOutcome {
    fn ok(content: String) -> Self {
        Self {
            content,
            success: true,
        }
    }

    fn failed(content: String) -> Self {
        Self {
            content,
            success: false,
        }
    }
}

/// Mapping from tool name to schema and handler, fixed at construction
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolSpec>,
}

impl ToolRegistry {
    /// The five knowledge and memory tools
    pub fn standard() -> Self {
        Self {
            tools: STANDARD_TOOLS.to_vec(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ToolSpec> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name).collect()
    }

    /// Function schemas sent to the model
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(ToolSpec::definition).collect()
    }

    /// Run one call. Never fails: unknown tools, bad arguments and handler
    /// errors come back as text the model can read.
    pub fn dispatch(&self, context: &mut ToolContext, call: &ToolCall) -> ToolOutcome {
        let Some(tool) = self.get(&call.name) else {
            tracing::warn!("Model requested unknown tool {}", call.name);
            return ToolOutcome::failed(format!("Unknown function: {}", call.name));
        };

        let result = call
            .argument_object()
            .map_err(Error::InvalidInput)
            .and_then(|args| {
                tool.validate(&args)?;
                (tool.handler)(context, &args)
            });

        match result {
            Ok(content) => ToolOutcome::ok(content),
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", call.name, e);
                ToolOutcome::failed(format!("Error executing {}: {}", call.name, e))
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn string_arg<'a>(args: &'a Map<String, Value>, name: &str) -> &'a str {
    args.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn get_section_content(context: &mut ToolContext, args: &Map<String, Value>) -> Result<String> {
    let name = string_arg(args, "section_name");
    Ok(match context.knowledge.get(name) {
        Some(body) => body.to_string(),
        None => format!(
            "Section '{}' not found. Available sections: {}",
            name,
            context.knowledge.section_names().join(", ")
        ),
    })
}

fn list_sections(context: &mut ToolContext, _args: &Map<String, Value>) -> Result<String> {
    Ok(serde_json::to_string(&context.knowledge.section_names())?)
}

fn search_in_context(context: &mut ToolContext, args: &Map<String, Value>) -> Result<String> {
    let query = string_arg(args, "query");
    let hits = context.knowledge.search(query);
    if hits.is_empty() {
        return Ok(json!({ "message": format!("No results found for '{}'", query) }).to_string());
    }

    let results: Map<String, Value> = hits
        .into_iter()
        .map(|s| (s.heading.clone(), Value::String(s.body.clone())))
        .collect();
    Ok(Value::Object(results).to_string())
}

fn get_memory(context: &mut ToolContext, _args: &Map<String, Value>) -> Result<String> {
    if context.memory.is_empty() {
        return Ok("No memories stored yet.".to_string());
    }
    Ok(context.memory.text().to_string())
}

fn record_memory(context: &mut ToolContext, args: &Map<String, Value>) -> Result<String> {
    let category = string_arg(args, "category");
    let content = string_arg(args, "content");
    context.memory.record(category, content)?;
    Ok(format!("Memory recorded successfully under category '{}'", category.trim()))
}

const STANDARD_TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "get_section_content",
        description: "Get the content from a specific section in the context document.",
        params: &[ParamSpec {
            name: "section_name",
            kind: ParamKind::String,
            description: "The name of the section to retrieve",
            required: true,
        }],
        handler: get_section_content,
    },
    ToolSpec {
        name: "list_sections",
        description: "List all available sections in the context document.",
        params: &[],
        handler: list_sections,
    },
    ToolSpec {
        name: "search_in_context",
        description: "Search for specific information across all sections in the context.",
        params: &[ParamSpec {
            name: "query",
            kind: ParamKind::String,
            description: "The search query to find in the context",
            required: true,
        }],
        handler: search_in_context,
    },
    ToolSpec {
        name: "get_memory",
        description: "Retrieve all stored memories from previous interactions.",
        params: &[],
        handler: get_memory,
    },
    ToolSpec {
        name: "record_memory",
        description: "Record a new memory or fact learned from the current interaction.",
        params: &[
            ParamSpec {
                name: "category",
                kind: ParamKind::String,
                description: "The category of the memory (e.g., 'User Preferences', 'Common Questions', 'Clarifications', 'Insights')",
                required: true,
            },
            ParamSpec {
                name: "content",
                kind: ParamKind::String,
                description: "The memory content to record",
                required: true,
            },
        ],
        handler: record_memory,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> ToolContext {
        ToolContext::new(
            KnowledgeBase::parse("## Pricing Details\nFixed price of $500,000.\n## Scope\nPortal and mobile app.\n"),
            MemoryLog::in_memory(),
        )
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    #[test]
    fn test_definitions() {
        let registry = ToolRegistry::standard();
        let defs = registry.definitions();
        assert_eq!(defs.len(), 5);
        let record = defs.iter().find(|d| d.name == "record_memory").unwrap();
        assert_eq!(record.parameters["required"], json!(["category", "content"]));
        assert_eq!(record.parameters["properties"]["content"]["type"], "string");
    }

    #[test]
    fn test_section_lookup_is_exact() {
        let registry = ToolRegistry::standard();
        let mut ctx = context();

        let found = registry.dispatch(&mut ctx, &call("get_section_content", json!({"section_name": "pricing details"})));
        assert_eq!(found.content, "Fixed price of $500,000.");

        let missing = registry.dispatch(&mut ctx, &call("get_section_content", json!({"section_name": "Pricing"})));
        assert!(missing.success);
        assert_eq!(
            missing.content,
            "Section 'Pricing' not found. Available sections: Pricing Details, Scope"
        );
    }

    #[test]
    fn test_list_and_search() {
        let registry = ToolRegistry::standard();
        let mut ctx = context();

        let list = registry.dispatch(&mut ctx, &call("list_sections", Value::Null));
        assert_eq!(list.content, r#"["Pricing Details","Scope"]"#);

        let hits = registry.dispatch(&mut ctx, &call("search_in_context", json!({"query": "MOBILE"})));
        let parsed: Value = serde_json::from_str(&hits.content).unwrap();
        assert_eq!(parsed, json!({"Scope": "Portal and mobile app."}));

        let none = registry.dispatch(&mut ctx, &call("search_in_context", json!("{\"query\":\"blockchain\"}")));
        let parsed: Value = serde_json::from_str(&none.content).unwrap();
        assert_eq!(parsed["message"], "No results found for 'blockchain'");
    }

    #[test]
    fn test_search_hits_keep_document_order() {
        let registry = ToolRegistry::standard();
        let mut ctx = ToolContext::new(
            KnowledgeBase::parse("## Zeta
shared term
## Middle
nothing here
## Alpha
shared term again
"),
            MemoryLog::in_memory(),
        );

        let hits = registry.dispatch(&mut ctx, &call("search_in_context", json!({"query": "shared"})));
        assert_eq!(
            hits.content,
            r#"{"Zeta":"shared term","Alpha":"shared term again"}"#
        );
    }

    #[test]
    fn test_memory_round_trip() {
        let registry = ToolRegistry::standard();
        let mut ctx = context();

        let empty = registry.dispatch(&mut ctx, &call("get_memory", json!({})));
        assert_eq!(empty.content, "No memories stored yet.");

        let recorded = registry.dispatch(
            &mut ctx,
            &call("record_memory", json!({"category": "Insights", "content": "Budget is fixed"})),
        );
        assert_eq!(recorded.content, "Memory recorded successfully under category 'Insights'");

        let memory = registry.dispatch(&mut ctx, &call("get_memory", json!({})));
        assert!(memory.content.contains("### Insights"));
        assert!(memory.content.contains("Budget is fixed"));
    }

    #[test]
    fn test_failures_become_text() {
        let registry = ToolRegistry::standard();
        let mut ctx = context();

        let unknown = registry.dispatch(&mut ctx, &call("delete_everything", json!({})));
        assert!(!unknown.success);
        assert_eq!(unknown.content, "Unknown function: delete_everything");

        let missing = registry.dispatch(&mut ctx, &call("record_memory", json!({"category": "x"})));
        assert!(!missing.success);
        assert!(missing.content.starts_with("Error executing record_memory:"));
        assert!(missing.content.contains("'content'"));

        let wrong_type = registry.dispatch(&mut ctx, &call("search_in_context", json!({"query": 7})));
        assert!(!wrong_type.success);

        let garbage = registry.dispatch(&mut ctx, &call("list_sections", json!("{not json")));
        assert!(garbage.content.starts_with("Error executing list_sections:"));
    }
}
