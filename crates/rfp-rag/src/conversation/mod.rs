//! Conversational agent: knowledge sections, memory log, tools and the chat loop

mod agent;
mod knowledge_base;
mod memory_log;
mod tools;

pub use agent::{ChatReply, ConversationalAgent, ROUND_LIMIT_MESSAGE};
pub use knowledge_base::{KnowledgeBase, KnowledgeSection};
pub use memory_log::{MemoryLog, MemoryRecord, MEMORY_HEADER};
pub use tools::{ParamKind, ParamSpec, ToolContext, ToolHandler, ToolOutcome, ToolRegistry, ToolSpec};
