//! Core types for the pipeline

pub mod conversation;
pub mod document;

pub use conversation::{ChatResponse, ConversationMessage, Role, ToolCall, ToolDefinition};
pub use document::{Chunk, Document};
