//! rfp-rag: document analysis pipeline for RFPs
//!
//! Turns extracted document text into a searchable vector index and a set of
//! structured extracts produced by specialist language-model agents, then
//! answers follow-up questions with a tool-calling conversational agent that
//! reads the extracts and keeps a persistent memory log.

pub mod agents;
pub mod config;
pub mod conversation;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod types;

pub use agents::{AgentCatalog, AgentResult, ExtractionOrchestrator, KnowledgeDocument};
pub use config::RagConfig;
pub use conversation::{ChatReply, ConversationalAgent, KnowledgeBase, MemoryLog};
pub use error::{Error, Result};
pub use ingestion::{ChunkPolicy, TextChunker};
pub use pipeline::{Analysis, DocumentPipeline, IngestReport};
pub use retrieval::VectorIndex;
pub use types::{Chunk, Document};
