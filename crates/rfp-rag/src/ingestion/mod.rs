//! Document chunking

mod chunker;

pub use chunker::{
    chunk_by_paragraphs, chunk_by_sentences, chunk_text, chunk_text_with_overlap, ChunkPolicy,
    TextChunker,
};
