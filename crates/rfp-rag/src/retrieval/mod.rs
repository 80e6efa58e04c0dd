//! Vector index and similarity search

pub mod vector_index;

pub use vector_index::{IndexEntry, IndexMetadata, IndexStats, ScoredEntry, VectorIndex};
