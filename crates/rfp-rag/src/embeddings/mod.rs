//! Embedding generation: similarity, offline hashing embedder, batched calls

mod batch;
mod hashing;
mod similarity;

pub use batch::embed_in_batches;
pub use hashing::HashingEmbedder;
pub use similarity::{cosine_similarity, l2_norm};
