//! Batched, bounded-concurrency embedding

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

/// Embed `texts` in batches of `batch_size`, with up to `parallelism`
/// batches in flight. Output order matches input order.
///
/// Every vector is checked against the provider's declared dimension.
pub async fn embed_in_batches(
    embedder: &dyn EmbeddingProvider,
    texts: &[String],
    batch_size: usize,
    parallelism: usize,
) -> Result<Vec<Vec<f32>>> {
    if batch_size == 0 {
        return Err(Error::config("embedding batch size must be greater than 0"));
    }

    let batches: Vec<Vec<Vec<f32>>> = stream::iter(texts.chunks(batch_size))
        .map(|batch| async move {
            let vectors = embedder.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(Error::llm(format!(
                    "{} returned {} embeddings for {} texts",
                    embedder.name(),
                    vectors.len(),
                    batch.len()
                )));
            }
            Ok(vectors)
        })
        .buffered(parallelism.max(1))
        .try_collect()
        .await?;

    let expected = embedder.dimensions();
    let vectors: Vec<Vec<f32>> = batches.into_iter().flatten().collect();
    if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
        return Err(Error::DimensionMismatch {
            expected,
            actual: bad.len(),
        });
    }

    tracing::debug!("Embedded {} texts with {}", vectors.len(), embedder.name());
    Ok(vectors)
}
