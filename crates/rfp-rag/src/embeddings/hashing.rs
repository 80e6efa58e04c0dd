//! Deterministic offline embedder based on feature hashing

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::providers::EmbeddingProvider;

/// Hashes lower-cased word tokens into a fixed number of buckets and
/// L2-normalises the counts. No model, no network; the same text always
/// yields the same vector.
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::config("hashing embedder needs at least one dimension"));
        }
        Ok(Self { dimensions })
    }

    fn bucket(&self, token: &str) -> usize {
        let digest = Sha256::digest(token.as_bytes());
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(head) % self.dimensions as u64) as usize
    }

    /// Synchronous embedding, shared by the trait methods
    pub fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidInput("cannot embed empty text".to_string()));
        }

        let lowered = trimmed.to_lowercase();
        let mut tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        // Punctuation-only text still gets a vector
        if tokens.is_empty() {
            tokens.push(lowered.as_str());
        }

        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokens {
            vector[self.bucket(token)] += 1.0;
        }

        let norm = super::l2_norm(&vector);
        for value in &mut vector {
            *value /= norm;
        }
        Ok(vector)
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_text(text)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed_text(text)).collect()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::cosine_similarity;
    use proptest::prelude::*;

    #[tokio::test]
    async fn test_deterministic_and_normalised() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let a = embedder.embed("Project budget and timeline").await.unwrap();
        let b = embedder.embed("Project budget and timeline").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!((super::super::l2_norm(&a) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_related_text_scores_higher() {
        let embedder = HashingEmbedder::new(256).unwrap();
        let query = embedder.embed("cloud migration budget").await.unwrap();
        let near = embedder.embed("The budget for the cloud migration is fixed").await.unwrap();
        let far = embedder.embed("Staff onboarding checklist").await.unwrap();
        assert!(cosine_similarity(&query, &near).unwrap() > cosine_similarity(&query, &far).unwrap());
    }

    #[tokio::test]
    async fn test_batch_matches_single_calls() {
        let embedder = HashingEmbedder::new(32).unwrap();
        let texts = vec!["alpha beta".to_string(), "gamma".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(batch[0], embedder.embed("alpha beta").await.unwrap());
        assert_eq!(batch[1], embedder.embed("gamma").await.unwrap());
    }

    #[test]
    fn test_empty_text_rejected() {
        let embedder = HashingEmbedder::new(8).unwrap();
        assert!(matches!(embedder.embed_text("   "), Err(Error::InvalidInput(_))));
        assert!(embedder.embed_text("!!!").is_ok());
    }

    proptest! {
        #[test]
        fn self_similarity_is_one(text in "[a-zA-Z0-9 .,!?]{1,80}") {
            prop_assume!(!text.trim().is_empty());
            let embedder = HashingEmbedder::new(48).unwrap();
            let v = embedder.embed_text(&text).unwrap();
            let s = cosine_similarity(&v, &v).unwrap();
            prop_assert!((s - 1.0).abs() < 1e-5);
        }
    }
}
