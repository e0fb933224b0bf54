//! Deterministic feature-hashing embedder.
//!
//! [`HashEmbeddingProvider`] needs no model download, which makes it the
//! offline default and the embedder used by the test suite. Words and
//! character trigrams are hashed with SHA-256 into signed buckets and the
//! result is L2-normalised, so texts sharing vocabulary land close together
//! under L2 distance.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// An [`EmbeddingProvider`] that hashes lexical features into a fixed-size vector.
///
/// Output is bit-identical across runs, processes and platforms. Empty or
/// punctuation-only text embeds to the zero vector.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    /// Create a provider producing vectors of `dimensions` length.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ModelLoad`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::ModelLoad {
                provider: "Hash".into(),
                message: "dimensions must be greater than zero".into(),
            });
        }
        Ok(Self { dimensions })
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for word in tokenize(text) {
            self.accumulate(&mut vector, b"w", word.as_bytes(), WORD_WEIGHT);

            let padded: Vec<char> =
                std::iter::once('#').chain(word.chars()).chain(std::iter::once('#')).collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.accumulate(&mut vector, b"t", trigram.as_bytes(), TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }

    fn accumulate(&self, vector: &mut [f32], kind: &[u8], feature: &[u8], weight: f32) {
        let mut hasher = Sha256::new();
        hasher.update(kind);
        hasher.update(feature);
        let digest = hasher.finalize();

        let mut bucket_bytes = [0u8; 8];
        bucket_bytes.copy_from_slice(&digest[..8]);
        let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimensions as u64) as usize;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };

        vector[bucket] += sign * weight;
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(str::to_lowercase)
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_sync(text)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "Hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::squared_l2;

    #[test]
    fn zero_dimensions_is_a_load_error() {
        assert!(matches!(HashEmbeddingProvider::new(0), Err(RagError::ModelLoad { .. })));
    }

    #[tokio::test]
    async fn same_text_is_bit_identical() {
        let provider = HashEmbeddingProvider::new(64).unwrap();
        let a = provider.embed("Tuition and financial aid").await.unwrap();
        let b = provider.embed("Tuition and financial aid").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_text_is_zero_vector() {
        let provider = HashEmbeddingProvider::new(16).unwrap();
        let v = provider.embed("").await.unwrap();
        assert_eq!(v, vec![0.0; 16]);
    }

    #[tokio::test]
    async fn non_empty_text_is_unit_length() {
        let provider = HashEmbeddingProvider::new(32).unwrap();
        let v = provider.embed("campus housing office").await.unwrap();
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn shared_vocabulary_is_closer() {
        let provider = HashEmbeddingProvider::new(384).unwrap();
        let query = provider.embed("housing").await.unwrap();
        let related = provider.embed("On-campus housing is available").await.unwrap();
        let unrelated = provider.embed("Robotics research labs").await.unwrap();
        assert!(squared_l2(&query, &related) < squared_l2(&query, &unrelated));
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let provider = HashEmbeddingProvider::new(32).unwrap();
        let batch = provider.embed_batch(&["alpha", "beta"]).await.unwrap();
        assert_eq!(batch[0], provider.embed("alpha").await.unwrap());
        assert_eq!(batch[1], provider.embed("beta").await.unwrap());
    }
}
