//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{RagError, Result};

/// A provider that generates fixed-dimension embeddings from text input.
///
/// Implementations wrap a specific model (local ONNX, remote API, feature
/// hashing) behind a unified async interface. Embedding the same text twice
/// with the same instance must produce the same vector.
///
/// The default [`embed_batch`](EmbeddingProvider::embed_batch) implementation
/// calls [`embed`](EmbeddingProvider::embed) sequentially; backends that
/// support native batching should override it.
///
/// # Example
///
/// ```rust,ignore
/// use campus_rag::{EmbeddingProvider, HashEmbeddingProvider};
///
/// let provider = HashEmbeddingProvider::new(384)?;
/// let embedding = provider.embed("admissions deadline").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate one embedding per input, preserving input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str;
}

/// Embed `texts` and check the provider kept its contract.
///
/// # Errors
///
/// Returns [`RagError::Embedding`] if the provider returned a different number
/// of vectors than inputs, and [`RagError::DimensionMismatch`] if any vector's
/// length differs from [`EmbeddingProvider::dimensions`].
pub async fn embed_all(provider: &dyn EmbeddingProvider, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
    let vectors = provider.embed_batch(texts).await?;
    if vectors.len() != texts.len() {
        return Err(RagError::Embedding {
            provider: provider.name().to_string(),
            message: format!("returned {} vectors for {} inputs", vectors.len(), texts.len()),
        });
    }

    let expected = provider.dimensions();
    if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
        return Err(RagError::DimensionMismatch { expected, actual: bad.len() });
    }

    debug!(
        provider = provider.name(),
        batch_size = texts.len(),
        dimensions = expected,
        "embedded batch"
    );
    Ok(vectors)
}
