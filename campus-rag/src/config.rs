//! Configuration for retrieval and ingestion.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Tunables shared by the retrieval service and its HTTP boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Results returned when a caller does not ask for a specific count.
    pub top_k: usize,
    /// Largest `top_k` the boundary accepts.
    pub max_top_k: usize,
    /// Number of passages retrieved as chat context.
    pub chat_top_k: usize,
    /// Maximum chunk size in characters for ingested documents.
    pub chunk_size: usize,
    /// Overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { top_k: 5, max_top_k: 50, chat_top_k: 3, chunk_size: 500, chunk_overlap: 50 }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the default number of results.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the largest accepted `top_k`.
    pub fn max_top_k(mut self, k: usize) -> Self {
        self.config.max_top_k = k;
        self
    }

    /// Set the number of passages used as chat context.
    pub fn chat_top_k(mut self, k: usize) -> Self {
        self.config.chat_top_k = k;
        self
    }

    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `top_k == 0` or `chat_top_k == 0`
    /// - `top_k > max_top_k`
    /// - `chunk_overlap >= chunk_size`
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.top_k == 0 || config.chat_top_k == 0 {
            return Err(RagError::Config(
                "top_k and chat_top_k must be greater than zero".to_string(),
            ));
        }
        if config.top_k > config.max_top_k {
            return Err(RagError::Config(format!(
                "top_k ({}) must not exceed max_top_k ({})",
                config.top_k, config.max_top_k
            )));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        Ok(config)
    }
}
