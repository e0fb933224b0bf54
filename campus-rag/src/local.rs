//! Local sentence-embedding model via `fastembed`.
//!
//! This module is only available when the `local` feature is enabled. The
//! model weights are downloaded to the fastembed cache on first use.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// An [`EmbeddingProvider`] running an ONNX sentence-transformer in-process.
///
/// Defaults to `all-MiniLM-L6-v2` (384 dimensions). Inference runs on tokio's
/// blocking pool; the model handle needs exclusive access, so concurrent
/// calls are serialised behind a mutex.
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedProvider {
    /// Load the default `all-MiniLM-L6-v2` model.
    pub fn new() -> Result<Self> {
        Self::with_model(EmbeddingModel::AllMiniLML6V2)
    }

    /// Load `model`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ModelLoad`] if the weights cannot be fetched or
    /// initialised.
    pub fn with_model(model: EmbeddingModel) -> Result<Self> {
        let model_info = TextEmbedding::get_model_info(&model).map_err(|e| RagError::ModelLoad {
            provider: "FastEmbed".into(),
            message: format!("unknown model: {e}"),
        })?;
        let model_name = model_info.model_code.clone();
        let dimensions = model_info.dim;

        let options = InitOptions::new(model).with_show_download_progress(false);
        let embedding = TextEmbedding::try_new(options).map_err(|e| RagError::ModelLoad {
            provider: "FastEmbed".into(),
            message: format!("failed to load {model_name}: {e}"),
        })?;

        info!(model = %model_name, dimensions, "loaded embedding model");
        Ok(Self { model: Arc::new(Mutex::new(embedding)), model_name, dimensions })
    }

    fn inference_error(message: impl Into<String>) -> RagError {
        RagError::Embedding { provider: "FastEmbed".into(), message: message.into() }
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])
            .await?
            .pop()
            .ok_or_else(|| Self::inference_error("model returned no vector"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.model_name, batch_size = texts.len(), "embedding batch");

        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        let model = Arc::clone(&self.model);
        tokio::task::spawn_blocking(move || -> Result<Vec<Vec<f32>>> {
            let mut model =
                model.lock().map_err(|_| Self::inference_error("model mutex poisoned"))?;
            model.embed(owned, None).map_err(|e| Self::inference_error(e.to_string()))
        })
        .await
        .map_err(|e| Self::inference_error(format!("inference task failed: {e}")))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "FastEmbed"
    }
}
