//! Answer composition from retrieved context.

use async_trait::async_trait;

use crate::error::Result;

/// Turns a question and retrieved passages into a natural-language answer.
///
/// Implementations may call a language model; the retrieval core treats them
/// as opaque.
#[async_trait]
pub trait AnswerComposer: Send + Sync {
    /// Compose an answer to `query` grounded in `context`.
    ///
    /// `max_tokens` bounds generated output for model-backed composers.
    async fn compose(&self, query: &str, context: &[&str], max_tokens: usize) -> Result<String>;

    /// Short name used in logs and error messages.
    fn name(&self) -> &str;
}

/// Deterministic composer that quotes the retrieved context back.
///
/// Needs no model, so answers are reproducible in tests and offline setups.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractiveComposer;

impl ExtractiveComposer {
    const PREVIEW_CHARS: usize = 200;
}

#[async_trait]
impl AnswerComposer for ExtractiveComposer {
    async fn compose(&self, query: &str, context: &[&str], _max_tokens: usize) -> Result<String> {
        let joined = context.join("\n");
        if joined.trim().is_empty() {
            return Ok(format!(
                "I couldn't find specific information about '{query}'. \
                 Please try a different question."
            ));
        }

        let preview: String = joined.chars().take(Self::PREVIEW_CHARS).collect();
        Ok(format!(
            "Based on our university information: {preview}... \
             For more details, please check the sources provided."
        ))
    }

    fn name(&self) -> &str {
        "Extractive"
    }
}
