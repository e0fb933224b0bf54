//! Process configuration and the single construction point for services.

use std::path::PathBuf;
use std::sync::Arc;

use campus_rag::{
    AnswerComposer, EmbeddingProvider, ExtractiveComposer, HashEmbeddingProvider, RagConfig,
    RagError, RetrievalService,
};
use clap::{Parser, ValueEnum};
use tracing::info;

use crate::server::AppState;

/// Default `RUST_LOG` filter when none is set.
pub const DEFAULT_LOG_FILTER: &str = "info,campus_server=info,campus_rag=info,tower_http=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbedderKind {
    /// Deterministic feature hashing, no model download.
    Hash,
    /// `all-MiniLM-L6-v2` via fastembed (needs the `local` feature).
    Local,
    /// OpenAI embeddings API (needs the `openai` feature).
    Openai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ComposerKind {
    /// Quote retrieved passages back.
    Extractive,
    /// OpenAI chat completions (needs the `openai` feature).
    Openai,
}

#[derive(Debug, Clone, Parser)]
#[command(
    name = "campus-server",
    version,
    about = "Semantic search and chat over a document corpus"
)]
pub struct ServerConfig {
    #[arg(long, env = "CAMPUS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "CAMPUS_PORT", default_value_t = 8001)]
    pub port: u16,

    /// Directory of `.txt` documents; a placeholder corpus is written if it has none.
    #[arg(long, env = "CAMPUS_CORPUS_DIR", default_value = "data/sample_documents")]
    pub corpus_dir: PathBuf,

    #[arg(long, env = "CAMPUS_EMBEDDER", value_enum, default_value_t = EmbedderKind::Hash)]
    pub embedder: EmbedderKind,

    /// Output size of the hash embedder.
    #[arg(long, env = "CAMPUS_EMBEDDING_DIMS", default_value_t = 384)]
    pub embedding_dims: usize,

    #[arg(long, env = "CAMPUS_COMPOSER", value_enum, default_value_t = ComposerKind::Extractive)]
    pub composer: ComposerKind,

    /// Results returned by `/search` when the request omits `top_k`.
    #[arg(long, env = "CAMPUS_TOP_K", default_value_t = 5)]
    pub top_k: usize,

    /// Passages retrieved as context for `/chat`.
    #[arg(long, env = "CAMPUS_CHAT_TOP_K", default_value_t = 3)]
    pub chat_top_k: usize,

    /// Maximum chunk size, in characters, for documents posted to `/index`.
    #[arg(long, env = "CAMPUS_CHUNK_SIZE", default_value_t = 500)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks; must be below `chunk_size`.
    #[arg(long, env = "CAMPUS_CHUNK_OVERLAP", default_value_t = 50)]
    pub chunk_overlap: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8001,
            corpus_dir: PathBuf::from("data/sample_documents"),
            embedder: EmbedderKind::Hash,
            embedding_dims: 384,
            composer: ComposerKind::Extractive,
            top_k: 5,
            chat_top_k: 3,
            chunk_size: 500,
            chunk_overlap: 50,
        }
    }
}

#[cfg(any(not(feature = "local"), not(feature = "openai")))]
fn missing_feature(provider: &str, feature: &str) -> RagError {
    RagError::ModelLoad {
        provider: provider.to_string(),
        message: format!("campus-server was built without the `{feature}` feature"),
    }
}

pub fn build_embedder(config: &ServerConfig) -> Result<Arc<dyn EmbeddingProvider>, RagError> {
    match config.embedder {
        EmbedderKind::Hash => Ok(Arc::new(HashEmbeddingProvider::new(config.embedding_dims)?)),
        #[cfg(feature = "local")]
        EmbedderKind::Local => Ok(Arc::new(campus_rag::FastEmbedProvider::new()?)),
        #[cfg(not(feature = "local"))]
        EmbedderKind::Local => Err(missing_feature("FastEmbed", "local")),
        #[cfg(feature = "openai")]
        EmbedderKind::Openai => Ok(Arc::new(campus_rag::OpenAIEmbeddingProvider::from_env()?)),
        #[cfg(not(feature = "openai"))]
        EmbedderKind::Openai => Err(missing_feature("OpenAI", "openai")),
    }
}

pub fn build_composer(config: &ServerConfig) -> Result<Arc<dyn AnswerComposer>, RagError> {
    match config.composer {
        ComposerKind::Extractive => Ok(Arc::new(ExtractiveComposer)),
        #[cfg(feature = "openai")]
        ComposerKind::Openai => Ok(Arc::new(campus_rag::OpenAIChatComposer::from_env()?)),
        #[cfg(not(feature = "openai"))]
        ComposerKind::Openai => Err(missing_feature("OpenAIChat", "openai")),
    }
}

/// Construct every service in order: embedder, corpus and index, retrieval, composer.
///
/// Any failure aborts startup; the server never comes up half-initialised.
pub async fn bootstrap(config: &ServerConfig) -> Result<AppState, RagError> {
    let rag_config = RagConfig::builder()
        .top_k(config.top_k)
        .chat_top_k(config.chat_top_k)
        .chunk_size(config.chunk_size)
        .chunk_overlap(config.chunk_overlap)
        .build()?;

    let embedder = build_embedder(config)?;
    info!(embedder = embedder.name(), dimensions = embedder.dimensions(), "embedder ready");

    let retrieval = RetrievalService::new(embedder);
    retrieval.load_dir(&config.corpus_dir).await?;

    let composer = build_composer(config)?;
    Ok(AppState::new(Arc::new(retrieval), composer, rag_config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let config = ServerConfig::parse_from([
            "campus-server",
            "--port",
            "9000",
            "--embedder",
            "hash",
            "--corpus-dir",
            "/tmp/docs",
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.embedder, EmbedderKind::Hash);
        assert_eq!(config.corpus_dir, PathBuf::from("/tmp/docs"));
    }

    #[tokio::test]
    async fn bootstrap_writes_placeholder_corpus() {
        let temp = tempfile::tempdir().unwrap();
        let config =
            ServerConfig { corpus_dir: temp.path().join("docs"), ..ServerConfig::default() };

        let state = bootstrap(&config).await.unwrap();
        assert_eq!(state.retrieval.document_count().await, campus_rag::DEFAULT_CORPUS.len());
    }

    #[tokio::test]
    async fn bootstrap_rejects_invalid_top_k() {
        let temp = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            corpus_dir: temp.path().to_path_buf(),
            top_k: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(bootstrap(&config).await, Err(RagError::Config(_))));
    }

    #[test]
    fn parses_chunking_flags() {
        let config = ServerConfig::parse_from([
            "campus-server",
            "--chunk-size",
            "800",
            "--chunk-overlap",
            "100",
            "--chat-top-k",
            "4",
        ]);
        assert_eq!((config.chunk_size, config.chunk_overlap, config.chat_top_k), (800, 100, 4));
    }

    #[tokio::test]
    async fn bootstrap_applies_chunking_settings() {
        let temp = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            corpus_dir: temp.path().to_path_buf(),
            chat_top_k: 2,
            chunk_size: 800,
            chunk_overlap: 100,
            ..ServerConfig::default()
        };

        let state = bootstrap(&config).await.unwrap();
        assert_eq!(state.config.chat_top_k, 2);
        assert_eq!(state.config.chunk_size, 800);
        assert_eq!(state.config.chunk_overlap, 100);
    }

    #[tokio::test]
    async fn bootstrap_rejects_overlap_not_below_chunk_size() {
        let temp = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            corpus_dir: temp.path().to_path_buf(),
            chunk_size: 100,
            chunk_overlap: 100,
            ..ServerConfig::default()
        };
        assert!(matches!(bootstrap(&config).await, Err(RagError::Config(_))));
    }

    #[cfg(not(feature = "local"))]
    #[test]
    fn local_embedder_needs_feature() {
        let config = ServerConfig { embedder: EmbedderKind::Local, ..ServerConfig::default() };
        assert!(matches!(build_embedder(&config), Err(RagError::ModelLoad { .. })));
    }
}
