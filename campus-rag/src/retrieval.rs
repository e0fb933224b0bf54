//! The retrieval service: embedder, index and corpus composed behind one API.
//!
//! [`RetrievalService`] builds a corpus and its index together and swaps them
//! in as one immutable snapshot. Queries clone the current snapshot's `Arc`
//! and run without holding any lock, so a rebuild never exposes a
//! half-populated index.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use campus_rag::{HashEmbeddingProvider, RetrievalService};
//!
//! let service = RetrievalService::new(Arc::new(HashEmbeddingProvider::new(384)?));
//! service.load_dir("data/sample_documents").await?;
//! let results = service.search("admissions", 5).await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::corpus::CorpusStore;
use crate::document::{Document, MetadataFilter, RawDocument, SearchResult, matches_filter};
use crate::embedding::{EmbeddingProvider, embed_all};
use crate::error::{RagError, Result};
use crate::index::FlatL2Index;

/// Corpus and index built together; index position `i` describes `corpus.get(i)`.
#[derive(Debug)]
struct Snapshot {
    corpus: CorpusStore,
    index: FlatL2Index,
}

/// Summary of a completed build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Documents indexed.
    pub documents: usize,
    /// Embedding dimensionality of the index.
    pub dimensions: usize,
}

/// Semantic search over a single in-memory corpus.
pub struct RetrievalService {
    embedder: Arc<dyn EmbeddingProvider>,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
}

impl std::fmt::Debug for RetrievalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalService")
            .field("embedder", &self.embedder.name())
            .finish_non_exhaustive()
    }
}

impl RetrievalService {
    /// Create an unbuilt service. Queries return no results until a build succeeds.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { embedder, snapshot: RwLock::new(None) }
    }

    /// Return a reference to the embedding provider.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Replace the corpus and index with `documents`.
    ///
    /// Blank documents are dropped. On error the previous snapshot, if any,
    /// stays in service.
    ///
    /// # Errors
    ///
    /// - [`RagError::NoDocuments`] if nothing is left after filtering.
    /// - [`RagError::Embedding`] or [`RagError::DimensionMismatch`] if the
    ///   embedder fails or breaks its dimensionality contract.
    pub async fn build(&self, documents: Vec<RawDocument>) -> Result<BuildStats> {
        let corpus = CorpusStore::from_documents(documents)?;
        self.install(corpus).await
    }

    /// Load `*.txt` documents from `dir` and build from them.
    ///
    /// Writes the placeholder corpus if `dir` has no documents. Directory
    /// reads are synchronous; this is meant for startup.
    ///
    /// # Errors
    ///
    /// As [`CorpusStore::load_dir`] and [`RetrievalService::build`].
    pub async fn load_dir(&self, dir: impl AsRef<Path>) -> Result<BuildStats> {
        let corpus = CorpusStore::load_dir(dir)?;
        self.install(corpus).await
    }

    async fn install(&self, corpus: CorpusStore) -> Result<BuildStats> {
        info!(documents = corpus.len(), embedder = self.embedder.name(), "embedding corpus");
        let vectors = embed_all(self.embedder.as_ref(), &corpus.texts()).await?;
        let index = FlatL2Index::build(vectors)?;
        debug_assert_eq!(index.len(), corpus.len());

        let stats = BuildStats { documents: corpus.len(), dimensions: index.dimensions() };
        *self.snapshot.write().await = Some(Arc::new(Snapshot { corpus, index }));

        info!(documents = stats.documents, dimensions = stats.dimensions, "indexed corpus");
        Ok(stats)
    }

    async fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot.read().await.clone()
    }

    /// Return the `top_k` documents closest to `query`, most relevant first.
    ///
    /// `top_k` larger than the corpus returns every document. An unbuilt
    /// service returns an empty list and logs a warning.
    ///
    /// # Errors
    ///
    /// Propagates embedder failures. [`RagError::OutOfRange`] here would mean
    /// the index and corpus disagree.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let Some(snapshot) = self.current().await else {
            warn!("vector store not initialized, returning no results");
            return Ok(Vec::new());
        };

        let query_vector = embed_all(self.embedder.as_ref(), &[query]).await?.pop().ok_or_else(|| {
            RagError::Embedding {
                provider: self.embedder.name().to_string(),
                message: "no vector returned for query".to_string(),
            }
        })?;

        let neighbors = snapshot.index.knn(&query_vector, top_k)?;
        let results = neighbors
            .into_iter()
            .enumerate()
            .map(|(rank, neighbor)| -> Result<SearchResult> {
                let document = snapshot.corpus.get(neighbor.position)?.clone();
                Ok(SearchResult { document, distance: neighbor.distance, rank })
            })
            .collect::<Result<Vec<_>>>()?;

        let preview: String = query.chars().take(50).collect();
        debug!(query = %preview, top_k, result_count = results.len(), "search completed");
        Ok(results)
    }

    /// Search, then keep only results whose metadata contains every pair in `filter`.
    ///
    /// Filtering happens after the top-k cut, so fewer than `top_k` results may
    /// come back. Ranks are renumbered from zero over the kept results.
    ///
    /// # Errors
    ///
    /// As [`RetrievalService::search`].
    pub async fn search_with_filters(
        &self,
        query: &str,
        top_k: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        let results = self.search(query, top_k).await?;
        if filter.is_empty() {
            return Ok(results);
        }

        Ok(results
            .into_iter()
            .filter(|r| matches_filter(&r.document, filter))
            .enumerate()
            .map(|(rank, r)| SearchResult { rank, ..r })
            .collect())
    }

    /// Document at corpus `position` in the current snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::OutOfRange`] for invalid positions, including any
    /// position on an unbuilt service.
    pub async fn document(&self, position: usize) -> Result<Document> {
        match self.current().await {
            Some(snapshot) => snapshot.corpus.get(position).cloned(),
            None => Err(RagError::OutOfRange { position, len: 0 }),
        }
    }

    /// Whether a build has completed.
    pub async fn is_ready(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    /// Documents in the current snapshot, zero when unbuilt.
    pub async fn document_count(&self) -> usize {
        self.current().await.map_or(0, |s| s.corpus.len())
    }

    /// Index dimensionality, `None` when unbuilt.
    pub async fn dimensions(&self) -> Option<usize> {
        self.current().await.map(|s| s.index.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashEmbeddingProvider;

    fn service() -> RetrievalService {
        RetrievalService::new(Arc::new(HashEmbeddingProvider::new(64).unwrap()))
    }

    #[tokio::test]
    async fn unbuilt_service_returns_nothing() {
        let service = service();
        assert!(!service.is_ready().await);
        assert!(service.search("admissions", 5).await.unwrap().is_empty());
        assert_eq!(service.document_count().await, 0);
        assert!(matches!(service.document(0).await, Err(RagError::OutOfRange { .. })));
    }

    #[tokio::test]
    async fn failed_rebuild_keeps_previous_snapshot() {
        let service = service();
        service.build(vec![RawDocument::new("Housing office")]).await.unwrap();

        let err = service.build(vec![RawDocument::new("  ")]).await.unwrap_err();
        assert!(matches!(err, RagError::NoDocuments { .. }));
        assert_eq!(service.document_count().await, 1);
    }

    #[tokio::test]
    async fn ranks_are_sequential() {
        let service = service();
        service
            .build(["alpha", "beta", "gamma"].into_iter().map(RawDocument::new).collect())
            .await
            .unwrap();

        let results = service.search("alpha", 3).await.unwrap();
        assert_eq!(results.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(results[0].document.text, "alpha");
        assert_eq!(results[0].distance, 0.0);
    }
}
