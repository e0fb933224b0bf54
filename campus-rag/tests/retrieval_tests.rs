//! End-to-end retrieval tests over the placeholder and hand-built corpora.

use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use campus_rag::{
    CorpusStore, DEFAULT_CORPUS, EmbeddingProvider, HashEmbeddingProvider, MetadataFilter, RagError,
    RawDocument, RetrievalService,
};

fn hash_service() -> RetrievalService {
    RetrievalService::new(Arc::new(HashEmbeddingProvider::new(384).unwrap()))
}

/// Maps each text to a fixed point on a line, so distances are predictable.
struct LineEmbedder;

#[async_trait]
impl EmbeddingProvider for LineEmbedder {
    async fn embed(&self, text: &str) -> campus_rag::Result<Vec<f32>> {
        let x = text.trim().parse::<f32>().unwrap_or(0.0);
        Ok(vec![x, 0.0])
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "Line"
    }
}

/// Claims one dimensionality and returns another.
struct LyingEmbedder;

#[async_trait]
impl EmbeddingProvider for LyingEmbedder {
    async fn embed(&self, text: &str) -> campus_rag::Result<Vec<f32>> {
        Ok(vec![0.0; text.len().max(1)])
    }

    fn dimensions(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "Lying"
    }
}

/// Embeds like [`LineEmbedder`] until switched off, then fails every call.
#[derive(Default)]
struct FlakyEmbedder {
    down: AtomicBool,
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed(&self, text: &str) -> campus_rag::Result<Vec<f32>> {
        if self.down.load(Ordering::SeqCst) {
            return Err(RagError::Embedding {
                provider: "Flaky".into(),
                message: "backend unavailable".into(),
            });
        }
        LineEmbedder.embed(text).await
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn name(&self) -> &str {
        "Flaky"
    }
}

#[tokio::test]
async fn search_maps_positions_back_to_documents() {
    let service = RetrievalService::new(Arc::new(LineEmbedder));
    service
        .build(["0", "1", "5", "10"].into_iter().map(RawDocument::new).collect())
        .await
        .unwrap();

    let results = service.search("0", 2).await.unwrap();
    let texts: Vec<_> = results.iter().map(|r| r.document.text.as_str()).collect();
    assert_eq!(texts, vec!["0", "1"]);
    assert_eq!(results.iter().map(|r| r.distance).collect::<Vec<_>>(), vec![0.0, 1.0]);
    assert_eq!(results.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![0, 1]);
}

#[tokio::test]
async fn top_k_beyond_corpus_returns_everything() {
    let service = hash_service();
    service.build(DEFAULT_CORPUS.iter().map(|t| RawDocument::new(*t)).collect()).await.unwrap();

    let results = service.search("campus", 100).await.unwrap();
    assert_eq!(results.len(), DEFAULT_CORPUS.len());
}

#[tokio::test]
async fn repeated_searches_are_identical() {
    let service = hash_service();
    service.build(DEFAULT_CORPUS.iter().map(|t| RawDocument::new(*t)).collect()).await.unwrap();

    let first = service.search("admissions", 5).await.unwrap();
    let second = service.search("admissions", 5).await.unwrap();
    assert_eq!(first, second);
    assert!(first[0].document.text.starts_with("Admissions"));
}

#[tokio::test]
async fn never_built_service_degrades_to_empty() {
    let service = hash_service();
    assert!(service.search("admissions", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn fallback_corpus_is_reproducible() {
    let first_dir = tempfile::tempdir().unwrap();
    let second_dir = tempfile::tempdir().unwrap();

    let first = CorpusStore::load_dir(first_dir.path().join("docs")).unwrap();
    let second = CorpusStore::load_dir(second_dir.path().join("docs")).unwrap();

    assert_eq!(first.len(), DEFAULT_CORPUS.len());
    assert_eq!(first.len(), second.len());
    let first_texts: Vec<_> = first.iter().map(|d| d.text.clone()).collect();
    let second_texts: Vec<_> = second.iter().map(|d| d.text.clone()).collect();
    assert_eq!(first_texts, second_texts);
}

#[tokio::test]
async fn stored_text_round_trips_by_position() {
    let temp = tempfile::tempdir().unwrap();
    let text = "Library: open 24/7 during finals. Café on the ground floor.";
    fs::write(temp.path().join("library.txt"), text).unwrap();

    let service = hash_service();
    let stats = service.load_dir(temp.path()).await.unwrap();
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.dimensions, 384);

    let document = service.document(0).await.unwrap();
    assert_eq!(document.text.as_bytes(), text.as_bytes());
    assert_eq!(document.id, "library");
}

#[tokio::test]
async fn embedder_dimension_violations_fail_the_build() {
    let service = RetrievalService::new(Arc::new(LyingEmbedder));
    let err = service.build(vec![RawDocument::new("hello")]).await.unwrap_err();
    assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 5 }));
    assert!(!service.is_ready().await);
}

#[tokio::test]
async fn query_embedding_failures_propagate() {
    let embedder = Arc::new(FlakyEmbedder::default());
    let service = RetrievalService::new(Arc::clone(&embedder) as Arc<dyn EmbeddingProvider>);
    service.build(["0", "1"].into_iter().map(RawDocument::new).collect()).await.unwrap();

    embedder.down.store(true, Ordering::SeqCst);
    let err = service.search("0", 2).await.unwrap_err();
    assert!(matches!(err, RagError::Embedding { ref provider, .. } if provider == "Flaky"));

    let filtered = service.search_with_filters("0", 2, &MetadataFilter::new()).await;
    assert!(matches!(filtered, Err(RagError::Embedding { .. })));
    assert_eq!(service.document_count().await, 2);
}

#[tokio::test]
async fn empty_query_is_an_ordinary_input() {
    let service = hash_service();
    service.build(vec![RawDocument::new("Housing"), RawDocument::new("Tuition")]).await.unwrap();

    // The empty text embeds to the zero vector, one unit away from every document.
    let results = service.search("", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| (r.distance - 1.0).abs() < 1e-4));
}

#[tokio::test]
async fn filters_keep_matching_metadata_only() {
    let service = hash_service();
    service
        .build(vec![
            RawDocument::new("Housing office hours").with_tag("doc_id", "housing"),
            RawDocument::new("Housing applications").with_tag("doc_id", "admissions"),
            RawDocument::new("Tuition and fees").with_tag("doc_id", "finance"),
        ])
        .await
        .unwrap();

    let filter: MetadataFilter =
        [("doc_id".to_string(), "admissions".to_string())].into_iter().collect();
    let results = service.search_with_filters("housing", 3, &filter).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document.tag("doc_id"), Some("admissions"));
    assert_eq!(results[0].rank, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_see_whole_snapshots_during_rebuilds() {
    let service = Arc::new(hash_service());
    service.build(vec![RawDocument::new("old corpus")]).await.unwrap();

    let writer = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            for round in 0..20 {
                let docs = (0..5)
                    .map(|i| RawDocument::new(format!("new corpus {round} {i}")))
                    .collect();
                service.build(docs).await.unwrap();
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let service = Arc::clone(&service);
        readers.push(tokio::spawn(async move {
            for _ in 0..50 {
                let results = service.search("corpus", 10).await.unwrap();
                let len = results.len();
                assert!(len == 1 || len == 5, "partial snapshot: {len}");
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(service.document_count().await, 5);
}
