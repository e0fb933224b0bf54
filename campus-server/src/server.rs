use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
    routing::{get, post},
};
use campus_rag::{
    AnswerComposer, Chunker, RagConfig, RagError, RawDocument, RecursiveChunker, RetrievalService,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    config::{ServerConfig, bootstrap},
    error::ApiError,
    protocol::{
        ChatRequest, ChatResponse, HealthResponse, IndexRequest, IndexResponse, SearchHit,
        SearchRequest, SearchResponse, context_line, validate_max_tokens, validate_query,
        validate_top_k,
    },
};

/// Services shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub retrieval: Arc<RetrievalService>,
    pub composer: Arc<dyn AnswerComposer>,
    pub config: Arc<RagConfig>,
}

impl AppState {
    pub fn new(
        retrieval: Arc<RetrievalService>,
        composer: Arc<dyn AnswerComposer>,
        config: RagConfig,
    ) -> Self {
        Self { retrieval, composer, config: Arc::new(config) }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("retrieval", &self.retrieval)
            .field("composer", &self.composer.name())
            .field("config", &self.config)
            .finish()
    }
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/search", post(search))
        .route("/chat", post(chat))
        .route("/index", post(index_documents))
}

/// Routes are served at the root and again under `/api`.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .merge(api_routes())
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let state = bootstrap(&config).await.context("failed to initialize retrieval service")?;
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for campus-server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("campus-server listening on http://{}", addr);
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Campus Assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "health": "/health",
    }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        ready: state.retrieval.is_ready().await,
        documents: state.retrieval.document_count().await,
    })
}

async fn search(
    State(state): State<AppState>,
    request: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(request) = request?;
    let query = validate_query(&request.query)?;
    let top_k = validate_top_k(request.top_k, state.config.top_k, state.config.max_top_k)?;

    let results = state
        .retrieval
        .search_with_filters(query, top_k, &request.filters)
        .await
        .map_err(|e| ApiError::internal("search query", e))?;

    let results: Vec<SearchHit> = results.into_iter().map(SearchHit::from).collect();
    Ok(Json(SearchResponse { total: results.len(), results }))
}

async fn chat(
    State(state): State<AppState>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = request?;
    let query = validate_query(&request.query)?;
    let max_tokens = validate_max_tokens(request.max_tokens)?;

    let results = state
        .retrieval
        .search(query, state.config.chat_top_k)
        .await
        .map_err(|e| ApiError::internal("chat query", e))?;

    let context: Vec<String> = results.iter().map(|r| context_line(&r.document.text)).collect();
    let context_refs: Vec<&str> = context.iter().map(String::as_str).collect();
    let response = state
        .composer
        .compose(query, &context_refs, max_tokens)
        .await
        .map_err(|e| ApiError::internal("chat query", e))?;

    let preview: String = query.chars().take(50).collect();
    info!(
        query = %preview,
        sources = results.len(),
        composer = state.composer.name(),
        "chat query processed"
    );

    let sources = results.into_iter().map(|r| r.document.text).collect();
    Ok(Json(ChatResponse { response, sources }))
}

/// Replace the whole corpus with the posted documents, chunked.
async fn index_documents(
    State(state): State<AppState>,
    request: Result<Json<IndexRequest>, JsonRejection>,
) -> Result<Json<IndexResponse>, ApiError> {
    let Json(request) = request?;
    if request.documents.is_empty() {
        return Err(ApiError::BadRequest("Documents are required".to_string()));
    }

    let chunker = RecursiveChunker::new(state.config.chunk_size, state.config.chunk_overlap)
        .map_err(|e| ApiError::internal("index request", e))?;
    let documents = request.documents.len();
    let chunks: Vec<RawDocument> = request
        .documents
        .into_iter()
        .flat_map(|doc| {
            let raw = RawDocument {
                id: Some(doc.id),
                text: doc.content,
                metadata: doc.metadata,
                source_uri: None,
            };
            chunker.chunk(&raw)
        })
        .collect();

    let stats = state.retrieval.build(chunks).await.map_err(|e| match e {
        RagError::NoDocuments { .. } => {
            ApiError::BadRequest("Documents contain no indexable text".to_string())
        }
        e => ApiError::internal("index request", e),
    })?;

    info!(documents, chunks = stats.documents, "reindexed corpus");
    Ok(Json(IndexResponse {
        message: "Documents indexed successfully".to_string(),
        documents,
        chunks: stats.documents,
    }))
}
