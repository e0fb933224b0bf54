//! Request and response bodies for the HTTP API.

use campus_rag::{Metadata, MetadataFilter, SearchResult};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const MAX_QUERY_CHARS: usize = 1000;
pub const MIN_CHAT_TOKENS: usize = 50;
pub const MAX_CHAT_TOKENS: usize = 2048;
pub const DEFAULT_CHAT_TOKENS: usize = 512;

/// Characters of each passage quoted into chat context.
pub const CONTEXT_SNIPPET_CHARS: usize = 100;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub filters: MetadataFilter,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SearchHit {
    pub document: String,
    pub relevance: f32,
    pub id: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl From<SearchResult> for SearchHit {
    fn from(result: SearchResult) -> Self {
        let relevance = result.relevance();
        Self {
            document: result.document.text,
            relevance,
            id: result.document.id,
            metadata: result.document.metadata,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub total: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub max_tokens: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexDocument {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexRequest {
    #[serde(default)]
    pub documents: Vec<IndexDocument>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexResponse {
    pub message: String,
    pub documents: usize,
    pub chunks: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub ready: bool,
    pub documents: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Trimmed query, rejecting blank and over-long input.
pub fn validate_query(query: &str) -> Result<&str, ApiError> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(ApiError::BadRequest("Query cannot be empty".to_string()));
    }
    if query.chars().count() > MAX_QUERY_CHARS {
        return Err(ApiError::BadRequest(format!(
            "Query must be at most {MAX_QUERY_CHARS} characters"
        )));
    }
    Ok(trimmed)
}

pub fn validate_top_k(top_k: Option<usize>, default: usize, max: usize) -> Result<usize, ApiError> {
    match top_k.unwrap_or(default) {
        k if (1..=max).contains(&k) => Ok(k),
        k => Err(ApiError::BadRequest(format!("top_k must be between 1 and {max}, got {k}"))),
    }
}

pub fn validate_max_tokens(max_tokens: Option<usize>) -> Result<usize, ApiError> {
    match max_tokens.unwrap_or(DEFAULT_CHAT_TOKENS) {
        n if (MIN_CHAT_TOKENS..=MAX_CHAT_TOKENS).contains(&n) => Ok(n),
        n => Err(ApiError::BadRequest(format!(
            "max_tokens must be between {MIN_CHAT_TOKENS} and {MAX_CHAT_TOKENS}, got {n}"
        ))),
    }
}

/// `- {first 100 chars}` context line for one retrieved passage.
pub fn context_line(text: &str) -> String {
    let snippet: String = text.chars().take(CONTEXT_SNIPPET_CHARS).collect();
    format!("- {snippet}")
}
