//! Mapping of failures onto HTTP responses.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use campus_rag::RagError;
use thiserror::Error;
use tracing::error;

use crate::protocol::ErrorBody;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid input; the message is returned to the caller.
    #[error("{0}")]
    BadRequest(String),

    /// Anything else. Logged in full, reported generically.
    #[error("Failed to process {operation}: {source}")]
    Internal {
        operation: &'static str,
        #[source]
        source: RagError,
    },
}

impl ApiError {
    pub fn internal(operation: &'static str, source: RagError) -> Self {
        Self::Internal { operation, source }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::Internal { operation, source } => {
                error!(operation, error = %source, error_debug = ?source, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Failed to process {operation}"))
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}
