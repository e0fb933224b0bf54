//! Error types for the `campus-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or querying the retrieval index.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding model could not be loaded or configured.
    #[error("Model load error ({provider}): {message}")]
    ModelLoad {
        /// The embedding provider that failed to initialise.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// Inference failed on well-formed input.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector did not have the dimensionality of the index it was used with.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the index (or of the first vector of a build).
        expected: usize,
        /// Dimensionality of the offending vector.
        actual: usize,
    },

    /// An index build was attempted with zero vectors.
    #[error("Cannot build an index from zero vectors")]
    EmptyIndex,

    /// The corpus holds no non-blank documents after filtering.
    #[error("No documents loaded from {source_name} - cannot index")]
    NoDocuments {
        /// Where the documents were expected to come from.
        source_name: String,
    },

    /// A corpus position outside `0..len` was requested.
    #[error("Position {position} out of range for corpus of {len} documents")]
    OutOfRange {
        /// The requested position.
        position: usize,
        /// The corpus size.
        len: usize,
    },

    /// A filesystem operation on the corpus directory failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The answer composer failed to produce a response.
    #[error("Composer error ({composer}): {message}")]
    Composer {
        /// The composer that produced the error.
        composer: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
