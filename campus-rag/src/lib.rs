//! Semantic retrieval core for the campus assistant.
//!
//! Turns a document collection into an exact L2 nearest-neighbour index and
//! answers top-k queries against it:
//!
//! - [`EmbeddingProvider`] maps text to fixed-dimension vectors
//!   ([`HashEmbeddingProvider`] always, `FastEmbedProvider` with the `local`
//!   feature, OpenAI with the `openai` feature).
//! - [`FlatL2Index`] is the brute-force index, ordered by squared distance
//!   with ties broken by position.
//! - [`CorpusStore`] maps index positions to [`Document`]s and loads `.txt`
//!   directories, writing a placeholder corpus when one is empty.
//! - [`RetrievalService`] composes the three and swaps rebuilt snapshots in
//!   atomically.
//! - [`AnswerComposer`] turns retrieved passages into an answer.
//!
//! # Features
//!
//! - `local`: in-process sentence embeddings through `fastembed`.
//! - `openai`: OpenAI embeddings and chat completions through `reqwest`.

pub mod chunking;
pub mod composer;
pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod hashing;
pub mod index;
pub mod retrieval;

#[cfg(feature = "local")]
pub mod local;
#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, RecursiveChunker};
pub use composer::{AnswerComposer, ExtractiveComposer};
pub use config::{RagConfig, RagConfigBuilder};
pub use corpus::{CorpusStore, DEFAULT_CORPUS, discover_text_files, ensure_default_corpus};
pub use document::{Document, Metadata, MetadataFilter, RawDocument, SearchResult};
pub use embedding::{EmbeddingProvider, embed_all};
pub use error::{RagError, Result};
pub use hashing::HashEmbeddingProvider;
pub use index::{FlatL2Index, Neighbor, squared_l2};
pub use retrieval::{BuildStats, RetrievalService};

#[cfg(feature = "local")]
pub use local::FastEmbedProvider;
#[cfg(feature = "openai")]
pub use openai::{OpenAIChatComposer, OpenAIEmbeddingProvider};
