//! Splitting long documents into index-sized chunks.
//!
//! Chunks are themselves [`RawDocument`]s, so the corpus treats every chunk
//! as one document and the one-vector-per-document invariant is kept.

use crate::document::RawDocument;
use crate::error::{RagError, Result};

/// Separators tried in order: paragraphs, lines, sentences, words.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// A strategy for splitting documents into chunks.
pub trait Chunker: Send + Sync {
    /// Split a document. Blank documents produce no chunks.
    fn chunk(&self, document: &RawDocument) -> Vec<RawDocument>;
}

/// Splits hierarchically by paragraph, line, sentence and word, then merges
/// the pieces back up to `chunk_size` characters.
///
/// Consecutive chunks share up to `chunk_overlap` trailing characters of the
/// previous chunk. Sizes are counted in characters, never splitting a UTF-8
/// code point. Each chunk inherits the parent's metadata plus `doc_id` and
/// `chunk_index`, and is named `{doc_id}_chunk_{i}`.
///
/// # Example
///
/// ```rust,ignore
/// use campus_rag::{Chunker, RawDocument, RecursiveChunker};
///
/// let chunker = RecursiveChunker::new(500, 50)?;
/// let chunks = chunker.chunk(&RawDocument::new(long_text).with_id("handbook"));
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a chunker.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let mut pieces = Vec::new();
        self.split_recursive(text, &SEPARATORS, &mut pieces);
        self.merge(pieces)
    }

    fn split_recursive<'a>(&self, text: &'a str, separators: &[&str], out: &mut Vec<&'a str>) {
        if char_len(text) <= self.chunk_size {
            out.push(text);
            return;
        }
        let Some((separator, rest)) = separators.split_first() else {
            out.extend(split_by_chars(text, self.chunk_size));
            return;
        };

        for segment in text.split_inclusive(separator) {
            if char_len(segment) <= self.chunk_size {
                out.push(segment);
            } else {
                self.split_recursive(segment, rest, out);
            }
        }
    }

    fn merge(&self, pieces: Vec<&str>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for piece in pieces {
            if char_len(&current) + char_len(piece) <= self.chunk_size {
                current.push_str(piece);
                continue;
            }

            let overlap = tail_chars(&current, self.chunk_overlap).to_string();
            push_trimmed(&mut chunks, &current);
            current = if char_len(&overlap) + char_len(piece) <= self.chunk_size {
                overlap + piece
            } else {
                piece.to_string()
            };
        }
        push_trimmed(&mut chunks, &current);
        chunks
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self { chunk_size: 500, chunk_overlap: 50 }
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &RawDocument) -> Vec<RawDocument> {
        let doc_id = document.id.clone().unwrap_or_else(|| "doc".to_string());

        self.split_text(&document.text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, text)| {
                let mut metadata = document.metadata.clone();
                metadata.insert("doc_id".to_string(), doc_id.clone());
                metadata.insert("chunk_index".to_string(), chunk_index.to_string());
                RawDocument {
                    id: Some(format!("{doc_id}_chunk_{chunk_index}")),
                    text,
                    metadata,
                    source_uri: document.source_uri.clone(),
                }
            })
            .collect()
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

/// The last `n` characters of `text`.
fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((start, _)) => &text[start..],
        None => text,
    }
}

fn split_by_chars(text: &str, size: usize) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == size {
            out.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        assert!(RecursiveChunker::new(10, 10).is_err());
        assert!(RecursiveChunker::new(0, 0).is_err());
        assert!(RecursiveChunker::new(10, 9).is_ok());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunker = RecursiveChunker::default();
        assert_eq!(chunker.split_text("  Tuition is $45,000.  "), vec!["Tuition is $45,000."]);
    }

    #[test]
    fn blank_text_has_no_chunks() {
        let chunker = RecursiveChunker::default();
        assert!(chunker.chunk(&RawDocument::new("   ")).is_empty());
    }

    #[test]
    fn chunks_respect_size_limit() {
        let chunker = RecursiveChunker::new(40, 10).unwrap();
        let text = "Admissions open in fall. Apply online early.\n\nHousing is on campus. \
                    Meal plans vary by residence hall and student preference.";
        let chunks = chunker.split_text(text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40), "{chunks:?}");
    }

    #[test]
    fn long_words_are_split_on_char_boundaries() {
        let chunker = RecursiveChunker::new(4, 1).unwrap();
        let chunks = chunker.split_text("ééééééééé");
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
        assert!(chunks.concat().chars().filter(|c| *c == 'é').count() >= 9);
    }

    #[test]
    fn chunk_metadata_names_parent() {
        let chunker = RecursiveChunker::new(20, 5).unwrap();
        let doc = RawDocument::new("one two three four five six seven eight nine ten")
            .with_id("faq")
            .with_tag("lang", "en");
        let chunks = chunker.chunk(&doc);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.id.as_deref(), Some(format!("faq_chunk_{i}").as_str()));
            assert_eq!(chunk.metadata.get("doc_id").map(String::as_str), Some("faq"));
            assert_eq!(chunk.metadata.get("chunk_index"), Some(&i.to_string()));
            assert_eq!(chunk.metadata.get("lang").map(String::as_str), Some("en"));
        }
    }

    #[test]
    fn tail_chars_counts_characters() {
        assert_eq!(tail_chars("héllo", 3), "llo");
        assert_eq!(tail_chars("hi", 5), "hi");
        assert_eq!(tail_chars("hi", 0), "");
    }
}
