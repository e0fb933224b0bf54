//! Data types for documents and search results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key-value tags attached to a document (source file, `doc_id`, free-form labels).
///
/// A `BTreeMap` keeps serialization order stable.
pub type Metadata = BTreeMap<String, String>;

/// Unvalidated loader input. Blank texts are dropped when the corpus is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawDocument {
    /// Identifier to keep. `None` assigns `doc-{position}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The text content as read from the source.
    pub text: String,
    /// Tags carried through to the stored [`Document`].
    #[serde(default)]
    pub metadata: Metadata,
    /// Where the text came from, usually a file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl RawDocument {
    /// A document with text only.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    /// Set the identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add one metadata tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// An immutable unit of indexed text.
///
/// Identified inside the index by its corpus position; `id` is the stable
/// name exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Identifier, unique within a corpus build.
    pub id: String,
    /// Trimmed, non-empty text.
    pub text: String,
    /// Tags associated with the document.
    pub metadata: Metadata,
    /// Optional URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Look up a metadata tag.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

/// A retrieved [`Document`] with its distance and rank.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved document.
    pub document: Document,
    /// Squared L2 distance to the query (lower is more relevant).
    pub distance: f32,
    /// 0-based position in ascending-distance order.
    pub rank: usize,
}

impl SearchResult {
    /// Display score in `[0, 1]`, monotonically decreasing in distance.
    ///
    /// A NaN distance scores `0.0`.
    pub fn relevance(&self) -> f32 {
        if self.distance.is_nan() {
            return 0.0;
        }
        1.0 / (1.0 + self.distance.max(0.0))
    }
}

/// Exact-match metadata filter: every pair must be present on a result.
pub type MetadataFilter = BTreeMap<String, String>;

pub(crate) fn matches_filter(document: &Document, filter: &MetadataFilter) -> bool {
    filter.iter().all(|(key, value)| document.tag(key) == Some(value.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(tags: &[(&str, &str)]) -> Document {
        Document {
            id: "d".into(),
            text: "text".into(),
            metadata: tags.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            source_uri: None,
        }
    }

    #[test]
    fn relevance_is_one_at_zero_distance_and_decreases() {
        let near = SearchResult { document: doc(&[]), distance: 0.0, rank: 0 };
        let far = SearchResult { document: doc(&[]), distance: 3.0, rank: 1 };
        assert_eq!(near.relevance(), 1.0);
        assert!(far.relevance() < near.relevance());
        assert!(far.relevance() > 0.0);
    }

    #[test]
    fn nan_distance_has_zero_relevance() {
        let broken = SearchResult { document: doc(&[]), distance: f32::NAN, rank: 0 };
        assert_eq!(broken.relevance(), 0.0);
    }

    #[test]
    fn filter_requires_every_pair() {
        let d = doc(&[("doc_id", "a"), ("lang", "en")]);
        let mut filter = MetadataFilter::new();
        assert!(matches_filter(&d, &filter));
        filter.insert("doc_id".into(), "a".into());
        assert!(matches_filter(&d, &filter));
        filter.insert("lang".into(), "fr".into());
        assert!(!matches_filter(&d, &filter));
    }

    #[test]
    fn missing_tag_is_none() {
        assert_eq!(doc(&[]).tag("doc_id"), None);
    }
}
