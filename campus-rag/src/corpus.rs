//! Corpus storage: position-addressed documents and `.txt` directory loading.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::document::{Document, RawDocument};
use crate::error::{RagError, Result};

/// Placeholder corpus written when the corpus directory has no documents.
pub const DEFAULT_CORPUS: [&str; 8] = [
    "Admissions: Apply online at admissions.university.edu. Require SAT/ACT scores, GPA 3.5+, and essays.",
    "Tuition: Annual tuition is $45,000. Financial aid and scholarships available for qualified students.",
    "Academic Programs: BS Computer Science, MS Data Science, MBA, PhD Engineering, and more.",
    "Campus Life: 200-acre downtown campus with modern facilities, 24/7 library, student center.",
    "Student Life: 200+ clubs, sports teams, research opportunities, internships, and mentorship programs.",
    "Housing: On-campus and off-campus housing available. Housing office at housing@university.edu.",
    "Career Services: Resume reviews, interview prep, job fairs, internship placements, and alumni network.",
    "Research: Cutting-edge labs in AI, robotics, biotechnology, and renewable energy research.",
];

/// Immutable, position-addressed document collection.
///
/// Position `i` is the document described by vector `i` of the index built
/// alongside it.
#[derive(Debug, Clone)]
pub struct CorpusStore {
    documents: Vec<Document>,
}

impl CorpusStore {
    /// Build a store from raw documents, dropping blank ones.
    ///
    /// Texts are trimmed. Documents without an id get `doc-{position}`, where
    /// position is the document's index in the finished store.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::NoDocuments`] if nothing survives filtering.
    pub fn from_documents(raw: Vec<RawDocument>) -> Result<Self> {
        Self::collect(raw, "in-memory documents")
    }

    fn collect(raw: Vec<RawDocument>, source_name: &str) -> Result<Self> {
        let total = raw.len();
        let mut documents = Vec::with_capacity(total);
        for doc in raw {
            let text = doc.text.trim();
            if text.is_empty() {
                continue;
            }
            let position = documents.len();
            documents.push(Document {
                id: doc.id.unwrap_or_else(|| format!("doc-{position}")),
                text: text.to_string(),
                metadata: doc.metadata,
                source_uri: doc.source_uri,
            });
        }

        if documents.is_empty() {
            return Err(RagError::NoDocuments { source_name: source_name.to_string() });
        }
        if documents.len() < total {
            debug!(dropped = total - documents.len(), "skipped blank documents");
        }
        Ok(Self { documents })
    }

    /// Load every `*.txt` file directly inside `dir`, in file-name order.
    ///
    /// Writes the placeholder corpus first if the directory has no documents
    /// (see [`ensure_default_corpus`]). Files that cannot be read as UTF-8 are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// - [`RagError::Io`] if the directory cannot be created or listed.
    /// - [`RagError::NoDocuments`] if every file is blank or unreadable.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if ensure_default_corpus(dir)? {
            info!(dir = %dir.display(), count = DEFAULT_CORPUS.len(), "created placeholder corpus");
        }

        let mut raw = Vec::new();
        for path in discover_text_files(dir)? {
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to read document");
                    continue;
                }
            };
            let file_name =
                path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned());
            raw.push(RawDocument {
                id: stem,
                text,
                metadata: [("source".to_string(), file_name)].into_iter().collect(),
                source_uri: Some(path.display().to_string()),
            });
        }

        let store = Self::collect(raw, &dir.display().to_string())?;
        info!(dir = %dir.display(), documents = store.len(), "loaded corpus");
        Ok(store)
    }

    /// Document at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::OutOfRange`] for positions outside `0..len()`.
    pub fn get(&self, position: usize) -> Result<&Document> {
        let len = self.documents.len();
        self.documents.get(position).ok_or(RagError::OutOfRange { position, len })
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Always `false` for a successfully built store.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents in position order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    /// Document texts in position order, ready for batch embedding.
    pub fn texts(&self) -> Vec<&str> {
        self.documents.iter().map(|d| d.text.as_str()).collect()
    }
}

/// `*.txt` files directly inside `dir`, sorted by path.
///
/// A missing directory yields an empty list.
pub fn discover_text_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Ok(Vec::new());
    }
    if !dir.is_dir() {
        return Err(RagError::io(dir, std::io::Error::other("corpus path is not a directory")));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            RagError::io(path, e.into())
        })?;
        let is_text = entry.path().extension().is_some_and(|ext| ext == "txt");
        if entry.file_type().is_file() && is_text {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Write [`DEFAULT_CORPUS`] into `dir` when it holds no `*.txt` files.
///
/// Creates `dir` if needed. Files are named `document_{i}.txt`; an existing
/// entry with one of those names is never overwritten. Returns whether
/// anything was written. A directory that already has documents is left
/// untouched.
///
/// # Errors
///
/// Returns [`RagError::Io`] if the directory or a file cannot be written.
pub fn ensure_default_corpus(dir: impl AsRef<Path>) -> Result<bool> {
    let dir = dir.as_ref();
    if !discover_text_files(dir)?.is_empty() {
        return Ok(false);
    }

    warn!(dir = %dir.display(), "no .txt files found, creating defaults");
    fs::create_dir_all(dir).map_err(|e| RagError::io(dir, e))?;
    let mut written = false;
    for (i, sample) in DEFAULT_CORPUS.iter().enumerate() {
        let path = dir.join(format!("document_{i}.txt"));
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!(path = %path.display(), "placeholder name already taken, skipping");
                continue;
            }
            Err(e) => return Err(RagError::io(&path, e)),
        };
        file.write_all(sample.as_bytes()).map_err(|e| RagError::io(&path, e))?;
        debug!(path = %path.display(), "wrote placeholder document");
        written = true;
    }
    Ok(written)
}
