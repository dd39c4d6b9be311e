//! Core data types for stored documents and retrieval results.

use serde::{Deserialize, Serialize};

/// Metadata stored alongside every document chunk.
///
/// `title` identifies the source document (chunk ids are derived from it),
/// `source` is the URL or location the content was taken from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub source: String,
}

impl DocumentMetadata {
    /// Creates metadata from a title and source.
    pub fn new(title: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: source.into(),
        }
    }
}

/// A document chunk as persisted in the vector store.
#[derive(Debug, Clone)]
pub struct StoredDocument {
    /// Unique chunk id of the form `{title}-{index}`.
    pub id: String,
    /// The chunk text.
    pub content: String,
    /// Title and source of the originating document.
    pub metadata: DocumentMetadata,
    /// RFC 3339 timestamp of the last upsert.
    pub updated_at: String,
}

/// Raw result of a multi-query nearest-neighbor search.
///
/// One inner list per input query, inner order is descending similarity.
/// The three fields are aligned: `documents[i][j]` and `metadatas[i][j]`
/// belong to `ids[i][j]`.
#[derive(Debug, Clone, Default)]
pub struct StoreQueryResult {
    pub ids: Vec<Vec<String>>,
    pub documents: Vec<Vec<String>>,
    pub metadatas: Vec<Vec<DocumentMetadata>>,
}

/// Deduplicated retrieval result handed to prompt assembly.
///
/// The three sequences are aligned by position and contain each document
/// id exactly once, in first-seen order across the rewritten queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedInformation {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadatas: Vec<DocumentMetadata>,
}

impl RetrievedInformation {
    /// Returns the number of retrieved documents.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true when nothing was retrieved. An empty result is valid,
    /// not an error.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
