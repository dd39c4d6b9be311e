//! rusqlite-backed vector store.
//!
//! Document chunks are persisted with their embedding vectors as BLOBs and
//! nearest neighbors are answered by a cosine-similarity scan over the
//! stored corpus. The store owns an [`EmbeddingFunction`] and embeds text
//! implicitly on both the upsert and the query path, so callers only ever
//! hand it plain strings.

use std::cmp::Ordering;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, params};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::embedding::{EmbeddingFunction, InputType};
use crate::models::{DocumentMetadata, StoreQueryResult, StoredDocument};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    title TEXT NOT NULL,
    source TEXT NOT NULL,
    embedding BLOB NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_documents_title ON documents(title);
";

/// Vector store wrapper providing connection management, schema
/// initialization, and embedding-backed document operations.
pub struct VectorStore {
    conn: Connection,
    embedder: Box<dyn EmbeddingFunction>,
}

impl VectorStore {
    /// Opens an in-memory store.
    ///
    /// Automatically initializes the schema on connection open.
    pub fn in_memory(embedder: Box<dyn EmbeddingFunction>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn, embedder };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Opens a file-based store at the given path.
    ///
    /// Creates the database file if it does not exist.
    /// Automatically initializes the schema on connection open.
    pub fn open(path: impl AsRef<Path>, embedder: Box<dyn EmbeddingFunction>) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn, embedder };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initializes the store schema.
    ///
    /// Uses IF NOT EXISTS throughout, so the call is idempotent on both
    /// fresh and existing stores.
    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Inserts or overwrites documents by explicit id.
    ///
    /// Embeds every document in one batch call, then writes all rows in a
    /// single transaction. Re-upserting an existing id overwrites the whole
    /// row, including the embedding and `updated_at`.
    ///
    /// # Arguments
    ///
    /// * `documents` - chunk texts
    /// * `metadatas` - title/source metadata, aligned with `documents`
    /// * `ids` - unique ids, aligned with `documents`
    pub fn upsert(
        &self,
        documents: &[String],
        metadatas: &[DocumentMetadata],
        ids: &[String],
    ) -> Result<()> {
        if documents.len() != metadatas.len() || documents.len() != ids.len() {
            bail!(
                "Mismatched upsert lengths: {} documents, {} metadatas, {} ids",
                documents.len(),
                metadatas.len(),
                ids.len()
            );
        }
        if documents.is_empty() {
            return Ok(());
        }

        let embeddings = self
            .embedder
            .embed(documents, InputType::Document)
            .context("Failed to embed documents")?;
        let updated_at = now_rfc3339()?;

        let tx = self.conn.unchecked_transaction()?;
        for ((document, metadata), (id, embedding)) in documents
            .iter()
            .zip(metadatas.iter())
            .zip(ids.iter().zip(embeddings.iter()))
        {
            tx.execute(
                "INSERT INTO documents (id, content, title, source, embedding, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                     content = excluded.content,
                     title = excluded.title,
                     source = excluded.source,
                     embedding = excluded.embedding,
                     updated_at = excluded.updated_at",
                params![
                    id,
                    document,
                    metadata.title,
                    metadata.source,
                    embedding_to_blob(embedding),
                    updated_at,
                ],
            )?;
        }
        tx.commit()?;

        Ok(())
    }

    /// Performs a multi-query nearest-neighbor search.
    ///
    /// Embeds all query texts in one batch, then scores every stored
    /// document by cosine similarity against each query vector. Returns
    /// `n_results` neighbors per query in descending-similarity order, one
    /// hit list per query. An empty corpus yields empty hit lists.
    pub fn query(&self, query_texts: &[String], n_results: usize) -> Result<StoreQueryResult> {
        if query_texts.is_empty() || n_results == 0 {
            return Ok(StoreQueryResult::default());
        }

        let query_vectors = self
            .embedder
            .embed(query_texts, InputType::Query)
            .context("Failed to embed queries")?;

        let mut stmt = self
            .conn
            .prepare("SELECT id, content, title, source, embedding FROM documents ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
            ))
        })?;

        let mut corpus = Vec::new();
        for row in rows {
            let (id, content, title, source, blob) = row?;
            corpus.push((id, content, title, source, blob_to_embedding(&blob)));
        }

        let mut result = StoreQueryResult::default();
        for query_vector in &query_vectors {
            let mut scored: Vec<(&(String, String, String, String, Vec<f32>), f32)> = corpus
                .iter()
                .map(|entry| (entry, cosine_similarity(query_vector, &entry.4)))
                .collect();
            scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

            let mut ids = Vec::new();
            let mut documents = Vec::new();
            let mut metadatas = Vec::new();
            for ((id, content, title, source, _), _) in scored.into_iter().take(n_results) {
                ids.push(id.clone());
                documents.push(content.clone());
                metadatas.push(DocumentMetadata::new(title.clone(), source.clone()));
            }
            result.ids.push(ids);
            result.documents.push(documents);
            result.metadatas.push(metadatas);
        }

        Ok(result)
    }

    /// Lists stored chunks, most recently updated first.
    pub fn get_documents(&self, limit: Option<usize>) -> Result<Vec<StoredDocument>> {
        let sql = "SELECT id, content, title, source, updated_at FROM documents
                   ORDER BY updated_at DESC, id ASC";
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredDocument {
                id: row.get(0)?,
                content: row.get(1)?,
                metadata: DocumentMetadata {
                    title: row.get(2)?,
                    source: row.get(3)?,
                },
                updated_at: row.get(4)?,
            })
        })?;

        let mut documents = Vec::new();
        for row in rows {
            documents.push(row?);
        }
        if let Some(limit) = limit {
            documents.truncate(limit);
        }
        Ok(documents)
    }

    /// Deletes chunks by explicit id. Returns the number of rows removed.
    pub fn delete(&self, ids: &[String]) -> Result<usize> {
        let mut removed = 0;
        for id in ids {
            removed += self
                .conn
                .execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        }
        Ok(removed)
    }

    /// Deletes every chunk belonging to one source document.
    ///
    /// Returns the number of rows removed. Ingestion calls this before
    /// re-upserting so a shrunken document leaves no stale trailing chunks.
    pub fn delete_by_title(&self, title: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM documents WHERE title = ?1", params![title])?;
        Ok(removed)
    }

    /// Returns the number of stored chunks.
    pub fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Cosine similarity between two vectors.
///
/// Mismatched dimensions and zero-norm vectors score 0.0 instead of
/// poisoning the ranking.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Serializes an embedding as little-endian f32 bytes.
fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        blob.extend_from_slice(&value.to_le_bytes());
    }
    blob
}

/// Deserializes little-endian f32 bytes back into an embedding.
fn blob_to_embedding(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
        .collect()
}

fn now_rfc3339() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("Failed to format timestamp")
}
