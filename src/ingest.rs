//! Knowledge-base ingestion pipeline.
//!
//! Turns one Markdown document into stored chunks: split by headers, prune
//! whatever an earlier run stored under the same title, then upsert each
//! chunk with a deterministic `{title}-{index}` id. Re-ingesting the same
//! content therefore overwrites in place, and a shrunken document cannot
//! leave stale trailing chunks behind.

use anyhow::Result;

use crate::chunker::Chunker;
use crate::models::DocumentMetadata;
use crate::store::VectorStore;

/// Ingestion pipeline over a vector store.
pub struct Ingestor {
    store: VectorStore,
    chunker: Chunker,
}

impl Ingestor {
    /// Creates an ingestor from a store and a chunker.
    pub fn new(store: VectorStore, chunker: Chunker) -> Self {
        Self { store, chunker }
    }

    /// Chunks and stores one Markdown document.
    ///
    /// Previously stored chunks with the same title are deleted first, then
    /// every chunk is upserted with id `{title}-{index}` and the document's
    /// metadata.
    ///
    /// # Returns
    ///
    /// The number of chunks stored.
    pub fn store_content(&self, content: &str, metadata: &DocumentMetadata) -> Result<usize> {
        let chunks = self.chunker.chunk(content);

        let removed = self.store.delete_by_title(&metadata.title)?;
        if removed > 0 {
            tracing::debug!(removed, title = %metadata.title, "pruned previous chunks");
        }

        let ids: Vec<String> = (0..chunks.len())
            .map(|index| format!("{}-{}", metadata.title, index))
            .collect();
        let metadatas = vec![metadata.clone(); chunks.len()];
        self.store.upsert(&chunks, &metadatas, &ids)?;

        tracing::info!(count = chunks.len(), title = %metadata.title, "stored content");
        Ok(chunks.len())
    }

    /// Returns a reference to the underlying store.
    ///
    /// Useful for testing or follow-up queries after ingestion.
    pub fn store(&self) -> &VectorStore {
        &self.store
    }

    /// Consumes the ingestor and returns the underlying store.
    pub fn into_store(self) -> VectorStore {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{EmbeddingError, EmbeddingFunction, InputType};

    struct FlatEmbedding;

    impl EmbeddingFunction for FlatEmbedding {
        fn embed(
            &self,
            texts: &[String],
            _input_type: InputType,
        ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0, 0.0]).collect())
        }
    }

    fn ingestor() -> Ingestor {
        let store = VectorStore::in_memory(Box::new(FlatEmbedding)).unwrap();
        let chunker = Chunker::new(10_000).unwrap();
        Ingestor::new(store, chunker)
    }

    const CONTENT: &str = "# Pendaftaran\nDibuka bulan Juni.\n\n# Jadwal\nSeleksi bulan Juli.";

    #[test]
    fn store_content_assigns_sequential_ids() {
        let ingestor = ingestor();
        let metadata = DocumentMetadata::new("Jalur Mandiri", "https://ppmb.example/mandiri");

        let stored = ingestor.store_content(CONTENT, &metadata).unwrap();

        assert_eq!(stored, 2);
        let documents = ingestor.store().get_documents(None).unwrap();
        let mut ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["Jalur Mandiri-0", "Jalur Mandiri-1"]);
    }

    #[test]
    fn reingesting_identical_content_overwrites_not_duplicates() {
        let ingestor = ingestor();
        let metadata = DocumentMetadata::new("Jalur Mandiri", "https://ppmb.example/mandiri");

        ingestor.store_content(CONTENT, &metadata).unwrap();
        ingestor.store_content(CONTENT, &metadata).unwrap();

        assert_eq!(ingestor.store().count().unwrap(), 2);
    }

    #[test]
    fn reingesting_shrunken_content_prunes_stale_chunks() {
        let ingestor = ingestor();
        let metadata = DocumentMetadata::new("Jalur Mandiri", "https://ppmb.example/mandiri");

        ingestor.store_content(CONTENT, &metadata).unwrap();
        assert_eq!(ingestor.store().count().unwrap(), 2);

        let shrunk = "# Pendaftaran\nDibuka bulan Juni.";
        ingestor.store_content(shrunk, &metadata).unwrap();

        assert_eq!(ingestor.store().count().unwrap(), 1);
        let documents = ingestor.store().get_documents(None).unwrap();
        assert_eq!(documents[0].id, "Jalur Mandiri-0");
    }

    #[test]
    fn different_titles_do_not_interfere() {
        let ingestor = ingestor();

        ingestor
            .store_content(
                CONTENT,
                &DocumentMetadata::new("Jalur Mandiri", "https://ppmb.example/mandiri"),
            )
            .unwrap();
        ingestor
            .store_content(
                "# SNBP\nJalur prestasi.",
                &DocumentMetadata::new("SNBP", "https://ppmb.example/snbp"),
            )
            .unwrap();

        assert_eq!(ingestor.store().count().unwrap(), 3);
    }

    #[test]
    fn empty_content_stores_nothing() {
        let ingestor = ingestor();
        let metadata = DocumentMetadata::new("Kosong", "https://ppmb.example/kosong");

        let stored = ingestor.store_content("", &metadata).unwrap();

        assert_eq!(stored, 0);
        assert_eq!(ingestor.store().count().unwrap(), 0);
    }
}
