//! Multi-query retrieval with deduplication.

use std::collections::HashSet;

use anyhow::Result;

use crate::models::{RetrievedInformation, StoreQueryResult};
use crate::store::VectorStore;

/// Issues multi-query searches and merges the per-query hit lists.
pub struct Retriever {
    n_results: usize,
}

impl Retriever {
    /// Creates a retriever requesting `n_results` neighbors per query.
    pub fn new(n_results: usize) -> Self {
        Self { n_results }
    }

    /// Searches the store with every rewritten query and deduplicates the
    /// combined hits by document id.
    ///
    /// Store errors propagate uncaught; an empty result is valid.
    pub fn search(
        &self,
        store: &VectorStore,
        queries: &[String],
    ) -> Result<RetrievedInformation> {
        let results = store.query(queries, self.n_results)?;
        let retrieved = merge_unique(&results);
        tracing::debug!(
            queries = queries.len(),
            unique = retrieved.len(),
            "merged retrieval results"
        );
        Ok(retrieved)
    }
}

/// Merges per-query hit lists into one deduplicated result.
///
/// Each document id is kept exactly once, at its first occurrence: outer
/// iteration follows query order, inner iteration descending similarity.
pub fn merge_unique(results: &StoreQueryResult) -> RetrievedInformation {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut retrieved = RetrievedInformation::default();

    for (i, ids) in results.ids.iter().enumerate() {
        for (j, id) in ids.iter().enumerate() {
            if !seen.insert(id.as_str()) {
                continue;
            }
            retrieved.ids.push(id.clone());
            retrieved.documents.push(results.documents[i][j].clone());
            retrieved.metadatas.push(results.metadatas[i][j].clone());
        }
    }

    retrieved
}
