//! In-memory vector store using cosine similarity.
//!
//! A zero-dependency [`VectorStore`] backed by a `HashMap` of append-only
//! row vectors behind a `tokio::sync::RwLock`. Suitable for development and
//! tests; rows are stored in insertion order and, like every backend, are
//! not deduplicated.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// An in-memory vector store using cosine similarity for search.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Vec<Chunk>>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    fn missing_collection(collection: &str) -> RagError {
        RagError::VectorStoreError {
            backend: "InMemory".to_string(),
            message: format!("collection '{collection}' does not exist"),
        }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.remove(name);
        Ok(())
    }

    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let rows = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing_collection(collection))?;
        rows.extend(chunks.iter().cloned());
        Ok(())
    }

    async fn delete_document(&self, collection: &str, file_name: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        let rows = collections
            .get_mut(collection)
            .ok_or_else(|| Self::missing_collection(collection))?;
        rows.retain(|chunk| chunk.file_name != file_name);
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let rows =
            collections.get(collection).ok_or_else(|| Self::missing_collection(collection))?;

        let mut scored: Vec<SearchResult> = rows
            .iter()
            .map(|chunk| SearchResult {
                distance: cosine_similarity(&chunk.embedding, embedding),
                context: chunk.context.clone(),
                search_context: chunk.search_context.clone(),
                file_name: chunk.file_name.clone(),
                metadata: chunk.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.distance.partial_cmp(&a.distance).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::TenderMetadata;

    fn chunk(file_name: &str, index: usize, embedding: Vec<f32>) -> Chunk {
        Chunk {
            document_id: file_name.to_string(),
            file_name: file_name.to_string(),
            chunk_index: index,
            context: format!("testo {index}"),
            search_context: format!("testo {index} [cig: X]"),
            embedding,
            metadata: TenderMetadata { cig: "X".into(), ..Default::default() },
        }
    }

    #[tokio::test]
    async fn insert_into_missing_collection_fails() {
        let store = InMemoryVectorStore::new();
        let result = store.insert("nope", &[chunk("a.pdf", 0, vec![1.0, 0.0])]).await;
        assert!(matches!(result, Err(RagError::VectorStoreError { .. })));
    }

    #[tokio::test]
    async fn duplicate_insert_duplicates_rows() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("gare", 2).await.unwrap();
        let chunks = [chunk("a.pdf", 0, vec![1.0, 0.0])];
        store.insert("gare", &chunks).await.unwrap();
        store.insert("gare", &chunks).await.unwrap();

        let results = store.search("gare", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn delete_document_removes_only_that_file() {
        let store = InMemoryVectorStore::new();
        store.ensure_collection("gare", 2).await.unwrap();
        store
            .insert(
                "gare",
                &[chunk("a.pdf", 0, vec![1.0, 0.0]), chunk("b.pdf", 0, vec![0.0, 1.0])],
            )
            .await
            .unwrap();

        store.delete_document("gare", "a.pdf").await.unwrap();
        let results = store.search("gare", &[1.0, 1.0], 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_name, "b.pdf");
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
