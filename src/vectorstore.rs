//! Vector store trait: collection schema management, insertion, hybrid search.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend for enriched, embedded tender chunks.
///
/// Implementations own the collection schema (identity, raw and enriched
/// text, one vector field of declared dimension, and the structural metadata
/// fields) and a cosine-similarity index over the vector field.
///
/// The handle is explicitly constructed and explicitly owned: open it once at
/// startup, share it as an `Arc<dyn VectorStore>`, close it when the process
/// shuts down. It must tolerate concurrent read/insert calls.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection with the declared vector dimensionality.
    ///
    /// Idempotent: if the collection already exists it is loaded unchanged —
    /// the schema is never altered in place. Safe to call repeatedly.
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Append chunks to a collection.
    ///
    /// Does **not** deduplicate against existing rows: re-ingesting an
    /// already-ingested document duplicates its chunks. Known limitation;
    /// callers that need idempotent re-ingestion should call
    /// [`delete_document`](VectorStore::delete_document) first.
    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Delete every chunk belonging to the given source file.
    async fn delete_document(&self, collection: &str, file_name: &str) -> Result<()>;

    /// Return up to `top_k` nearest chunks by cosine similarity, nearest
    /// first, each carrying its raw/enriched text and structural metadata.
    ///
    /// Search applies no metadata filter: it is pure vector nearest-neighbor
    /// plus payload projection ("hybrid" in the sense of returning structured
    /// fields alongside the similarity ranking).
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}
