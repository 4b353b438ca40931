//! Embedding provider trait for turning text into fixed-dimension vectors.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text.
///
/// Implementations wrap a specific embedding backend behind a unified async
/// interface. The default [`embed_batch`](EmbeddingProvider::embed_batch)
/// implementation calls [`embed`](EmbeddingProvider::embed) sequentially and
/// propagates the first failure: batch output must stay positionally aligned
/// with the input, so a partial batch cannot be safely re-aligned. Callers
/// that can tolerate partial results (the ingestion orchestrator) catch the
/// failure at the per-document boundary instead.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of texts, positionally aligned
    /// with the input.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The dimensionality of the vectors produced by this provider. All
    /// chunks in a collection share this dimensionality.
    fn dimensions(&self) -> usize;
}
