//! Ingestion orchestrator.
//!
//! [`IngestionPipeline`] fans a batch of documents out to parallel
//! per-document pipelines (keyword gate → metadata extraction → chunking →
//! enrichment → batch embedding → validity filter), isolates failures per
//! document, and aggregates the surviving chunks. Processed batches can be
//! snapshotted to a JSON file and replayed into the store later.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::PipelineConfig;
use crate::document::{Chunk, ChunkRecord, Document};
use crate::embedding::EmbeddingProvider;
use crate::enrich::{enrich_text, is_valid_metadata};
use crate::error::{RagError, Result};
use crate::extract::MetadataExtractor;
use crate::llm::ChatModel;
use crate::pool::WorkerPool;
use crate::vectorstore::VectorStore;

/// The ingestion orchestrator.
///
/// All collaborators are injected at construction and shared behind `Arc`s;
/// in particular the vector-store handle is opened once by the caller and
/// reused by every concurrent document pipeline. Construct one via
/// [`IngestionPipeline::builder()`].
pub struct IngestionPipeline {
    config: PipelineConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    extractor: MetadataExtractor,
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Return a reference to the vector store handle.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Create (or load) the named collection, with the dimensionality
    /// reported by the configured embedding provider. Idempotent.
    pub async fn ensure_collection(&self, name: &str) -> Result<()> {
        let dimensions = self.embedder.dimensions();
        self.store.ensure_collection(name, dimensions).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to ensure collection");
            RagError::PipelineError(format!("failed to ensure collection '{name}': {e}"))
        })
    }

    /// Run the full per-document pipeline and return the surviving chunks.
    ///
    /// Documents that do not pass the keyword gate contribute zero chunks
    /// and trigger no LLM call. Chunks whose extracted metadata does not meet
    /// the validity threshold are silently excluded.
    ///
    /// # Errors
    ///
    /// Returns an error if batch embedding or any backend call fails; the
    /// chunk/embedding positional alignment cannot survive a partial batch.
    pub async fn process_document(&self, document: &Document) -> Result<Vec<Chunk>> {
        let lowered = document.text.to_lowercase();
        if !MetadataExtractor::passes_keyword_gate(&lowered) {
            info!(file_name = %document.file_name, "no metadata keywords found, skipping document");
            return Ok(Vec::new());
        }

        // One extraction per document, shared read-only by all its chunks.
        let metadata = self.extractor.extract(&document.text).await;

        let passages = self.chunker.split(&document.text);
        if passages.is_empty() {
            info!(file_name = %document.file_name, chunk_count = 0, "document produced no passages");
            return Ok(Vec::new());
        }

        let enriched: Vec<String> =
            passages.iter().map(|passage| enrich_text(passage, &metadata)).collect();

        // One batch call; a failure here aborts this document's pipeline so
        // that chunk metadata and embeddings stay positionally aligned.
        let texts: Vec<&str> = enriched.iter().map(String::as_str).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(file_name = %document.file_name, error = %e, "batch embedding failed");
            RagError::PipelineError(format!(
                "embedding failed for document '{}': {e}",
                document.file_name
            ))
        })?;

        let mut chunks = Vec::with_capacity(passages.len());
        for (index, ((passage, search_context), embedding)) in
            passages.into_iter().zip(enriched).zip(embeddings).enumerate()
        {
            if !is_valid_metadata(&metadata, self.config.min_valid_fields) {
                info!(
                    file_name = %document.file_name,
                    chunk_index = index,
                    "chunk discarded: too few valid metadata fields"
                );
                continue;
            }
            chunks.push(Chunk {
                document_id: document.id.clone(),
                file_name: document.file_name.clone(),
                chunk_index: index,
                context: passage,
                search_context,
                embedding,
                metadata: metadata.clone(),
            });
        }

        info!(file_name = %document.file_name, chunk_count = chunks.len(), "processed document");
        Ok(chunks)
    }

    /// Process a batch of documents concurrently and aggregate their chunks.
    ///
    /// Documents run on a bounded worker pool
    /// (`min(available_parallelism, max_concurrency)`). Each document's
    /// pipeline is isolated: a failure is logged with the offending file name
    /// and contributes zero chunks, without affecting any other document.
    /// There is no retry. Aggregate chunk order across documents is
    /// completion order; within a document, chunk indices are dense and
    /// sequential.
    pub async fn process_all(&self, documents: &[Document]) -> Vec<Chunk> {
        let pool = WorkerPool::new(self.config.effective_concurrency());
        info!(
            document_count = documents.len(),
            pool_capacity = pool.capacity(),
            "starting batch ingestion"
        );

        let tasks = documents.iter().map(|document| async move {
            self.process_document(document).await.map_err(|e| {
                RagError::PipelineError(format!("document '{}': {e}", document.file_name))
            })
        });

        let mut all_chunks = Vec::new();
        for result in pool.run_all(tasks).await {
            match result {
                Ok(chunks) => all_chunks.extend(chunks),
                Err(e) => error!(error = %e, "document pipeline failed, skipping"),
            }
        }

        info!(chunk_count = all_chunks.len(), "batch ingestion complete");
        all_chunks
    }

    /// Process a batch of documents and insert the surviving chunks into the
    /// named collection. Returns the inserted chunks.
    ///
    /// # Errors
    ///
    /// Returns an error only if the final insert fails; per-document
    /// processing failures are isolated as in
    /// [`process_all`](IngestionPipeline::process_all).
    pub async fn process_and_insert(
        &self,
        collection: &str,
        documents: &[Document],
    ) -> Result<Vec<Chunk>> {
        let chunks = self.process_all(documents).await;
        self.store.insert(collection, &chunks).await.map_err(|e| {
            error!(collection, error = %e, "insert failed after batch ingestion");
            RagError::PipelineError(format!("insert into '{collection}' failed: {e}"))
        })?;
        Ok(chunks)
    }

    /// Insert previously snapshotted records into the named collection.
    ///
    /// The records are the literal layout produced by [`save_snapshot`], so a
    /// saved batch can be replayed without re-running extraction or
    /// embedding. Returns the number of inserted chunks.
    pub async fn insert_records(
        &self,
        collection: &str,
        records: Vec<ChunkRecord>,
    ) -> Result<usize> {
        let chunks: Vec<Chunk> = records.into_iter().map(ChunkRecord::into_chunk).collect();
        self.store.insert(collection, &chunks).await?;
        info!(collection, count = chunks.len(), "inserted snapshot records");
        Ok(chunks.len())
    }
}

/// Serialize processed chunks to a JSON snapshot file for inspection or
/// later replay via [`IngestionPipeline::insert_records`].
pub fn save_snapshot(path: impl AsRef<Path>, chunks: &[Chunk]) -> Result<()> {
    let records: Vec<ChunkRecord> = chunks.iter().map(ChunkRecord::from).collect();
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(BufWriter::new(file), &records)?;
    info!(path = %path.as_ref().display(), count = records.len(), "saved chunk snapshot");
    Ok(())
}

/// Load a JSON snapshot previously written by [`save_snapshot`].
pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Vec<ChunkRecord>> {
    let file = File::open(path.as_ref())?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Builder for constructing an [`IngestionPipeline`].
///
/// All fields are required except `config`, which falls back to
/// [`PipelineConfig::default()`].
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    config: Option<PipelineConfig>,
    chat_model: Option<Arc<dyn ChatModel>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl IngestionPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the chat model used for metadata extraction.
    pub fn chat_model(mut self, chat: Arc<dyn ChatModel>) -> Self {
        self.chat_model = Some(chat);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store handle.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`IngestionPipeline`], validating that all required
    /// collaborators are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<IngestionPipeline> {
        let config = self.config.unwrap_or_default();
        let chat_model = self
            .chat_model
            .ok_or_else(|| RagError::ConfigError("chat_model is required".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let store = self
            .store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::ConfigError("chunker is required".to_string()))?;

        let extractor =
            MetadataExtractor::new(chat_model).with_char_limit(config.extraction_char_limit);

        Ok(IngestionPipeline { config, embedder, store, chunker, extractor })
    }
}
