//! # gara-rag
//!
//! Ingestion and hybrid retrieval pipeline for Italian procurement-tender
//! documents (gare d'appalto).
//!
//! The pipeline takes documents whose text was already extracted from PDFs,
//! extracts structured tender fields with an LLM (guarded by a cheap keyword
//! pre-filter), splits the text into overlapping passages, enriches each
//! passage with the extracted facts, embeds the enriched text, filters out
//! chunks with too little metadata, and stores the survivors in a vector
//! collection. A retrieval engine later answers questions by vector search
//! over the enriched passages plus one schema-constrained LLM call.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gara_rag::{
//!     Document, IngestionPipeline, InMemoryVectorStore, PipelineConfig,
//!     RetrievalEngine, SentenceChunker,
//! };
//!
//! # async fn run(chat: Arc<dyn gara_rag::ChatModel>, embedder: Arc<dyn gara_rag::EmbeddingProvider>) -> gara_rag::Result<()> {
//! let store = Arc::new(InMemoryVectorStore::new());
//! let config = PipelineConfig::default();
//!
//! let pipeline = IngestionPipeline::builder()
//!     .config(config)
//!     .chat_model(chat.clone())
//!     .embedding_provider(embedder.clone())
//!     .vector_store(store.clone())
//!     .chunker(Arc::new(SentenceChunker::new(1300, 130)))
//!     .build()?;
//!
//! pipeline.ensure_collection("gare").await?;
//! let documents = vec![Document {
//!     id: "1".into(),
//!     text: "CIG: 12345 Oggetto: fornitura sedie".into(),
//!     file_name: "bando.pdf".into(),
//! }];
//! pipeline.process_and_insert("gare", &documents).await?;
//!
//! let engine = RetrievalEngine::new(chat, embedder, store, "gare");
//! let answer = engine.answer_metadata().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Network backends are feature-gated: enable `ollama` for the Ollama chat
//! and embedding clients, `qdrant` for the Qdrant vector store.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod inmemory;
pub mod llm;
pub mod pool;
pub mod retrieval;
pub mod vectorstore;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chunking::{Chunker, SentenceChunker};
pub use config::{PipelineConfig, PipelineConfigBuilder, MAX_POOL_CAPACITY, MIN_VALID_FIELDS};
pub use document::{Chunk, ChunkRecord, Document, Lot, RecordMetadata, SearchResult, TenderMetadata};
pub use embedding::EmbeddingProvider;
pub use enrich::{enrich_text, is_valid_metadata};
pub use error::{RagError, Result};
pub use extract::MetadataExtractor;
pub use ingest::{load_snapshot, save_snapshot, IngestionPipeline, IngestionPipelineBuilder};
pub use inmemory::InMemoryVectorStore;
pub use llm::ChatModel;
pub use pool::WorkerPool;
pub use retrieval::RetrievalEngine;
pub use vectorstore::VectorStore;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaChatModel, OllamaEmbeddingProvider};

#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
