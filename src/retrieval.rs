//! RAG front-end: retrieve relevant passages and synthesize a structured
//! JSON answer.
//!
//! [`RetrievalEngine`] embeds a query, searches the vector store, joins the
//! retrieved enriched passages into a context, and issues a single chat call
//! whose system instruction fixes the output JSON schema. Malformed LLM
//! output degrades to the empty schema, the same policy the metadata
//! extractor applies.

use std::sync::Arc;

use tracing::{error, info};

use crate::document::TenderMetadata;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extract::{parse_metadata_response, QUERY_CONTEXT_META, SYS_PROMPT_META};
use crate::llm::ChatModel;
use crate::vectorstore::VectorStore;

/// Canonical preset search query for recovering the passages that carry the
/// tender's structural facts.
pub const QUERY_SEARCH_META: &str = r#"Voglio estrarre informazioni strutturate da una gara d'appalto.
Trova nei documenti le sezioni contenenti riferimenti a:
- La tipologia dell'offerta (es. 'Aperta').
- L'ente o l'amministrazione che ha pubblicato la gara.
- L'importo a base d'asta.
- Il codice CIG.
- L'oggetto della gara.
- Eventuali lotti (numero, descrizione, importo).
- La data del documento.
- La scadenza del contratto e la data di presentazione delle offerte.
Restituisci solo i testi che contengono queste informazioni o che sono strettamente correlati."#;

/// The retrieval-augmented answer engine.
///
/// Ingestion-agnostic: it only needs an embedding provider, the shared
/// vector-store handle and a chat model.
pub struct RetrievalEngine {
    chat: Arc<dyn ChatModel>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    collection: String,
    top_k: usize,
}

impl RetrievalEngine {
    /// Create a new engine searching the named collection with top_k = 5.
    pub fn new(
        chat: Arc<dyn ChatModel>,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self { chat, embedder, store, collection: collection.into(), top_k: 5 }
    }

    /// Set the number of passages retrieved per query.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Retrieve the context for a query: embed, search, and join the
    /// retrieved enriched passages (nearest first) with single spaces.
    ///
    /// # Errors
    ///
    /// Returns an error if query embedding or the vector search fails. With a
    /// single query vector there is no batch to degrade, so an embedding
    /// failure surfaces to the caller instead of being silently omitted.
    pub async fn retrieve(&self, query: &str) -> Result<String> {
        let query_embedding = self.embedder.embed(query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            e
        })?;

        let results =
            self.store.search(&self.collection, &query_embedding, self.top_k).await.map_err(
                |e| {
                    error!(collection = %self.collection, error = %e, "vector search failed");
                    RagError::PipelineError(format!(
                        "search failed in collection '{}': {e}",
                        self.collection
                    ))
                },
            )?;

        info!(result_count = results.len(), "retrieved context passages");

        let context: Vec<&str> = results.iter().map(|r| r.search_context.as_str()).collect();
        Ok(context.join(" "))
    }

    /// Answer a free-form question about the ingested corpus, returning the
    /// structured tender schema synthesized from the retrieved context.
    ///
    /// Malformed LLM JSON is logged and degrades to the all-empty schema;
    /// transport failures propagate.
    pub async fn answer(&self, query: &str) -> Result<TenderMetadata> {
        let context = self.retrieve(query).await?;
        let user = QUERY_CONTEXT_META.replace("{context}", &context);

        let raw = self.chat.chat(SYS_PROMPT_META, &user).await?;
        Ok(parse_metadata_response(&raw))
    }

    /// Synthesize the tender's structured metadata using the canonical
    /// preset search query.
    pub async fn answer_metadata(&self) -> Result<TenderMetadata> {
        self.answer(QUERY_SEARCH_META).await
    }
}
