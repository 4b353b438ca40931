//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using the
//! [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC. This
//! module is only available when the `qdrant` feature is enabled.
//!
//! Each chunk becomes one point: the enriched-text embedding as the vector,
//! and a flat payload carrying the raw text, the enriched text, the file
//! name, the chunk index and the six scalar tender fields, so search results
//! return structural facts alongside the similarity ranking.

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::debug;
use uuid::Uuid;

use crate::document::{Chunk, SearchResult, TenderMetadata};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Collections use cosine distance. Point IDs are freshly generated UUIDs:
/// insertion is append-only by contract, so no stable identity is reused.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Create a new Qdrant vector store connecting to the given URL.
    pub fn new(url: &str) -> Result<Self> {
        let client = Qdrant::from_url(url).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a new Qdrant vector store with the default URL
    /// (`http://localhost:6334`).
    pub fn default_url() -> Result<Self> {
        Self::new("http://localhost:6334")
    }

    /// Create a new Qdrant vector store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStoreError { backend: "qdrant".to_string(), message: e.to_string() }
    }

    fn extract_string(value: Option<&QdrantValue>) -> String {
        match value.and_then(|v| v.kind.as_ref()) {
            Some(Kind::StringValue(s)) => s.clone(),
            _ => String::new(),
        }
    }

    fn chunk_payload(chunk: &Chunk) -> Payload {
        let metadata = &chunk.metadata;
        let mut payload = serde_json::Map::new();
        payload.insert("context".into(), chunk.context.clone().into());
        payload.insert("search_context".into(), chunk.search_context.clone().into());
        payload.insert("file_name".into(), chunk.file_name.clone().into());
        payload.insert("chunk_id".into(), (chunk.chunk_index as i64).into());
        payload.insert("ente_appaltante".into(), metadata.ente_appaltante.clone().into());
        payload.insert("cig".into(), metadata.cig.clone().into());
        payload.insert("oggetto".into(), metadata.oggetto.clone().into());
        payload.insert("importo_base_asta".into(), metadata.importo_base_asta.clone().into());
        payload.insert("scadenza_contratto".into(), metadata.scadenza_contratto.clone().into());
        payload.insert("scadenza_chiarimenti".into(), metadata.scadenza_chiarimenti.clone().into());
        Payload::try_from(serde_json::Value::Object(payload)).unwrap_or_default()
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let exists = self.client.collection_exists(name).await.map_err(Self::map_err)?;
        if exists {
            debug!(collection = name, "qdrant collection already exists, loading as-is");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.client.delete_collection(name).await.map_err(Self::map_err)?;
        debug!(collection = name, "deleted qdrant collection");
        Ok(())
    }

    async fn insert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = chunks
            .iter()
            .map(|chunk| {
                PointStruct::new(
                    Uuid::new_v4().to_string(),
                    chunk.embedding.clone(),
                    Self::chunk_payload(chunk),
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = chunks.len(), "inserted chunks into qdrant");
        Ok(())
    }

    async fn delete_document(&self, collection: &str, file_name: &str) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(collection)
                    .points(Filter::must([Condition::matches(
                        "file_name",
                        file_name.to_string(),
                    )]))
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection, file_name, "deleted document chunks from qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, embedding.to_vec(), top_k as u64)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let results = response
            .result
            .into_iter()
            .map(|scored| {
                let payload = &scored.payload;
                let metadata = TenderMetadata {
                    ente_appaltante: Self::extract_string(payload.get("ente_appaltante")),
                    cig: Self::extract_string(payload.get("cig")),
                    oggetto: Self::extract_string(payload.get("oggetto")),
                    importo_base_asta: Self::extract_string(payload.get("importo_base_asta")),
                    scadenza_contratto: Self::extract_string(payload.get("scadenza_contratto")),
                    scadenza_chiarimenti: Self::extract_string(payload.get("scadenza_chiarimenti")),
                    ..Default::default()
                };
                SearchResult {
                    distance: scored.score,
                    context: Self::extract_string(payload.get("context")),
                    search_context: Self::extract_string(payload.get("search_context")),
                    file_name: Self::extract_string(payload.get("file_name")),
                    metadata,
                }
            })
            .collect();

        Ok(results)
    }
}
