//! Data types for tender documents, extracted metadata, chunks, and search results.

use serde::{Deserialize, Serialize};

/// A source document whose text was already extracted from a PDF by the
/// external text-extraction collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// External identifier for the document.
    pub id: String,
    /// The full extracted text of the document.
    pub text: String,
    /// Name of the source file, carried through to every chunk.
    pub file_name: String,
}

/// A single tender lot.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Lot {
    /// Lot number as it appears in the tender.
    #[serde(default)]
    pub numero: String,
    /// Description of the lot.
    #[serde(default)]
    pub descrizione: String,
    /// Lot amount in euros.
    #[serde(default)]
    pub importo: String,
}

/// Structured fields extracted once per document by the LLM.
///
/// Every scalar field is a `String`; absent information is an empty string,
/// never null, never omitted. `lotti` is an empty list when the tender has no
/// lots. Each field carries `#[serde(default)]` so that whatever key set the
/// LLM actually returns is coerced into this fixed schema — missing keys
/// default to empty, unknown keys are dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TenderMetadata {
    /// Type of offer (usually "Aperta").
    #[serde(default)]
    pub tipologia_offerta: String,
    /// Contracting authority that published the tender.
    #[serde(default)]
    pub ente_appaltante: String,
    /// Total base auction amount in euros.
    #[serde(default)]
    pub importo_base_asta: String,
    /// Tender identification code (Codice Identificativo Gara).
    #[serde(default)]
    pub cig: String,
    /// General description of the tender's subject.
    #[serde(default)]
    pub oggetto: String,
    /// Tender lots, in document order.
    #[serde(default)]
    pub lotti: Vec<Lot>,
    /// Contract expiry date or duration.
    #[serde(default)]
    pub scadenza_contratto: String,
    /// Deadline for submitting clarifications / offers.
    #[serde(default)]
    pub scadenza_chiarimenti: String,
}

impl TenderMetadata {
    /// The scalar fields in their fixed annotation order, paired with their
    /// schema key. `lotti` and bookkeeping fields are deliberately excluded:
    /// only scalar facts are appended inline to the search context.
    pub fn scalar_fields(&self) -> [(&'static str, &str); 7] {
        [
            ("tipologia_offerta", self.tipologia_offerta.as_str()),
            ("ente_appaltante", self.ente_appaltante.as_str()),
            ("importo_base_asta", self.importo_base_asta.as_str()),
            ("cig", self.cig.as_str()),
            ("oggetto", self.oggetto.as_str()),
            ("scadenza_contratto", self.scadenza_contratto.as_str()),
            ("scadenza_chiarimenti", self.scadenza_chiarimenti.as_str()),
        ]
    }

    /// The key fields counted by the chunk-validity gate.
    pub fn key_fields(&self) -> [&str; 6] {
        [
            self.ente_appaltante.as_str(),
            self.cig.as_str(),
            self.importo_base_asta.as_str(),
            self.oggetto.as_str(),
            self.scadenza_contratto.as_str(),
            self.scadenza_chiarimenti.as_str(),
        ]
    }
}

/// A bounded-length passage of a document with its enrichment and embedding.
///
/// Created once during ingestion and never mutated after insertion into the
/// vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Identifier of the parent [`Document`].
    pub document_id: String,
    /// Source file name of the parent document.
    pub file_name: String,
    /// 0-based, dense index of this chunk within its document.
    pub chunk_index: usize,
    /// The original passage text.
    pub context: String,
    /// The lower-cased passage text with non-empty metadata fields appended
    /// as inline `[key: value]` annotations. This is the text that was
    /// embedded, and the text matched by lexical search.
    pub search_context: String,
    /// Embedding of `search_context`; fixed dimensionality per collection.
    pub embedding: Vec<f32>,
    /// The document-level extracted metadata, shared by every chunk.
    pub metadata: TenderMetadata,
}

/// A retrieved chunk with its similarity score and structural payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Cosine similarity score reported by the backend (higher = nearer).
    /// Results are ordered nearest-first.
    pub distance: f32,
    /// The original passage text.
    pub context: String,
    /// The enriched passage text.
    pub search_context: String,
    /// Source file name.
    pub file_name: String,
    /// Structural metadata fields stored alongside the vector.
    pub metadata: TenderMetadata,
}

/// Per-chunk metadata as persisted in snapshots and vector-store payloads:
/// bookkeeping fields plus the flattened extracted fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecordMetadata {
    /// Source file name.
    #[serde(default)]
    pub file_name: String,
    /// 0-based chunk index within the document.
    #[serde(default)]
    pub chunk_id: usize,
    /// The extracted tender fields.
    #[serde(flatten)]
    pub tender: TenderMetadata,
}

/// The serialized form of a processed chunk, as written to batch snapshot
/// files. An ingestion run can be replayed by loading an array of these and
/// inserting them directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkRecord {
    /// The original passage text.
    pub context: String,
    /// The enriched passage text.
    pub search_context: String,
    /// Embedding of `search_context`.
    pub vector_context: Vec<f32>,
    /// Bookkeeping plus extracted fields.
    pub metadata: RecordMetadata,
}

impl From<&Chunk> for ChunkRecord {
    fn from(chunk: &Chunk) -> Self {
        Self {
            context: chunk.context.clone(),
            search_context: chunk.search_context.clone(),
            vector_context: chunk.embedding.clone(),
            metadata: RecordMetadata {
                file_name: chunk.file_name.clone(),
                chunk_id: chunk.chunk_index,
                tender: chunk.metadata.clone(),
            },
        }
    }
}

impl ChunkRecord {
    /// Convert a snapshot record back into an insertable [`Chunk`].
    ///
    /// The document id is not persisted in snapshots; the file name stands in
    /// for it on replay.
    pub fn into_chunk(self) -> Chunk {
        Chunk {
            document_id: self.metadata.file_name.clone(),
            file_name: self.metadata.file_name,
            chunk_index: self.metadata.chunk_id,
            context: self.context,
            search_context: self.search_context,
            embedding: self.vector_context,
            metadata: self.metadata.tender,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_defaults_fill_missing_keys() {
        let metadata: TenderMetadata = serde_json::from_str(r#"{"cig": "X"}"#).unwrap();
        assert_eq!(metadata.cig, "X");
        assert_eq!(metadata.ente_appaltante, "");
        assert_eq!(metadata.oggetto, "");
        assert!(metadata.lotti.is_empty());
    }

    #[test]
    fn metadata_ignores_unknown_keys() {
        let metadata: TenderMetadata =
            serde_json::from_str(r#"{"cig": "X", "campo_inventato": "y"}"#).unwrap();
        assert_eq!(metadata.cig, "X");
    }

    #[test]
    fn metadata_parses_lots() {
        let metadata: TenderMetadata = serde_json::from_str(
            r#"{"lotti": [{"numero": "1", "descrizione": "sedie", "importo": "1000"}]}"#,
        )
        .unwrap();
        assert_eq!(metadata.lotti.len(), 1);
        assert_eq!(metadata.lotti[0].descrizione, "sedie");
    }

    #[test]
    fn chunk_record_round_trip() {
        let chunk = Chunk {
            document_id: "bando.pdf".into(),
            file_name: "bando.pdf".into(),
            chunk_index: 3,
            context: "Testo".into(),
            search_context: "testo [cig: X]".into(),
            embedding: vec![0.1, 0.2],
            metadata: TenderMetadata { cig: "X".into(), ..Default::default() },
        };
        let record = ChunkRecord::from(&chunk);
        let json = serde_json::to_string(&record).unwrap();
        let loaded: ChunkRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, record);
        let restored = loaded.into_chunk();
        assert_eq!(restored.chunk_index, 3);
        assert_eq!(restored.metadata.cig, "X");
        assert_eq!(restored.embedding, vec![0.1, 0.2]);
    }
}
