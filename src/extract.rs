//! LLM-backed metadata extraction with a keyword pre-filter.
//!
//! [`MetadataExtractor`] runs once per document: a cheap lexical gate decides
//! whether the document is worth an LLM call at all, then a single chat call
//! with a fixed schema-bearing prompt produces the structured tender fields.
//! Extraction is infallible: any failure (transport, malformed JSON) is
//! logged and degrades to the all-empty schema.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::document::TenderMetadata;
use crate::llm::ChatModel;

/// Keywords whose presence in the lower-cased document text justifies an LLM
/// extraction call. Absence of all of them short-circuits extraction
/// entirely — a cost control, not a correctness requirement.
pub const METADATA_KEYWORDS: [&str; 5] =
    ["ente appaltante", "cig", "importo base", "oggetto", "scadenza"];

/// System instruction fixing the exact JSON schema of the extraction output.
pub const SYS_PROMPT_META: &str = r#"Sei un assistente intelligente specializzato nell'analisi di documenti relativi a gare d'appalto.
Il tuo compito è leggere attentamente il testo fornito e restituire esclusivamente un JSON che rispetti esattamente il seguente schema:
{
"tipologia_offerta": "",
"ente_appaltante": "",
"importo_base_asta": "",
"cig": "",
"oggetto": "",
"lotti": [
    {
        "numero": "",
        "descrizione": "",
        "importo": ""
    }
],
"scadenza_contratto": "",
"scadenza_chiarimenti": ""
}
Se un campo non è presente, restituisci una stringa vuota ("") oppure, per il campo "lotti", una lista vuota ([]).
Non aggiungere alcun testo extra o spiegazioni."#;

/// User instruction template; `{context}` is replaced with the (truncated)
/// document text.
pub const QUERY_CONTEXT_META: &str = r#"Dato il seguente testo estratto da documenti relativi a una gara d'appalto:
---------------------------
{context}
---------------------------
Estrarre con precisione le seguenti informazioni:
- tipologia_offerta: il tipo di offerta (es. 'Aperta').
- ente_appaltante: l'ente o l'amministrazione che ha pubblicato la gara (si tratta di una Regione Italiana).
- importo_base_asta: l'importo complessivo a base d'asta, in euro.
- cig: il codice identificativo della gara.
- oggetto: la descrizione generale dell'oggetto della gara.
- lotti: un elenco dei lotti, se presenti. Per ciascun lotto, includi numero, descrizione ed importo.
- scadenza_contratto: la data o la durata di scadenza del contratto.
- scadenza_chiarimenti: la data entro cui devono essere presentate le offerte.
Se un campo non è presente, restituisci una stringa vuota o, per "lotti", una lista vuota.
Restituisci l'output esclusivamente in formato JSON esattamente secondo lo schema indicato."#;

/// Extracts structured tender fields from document text via the chat model.
pub struct MetadataExtractor {
    chat: Arc<dyn ChatModel>,
    char_limit: usize,
}

impl MetadataExtractor {
    /// Create an extractor with the default 8000-character prompt limit.
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat, char_limit: 8000 }
    }

    /// Override the number of document characters handed to the LLM.
    pub fn with_char_limit(mut self, limit: usize) -> Self {
        self.char_limit = limit;
        self
    }

    /// Whether the lower-cased document text contains any extraction keyword.
    ///
    /// The caller must pass already lower-cased text.
    pub fn passes_keyword_gate(text_lower: &str) -> bool {
        METADATA_KEYWORDS.iter().any(|keyword| text_lower.contains(keyword))
    }

    /// Extract tender metadata from document text.
    ///
    /// Never fails: documents that do not pass the keyword gate, transport
    /// errors, and malformed LLM output all yield the all-empty schema.
    pub async fn extract(&self, text: &str) -> TenderMetadata {
        let lowered = text.to_lowercase();
        if !Self::passes_keyword_gate(&lowered) {
            debug!("no metadata keywords found, skipping extraction");
            return TenderMetadata::default();
        }

        let truncated = truncate_chars(&lowered, self.char_limit);
        let user = QUERY_CONTEXT_META.replace("{context}", truncated);

        match self.chat.chat(SYS_PROMPT_META, &user).await {
            Ok(raw) => {
                let metadata = parse_metadata_response(&raw);
                info!(model = self.chat.model(), "extracted tender metadata");
                metadata
            }
            Err(e) => {
                warn!(error = %e, "metadata extraction call failed, returning empty schema");
                TenderMetadata::default()
            }
        }
    }
}

/// Parse a raw LLM response into [`TenderMetadata`].
///
/// Strips at most one Markdown code-fence pair, then parses with serde
/// defaults so missing keys become empty. A malformed payload is logged and
/// degrades to the all-empty schema.
pub fn parse_metadata_response(raw: &str) -> TenderMetadata {
    let cleaned = strip_code_fence(raw);
    match serde_json::from_str::<TenderMetadata>(cleaned) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!(error = %e, payload = cleaned, "malformed extraction JSON, returning empty schema");
            TenderMetadata::default()
        }
    }
}

/// Strip a single ```` ```json … ``` ```` or ```` ``` … ``` ```` fence pair,
/// if present.
pub(crate) fn strip_code_fence(raw: &str) -> &str {
    let raw = raw.trim();
    for prefix in ["```json", "```"] {
        if let Some(rest) = raw.strip_prefix(prefix) {
            let rest = rest.trim();
            return rest.strip_suffix("```").map(str::trim).unwrap_or(rest);
        }
    }
    raw
}

/// A char-boundary-safe prefix of at most `limit` characters.
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_rejects_text_without_keywords() {
        assert!(!MetadataExtractor::passes_keyword_gate("lorem ipsum dolor sit amet"));
    }

    #[test]
    fn gate_accepts_any_keyword() {
        assert!(MetadataExtractor::passes_keyword_gate("il cig della gara è 12345"));
        assert!(MetadataExtractor::passes_keyword_gate("scadenza: 2025-01-01"));
        assert!(MetadataExtractor::passes_keyword_gate("oggetto: fornitura sedie"));
    }

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fence("```json {\"cig\": \"X\"} ```"), "{\"cig\": \"X\"}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fence("```\n{\"cig\": \"X\"}\n```"), "{\"cig\": \"X\"}");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fence(r#"{"cig": "X"}"#), r#"{"cig": "X"}"#);
    }

    #[test]
    fn fenced_response_parses_with_defaults() {
        let metadata = parse_metadata_response("```json {\"cig\": \"X\"} ```");
        assert_eq!(metadata.cig, "X");
        assert_eq!(metadata.ente_appaltante, "");
        assert!(metadata.lotti.is_empty());
    }

    #[test]
    fn malformed_response_degrades_to_empty_schema() {
        let metadata = parse_metadata_response("non sono un json");
        assert_eq!(metadata, TenderMetadata::default());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "è".repeat(20);
        let truncated = truncate_chars(&text, 10);
        assert_eq!(truncated.chars().count(), 10);
    }
}
