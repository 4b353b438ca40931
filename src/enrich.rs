//! Chunk enrichment and the chunk-validity gate.
//!
//! Enrichment appends the extracted structural facts inline to a passage's
//! text before embedding, producing a semantically denser search context and
//! making the facts lexically matchable. The validity gate rejects chunks
//! whose extraction produced too little information to be worth indexing.

use crate::document::TenderMetadata;

/// Build the enriched search context for a passage.
///
/// Pure function: lower-cases the passage text, then appends
/// `" [key: value]"` for every non-empty (trimmed) scalar metadata field, in
/// the schema's fixed field order. `lotti` and bookkeeping keys are never
/// annotated.
pub fn enrich_text(chunk_text: &str, metadata: &TenderMetadata) -> String {
    let mut enriched = chunk_text.to_lowercase();
    for (key, value) in metadata.scalar_fields() {
        let value = value.trim();
        if !value.is_empty() {
            enriched.push_str(&format!(" [{key}: {value}]"));
        }
    }
    enriched
}

/// Whether a chunk's metadata carries enough information to be indexed.
///
/// Counts non-empty trimmed values among the six key fields (contracting
/// authority, CIG, base amount, object, contract deadline, clarification
/// deadline) and requires at least `min_fields` of them
/// (see [`crate::config::MIN_VALID_FIELDS`]).
pub fn is_valid_metadata(metadata: &TenderMetadata, min_fields: usize) -> bool {
    let non_empty = metadata.key_fields().iter().filter(|v| !v.trim().is_empty()).count();
    non_empty >= min_fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MIN_VALID_FIELDS;

    fn metadata() -> TenderMetadata {
        TenderMetadata {
            ente_appaltante: "Regione Lazio".into(),
            cig: "12345".into(),
            oggetto: "fornitura sedie".into(),
            ..Default::default()
        }
    }

    #[test]
    fn appends_non_empty_fields_in_schema_order() {
        let enriched = enrich_text("Testo Del Chunk", &metadata());
        assert_eq!(
            enriched,
            "testo del chunk [ente_appaltante: Regione Lazio] [cig: 12345] [oggetto: fornitura sedie]"
        );
    }

    #[test]
    fn empty_metadata_only_lowercases() {
        let enriched = enrich_text("Testo Del Chunk", &TenderMetadata::default());
        assert_eq!(enriched, "testo del chunk");
    }

    #[test]
    fn whitespace_only_values_are_skipped() {
        let mut m = metadata();
        m.oggetto = "   ".into();
        let enriched = enrich_text("testo", &m);
        assert!(!enriched.contains("oggetto"));
    }

    #[test]
    fn annotations_round_trip_to_source_fields() {
        let m = metadata();
        let enriched = enrich_text("testo del chunk", &m);

        // Re-parse the bracketed annotations and check they recover exactly
        // the non-empty source fields.
        let mut recovered = Vec::new();
        let mut rest = enriched.as_str();
        while let Some(open) = rest.find('[') {
            let close = rest[open..].find(']').map(|i| open + i).unwrap();
            let inner = &rest[open + 1..close];
            let (key, value) = inner.split_once(": ").unwrap();
            recovered.push((key.to_string(), value.to_string()));
            rest = &rest[close + 1..];
        }

        let expected: Vec<(String, String)> = m
            .scalar_fields()
            .iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.to_string(), v.trim().to_string()))
            .collect();
        assert_eq!(recovered, expected);
    }

    #[test]
    fn two_fields_pass_the_gate() {
        let m = TenderMetadata {
            cig: "12345".into(),
            oggetto: "fornitura".into(),
            ..Default::default()
        };
        assert!(is_valid_metadata(&m, MIN_VALID_FIELDS));
    }

    #[test]
    fn one_field_fails_the_gate() {
        let m = TenderMetadata { cig: "12345".into(), ..Default::default() };
        assert!(!is_valid_metadata(&m, MIN_VALID_FIELDS));
    }

    #[test]
    fn tipologia_offerta_does_not_count_toward_validity() {
        let m = TenderMetadata {
            tipologia_offerta: "Aperta".into(),
            cig: "12345".into(),
            ..Default::default()
        };
        assert!(!is_valid_metadata(&m, MIN_VALID_FIELDS));
    }
}
