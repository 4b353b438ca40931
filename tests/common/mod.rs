//! Shared test doubles: a canned chat model and deterministic embedders.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use gara_rag::{ChatModel, EmbeddingProvider, RagError, Result};

/// A chat model returning a canned response and counting its calls.
pub struct MockChatModel {
    response: String,
    calls: AtomicUsize,
}

impl MockChatModel {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into(), calls: AtomicUsize::new(0) }
    }

    /// Canned response carrying four non-empty key fields.
    pub fn with_full_metadata() -> Self {
        Self::new(
            r#"{"tipologia_offerta": "Aperta", "ente_appaltante": "Regione Lazio",
                "importo_base_asta": "", "cig": "12345", "oggetto": "fornitura sedie",
                "lotti": [], "scadenza_contratto": "2025-01-01", "scadenza_chiarimenti": ""}"#,
        )
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(&self, _system: &str, _user: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }

    fn model(&self) -> &str {
        "mock-chat"
    }
}

/// Deterministic hash-based embeddings: same text, same vector.
pub struct MockEmbeddingProvider {
    dimensions: usize,
}

impl MockEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

pub fn hash_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
    let mut embedding = vec![0.0f32; dimensions];
    for (i, v) in embedding.iter_mut().enumerate() {
        *v = ((hash.wrapping_add(i as u64)) as f32).sin();
    }
    let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        embedding.iter_mut().for_each(|x| *x /= norm);
    }
    embedding
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(hash_embedding(text, self.dimensions))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// An embedder that fails on any text containing `fail_marker`.
pub struct FailingEmbeddingProvider {
    dimensions: usize,
    fail_marker: String,
}

impl FailingEmbeddingProvider {
    pub fn new(dimensions: usize, fail_marker: impl Into<String>) -> Self {
        Self { dimensions, fail_marker: fail_marker.into() }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains(&self.fail_marker) {
            return Err(RagError::EmbeddingError {
                provider: "failing-mock".into(),
                message: format!("refusing to embed text containing '{}'", self.fail_marker),
            });
        }
        Ok(hash_embedding(text, self.dimensions))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
