//! Ollama backends for chat and embeddings.
//!
//! This module is only available when the `ollama` feature is enabled.
//! Both clients call a local Ollama server over its native HTTP API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::ChatModel;

/// Default Ollama server URL.
const DEFAULT_HOST: &str = "http://localhost:11434";

/// Default chat model used for metadata extraction and answer synthesis.
const DEFAULT_CHAT_MODEL: &str = "phi4-mini:3.8b";

/// Default embedding model.
const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Output dimensionality of `nomic-embed-text`.
const DEFAULT_DIMENSIONS: usize = 768;

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

// ── Chat model ─────────────────────────────────────────────────────

/// A [`ChatModel`] backed by Ollama's `/api/chat` endpoint.
///
/// Always requests `temperature: 0` and a non-streamed response.
pub struct OllamaChatModel {
    client: reqwest::Client,
    host: String,
    model: String,
}

impl OllamaChatModel {
    /// Create a new chat client with the default host and model.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            host: DEFAULT_HOST.into(),
            model: DEFAULT_CHAT_MODEL.into(),
        }
    }

    /// Create a chat client from the `OLLAMA_HOST` and `LLM_MODEL`
    /// environment variables, falling back to the defaults.
    pub fn from_env() -> Self {
        let mut client = Self::new();
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            client.host = host;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            client.model = model;
        }
        client
    }

    /// Set the server URL.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn map_err(&self, message: String) -> RagError {
        RagError::LlmError { model: self.model.clone(), message }
    }
}

impl Default for OllamaChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        debug!(model = %self.model, user_len = user.len(), "issuing chat call");

        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            stream: false,
            options: ChatOptions { temperature: 0.0 },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.host))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "chat request failed");
                self.map_err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model, %status, "chat API error");
            return Err(self.map_err(format!("API returned {status}: {body}")));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse chat response");
            self.map_err(format!("failed to parse response: {e}"))
        })?;

        Ok(chat_response.message.content)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// ── Embedding provider ─────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by Ollama's `/api/embeddings` endpoint.
///
/// The endpoint embeds one prompt per request; batches go through the
/// sequential default of [`EmbeddingProvider::embed_batch`].
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    host: String,
    model: String,
    dimensions: usize,
}

impl OllamaEmbeddingProvider {
    /// Create a new provider with the default host, model and dimensions.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            host: DEFAULT_HOST.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Create a provider from the `OLLAMA_HOST` and `EMBEDDING_MODEL`
    /// environment variables, falling back to the defaults.
    pub fn from_env() -> Self {
        let mut provider = Self::new();
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            provider.host = host;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            provider.model = model;
        }
        provider
    }

    /// Set the server URL.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the model name and its output dimensionality.
    pub fn with_model(mut self, model: impl Into<String>, dimensions: usize) -> Self {
        self.model = model.into();
        self.dimensions = dimensions;
        self
    }

    fn map_err(&self, message: String) -> RagError {
        RagError::EmbeddingError { provider: format!("ollama/{}", self.model), message }
    }
}

impl Default for OllamaEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(model = %self.model, text_len = text.len(), "embedding text");

        let request_body = EmbeddingRequest { model: &self.model, prompt: text };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.host))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "embedding request failed");
                self.map_err(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(model = %self.model, %status, "embedding API error");
            return Err(self.map_err(format!("API returned {status}: {body}")));
        }

        let embedding_response: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(model = %self.model, error = %e, "failed to parse embedding response");
            self.map_err(format!("failed to parse response: {e}"))
        })?;

        if embedding_response.embedding.is_empty() {
            return Err(self.map_err("API returned an empty embedding".into()));
        }

        Ok(embedding_response.embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
