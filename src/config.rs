//! Configuration for the ingestion and retrieval pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Number of non-empty key metadata fields a chunk needs to be worth indexing.
///
/// A tunable threshold, not a domain law: a document whose extraction yielded
/// at most one usable fact would pollute structural filtering without adding
/// retrieval value.
pub const MIN_VALID_FIELDS: usize = 2;

/// Upper bound on concurrent document pipelines, to avoid overwhelming the
/// LLM and embedding backends. The effective pool size is
/// `min(available_parallelism, MAX_POOL_CAPACITY)`.
pub const MAX_POOL_CAPACITY: usize = 4;

/// Configuration parameters for the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Maximum number of characters of document text handed to the LLM
    /// for metadata extraction.
    pub extraction_char_limit: usize,
    /// Minimum number of non-empty key metadata fields for a chunk to be indexed.
    pub min_valid_fields: usize,
    /// Cap on concurrent document pipelines during batch ingestion.
    pub max_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        // Chunk size 1300 with 10% overlap, matching the sentence-splitter
        // settings the tender corpus was tuned on.
        Self {
            chunk_size: 1300,
            chunk_overlap: 130,
            top_k: 5,
            extraction_char_limit: 8000,
            min_valid_fields: MIN_VALID_FIELDS,
            max_concurrency: MAX_POOL_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Create a new builder for constructing a [`PipelineConfig`].
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// The pool size actually used for batch ingestion:
    /// `min(available_parallelism, max_concurrency)`, at least 1.
    pub fn effective_concurrency(&self) -> usize {
        let parallelism = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
        parallelism.min(self.max_concurrency).max(1)
    }
}

/// Builder for constructing a validated [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the maximum number of characters handed to the LLM during extraction.
    pub fn extraction_char_limit(mut self, limit: usize) -> Self {
        self.config.extraction_char_limit = limit;
        self
    }

    /// Set the minimum number of non-empty key fields for a chunk to be indexed.
    pub fn min_valid_fields(mut self, min: usize) -> Self {
        self.config.min_valid_fields = min;
        self
    }

    /// Set the cap on concurrent document pipelines.
    pub fn max_concurrency(mut self, cap: usize) -> Self {
        self.config.max_concurrency = cap;
        self
    }

    /// Build the [`PipelineConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_overlap >= chunk_size`
    /// - `top_k == 0`
    /// - `max_concurrency == 0`
    pub fn build(self) -> Result<PipelineConfig> {
        if self.config.chunk_overlap >= self.config.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.config.chunk_overlap, self.config.chunk_size
            )));
        }
        if self.config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.config.max_concurrency == 0 {
            return Err(RagError::ConfigError(
                "max_concurrency must be greater than zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}
