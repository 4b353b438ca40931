//! Chat model trait for the LLM backend.

use async_trait::async_trait;

use crate::error::Result;

/// A synchronous-style chat interface to the LLM backend.
///
/// One call, two messages (system instruction fixing the output schema plus a
/// user prompt), no streaming and no conversation state across calls.
/// Implementations must request temperature 0 to minimize output variance;
/// the contract guarantees schema-conformant output, not byte-identical
/// output across model versions.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Issue a single chat call and return the raw response text.
    async fn chat(&self, system: &str, user: &str) -> Result<String>;

    /// The name of the model being queried.
    fn model(&self) -> &str;
}
