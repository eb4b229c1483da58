use async_trait::async_trait;

use crate::error::Result;

/// Maps a batch of texts to fixed-length dense vectors via an external
/// embedding service, preserving input order.
///
/// Implementations fail with [`crate::Error::Provider`] when the call fails
/// or the response does not match the input batch. They never retry;
/// re-invocation is the orchestration layer's job.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embedding dimensionality (D).
    fn dim(&self) -> usize;
    /// Compute one vector per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Sampling parameters for answer synthesis. Fixed per call site, not
/// user-tunable.
#[derive(Debug, Clone, Copy)]
pub struct ChatParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 1024,
        }
    }
}

/// Invokes an external chat model with a system instruction and a user
/// message, returning the raw completion text.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(&self, system: &str, user: &str, params: ChatParams) -> Result<String>;
}

/// Extracts plain text from raw document bytes. Treated as a black box:
/// `bytes -> text`.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}
