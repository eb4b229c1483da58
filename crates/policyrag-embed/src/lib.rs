//! Embedding and chat provider implementations.
//!
//! The pipelines only see the traits in `policyrag_core::traits`; this crate
//! supplies the OpenAI-compatible HTTP providers and a deterministic hash
//! embedder for offline runs and tests.

pub mod fake;
pub mod openai;

use std::sync::Arc;

use policyrag_core::traits::{ChatProvider, EmbeddingProvider};
use policyrag_core::Result;

pub use fake::HashEmbedder;
pub use openai::{OpenAiChat, OpenAiEmbeddings};

/// Connection settings for the external providers.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: String,
    pub embed_model: String,
    pub chat_model: String,
    pub dim: usize,
}

/// Select the embedding provider: the deterministic hash embedder when
/// `APP_USE_FAKE_EMBEDDINGS` is set, the HTTP provider otherwise.
pub fn embedding_provider(settings: &ProviderSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    let use_fake = std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);
    if use_fake {
        tracing::info!(dim = settings.dim, "using deterministic hash embedder");
        return Ok(Arc::new(HashEmbedder::new(settings.dim)));
    }
    Ok(Arc::new(OpenAiEmbeddings::new(
        &settings.base_url,
        &settings.api_key,
        &settings.embed_model,
        settings.dim,
    )?))
}

pub fn chat_provider(settings: &ProviderSettings) -> Result<Arc<dyn ChatProvider>> {
    Ok(Arc::new(OpenAiChat::new(
        &settings.base_url,
        &settings.api_key,
        &settings.chat_model,
    )?))
}
