//! OpenAI-compatible HTTP providers for embeddings and chat completions.
//!
//! Calls are single-shot: a failed or malformed response surfaces as a
//! `Provider` error and is never retried here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use policyrag_core::traits::{ChatParams, ChatProvider, EmbeddingProvider};
use policyrag_core::{Error, Result};

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct OpenAiEmbeddings {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
    dim: usize,
}

impl OpenAiEmbeddings {
    pub fn new(base_url: &str, api_key: &str, model: &str, dim: usize) -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(Error::provider)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            dim,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    fn dim(&self) -> usize {
        self.dim
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(batch = texts.len(), model = %self.model, "embedding batch");
        let url = format!("{}/embeddings", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(Error::provider)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::provider(format!(
                "embeddings endpoint returned {status}: {body}"
            )));
        }
        let mut parsed: EmbeddingResponse = resp.json().await.map_err(Error::provider)?;
        if parsed.data.len() != texts.len() {
            return Err(Error::provider(format!(
                "embeddings endpoint returned {} vectors for {} inputs",
                parsed.data.len(),
                texts.len()
            )));
        }
        // The API may reorder items; `index` restores input order.
        parsed.data.sort_by_key(|d| d.index);
        let mut out = Vec::with_capacity(parsed.data.len());
        for item in parsed.data {
            if item.embedding.len() != self.dim {
                return Err(Error::provider(format!(
                    "embedding of dim {} does not match configured dim {}",
                    item.embedding.len(),
                    self.dim
                )));
            }
            out.push(item.embedding);
        }
        Ok(out)
    }
}

pub struct OpenAiChat {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(Error::provider)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    async fn chat(&self, system: &str, user: &str, params: ChatParams) -> Result<String> {
        tracing::debug!(model = %self.model, "chat completion request");
        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ChatRequest {
                model: &self.model,
                temperature: params.temperature,
                max_tokens: params.max_tokens,
                messages: [
                    ChatMessage {
                        role: "system",
                        content: system,
                    },
                    ChatMessage {
                        role: "user",
                        content: user,
                    },
                ],
            })
            .send()
            .await
            .map_err(Error::provider)?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::provider(format!(
                "chat endpoint returned {status}: {body}"
            )));
        }
        let parsed: ChatResponse = resp.json().await.map_err(Error::provider)?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::provider("chat endpoint returned no choices"))
    }
}
