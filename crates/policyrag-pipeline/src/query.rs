//! Query pipeline: embed, search, select, answer.

use std::sync::Arc;

use policyrag_core::traits::{ChatParams, ChatProvider, EmbeddingProvider};
use policyrag_core::types::{
    QueryResult, DEFAULT_CONTEXT_BUDGET, DEFAULT_MIN_SCORE, DEFAULT_TOP_K,
};
use policyrag_core::{Error, Result};
use policyrag_vector::PolicyStore;

use crate::answer::synthesize;
use crate::select::select_context_chunks;

/// Fixed response when no grounded context is available. Returned without
/// invoking the chat model.
pub const CANNOT_ANSWER: &str =
    "I cannot answer this question based on the available security policy documents.";

/// One query trigger. `allowed_sources` restricts retrieval to the named
/// documents; an explicit empty list matches nothing.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub question: String,
    pub top_k: usize,
    pub allowed_sources: Option<Vec<String>>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            top_k: DEFAULT_TOP_K,
            allowed_sources: None,
        }
    }
}

/// Retrieval and synthesis tuning.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    pub min_score: f32,
    pub context_budget: usize,
    pub chat_params: ChatParams,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            context_budget: DEFAULT_CONTEXT_BUDGET,
            chat_params: ChatParams::default(),
        }
    }
}

/// Answers questions from the indexed policy corpus.
pub struct QueryEngine {
    store: Arc<PolicyStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatProvider>,
    opts: QueryOptions,
}

impl QueryEngine {
    pub fn new(
        store: Arc<PolicyStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatProvider>,
        opts: QueryOptions,
    ) -> Self {
        Self {
            store,
            embedder,
            chat,
            opts,
        }
    }

    pub async fn run(&self, req: QueryRequest) -> Result<QueryResult> {
        let question = req.question.trim();
        if question.is_empty() {
            return Err(Error::validation("question must not be empty"));
        }

        let mut vectors = self.embedder.embed(&[question.to_string()]).await?;
        if vectors.is_empty() {
            return Err(Error::provider("embedder returned no vector for the question"));
        }
        let query_vector = vectors.remove(0);

        let found = self
            .store
            .search(
                &query_vector,
                req.top_k,
                self.opts.min_score,
                req.allowed_sources.as_deref(),
            )
            .await?;

        let selected = select_context_chunks(&found.contexts, self.opts.context_budget);
        if selected.is_empty() {
            // Nothing to ground an answer in; skip the model entirely.
            tracing::info!("no usable context; returning fixed response");
            return Ok(QueryResult {
                answer: CANNOT_ANSWER.to_string(),
                sources: Vec::new(),
                num_contexts: 0,
                roles: Vec::new(),
            });
        }
        tracing::info!(
            contexts = selected.len(),
            sources = found.sources.len(),
            "selected grounded context"
        );

        let answer = synthesize(
            self.chat.as_ref(),
            question,
            &selected,
            self.opts.chat_params,
        )
        .await?;
        Ok(QueryResult {
            answer,
            sources: found.sources,
            num_contexts: selected.len(),
            roles: found.roles,
        })
    }
}
