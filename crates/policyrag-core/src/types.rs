//! Domain types shared by the ingestion and query pipelines.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Embedding dimensionality of the default provider model.
pub const DEFAULT_EMBED_DIM: usize = 3072;
/// Default number of nearest records fetched per query.
pub const DEFAULT_TOP_K: usize = 5;
/// Records scoring below this cosine similarity are discarded post-ranking.
pub const DEFAULT_MIN_SCORE: f32 = 0.25;
/// Character budget for the context block handed to the chat model.
pub const DEFAULT_CONTEXT_BUDGET: usize = 3500;

/// A bounded slice of document text, the atomic retrieval unit.
///
/// Owned by the ingestion pipeline while a document is being processed;
/// persisted as part of a [`VectorRecord`] afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub index: usize,
}

/// Metadata stored alongside each chunk vector.
///
/// An explicit struct rather than a free-form map; the store rejects
/// payloads with an empty `source`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkPayload {
    pub source: String,
    pub text: String,
    #[serde(default)]
    pub policy_type: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub jurisdiction: String,
    #[serde(default)]
    pub section: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// One row of the vector index: a stable content-addressed id, the chunk
/// embedding, and its payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// Deterministic record id for a chunk position: `uuid5(URL, "source:index")`.
///
/// Re-ingesting the same source overwrites records in place instead of
/// accumulating duplicates.
pub fn record_id(source_id: &str, index: usize) -> String {
    Uuid::new_v5(
        &Uuid::NAMESPACE_URL,
        format!("{source_id}:{index}").as_bytes(),
    )
    .to_string()
}

/// Citation for an answer. Two refs are the same citation when
/// `(document, section, version)` match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub document: String,
    pub section: String,
    pub policy_type: String,
    pub version: String,
    pub jurisdiction: String,
}

impl SourceRef {
    pub fn dedup_key(&self) -> (String, String, String) {
        (
            self.document.clone(),
            self.section.clone(),
            self.version.clone(),
        )
    }
}

/// Outcome of a filtered similarity search. Contexts are rank ordered,
/// sources deduplicated, roles the sorted union over surviving records.
/// All-empty is a valid outcome, not a failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub contexts: Vec<String>,
    pub sources: Vec<SourceRef>,
    pub roles: Vec<String>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

/// Aggregated view of all records sharing a `source`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub source_id: String,
    pub policy_type: String,
    pub version: String,
    pub jurisdiction: String,
    pub chunk_count: usize,
}

/// Final answer assembled by the query pipeline. `sources` and `roles` come
/// from the search step, `num_contexts` counts the chunks that survived
/// context selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<SourceRef>,
    pub num_contexts: usize,
    pub roles: Vec<String>,
}
