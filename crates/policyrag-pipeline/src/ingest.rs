//! Ingestion pipeline: load, chunk, embed, upsert.

use std::path::PathBuf;
use std::sync::Arc;

use policyrag_core::chunker::{split_text, ChunkConfig};
use policyrag_core::roles::RoleTagger;
use policyrag_core::traits::{EmbeddingProvider, TextExtractor};
use policyrag_core::types::{record_id, Chunk, ChunkPayload, VectorRecord};
use policyrag_core::{Error, Result};
use policyrag_vector::PolicyStore;

/// One ingestion trigger.
///
/// `source_id` defaults to the path string; it is required when only raw
/// bytes are supplied.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub pdf_path: Option<PathBuf>,
    pub pdf_bytes: Option<Vec<u8>>,
    pub source_id: Option<String>,
    pub policy_type: String,
    pub version: String,
    pub jurisdiction: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub ingested: usize,
}

/// Drives a document from raw bytes to upserted vector records.
///
/// Holds the store and providers behind `Arc`: constructed once per process
/// and shared by reference with the query side.
pub struct Ingestor {
    store: Arc<PolicyStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    extractor: Arc<dyn TextExtractor>,
    roles: Arc<dyn RoleTagger>,
    chunking: ChunkConfig,
}

impl Ingestor {
    pub fn new(
        store: Arc<PolicyStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        extractor: Arc<dyn TextExtractor>,
        roles: Arc<dyn RoleTagger>,
        chunking: ChunkConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            extractor,
            roles,
            chunking,
        }
    }

    /// Run one ingestion to completion, returning the number of chunks
    /// upserted. A document with no extractable text is a valid terminal
    /// state (`ingested = 0`), not an error.
    ///
    /// Safe to re-invoke after a failure: record ids are content addresses,
    /// so the upsert step overwrites rather than duplicates.
    pub async fn run(&self, req: IngestRequest) -> Result<IngestOutcome> {
        let (bytes, source_id) = load_input(&req)?;

        let text = self.extractor.extract(&bytes)?;
        let pieces = split_text(&text, &self.chunking);
        if pieces.is_empty() {
            tracing::info!(source = %source_id, "no extractable text; nothing to ingest");
            return Ok(IngestOutcome { ingested: 0 });
        }
        let chunks: Vec<Chunk> = pieces
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                text,
                source_id: source_id.clone(),
                index,
            })
            .collect();
        tracing::info!(source = %source_id, chunks = chunks.len(), "chunked document");

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(Error::provider(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| VectorRecord {
                id: record_id(&chunk.source_id, chunk.index),
                vector,
                payload: ChunkPayload {
                    source: chunk.source_id.clone(),
                    text: chunk.text.clone(),
                    policy_type: req.policy_type.clone(),
                    version: req.version.clone(),
                    jurisdiction: req.jurisdiction.clone(),
                    section: String::new(),
                    roles: self.roles.tag(&chunk.text).into_iter().collect(),
                },
            })
            .collect();

        self.store.upsert(&records).await?;
        tracing::info!(source = %source_id, ingested = records.len(), "ingest complete");
        Ok(IngestOutcome {
            ingested: records.len(),
        })
    }
}

/// Resolve the request to raw bytes and a source id, failing fast before
/// any external call when required fields are missing.
fn load_input(req: &IngestRequest) -> Result<(Vec<u8>, String)> {
    if let Some(bytes) = &req.pdf_bytes {
        let source_id = req
            .source_id
            .clone()
            .or_else(|| {
                req.pdf_path
                    .as_ref()
                    .map(|p| p.to_string_lossy().to_string())
            })
            .ok_or_else(|| Error::validation("source_id is required when ingesting raw bytes"))?;
        return Ok((bytes.clone(), source_id));
    }
    let path = req
        .pdf_path
        .as_ref()
        .ok_or_else(|| Error::validation("one of pdf_path or pdf_bytes is required"))?;
    let bytes = std::fs::read(path)
        .map_err(|e| Error::validation(format!("cannot read {}: {e}", path.display())))?;
    let source_id = req
        .source_id
        .clone()
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    Ok((bytes, source_id))
}
