//! Ingestion and query pipelines over the policy vector store.
//!
//! Both pipelines are plain sequential flows whose only suspension points
//! are the external calls (embedding, chat, store I/O). Neither retries
//! internally; content-addressed record ids make step-level re-invocation
//! by an outer orchestrator safe.

pub mod answer;
pub mod extract;
pub mod ingest;
pub mod query;
pub mod select;

pub use extract::PdfExtractor;
pub use ingest::{IngestOutcome, IngestRequest, Ingestor};
pub use query::{QueryEngine, QueryOptions, QueryRequest, CANNOT_ANSWER};
