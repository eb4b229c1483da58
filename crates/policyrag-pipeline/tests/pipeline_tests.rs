use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use policyrag_core::chunker::ChunkConfig;
use policyrag_core::roles::KeywordRoleTagger;
use policyrag_core::traits::{ChatParams, ChatProvider, TextExtractor};
use policyrag_core::{Error, Result};
use policyrag_embed::HashEmbedder;
use policyrag_pipeline::answer::{build_user_prompt, SYSTEM_PROMPT};
use policyrag_pipeline::select::select_context_chunks;
use policyrag_pipeline::{
    IngestRequest, Ingestor, QueryEngine, QueryOptions, QueryRequest, CANNOT_ANSWER,
};
use policyrag_vector::PolicyStore;

const DIM: usize = 512;

/// Ignores the input bytes and returns fixed text, standing in for the PDF
/// extraction black box.
struct StubExtractor(String);

impl TextExtractor for StubExtractor {
    fn extract(&self, _bytes: &[u8]) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Counts invocations and checks the grounding contract on every call.
#[derive(Default)]
struct RecordingChat {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatProvider for RecordingChat {
    async fn chat(&self, system: &str, user: &str, _params: ChatParams) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(
            system.contains("Do not use outside knowledge"),
            "grounding instruction must be present on every call"
        );
        assert!(user.contains("Context:"), "user prompt embeds the context block");
        Ok("  stub answer  ".to_string())
    }
}

async fn open_store(tmp: &TempDir) -> Arc<PolicyStore> {
    let uri = tmp.path().to_string_lossy().to_string();
    Arc::new(
        PolicyStore::open(&uri, "policies", DIM)
            .await
            .expect("open store"),
    )
}

fn ingestor(store: &Arc<PolicyStore>, document_text: &str) -> Ingestor {
    Ingestor::new(
        store.clone(),
        Arc::new(HashEmbedder::new(DIM)),
        Arc::new(StubExtractor(document_text.to_string())),
        Arc::new(KeywordRoleTagger::new()),
        ChunkConfig::default(),
    )
}

fn engine(store: &Arc<PolicyStore>, chat: &Arc<RecordingChat>) -> QueryEngine {
    QueryEngine::new(
        store.clone(),
        Arc::new(HashEmbedder::new(DIM)),
        chat.clone(),
        QueryOptions::default(),
    )
}

fn request(source_id: &str) -> IngestRequest {
    IngestRequest {
        pdf_bytes: Some(Vec::new()),
        source_id: Some(source_id.to_string()),
        policy_type: "Access Control".to_string(),
        version: "2023.1".to_string(),
        jurisdiction: "EU".to_string(),
        ..IngestRequest::default()
    }
}

#[tokio::test]
async fn ingest_and_query_end_to_end() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;
    let text = "The incident response team reviews access alerts every morning.";

    let outcome = ingestor(&store, text)
        .run(request("policy-a.pdf"))
        .await
        .expect("ingest");
    assert_eq!(outcome.ingested, 1);

    let chat = Arc::new(RecordingChat::default());
    let result = engine(&store, &chat)
        .run(QueryRequest::new(text))
        .await
        .expect("query");

    assert_eq!(result.answer, "stub answer", "synthesizer trims the completion");
    assert_eq!(result.num_contexts, 1);
    assert_eq!(result.sources.len(), 1);
    assert_eq!(result.sources[0].document, "policy-a.pdf");
    assert_eq!(result.sources[0].policy_type, "Access Control");
    assert!(result
        .roles
        .contains(&"Incident Response Team".to_string()));
    assert_eq!(chat.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn query_with_no_documents_short_circuits() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;

    let chat = Arc::new(RecordingChat::default());
    let result = engine(&store, &chat)
        .run(QueryRequest::new("what is the retention period?"))
        .await
        .expect("query");

    assert_eq!(result.answer, CANNOT_ANSWER);
    assert!(result.sources.is_empty());
    assert_eq!(result.num_contexts, 0);
    assert!(result.roles.is_empty());
    assert_eq!(
        chat.calls.load(Ordering::SeqCst),
        0,
        "no grounded context means no model call"
    );
}

#[tokio::test]
async fn empty_allow_list_short_circuits() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;
    let text = "Visitors must be escorted at all times.";
    ingestor(&store, text)
        .run(request("policy-a.pdf"))
        .await
        .expect("ingest");

    let chat = Arc::new(RecordingChat::default());
    let mut req = QueryRequest::new(text);
    req.allowed_sources = Some(Vec::new());
    let result = engine(&store, &chat).run(req).await.expect("query");

    assert_eq!(result.answer, CANNOT_ANSWER);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn allow_list_restricts_to_named_source() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;
    let text_a = "Encryption keys are rotated on a yearly schedule.";
    let text_b = "Visitor badges expire at the end of each day.";
    ingestor(&store, text_a)
        .run(request("policy-a.pdf"))
        .await
        .expect("ingest a");
    ingestor(&store, text_b)
        .run(request("policy-b.pdf"))
        .await
        .expect("ingest b");

    let chat = Arc::new(RecordingChat::default());
    let mut req = QueryRequest::new(text_a);
    req.allowed_sources = Some(vec!["policy-a.pdf".to_string()]);
    let result = engine(&store, &chat).run(req).await.expect("query");

    assert!(!result.sources.is_empty());
    assert!(result.sources.iter().all(|s| s.document == "policy-a.pdf"));
}

#[tokio::test]
async fn ingesting_twice_is_idempotent() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;
    let text = "Backups are verified weekly by IT operations staff.";

    let first = ingestor(&store, text)
        .run(request("policy-a.pdf"))
        .await
        .expect("first ingest");
    let second = ingestor(&store, text)
        .run(request("policy-a.pdf"))
        .await
        .expect("second ingest");
    assert_eq!(first, second);

    let docs = store.list_documents().await.expect("list");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].chunk_count, first.ingested);
}

#[tokio::test]
async fn empty_document_ingests_zero_chunks() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;

    let outcome = ingestor(&store, "   \n  ")
        .run(request("blank.pdf"))
        .await
        .expect("ingest");
    assert_eq!(outcome.ingested, 0);
    assert!(store.list_documents().await.expect("list").is_empty());
}

#[tokio::test]
async fn missing_input_fails_validation_before_any_call() {
    let tmp = TempDir::new().expect("tmp");
    let store = open_store(&tmp).await;

    let err = ingestor(&store, "irrelevant")
        .run(IngestRequest::default())
        .await
        .expect_err("no path, no bytes");
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");

    let chat = Arc::new(RecordingChat::default());
    let err = engine(&store, &chat)
        .run(QueryRequest::new("   "))
        .await
        .expect_err("blank question");
    assert!(matches!(err, Error::Validation(_)), "got {err:?}");
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn selector_packs_a_rank_order_prefix_within_budget() {
    let chunks = vec!["a".repeat(1000), "b".repeat(2000), "c".repeat(600)];
    let selected = select_context_chunks(&chunks, 3500);
    assert_eq!(selected, vec!["a".repeat(1000), "b".repeat(2000)]);
    let total: usize = selected.iter().map(|c| c.chars().count()).sum();
    assert!(total <= 3500);
}

#[test]
fn selector_accepts_an_exact_fit() {
    let chunks = vec!["x".repeat(3500)];
    assert_eq!(select_context_chunks(&chunks, 3500).len(), 1);
}

#[test]
fn selector_returns_empty_when_first_chunk_exceeds_budget() {
    let chunks = vec!["x".repeat(4000), "y".repeat(100)];
    assert!(select_context_chunks(&chunks, 3500).is_empty());
}

#[test]
fn user_prompt_bullets_each_context() {
    let prompt = build_user_prompt(
        "Who approves exceptions?",
        &["first chunk".to_string(), "second chunk".to_string()],
    );
    assert_eq!(
        prompt,
        "Use the following context to answer the question.\n\n\
         Context:\n- first chunk\n\n- second chunk\n\n\
         Question: Who approves exceptions?\n\
         Answer concisely using the context above."
    );
    assert!(SYSTEM_PROMPT.ends_with("Do not use outside knowledge."));
}
