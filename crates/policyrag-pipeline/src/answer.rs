//! Grounded answer synthesis.

use policyrag_core::traits::{ChatParams, ChatProvider};
use policyrag_core::Result;

/// Grounding contract sent as the system instruction on every call.
pub const SYSTEM_PROMPT: &str = "You are a security policy assistant. \
Answer ONLY using the provided policy context. \
If the context does not contain the answer, say so explicitly. \
Do not use outside knowledge.";

/// User message: the selected context chunks as a bulleted block, then the
/// question.
pub fn build_user_prompt(question: &str, contexts: &[String]) -> String {
    let block = contexts
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Use the following context to answer the question.\n\n\
         Context:\n{block}\n\n\
         Question: {question}\n\
         Answer concisely using the context above."
    )
}

/// Ask the chat model for an answer grounded in `contexts`, returning the
/// trimmed completion. A provider failure propagates to the caller; an
/// answer is never fabricated locally.
pub async fn synthesize(
    chat: &dyn ChatProvider,
    question: &str,
    contexts: &[String],
    params: ChatParams,
) -> Result<String> {
    let user = build_user_prompt(question, contexts);
    let answer = chat.chat(SYSTEM_PROMPT, &user, params).await?;
    Ok(answer.trim().to_string())
}
