//! Greedy context packing under a character budget.

/// Accept candidates in rank order while the running total stays within
/// `budget` characters; stop at the first chunk that would overflow.
///
/// Chunks are never split to fit, so a first candidate larger than the
/// budget yields an empty selection.
pub fn select_context_chunks(chunks: &[String], budget: usize) -> Vec<String> {
    let mut total = 0usize;
    let mut selected = Vec::new();
    for c in chunks {
        let len = c.chars().count();
        if total + len > budget {
            break;
        }
        selected.push(c.clone());
        total += len;
    }
    selected
}
