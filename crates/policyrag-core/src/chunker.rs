//! Sliding-window text chunking.
//!
//! Splits extracted document text into overlapping windows sized in
//! characters, preferring paragraph/sentence/word boundaries near the
//! target. Offsets always land on `char` boundaries, so multi-byte text is
//! never split mid code point.

/// Window sizing, in characters.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    pub target_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            target_chars: 1000,
            overlap_chars: 200,
        }
    }
}

/// Split `text` into ordered, overlapping, non-empty chunks.
///
/// Empty or whitespace-only input yields an empty sequence, not an error.
pub fn split_text(text: &str, cfg: &ChunkConfig) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    // Byte offset of every char boundary, plus the end of the text.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let n_chars = bounds.len() - 1;
    if n_chars <= cfg.target_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize; // char index
    while start < n_chars {
        let hard_end = (start + cfg.target_chars).min(n_chars);
        let mut end = hard_end;
        if hard_end < n_chars {
            let window = &text[bounds[start]..bounds[hard_end]];
            if let Some(rel) = find_break_point(window) {
                // All break patterns are ASCII, so `rel` is a char boundary
                // and the lookup below is exact.
                let abs = bounds[start] + rel;
                let snapped = bounds.partition_point(|&b| b < abs);
                if snapped > start {
                    end = snapped;
                }
            }
        }
        let piece = text[bounds[start]..bounds[end]].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }
        if end >= n_chars {
            break;
        }
        let step = end - start;
        // Short windows advance past their end to guarantee progress.
        start = if step <= cfg.overlap_chars {
            end
        } else {
            end - cfg.overlap_chars
        };
    }
    chunks
}

/// Best break offset within `window`, or `None` to cut at the hard limit.
/// Prefers paragraph breaks, then sentence ends, then line breaks, then any
/// word boundary.
fn find_break_point(window: &str) -> Option<usize> {
    let len = window.len();

    if let Some(pos) = window.rfind("\n\n") {
        if pos > len / 3 {
            return Some(pos + 2);
        }
    }

    for pat in [". ", "! ", "? ", ".\n", "!\n", "?\n"] {
        if let Some(pos) = window.rfind(pat) {
            if pos > len / 3 {
                return Some(pos + pat.len());
            }
        }
    }

    if let Some(pos) = window.rfind('\n') {
        if pos > len / 3 {
            return Some(pos + 1);
        }
    }

    if let Some(pos) = window.rfind(' ') {
        if pos > 0 {
            return Some(pos + 1);
        }
    }

    None
}
