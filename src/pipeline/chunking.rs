//! Character-budget chunking with natural-boundary splits.
//!
//! Chunks accumulate until they hit the budget, then split backward at the
//! last sentence boundary available inside the window: period first, then
//! comma, then space, else a hard cut at the budget. The same routine
//! segments corpus documents at ingestion and long user queries at request
//! time, so both sides of retrieval see comparably sized text.

/// Default character budget per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 200;

/// Split raw text into trimmed chunks of at most `max_chunk_size` characters.
///
/// Splits prefer the last `.` in the window, then the last `,`, then the last
/// space; the delimiter stays with the leading chunk for `.` and `,` and is
/// dropped for spaces. When no delimiter exists the text is cut at exactly the
/// budget. Empty and whitespace-only chunks are never emitted, so
/// concatenating the result reconstructs the input modulo whitespace.
pub fn chunk_text(text: &str, max_chunk_size: usize) -> Vec<String> {
    let max_chunk_size = max_chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for ch in text.chars() {
        current.push(ch);
        current_len += 1;

        if current_len >= max_chunk_size {
            let rest = current.split_off(split_point(&current));
            push_chunk(&mut chunks, &current);
            current = rest.trim().to_string();
            current_len = current.chars().count();
        }
    }

    push_chunk(&mut chunks, &current);
    chunks
}

/// Byte offset to split the accumulated window at.
///
/// Delimiters are ASCII, so `idx + 1` always lands on a char boundary; the
/// no-delimiter fallback cuts at the end of the window, which holds exactly
/// the budgeted number of characters when this is called.
fn split_point(chunk: &str) -> usize {
    if let Some(idx) = chunk.rfind('.') {
        idx + 1
    } else if let Some(idx) = chunk.rfind(',') {
        idx + 1
    } else if let Some(idx) = chunk.rfind(' ') {
        idx
    } else {
        chunk.len()
    }
}

fn push_chunk(chunks: &mut Vec<String>, candidate: &str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
