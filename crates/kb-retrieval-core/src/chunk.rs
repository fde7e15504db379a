//! Sentence-boundary text chunker with configurable overlap.
//!
//! Splits document body text into retrievable chunks that respect a
//! configurable character budget. Splitting occurs only on sentence
//! boundaries; a chunk boundary never falls inside a sentence, so a single
//! sentence longer than the budget is emitted whole rather than split.
//!
//! Each persisted chunk receives a v4 UUID and a SHA-256 hash of its text
//! for staleness detection in the embedding pipeline.
//!
//! # Algorithm
//!
//! 1. Trim the input; empty text produces no chunks.
//! 2. Scan left-to-right for sentence units. A boundary is declared after a
//!    terminator (`.`, `!`, `?`) followed by whitespace whose next
//!    non-whitespace character is uppercase, after a terminator at
//!    end-of-input, or at a double newline (consumed, kept in neither unit).
//! 3. Greedily pack sentence units into chunks up to `chunk_size`
//!    characters, joining packed sentences with a single space.
//! 4. When a chunk closes, seed the next one with the last `overlap`
//!    characters of the closed chunk, advanced to the following word
//!    boundary when that boundary falls in the first half of the tail.
//! 5. Emit any trailing buffer as the final chunk.
//!
//! All size arithmetic counts Unicode scalar values, not bytes, so
//! multibyte input never splits inside a code point.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::Chunk;

/// Default chunk budget in characters, applied when the caller passes 0.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Sentence terminators recognized by the boundary scan.
const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Split text into overlapping chunks on sentence boundaries.
///
/// # Normalization
///
/// - `chunk_size == 0` falls back to [`DEFAULT_CHUNK_SIZE`].
/// - `overlap >= chunk_size` is clamped to `chunk_size / 2`.
/// - Leading/trailing whitespace is trimmed; empty or whitespace-only
///   input yields an empty vec, never an error.
///
/// # Guarantees
///
/// - Output order equals document order and is deterministic.
/// - No chunk boundary splits a sentence; every chunk except one holding a
///   single oversized sentence stays within `chunk_size` characters.
/// - Overlap duplicates only a trailing suffix of the immediately
///   preceding chunk, never content from two chunks back.
pub fn split_chunks(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    };
    let overlap = if overlap >= chunk_size {
        chunk_size / 2
    } else {
        overlap
    };

    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut current_size: usize = 0;

    for sentence in split_sentences(text) {
        let len = sentence.chars().count();

        if current_size > 0 && current_size + len > chunk_size {
            let closed = buf.trim().to_string();
            if overlap > 0 {
                buf = overlap_tail(&closed, overlap);
                current_size = buf.chars().count();
            } else {
                buf.clear();
                current_size = 0;
            }
            chunks.push(closed);
        }

        if !buf.is_empty() {
            buf.push(' ');
            current_size += 1;
        }
        buf.push_str(&sentence);
        current_size += len;
    }

    let last = buf.trim();
    if !last.is_empty() {
        chunks.push(last.to_string());
    }

    chunks
}

/// Chunk a document body and wrap each piece as a persisted-shape [`Chunk`]
/// with a UUID, contiguous indices from 0, a SHA-256 content hash, and the
/// supplied timestamp.
pub fn chunk_document(
    document_id: &str,
    text: &str,
    chunk_size: usize,
    overlap: usize,
    now: i64,
) -> Vec<Chunk> {
    split_chunks(text, chunk_size, overlap)
        .into_iter()
        .enumerate()
        .map(|(index, content)| make_chunk(document_id, index as i64, &content, now))
        .collect()
}

/// Split trimmed text into sentence units.
///
/// Single left-to-right pass, no backtracking. Each emitted unit is
/// trimmed; empty units are discarded. Trailing text without a terminator
/// is emitted as a final unit.
fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Double newline: hard paragraph break, consumed by neither unit.
        if c == '\n' && i + 1 < chars.len() && chars[i + 1] == '\n' {
            flush_sentence(&mut sentences, &mut buf);
            i += 2;
            continue;
        }

        buf.push(c);

        if TERMINATORS.contains(&c) {
            if i + 1 == chars.len() {
                flush_sentence(&mut sentences, &mut buf);
            } else if chars[i + 1].is_whitespace() {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_uppercase() {
                    flush_sentence(&mut sentences, &mut buf);
                }
            }
        }

        i += 1;
    }

    flush_sentence(&mut sentences, &mut buf);
    sentences
}

fn flush_sentence(sentences: &mut Vec<String>, buf: &mut String) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    buf.clear();
}

/// Take the last `overlap` characters of a closed chunk, advanced past the
/// first word boundary when that boundary falls within the first half of
/// the tail, so the seeded overlap does not start mid-word.
fn overlap_tail(chunk: &str, overlap: usize) -> String {
    let chars: Vec<char> = chunk.chars().collect();
    let start = chars.len().saturating_sub(overlap);
    let tail = &chars[start..];

    if let Some(pos) = tail.iter().position(|&c| c == ' ') {
        if pos < tail.len() / 2 {
            return tail[pos + 1..].iter().collect();
        }
    }
    tail.iter().collect()
}

/// Create a single [`Chunk`] with a UUID and SHA-256 content hash.
fn make_chunk(document_id: &str, index: i64, content: &str, now: i64) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        document_id: document_id.to_string(),
        index,
        content: content.to_string(),
        hash,
        created_at: now,
        updated_at: now,
    }
}
