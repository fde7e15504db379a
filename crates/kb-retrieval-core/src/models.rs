//! Core data models used throughout the retrieval engine.
//!
//! These types represent the documents, chunks, candidates, and statistics
//! that flow through the ingestion, retrieval, and evaluation pipelines.
//! Timestamps are Unix seconds (`i64`); formatting to ISO 8601 happens at
//! display edges only.

use serde::{Deserialize, Serialize};

/// A source document as supplied by the ingestion caller.
///
/// Immutable once chunked, apart from metadata edits. Chunking never
/// mutates the document itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    /// Category tag used for filtered retrieval (e.g. `"EVENT_INDTEC"`).
    pub category: String,
    pub title: Option<String>,
    pub body: String,
    /// Publish timestamp, Unix seconds.
    pub published_at: i64,
    /// Last metadata/content update, Unix seconds.
    pub updated_at: i64,
}

/// A retrievable text segment derived from a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    /// Position within the document, contiguous from 0.
    pub index: i64,
    pub content: String,
    /// SHA-256 of `content`, used for re-embedding staleness detection.
    pub hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A candidate chunk scored for one query by the storage collaborator.
///
/// Carries both raw scores so the ranker can filter, blend, and order
/// without further store round-trips. Ephemeral: lives only for the
/// duration of one retrieval call.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkCandidate {
    pub chunk_id: String,
    pub document_id: String,
    /// Owning document's category tag.
    pub category: String,
    /// Text excerpt for display.
    pub snippet: String,
    /// Cosine similarity in `[-1, 1]`, typically `[0, 1]` for normalized
    /// embeddings.
    pub vector_score: f64,
    /// Non-negative lexical relevance; comparable only within one query.
    pub keyword_score: f64,
}

/// A candidate after blending, with its final position.
#[derive(Debug, Clone, Serialize)]
pub struct RankedChunk {
    pub candidate: ChunkCandidate,
    pub combined_score: f64,
    /// 1-based position in the returned ordering.
    pub rank: usize,
}

/// One row of the metrics engine's input: a ranked result annotated with a
/// relevance judgment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgedResult {
    /// 1-based rank position.
    pub position: usize,
    pub is_relevant: bool,
    pub similarity_score: f64,
}

/// The six retrieval-quality metrics for one evaluation, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub f1_at_k: f64,
    pub mrr: f64,
    pub map: f64,
    pub ndcg: f64,
}

/// Long-run statistics tracked per chunk, keyed 1:1 by chunk id.
///
/// Usage increments are atomic and monotonic; metric updates overwrite all
/// six fields together (last write wins). Deleted only when the owning
/// chunk is deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkStatistics {
    pub chunk_id: String,
    pub usage_count: u64,
    pub last_used_at: Option<i64>,
    /// Unset until the first evaluation cycle runs.
    pub metrics: Option<MetricsResult>,
    pub staleness_days: Option<i64>,
    /// When metrics were last recomputed, Unix seconds.
    pub refreshed_at: Option<i64>,
}

impl ChunkStatistics {
    /// A zeroed statistics row for a freshly created chunk.
    pub fn new(chunk_id: impl Into<String>) -> Self {
        Self {
            chunk_id: chunk_id.into(),
            usage_count: 0,
            last_used_at: None,
            metrics: None,
            staleness_days: None,
            refreshed_at: None,
        }
    }
}

/// Format a Unix timestamp as ISO 8601.
pub fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
