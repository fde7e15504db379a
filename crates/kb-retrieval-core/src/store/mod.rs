//! Storage abstraction for the retrieval engine.
//!
//! The [`Store`] trait defines every storage operation the ingestion,
//! retrieval, and evaluation pipelines need, enabling pluggable backends.
//! Durable persistence is an external collaborator; this crate ships only
//! the contract and an in-memory implementation for tests and embedded
//! use.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//!
//! # Operations
//!
//! | Method | Purpose |
//! |--------|---------|
//! | [`upsert_document`](Store::upsert_document) | Insert or update a document |
//! | [`create_chunk`](Store::create_chunk) | Persist one chunk |
//! | [`bulk_create_chunks`](Store::bulk_create_chunks) | Replace a document's chunks in batch |
//! | [`update_chunk_content`](Store::update_chunk_content) | Replace chunk text, refreshing its hash |
//! | [`delete_chunk`](Store::delete_chunk) | Remove a chunk and its dependents |
//! | [`delete_document`](Store::delete_document) | Cascade-remove a document |
//! | [`upsert_embedding`](Store::upsert_embedding) | Store a chunk's vector |
//! | [`get_document`](Store::get_document) | Read one document |
//! | [`list_chunks`](Store::list_chunks) | Read all chunks |
//! | [`search_candidates`](Store::search_candidates) | Vector+keyword scored candidates for a query |
//! | [`get_statistics`](Store::get_statistics) | Read a chunk's statistics row |
//! | [`list_statistics`](Store::list_statistics) | Read all statistics rows |
//! | [`increment_usage`](Store::increment_usage) | Atomic usage-counter bump |
//! | [`update_quality_metrics`](Store::update_quality_metrics) | Overwrite the six metric fields |
//! | [`update_staleness`](Store::update_staleness) | Record staleness-in-days |

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Chunk, ChunkCandidate, ChunkStatistics, MetricsResult, SourceDocument};

/// Abstract storage backend for documents, chunks, vectors, and per-chunk
/// statistics.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or update a document. Returns the document id.
    async fn upsert_document(&self, doc: &SourceDocument) -> Result<String>;

    /// Persist one chunk and seed a zeroed statistics row. Returns the
    /// chunk id.
    async fn create_chunk(&self, chunk: &Chunk) -> Result<String>;

    /// Replace all chunks for a document in one batch, seeding zeroed
    /// statistics rows. Returns the new chunk ids in document order.
    async fn bulk_create_chunks(&self, document_id: &str, chunks: &[Chunk]) -> Result<Vec<String>>;

    /// Replace a chunk's content, refreshing its hash and `updated_at`.
    /// The stored embedding becomes stale and must be re-upserted.
    async fn update_chunk_content(&self, chunk_id: &str, content: &str, now: i64) -> Result<()>;

    /// Remove a chunk, its embedding, and its statistics row.
    async fn delete_chunk(&self, chunk_id: &str) -> Result<()>;

    /// Remove a document and cascade to its chunks, embeddings, and
    /// statistics.
    async fn delete_document(&self, document_id: &str) -> Result<()>;

    /// Store or replace the embedding vector for a chunk.
    async fn upsert_embedding(
        &self,
        chunk_id: &str,
        document_id: &str,
        vector: &[f32],
    ) -> Result<()>;

    /// Read one document by id.
    async fn get_document(&self, document_id: &str) -> Result<Option<SourceDocument>>;

    /// Read every stored chunk, in document order within each document.
    async fn list_chunks(&self) -> Result<Vec<Chunk>>;

    /// Return candidates for one query, each carrying a raw vector score
    /// (cosine similarity against `query_vec`) and a raw keyword score
    /// (lexical match against `query_text`). Category filtering and
    /// blending happen downstream in [`rank`](crate::rank::rank).
    async fn search_candidates(
        &self,
        query_vec: &[f32],
        query_text: &str,
        limit: usize,
    ) -> Result<Vec<ChunkCandidate>>;

    /// Read one chunk's statistics row.
    async fn get_statistics(&self, chunk_id: &str) -> Result<Option<ChunkStatistics>>;

    /// Read every statistics row, in unspecified order.
    async fn list_statistics(&self) -> Result<Vec<ChunkStatistics>>;

    /// Bump a chunk's usage counter and last-used timestamp. Atomic and
    /// monotonic under concurrent retrieval requests.
    async fn increment_usage(&self, chunk_id: &str, now: i64) -> Result<()>;

    /// Overwrite all six quality-metric fields for a chunk (last write
    /// wins) and refresh `refreshed_at`.
    async fn update_quality_metrics(
        &self,
        chunk_id: &str,
        metrics: &MetricsResult,
        now: i64,
    ) -> Result<()>;

    /// Record a chunk's staleness in whole days.
    async fn update_staleness(&self, chunk_id: &str, days: i64) -> Result<()>;
}
