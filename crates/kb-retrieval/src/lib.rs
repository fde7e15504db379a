//! # KB Retrieval
//!
//! Workflow layer for the knowledge-base retrieval engine. Wires the pure
//! core (chunking, hybrid ranking, quality metrics) to its external
//! collaborators: a [`Store`](kb_retrieval_core::store::Store) backend and
//! an [`EmbeddingProvider`](kb_retrieval_core::embedding::EmbeddingProvider).
//!
//! ```text
//! ingestion:   document ──▶ chunker ──▶ store + embeddings
//! query:       query ──▶ embed ──▶ candidates ──▶ rank ──▶ usage stats
//! evaluation:  ranked results ──▶ judgments ──▶ metrics ──▶ chunk stats
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`ingest`] | Document → chunk → embed → persist pipeline |
//! | [`query`] | Query → candidates → rank → usage pipeline |
//! | [`evaluate`] | Quality evaluation and staleness refresh |

pub mod config;
pub mod evaluate;
pub mod ingest;
pub mod query;

pub use kb_retrieval_core::models::{MetricsResult, RankedChunk, SourceDocument};
