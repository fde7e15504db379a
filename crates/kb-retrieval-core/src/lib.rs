//! # KB Retrieval Core
//!
//! Shared, dependency-light logic for the knowledge-base retrieval engine:
//! data models, sentence-aware chunking, hybrid ranking, retrieval-quality
//! metrics, the store abstraction, and the embedding trait.
//!
//! This crate contains no tokio, database, or network dependencies. All
//! algorithmic paths are pure, synchronous, and total over their normalized
//! input domains — degenerate inputs produce empty results or zero metrics,
//! never errors.

pub mod chunk;
pub mod embedding;
pub mod metrics;
pub mod models;
pub mod rank;
pub mod store;
