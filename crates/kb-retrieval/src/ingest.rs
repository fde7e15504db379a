//! Ingestion pipeline: document → chunks → embeddings → store.
//!
//! Chunking is pure and never fails; the fallible steps are the store
//! writes and the embedding calls, each surfaced with context. Ingesting a
//! document that already exists replaces its chunks (and their statistics)
//! wholesale.

use anyhow::{Context, Result};
use tracing::{debug, info};

use kb_retrieval_core::chunk::chunk_document;
use kb_retrieval_core::embedding::EmbeddingProvider;
use kb_retrieval_core::models::SourceDocument;
use kb_retrieval_core::store::Store;

use crate::config::Config;

/// Ingest one document: persist it, chunk its body, store the chunks in
/// bulk, and embed each chunk. Returns the new chunk ids in document
/// order.
///
/// An empty or whitespace-only body produces no chunks (the document
/// itself is still persisted).
pub async fn ingest_document<S, E>(
    store: &S,
    embedder: &E,
    doc: &SourceDocument,
    config: &Config,
) -> Result<Vec<String>>
where
    S: Store + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    let now = chrono::Utc::now().timestamp();

    store
        .upsert_document(doc)
        .await
        .with_context(|| format!("upserting document {}", doc.id))?;

    let chunks = chunk_document(
        &doc.id,
        &doc.body,
        config.chunking.chunk_size,
        config.chunking.overlap,
        now,
    );
    if chunks.is_empty() {
        debug!(document_id = %doc.id, "document body empty, no chunks created");
        return Ok(Vec::new());
    }

    let chunk_ids = store
        .bulk_create_chunks(&doc.id, &chunks)
        .await
        .with_context(|| format!("storing chunks for document {}", doc.id))?;

    for chunk in &chunks {
        let vector = embedder
            .embed(&chunk.content)
            .await
            .with_context(|| format!("embedding chunk {}", chunk.id))?;
        store
            .upsert_embedding(&chunk.id, &doc.id, &vector)
            .await
            .with_context(|| format!("storing embedding for chunk {}", chunk.id))?;
    }

    info!(
        document_id = %doc.id,
        chunks = chunk_ids.len(),
        model = embedder.model_name(),
        "document ingested"
    );
    Ok(chunk_ids)
}

/// Re-embed one chunk after its content was edited.
///
/// The store drops the stale vector on content update; this restores it.
pub async fn reembed_chunk<S, E>(
    store: &S,
    embedder: &E,
    chunk_id: &str,
    document_id: &str,
    content: &str,
) -> Result<()>
where
    S: Store + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    let vector = embedder
        .embed(content)
        .await
        .with_context(|| format!("re-embedding chunk {}", chunk_id))?;
    store
        .upsert_embedding(chunk_id, document_id, &vector)
        .await
        .with_context(|| format!("storing embedding for chunk {}", chunk_id))?;
    debug!(chunk_id, "chunk re-embedded");
    Ok(())
}
