//! Query pipeline: embed the query, gather candidates, rank, track usage.
//!
//! The ranking policy itself lives in `kb_retrieval_core::rank`; this
//! module supplies it with scored candidates from the store and records
//! usage on whatever it returns. Usage increments are fire-per-result but
//! atomic per chunk — concurrent queries selecting the same chunk never
//! lose counts.

use anyhow::{Context, Result};
use tracing::debug;

use kb_retrieval_core::embedding::EmbeddingProvider;
use kb_retrieval_core::models::RankedChunk;
use kb_retrieval_core::rank::{normalize_keyword_scores, rank, RankParams};
use kb_retrieval_core::store::Store;

use crate::config::Config;

/// Run one retrieval: embed the query, fetch scored candidates, rank them,
/// and bump usage statistics for every returned chunk.
///
/// An empty or whitespace-only query returns an empty result without
/// calling the embedding collaborator.
pub async fn retrieve<S, E>(
    store: &S,
    embedder: &E,
    query: &str,
    category_filter: Option<Vec<String>>,
    config: &Config,
) -> Result<Vec<RankedChunk>>
where
    S: Store + ?Sized,
    E: EmbeddingProvider + ?Sized,
{
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let query_vec = embedder
        .embed(query)
        .await
        .context("embedding query text")?;

    let mut candidates = store
        .search_candidates(&query_vec, query, config.retrieval.candidate_limit)
        .await
        .context("fetching retrieval candidates")?;

    // Keyword ranks are unbounded; bring them onto the cosine scale
    // before blending.
    normalize_keyword_scores(&mut candidates);

    let params = RankParams {
        min_similarity: config.retrieval.min_similarity,
        keyword_weight: config.retrieval.keyword_weight,
        limit: config.retrieval.limit,
        category_filter,
    };
    let ranked = rank(candidates, &params);

    let now = chrono::Utc::now().timestamp();
    for result in &ranked {
        store
            .increment_usage(&result.candidate.chunk_id, now)
            .await
            .with_context(|| format!("recording usage for chunk {}", result.candidate.chunk_id))?;
    }

    debug!(
        query,
        results = ranked.len(),
        limit = config.retrieval.limit,
        "retrieval complete"
    );
    Ok(ranked)
}
