//! Evaluation pipeline: relevance judgments → metrics → chunk statistics.
//!
//! Metrics computation is pure and total; this module only decides where
//! the judgments come from (explicit curator flags or the similarity
//! threshold heuristic) and persists the result to every chunk that took
//! part in the evaluated retrieval. The staleness refresh job lives here
//! too, since it runs on the same statistics rows in the same update
//! cycle.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{debug, info};

use kb_retrieval_core::metrics::{all_metrics, judge_by_threshold, staleness_days};
use kb_retrieval_core::models::{JudgedResult, MetricsResult, RankedChunk};
use kb_retrieval_core::store::Store;

use crate::config::Config;

/// Score one retrieval and persist the result per chunk.
///
/// When `judgments` is given it must align positionally with `ranked`;
/// missing trailing entries count as not relevant. Without explicit
/// judgments, relevance falls back to the configured similarity
/// threshold. Returns the computed metrics; all six fields are written to
/// each returned chunk's statistics row (last write wins).
pub async fn evaluate_and_record<S>(
    store: &S,
    ranked: &[RankedChunk],
    judgments: Option<&[bool]>,
    total_relevant: usize,
    config: &Config,
) -> Result<MetricsResult>
where
    S: Store + ?Sized,
{
    let judged: Vec<JudgedResult> = match judgments {
        Some(flags) => ranked
            .iter()
            .enumerate()
            .map(|(i, r)| JudgedResult {
                position: r.rank,
                is_relevant: flags.get(i).copied().unwrap_or(false),
                similarity_score: r.candidate.vector_score,
            })
            .collect(),
        None => judge_by_threshold(ranked, config.evaluation.relevance_threshold),
    };

    let metrics = all_metrics(&judged, total_relevant);

    let now = chrono::Utc::now().timestamp();
    for result in ranked {
        store
            .update_quality_metrics(&result.candidate.chunk_id, &metrics, now)
            .await
            .with_context(|| {
                format!("persisting metrics for chunk {}", result.candidate.chunk_id)
            })?;
    }

    debug!(
        results = ranked.len(),
        precision = metrics.precision_at_k,
        ndcg = metrics.ndcg,
        "evaluation recorded"
    );
    Ok(metrics)
}

/// Recompute staleness for every statistics row.
///
/// Staleness is days since the more recent of the row's metric refresh
/// and the owning document's publish date. Rows whose chunk or document
/// has vanished mid-job are skipped. Returns the number of rows updated.
pub async fn refresh_staleness<S>(store: &S, now: i64) -> Result<usize>
where
    S: Store + ?Sized,
{
    let chunks = store.list_chunks().await.context("listing chunks")?;
    let doc_by_chunk: HashMap<String, String> = chunks
        .into_iter()
        .map(|c| (c.id, c.document_id))
        .collect();

    let mut published_by_doc: HashMap<String, i64> = HashMap::new();
    let mut updated = 0usize;

    for stats in store.list_statistics().await.context("listing statistics")? {
        let Some(document_id) = doc_by_chunk.get(&stats.chunk_id) else {
            continue;
        };
        let published_at = match published_by_doc.get(document_id) {
            Some(ts) => *ts,
            None => {
                let Some(doc) = store
                    .get_document(document_id)
                    .await
                    .with_context(|| format!("loading document {}", document_id))?
                else {
                    continue;
                };
                published_by_doc.insert(document_id.clone(), doc.published_at);
                doc.published_at
            }
        };

        let days = staleness_days(published_at, stats.refreshed_at, now);
        store
            .update_staleness(&stats.chunk_id, days)
            .await
            .with_context(|| format!("updating staleness for chunk {}", stats.chunk_id))?;
        updated += 1;
    }

    info!(rows = updated, "staleness refreshed");
    Ok(updated)
}
