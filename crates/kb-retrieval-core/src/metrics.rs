//! Retrieval-quality metrics over a ranked, relevance-annotated result list.
//!
//! Provides standard IR metrics:
//! - Precision@K: proportion of the returned list that is relevant
//! - Recall@K: proportion of all known relevant items that were returned
//! - F1@K: harmonic mean of the two
//! - MRR: reciprocal rank of the first relevant result
//! - MAP: mean of running precision at each relevant position
//! - NDCG: rank-discounted graded gain, normalized against the ideal
//!   ordering, using the similarity score of relevant rows as the gain
//!
//! Every computation is total: empty lists, zero relevant totals, and
//! all-irrelevant inputs resolve to `0.0`. A zero metric is data ("nothing
//! relevant retrieved"), not a failure, so no function here returns a
//! `Result`.

use crate::models::{JudgedResult, MetricsResult, RankedChunk};

/// Precision@K = relevant-in-list / list length. `0.0` for an empty list.
pub fn precision_at_k(results: &[JudgedResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let relevant = results.iter().filter(|r| r.is_relevant).count();
    relevant as f64 / results.len() as f64
}

/// Recall@K = relevant-in-list / `total_relevant`. `0.0` when nothing in
/// the collection is known relevant.
pub fn recall_at_k(results: &[JudgedResult], total_relevant: usize) -> f64 {
    if total_relevant == 0 {
        return 0.0;
    }
    let relevant = results.iter().filter(|r| r.is_relevant).count();
    relevant as f64 / total_relevant as f64
}

/// F1@K = `2PR / (P + R)`, or `0.0` when the denominator vanishes.
pub fn f1_at_k(precision: f64, recall: f64) -> f64 {
    let denom = precision + recall;
    if denom == 0.0 {
        return 0.0;
    }
    2.0 * precision * recall / denom
}

/// Reciprocal rank of the first relevant result in rank order; `0.0` if
/// none is relevant.
pub fn mrr(results: &[JudgedResult]) -> f64 {
    results
        .iter()
        .find(|r| r.is_relevant)
        .map(|r| 1.0 / r.position as f64)
        .unwrap_or(0.0)
}

/// Mean average precision restricted to the given list.
///
/// `MAP = (1/N) × Σ (relevant-so-far at i / i)` over relevant positions
/// `i`, where `N` is the list length. `0.0` when no row is relevant.
pub fn mean_average_precision(results: &[JudgedResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }

    let mut sum = 0.0;
    let mut relevant_so_far = 0usize;
    for r in results {
        if r.is_relevant {
            relevant_so_far += 1;
            sum += relevant_so_far as f64 / r.position as f64;
        }
    }
    if relevant_so_far == 0 {
        return 0.0;
    }
    sum / results.len() as f64
}

/// Normalized discounted cumulative gain over the given list.
///
/// Gain of a row is its similarity score when relevant, `0.0` otherwise.
/// `DCG = Σ gain / log2(position + 1)`; `IDCG` re-sorts the same gains
/// descending (stable, ties keep relative order) onto positions `1..N`.
/// Returns `DCG / IDCG`, or `0.0` when `IDCG` is zero.
pub fn ndcg(results: &[JudgedResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }

    let dcg: f64 = results
        .iter()
        .map(|r| gain(r) / (r.position as f64 + 1.0).log2())
        .sum();

    let mut ideal_gains: Vec<f64> = results.iter().map(gain).collect();
    ideal_gains.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

    let idcg: f64 = ideal_gains
        .iter()
        .enumerate()
        .map(|(i, g)| g / (i as f64 + 2.0).log2())
        .sum();

    if idcg == 0.0 {
        return 0.0;
    }
    (dcg / idcg).clamp(0.0, 1.0)
}

fn gain(r: &JudgedResult) -> f64 {
    if r.is_relevant {
        r.similarity_score
    } else {
        0.0
    }
}

/// Compute all six metrics for one evaluation.
///
/// Precision and recall are computed first; F1 derives from them.
pub fn all_metrics(results: &[JudgedResult], total_relevant: usize) -> MetricsResult {
    let precision = precision_at_k(results);
    let recall = recall_at_k(results, total_relevant);
    MetricsResult {
        precision_at_k: precision,
        recall_at_k: recall,
        f1_at_k: f1_at_k(precision, recall),
        mrr: mrr(results),
        map: mean_average_precision(results),
        ndcg: ndcg(results),
    }
}

/// Derive relevance judgments from a similarity threshold.
///
/// Used when no explicit (curator) judgments are available. The threshold
/// is an external tunable, never hard-coded here.
pub fn judge_by_threshold(ranked: &[RankedChunk], threshold: f64) -> Vec<JudgedResult> {
    ranked
        .iter()
        .map(|r| JudgedResult {
            position: r.rank,
            is_relevant: r.candidate.vector_score >= threshold,
            similarity_score: r.candidate.vector_score,
        })
        .collect()
}

/// Days elapsed since the more recent of a chunk's metric refresh and its
/// owning document's publish date, floored at zero.
pub fn staleness_days(published_at: i64, refreshed_at: Option<i64>, now: i64) -> i64 {
    let reference = match refreshed_at {
        Some(ts) => ts.max(published_at),
        None => published_at,
    };
    ((now - reference) / 86_400).max(0)
}
