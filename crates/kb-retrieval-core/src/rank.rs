//! Hybrid ranking: filtering, score blending, and deterministic ordering.
//!
//! Operates on already-scored [`ChunkCandidate`]s supplied by the storage
//! collaborator; candidate retrieval itself lives behind the
//! [`Store`](crate::store::Store) trait. This separation keeps the blending
//! and ordering policy testable without any storage dependency.
//!
//! # Scoring
//!
//! 1. Drop candidates with `vector_score < min_similarity`.
//! 2. Drop candidates failing the category filter, if one is given.
//! 3. Blend: `combined = (1 - w) × vector + w × keyword` (default; the
//!    blend function is pluggable via [`rank_with_blend`]).
//! 4. Sort by combined score (desc), vector score (desc), chunk id (asc).
//! 5. Truncate to `limit` and assign 1-based ranks.
//!
//! Keyword scores arrive on an unbounded full-text scale; callers blending
//! them against cosine similarities should first pass the candidate set
//! through [`normalize_keyword_scores`] so both inputs share `[0, 1]`.

use std::cmp::Ordering;

use crate::models::{ChunkCandidate, RankedChunk};

/// Result limit applied when the caller passes 0.
pub const DEFAULT_LIMIT: usize = 10;

/// Blend function signature: `(vector_score, keyword_score, keyword_weight)`.
pub type BlendFn = fn(f64, f64, f64) -> f64;

/// Retrieval tuning parameters for one ranking call.
#[derive(Debug, Clone)]
pub struct RankParams {
    /// Candidates below this vector similarity are discarded. Clamped to
    /// `[0, 1]`.
    pub min_similarity: f64,
    /// Weight of the keyword score in the blend; the vector weight is its
    /// complement. Clamped to `[0, 1]`.
    pub keyword_weight: f64,
    /// Maximum results returned; 0 falls back to [`DEFAULT_LIMIT`].
    pub limit: usize,
    /// When non-empty, a candidate survives only if its document category
    /// contains at least one filter token, case-insensitively. Broader
    /// tokens match narrower categories (`"INDTEC"` matches
    /// `"EVENT_INDTEC"`).
    pub category_filter: Option<Vec<String>>,
}

impl Default for RankParams {
    fn default() -> Self {
        Self {
            min_similarity: 0.0,
            keyword_weight: 0.3,
            limit: DEFAULT_LIMIT,
            category_filter: None,
        }
    }
}

/// The default blend: a linear interpolation weighted by `keyword_weight`.
pub fn linear_blend(vector_score: f64, keyword_score: f64, keyword_weight: f64) -> f64 {
    (1.0 - keyword_weight) * vector_score + keyword_weight * keyword_score
}

/// Rank candidates with the default linear blend.
///
/// Pure: no side effects, no storage access. Empty input or a fully
/// filtered-out candidate set yields an empty vec, never an error.
pub fn rank(candidates: Vec<ChunkCandidate>, params: &RankParams) -> Vec<RankedChunk> {
    rank_with_blend(candidates, params, linear_blend)
}

/// Rank candidates with a caller-supplied blend function.
///
/// The exact combined-score formula is a tunable of the surrounding
/// system, so it is injected here rather than hard-coded.
pub fn rank_with_blend(
    candidates: Vec<ChunkCandidate>,
    params: &RankParams,
    blend: BlendFn,
) -> Vec<RankedChunk> {
    let min_similarity = params.min_similarity.clamp(0.0, 1.0);
    let keyword_weight = params.keyword_weight.clamp(0.0, 1.0);
    let limit = if params.limit == 0 {
        DEFAULT_LIMIT
    } else {
        params.limit
    };

    let filter_tokens: Vec<String> = params
        .category_filter
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(|t| t.to_lowercase())
        .collect();

    let mut scored: Vec<(ChunkCandidate, f64)> = candidates
        .into_iter()
        .filter(|c| c.vector_score >= min_similarity)
        .filter(|c| matches_category(&c.category, &filter_tokens))
        .map(|c| {
            let combined = blend(c.vector_score, c.keyword_score, keyword_weight);
            (c, combined)
        })
        .collect();

    scored.sort_by(|(a, sa), (b, sb)| {
        sb.partial_cmp(sa)
            .unwrap_or(Ordering::Equal)
            .then_with(|| {
                b.vector_score
                    .partial_cmp(&a.vector_score)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.chunk_id.cmp(&b.chunk_id))
    });

    scored.truncate(limit);

    scored
        .into_iter()
        .enumerate()
        .map(|(i, (candidate, combined_score))| RankedChunk {
            candidate,
            combined_score,
            rank: i + 1,
        })
        .collect()
}

/// Min-max normalize the keyword scores of one candidate set to `[0, 1]`.
///
/// Full-text keyword ranks are unbounded and only comparable within a
/// single query; normalizing before the blend keeps them on the same scale
/// as cosine similarities. If all scores are equal they normalize to `1.0`.
pub fn normalize_keyword_scores(candidates: &mut [ChunkCandidate]) {
    if candidates.is_empty() {
        return;
    }

    let s_min = candidates
        .iter()
        .map(|c| c.keyword_score)
        .fold(f64::INFINITY, f64::min);
    let s_max = candidates
        .iter()
        .map(|c| c.keyword_score)
        .fold(f64::NEG_INFINITY, f64::max);

    for c in candidates.iter_mut() {
        c.keyword_score = if (s_max - s_min).abs() < f64::EPSILON {
            1.0
        } else {
            (c.keyword_score - s_min) / (s_max - s_min)
        };
    }
}

/// Case-insensitive substring match of any filter token against the
/// candidate's category. An empty token list admits everything.
fn matches_category(category: &str, filter_tokens: &[String]) -> bool {
    if filter_tokens.is_empty() {
        return true;
    }
    let category = category.to_lowercase();
    filter_tokens.iter().any(|t| category.contains(t.as_str()))
}
