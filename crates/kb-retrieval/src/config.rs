//! TOML configuration for the retrieval workflow.
//!
//! Every tunable carries a serde default so a partial (or empty) config
//! file is valid. The core components receive these values as plain
//! arguments and never read configuration themselves.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    /// Chunk budget in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Characters of the previous chunk duplicated into the next.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    1000
}
fn default_overlap() -> usize {
    200
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Candidates below this cosine similarity are discarded.
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f64,
    /// Keyword share of the blended score; the vector share is its
    /// complement.
    #[serde(default = "default_keyword_weight")]
    pub keyword_weight: f64,
    /// Maximum results returned to the caller.
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Candidate-pool size requested from the store before ranking.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,
}

fn default_min_similarity() -> f64 {
    0.7
}
fn default_keyword_weight() -> f64 {
    0.3
}
fn default_limit() -> usize {
    10
}
fn default_candidate_limit() -> usize {
    50
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_similarity: default_min_similarity(),
            keyword_weight: default_keyword_weight(),
            limit: default_limit(),
            candidate_limit: default_candidate_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EvaluationConfig {
    /// Similarity at or above which a result counts as relevant when no
    /// explicit judgments are supplied.
    #[serde(default = "default_relevance_threshold")]
    pub relevance_threshold: f64,
}

fn default_relevance_threshold() -> f64 {
    0.75
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            relevance_threshold: default_relevance_threshold(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("parsing config TOML")
    }
}
