//! In-memory [`Store`] implementation for tests and embedded use.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock` for thread safety.
//! Vector scoring is brute-force cosine similarity over all stored
//! vectors; keyword scoring counts query-term matches in chunk text.
//! Statistics mutations hold the write lock across the whole
//! read-modify-write, which makes usage increments atomic.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::cosine_similarity;
use crate::models::{Chunk, ChunkCandidate, ChunkStatistics, MetricsResult, SourceDocument};

use super::Store;

struct StoredVector {
    chunk_id: String,
    document_id: String,
    vector: Vec<f32>,
}

/// In-memory store backing the pipelines in tests and embedded setups.
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, SourceDocument>>,
    chunks: RwLock<Vec<Chunk>>,
    vectors: RwLock<Vec<StoredVector>>,
    stats: RwLock<HashMap<String, ChunkStatistics>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            chunks: RwLock::new(Vec::new()),
            vectors: RwLock::new(Vec::new()),
            stats: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn keyword_score(text: &str, query_terms: &[&str]) -> f64 {
    let text_lower = text.to_lowercase();
    query_terms
        .iter()
        .filter(|t| text_lower.contains(**t))
        .count() as f64
}

fn snippet_of(text: &str) -> String {
    text.chars().take(240).collect()
}

#[async_trait]
impl Store for InMemoryStore {
    async fn upsert_document(&self, doc: &SourceDocument) -> Result<String> {
        let mut docs = self.docs.write().unwrap();
        docs.insert(doc.id.clone(), doc.clone());
        Ok(doc.id.clone())
    }

    async fn create_chunk(&self, chunk: &Chunk) -> Result<String> {
        self.chunks.write().unwrap().push(chunk.clone());
        self.stats
            .write()
            .unwrap()
            .insert(chunk.id.clone(), ChunkStatistics::new(&chunk.id));
        Ok(chunk.id.clone())
    }

    async fn bulk_create_chunks(&self, document_id: &str, chunks: &[Chunk]) -> Result<Vec<String>> {
        let replaced: Vec<String> = {
            let mut stored = self.chunks.write().unwrap();
            let replaced = stored
                .iter()
                .filter(|c| c.document_id == document_id)
                .map(|c| c.id.clone())
                .collect();
            stored.retain(|c| c.document_id != document_id);
            stored.extend(chunks.iter().cloned());
            replaced
        };

        {
            let mut vectors = self.vectors.write().unwrap();
            vectors.retain(|v| v.document_id != document_id);
        }
        {
            let mut stats = self.stats.write().unwrap();
            for id in &replaced {
                stats.remove(id);
            }
            for c in chunks {
                stats.insert(c.id.clone(), ChunkStatistics::new(&c.id));
            }
        }

        Ok(chunks.iter().map(|c| c.id.clone()).collect())
    }

    async fn update_chunk_content(&self, chunk_id: &str, content: &str, now: i64) -> Result<()> {
        {
            let mut chunks = self.chunks.write().unwrap();
            if let Some(chunk) = chunks.iter_mut().find(|c| c.id == chunk_id) {
                chunk.content = content.to_string();
                chunk.hash = content_hash(content);
                chunk.updated_at = now;
            }
        }
        // The old vector no longer matches the content; drop it until the
        // caller re-embeds.
        let mut vectors = self.vectors.write().unwrap();
        vectors.retain(|v| v.chunk_id != chunk_id);
        Ok(())
    }

    async fn delete_chunk(&self, chunk_id: &str) -> Result<()> {
        self.chunks.write().unwrap().retain(|c| c.id != chunk_id);
        self.vectors
            .write()
            .unwrap()
            .retain(|v| v.chunk_id != chunk_id);
        self.stats.write().unwrap().remove(chunk_id);
        Ok(())
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let removed: Vec<String> = {
            let mut chunks = self.chunks.write().unwrap();
            let removed = chunks
                .iter()
                .filter(|c| c.document_id == document_id)
                .map(|c| c.id.clone())
                .collect();
            chunks.retain(|c| c.document_id != document_id);
            removed
        };
        self.vectors
            .write()
            .unwrap()
            .retain(|v| v.document_id != document_id);
        {
            let mut stats = self.stats.write().unwrap();
            for id in &removed {
                stats.remove(id);
            }
        }
        self.docs.write().unwrap().remove(document_id);
        Ok(())
    }

    async fn upsert_embedding(
        &self,
        chunk_id: &str,
        document_id: &str,
        vector: &[f32],
    ) -> Result<()> {
        let mut vectors = self.vectors.write().unwrap();
        vectors.retain(|v| v.chunk_id != chunk_id);
        vectors.push(StoredVector {
            chunk_id: chunk_id.to_string(),
            document_id: document_id.to_string(),
            vector: vector.to_vec(),
        });
        Ok(())
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<SourceDocument>> {
        Ok(self.docs.read().unwrap().get(document_id).cloned())
    }

    async fn list_chunks(&self) -> Result<Vec<Chunk>> {
        let mut chunks: Vec<Chunk> = self.chunks.read().unwrap().clone();
        chunks.sort_by(|a, b| a.document_id.cmp(&b.document_id).then(a.index.cmp(&b.index)));
        Ok(chunks)
    }

    async fn search_candidates(
        &self,
        query_vec: &[f32],
        query_text: &str,
        limit: usize,
    ) -> Result<Vec<ChunkCandidate>> {
        let query_lower = query_text.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();

        let docs = self.docs.read().unwrap();
        let chunks = self.chunks.read().unwrap();
        let vectors = self.vectors.read().unwrap();

        let vec_by_chunk: HashMap<&str, &[f32]> = vectors
            .iter()
            .map(|v| (v.chunk_id.as_str(), v.vector.as_slice()))
            .collect();

        let mut candidates: Vec<ChunkCandidate> = chunks
            .iter()
            .map(|c| {
                let vector_score = vec_by_chunk
                    .get(c.id.as_str())
                    .map(|v| cosine_similarity(query_vec, v) as f64)
                    .unwrap_or(0.0);
                let category = docs
                    .get(&c.document_id)
                    .map(|d| d.category.clone())
                    .unwrap_or_default();
                ChunkCandidate {
                    chunk_id: c.id.clone(),
                    document_id: c.document_id.clone(),
                    category,
                    snippet: snippet_of(&c.content),
                    vector_score,
                    keyword_score: keyword_score(&c.content, &terms),
                }
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.vector_score
                .partial_cmp(&a.vector_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.keyword_score
                        .partial_cmp(&a.keyword_score)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn get_statistics(&self, chunk_id: &str) -> Result<Option<ChunkStatistics>> {
        Ok(self.stats.read().unwrap().get(chunk_id).cloned())
    }

    async fn list_statistics(&self) -> Result<Vec<ChunkStatistics>> {
        Ok(self.stats.read().unwrap().values().cloned().collect())
    }

    async fn increment_usage(&self, chunk_id: &str, now: i64) -> Result<()> {
        let mut stats = self.stats.write().unwrap();
        let entry = stats
            .entry(chunk_id.to_string())
            .or_insert_with(|| ChunkStatistics::new(chunk_id));
        entry.usage_count += 1;
        entry.last_used_at = Some(now);
        Ok(())
    }

    async fn update_quality_metrics(
        &self,
        chunk_id: &str,
        metrics: &MetricsResult,
        now: i64,
    ) -> Result<()> {
        let mut stats = self.stats.write().unwrap();
        let entry = stats
            .entry(chunk_id.to_string())
            .or_insert_with(|| ChunkStatistics::new(chunk_id));
        entry.metrics = Some(*metrics);
        entry.refreshed_at = Some(now);
        Ok(())
    }

    async fn update_staleness(&self, chunk_id: &str, days: i64) -> Result<()> {
        let mut stats = self.stats.write().unwrap();
        if let Some(entry) = stats.get_mut(chunk_id) {
            entry.staleness_days = Some(days);
        }
        Ok(())
    }
}
