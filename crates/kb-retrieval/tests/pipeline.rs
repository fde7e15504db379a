//! End-to-end pipeline tests over the in-memory store with a
//! deterministic stub embedder: ingest → retrieve → evaluate → staleness.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use kb_retrieval::config::Config;
use kb_retrieval::evaluate::{evaluate_and_record, refresh_staleness};
use kb_retrieval::ingest::{ingest_document, reembed_chunk};
use kb_retrieval::query::retrieve;
use kb_retrieval_core::embedding::EmbeddingProvider;
use kb_retrieval_core::models::SourceDocument;
use kb_retrieval_core::store::memory::InMemoryStore;
use kb_retrieval_core::store::Store;

/// Embeds text as counts of four topic terms. Deterministic, so
/// identical text always lands on the same vector, and texts about the
/// same topic score high cosine similarity against each other.
struct StubEmbedder {
    calls: AtomicUsize,
}

impl StubEmbedder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

const TOPICS: [&str; 4] = ["rust", "cargo", "recipe", "oven"];

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    fn model_name(&self) -> &str {
        "stub-topic-embedder"
    }

    fn dims(&self) -> usize {
        TOPICS.len()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        Ok(TOPICS
            .iter()
            .map(|t| lower.matches(t).count() as f32)
            .collect())
    }
}

fn test_config() -> Config {
    Config::from_toml_str(
        r#"
[chunking]
chunk_size = 60
overlap = 0

[retrieval]
min_similarity = 0.3
keyword_weight = 0.3
limit = 5

[evaluation]
relevance_threshold = 0.5
"#,
    )
    .unwrap()
}

fn rust_doc() -> SourceDocument {
    SourceDocument {
        id: "doc-rust".to_string(),
        category: "TECH_RUST".to_string(),
        title: Some("Rust notes".to_string()),
        body: "Rust ships with cargo. Cargo builds Rust crates quickly. \
               The borrow checker keeps Rust programs safe."
            .to_string(),
        published_at: 1_700_000_000,
        updated_at: 1_700_000_000,
    }
}

fn recipe_doc() -> SourceDocument {
    SourceDocument {
        id: "doc-recipe".to_string(),
        category: "FOOD_RECIPE".to_string(),
        title: Some("Bread recipe".to_string()),
        body: "This recipe needs an oven. Preheat the oven before the recipe starts."
            .to_string(),
        published_at: 1_700_000_000,
        updated_at: 1_700_000_000,
    }
}

#[tokio::test]
async fn test_ingest_then_retrieve_ranks_matching_document() {
    let store = InMemoryStore::new();
    let embedder = StubEmbedder::new();
    let config = test_config();

    let rust_ids = ingest_document(&store, &embedder, &rust_doc(), &config)
        .await
        .unwrap();
    let recipe_ids = ingest_document(&store, &embedder, &recipe_doc(), &config)
        .await
        .unwrap();
    assert!(!rust_ids.is_empty());
    assert!(!recipe_ids.is_empty());

    let ranked = retrieve(&store, &embedder, "rust cargo", None, &config)
        .await
        .unwrap();
    assert!(!ranked.is_empty());
    for (i, r) in ranked.iter().enumerate() {
        assert_eq!(r.rank, i + 1);
        assert_eq!(r.candidate.document_id, "doc-rust");
        assert!(r.candidate.vector_score >= 0.3);
    }
    for pair in ranked.windows(2) {
        assert!(pair[0].combined_score >= pair[1].combined_score);
    }

    // Usage was recorded for every returned chunk.
    for r in &ranked {
        let stats = store
            .get_statistics(&r.candidate.chunk_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.usage_count, 1);
        assert!(stats.last_used_at.is_some());
    }
}

#[tokio::test]
async fn test_category_filter_restricts_results() {
    let store = InMemoryStore::new();
    let embedder = StubEmbedder::new();
    let config = test_config();

    ingest_document(&store, &embedder, &rust_doc(), &config)
        .await
        .unwrap();
    ingest_document(&store, &embedder, &recipe_doc(), &config)
        .await
        .unwrap();

    // "food" matches category FOOD_RECIPE case-insensitively, but the
    // rust query's similarity keeps recipe chunks out: nothing survives.
    let ranked = retrieve(
        &store,
        &embedder,
        "rust cargo",
        Some(vec!["food".to_string()]),
        &config,
    )
    .await
    .unwrap();
    assert!(ranked.is_empty());

    let ranked = retrieve(
        &store,
        &embedder,
        "rust cargo",
        Some(vec!["tech".to_string()]),
        &config,
    )
    .await
    .unwrap();
    assert!(!ranked.is_empty());
    for r in &ranked {
        assert_eq!(r.candidate.category, "TECH_RUST");
    }
}

#[tokio::test]
async fn test_empty_query_skips_embedding() {
    let store = InMemoryStore::new();
    let embedder = StubEmbedder::new();
    let config = test_config();

    ingest_document(&store, &embedder, &rust_doc(), &config)
        .await
        .unwrap();
    let calls_after_ingest = embedder.calls.load(Ordering::SeqCst);

    let ranked = retrieve(&store, &embedder, "   ", None, &config)
        .await
        .unwrap();
    assert!(ranked.is_empty());
    assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_ingest);
}

#[tokio::test]
async fn test_evaluation_persists_metrics_per_chunk() {
    let store = InMemoryStore::new();
    let embedder = StubEmbedder::new();
    let config = test_config();

    ingest_document(&store, &embedder, &rust_doc(), &config)
        .await
        .unwrap();

    let ranked = retrieve(&store, &embedder, "rust cargo", None, &config)
        .await
        .unwrap();
    assert!(!ranked.is_empty());

    // Threshold-derived judgments: every returned chunk scores above 0.5
    // on this query, so precision is 1.0.
    let metrics = evaluate_and_record(&store, &ranked, None, ranked.len(), &config)
        .await
        .unwrap();
    assert!((metrics.precision_at_k - 1.0).abs() < 1e-9);
    assert!((metrics.mrr - 1.0).abs() < 1e-9);

    for r in &ranked {
        let stats = store
            .get_statistics(&r.candidate.chunk_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stats.metrics, Some(metrics));
        assert!(stats.refreshed_at.is_some());
    }

    // Explicit judgments override the threshold heuristic.
    let flags: Vec<bool> = ranked.iter().map(|r| r.rank == 1).collect();
    let metrics = evaluate_and_record(&store, &ranked, Some(&flags), 1, &config)
        .await
        .unwrap();
    assert!((metrics.recall_at_k - 1.0).abs() < 1e-9);
    assert!((metrics.precision_at_k - 1.0 / ranked.len() as f64).abs() < 1e-9);
}

#[tokio::test]
async fn test_staleness_refresh_updates_all_rows() {
    let store = InMemoryStore::new();
    let embedder = StubEmbedder::new();
    let config = test_config();

    ingest_document(&store, &embedder, &rust_doc(), &config)
        .await
        .unwrap();

    let five_days_on = chrono::Utc::now().timestamp() + 5 * 86_400;
    let updated = refresh_staleness(&store, five_days_on).await.unwrap();
    assert!(updated > 0);

    for stats in store.list_statistics().await.unwrap() {
        // No metric refresh yet, so staleness counts from the document's
        // publish date, which is well in the past.
        assert!(stats.staleness_days.unwrap() > 5);
    }

    let ranked = retrieve(&store, &embedder, "rust cargo", None, &config)
        .await
        .unwrap();
    evaluate_and_record(&store, &ranked, None, ranked.len(), &config)
        .await
        .unwrap();
    // Re-anchor the clock after the evaluation so whole-day division is
    // exact regardless of wall-clock seconds spent above.
    let refreshed_at = store
        .get_statistics(&ranked[0].candidate.chunk_id)
        .await
        .unwrap()
        .unwrap()
        .refreshed_at
        .unwrap();
    refresh_staleness(&store, refreshed_at + 5 * 86_400)
        .await
        .unwrap();

    for r in &ranked {
        let stats = store
            .get_statistics(&r.candidate.chunk_id)
            .await
            .unwrap()
            .unwrap();
        // Metrics were just refreshed; staleness now counts from that.
        assert_eq!(stats.staleness_days, Some(5));
    }
}

#[tokio::test]
async fn test_delete_document_removes_results() {
    let store = InMemoryStore::new();
    let embedder = StubEmbedder::new();
    let config = test_config();

    ingest_document(&store, &embedder, &rust_doc(), &config)
        .await
        .unwrap();
    store.delete_document("doc-rust").await.unwrap();

    let ranked = retrieve(&store, &embedder, "rust cargo", None, &config)
        .await
        .unwrap();
    assert!(ranked.is_empty());
    assert!(store.list_statistics().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_chunk_edit_and_reembed_round_trip() {
    let store = InMemoryStore::new();
    let embedder = StubEmbedder::new();
    let config = test_config();

    let ids = ingest_document(&store, &embedder, &rust_doc(), &config)
        .await
        .unwrap();
    let target = &ids[0];

    let now = chrono::Utc::now().timestamp();
    let new_content = "This chunk now describes a recipe for the oven.";
    store
        .update_chunk_content(target, new_content, now)
        .await
        .unwrap();

    // Until re-embedding, the edited chunk has no vector and cannot pass
    // the similarity floor.
    let ranked = retrieve(&store, &embedder, "recipe oven", None, &config)
        .await
        .unwrap();
    assert!(ranked.iter().all(|r| &r.candidate.chunk_id != target));

    reembed_chunk(&store, &embedder, target, "doc-rust", new_content)
        .await
        .unwrap();
    let ranked = retrieve(&store, &embedder, "recipe oven", None, &config)
        .await
        .unwrap();
    assert!(ranked.iter().any(|r| &r.candidate.chunk_id == target));
}

#[tokio::test]
async fn test_reingest_replaces_chunks() {
    let store = InMemoryStore::new();
    let embedder = StubEmbedder::new();
    let config = test_config();

    let first_ids = ingest_document(&store, &embedder, &rust_doc(), &config)
        .await
        .unwrap();

    let mut edited = rust_doc();
    edited.body = "Cargo workspaces organize Rust crates.".to_string();
    let second_ids = ingest_document(&store, &embedder, &edited, &config)
        .await
        .unwrap();

    assert!(!second_ids.is_empty());
    for id in &first_ids {
        assert!(store.get_statistics(id).await.unwrap().is_none());
    }
    let chunks = store.list_chunks().await.unwrap();
    assert_eq!(chunks.len(), second_ids.len());
}
