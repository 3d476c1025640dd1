//! Hybrid Search Coordinator.
//!
//! Combines a similarity-ranked candidate set with the Metadata Filter
//! Engine's result set by record identity.
//!
//! # Algorithm
//!
//! 1. Embed the query text once (a precomputed vector is used as-is).
//! 2. Ask the store for every record with similarity `>= threshold`.
//! 3. With no effective filter, return that set unchanged.
//! 4. Otherwise run the filter (concurrently with steps 1-2) and keep the
//!    records present in both sets.
//!
//! The intersection is ordered by [`ResultOrdering`]: `FilterOrder` follows
//! the metadata result's order, `SimilarityRank` keeps descending
//! similarity. Both orderings return exactly the same set.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use landmem_core::{Error, PlotRecord, RecordId, Result, SearchFilter};
use landmem_vector::{EmbeddingProvider, PlotStore, ScoredRecord};
use serde::{Deserialize, Serialize};

use crate::filter::{MetadataFilterEngine, describe_filter, translate};

/// Minimum similarity a candidate needs by default.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.75;

/// Default number of results returned by the search facade.
pub const DEFAULT_MATCH_COUNT: usize = 20;

/// What to search for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchQuery {
    /// Free text, embedded once per search.
    Text(String),
    /// A precomputed query vector.
    Embedding(Vec<f32>),
}

impl SearchQuery {
    /// Short description for logs and error contexts.
    pub fn describe(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Embedding(vector) => format!("<{}-dimensional embedding>", vector.len()),
        }
    }
}

impl From<&str> for SearchQuery {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for SearchQuery {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Vec<f32>> for SearchQuery {
    fn from(vector: Vec<f32>) -> Self {
        Self::Embedding(vector)
    }
}

/// Order of a filtered (intersected) result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrdering {
    /// Metadata result order (store order).
    #[default]
    FilterOrder,
    /// Descending similarity.
    SimilarityRank,
}

impl fmt::Display for ResultOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::FilterOrder => "filter",
            Self::SimilarityRank => "similarity",
        })
    }
}

impl FromStr for ResultOrdering {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filter" | "filter_order" => Ok(Self::FilterOrder),
            "similarity" | "similarity_rank" => Ok(Self::SimilarityRank),
            other => Err(Error::config(format!(
                "Unknown result ordering '{other}'. Expected one of: filter, similarity"
            ))),
        }
    }
}

/// Coordinates similarity search and metadata filtering over one collection.
#[derive(Clone)]
pub struct HybridSearch {
    store: Arc<dyn PlotStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    filter_engine: MetadataFilterEngine,
    threshold: f32,
    ordering: ResultOrdering,
    candidate_limit: Option<usize>,
}

impl HybridSearch {
    /// Create a coordinator over `collection`.
    pub fn new(
        store: Arc<dyn PlotStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
    ) -> Self {
        let filter_engine = MetadataFilterEngine::new(Arc::clone(&store), collection);
        Self {
            store,
            embedder,
            filter_engine,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            ordering: ResultOrdering::default(),
            candidate_limit: None,
        }
    }

    /// Set the default similarity threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the ordering of filtered results.
    pub fn with_ordering(mut self, ordering: ResultOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Cap the similarity candidate set. Unbounded by default, so that the
    /// intersection never loses a qualifying record.
    pub fn with_candidate_limit(mut self, limit: Option<usize>) -> Self {
        self.candidate_limit = limit;
        self
    }

    /// The default similarity threshold.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// The ordering of filtered results.
    pub fn ordering(&self) -> ResultOrdering {
        self.ordering
    }

    /// The collection searched.
    pub fn collection(&self) -> &str {
        self.filter_engine.collection()
    }

    /// The metadata filter engine over the same collection.
    pub fn filter_engine(&self) -> &MetadataFilterEngine {
        &self.filter_engine
    }

    /// Search with the default threshold.
    pub async fn search(
        &self,
        query: impl Into<SearchQuery>,
        filter: Option<&SearchFilter>,
    ) -> Result<Vec<ScoredRecord>> {
        self.search_with_threshold(query, filter, self.threshold)
            .await
    }

    /// Search with an explicit similarity threshold.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an inconsistent filter or a
    /// non-finite threshold, and the embedder's or store's failure (tagged
    /// with `hybrid_search` and the request) otherwise. Either sub-search
    /// failing fails the whole search.
    pub async fn search_with_threshold(
        &self,
        query: impl Into<SearchQuery>,
        filter: Option<&SearchFilter>,
        threshold: f32,
    ) -> Result<Vec<ScoredRecord>> {
        let query = query.into();
        if !threshold.is_finite() {
            return Err(Error::validation(format!(
                "similarity threshold must be finite, got {threshold}"
            )));
        }
        if let Some(filter) = filter {
            filter.validate()?;
        }

        let effective = filter.filter(|f| !translate(f).is_empty());
        let result = match effective {
            None => self.semantic(&query, threshold).await,
            Some(filter) => tokio::try_join!(
                self.semantic(&query, threshold),
                self.filter_engine.filter_records(filter)
            )
            .map(|(semantic, filtered)| intersect(semantic, filtered, self.ordering)),
        };

        result.map_err(|e| {
            let context = request_context(&query, filter, threshold);
            log::error!("hybrid_search failed for {context}: {e}");
            e.with_operation("hybrid_search", context)
        })
    }

    /// Records whose rank is within `[min, max]`, in store order. No
    /// similarity component is involved.
    pub async fn rarity_window(
        &self,
        min: u32,
        max: u32,
        limit: Option<usize>,
    ) -> Result<Vec<PlotRecord>> {
        self.filter_engine
            .filter_records_limited(&SearchFilter::rank_window(min, max), limit)
            .await
    }

    async fn semantic(&self, query: &SearchQuery, threshold: f32) -> Result<Vec<ScoredRecord>> {
        let embedding = match query {
            SearchQuery::Text(text) => self.embedder.embed(text).await?,
            SearchQuery::Embedding(vector) => vector.clone(),
        };
        let results = self
            .store
            .similarity_search(
                self.collection(),
                &embedding,
                threshold,
                self.candidate_limit,
            )
            .await
            .map_err(|e| {
                e.into_query_failure(
                    "similarity_search",
                    format!("collection={} threshold={}", self.collection(), threshold),
                )
            })?;
        log::debug!(
            "similarity_search on {} returned {} candidates >= {}",
            self.collection(),
            results.len(),
            threshold
        );
        Ok(results)
    }
}

/// Keep the records present in both sets.
fn intersect(
    semantic: Vec<ScoredRecord>,
    filtered: Vec<PlotRecord>,
    ordering: ResultOrdering,
) -> Vec<ScoredRecord> {
    match ordering {
        ResultOrdering::FilterOrder => {
            let scores: HashMap<RecordId, f32> = semantic
                .iter()
                .map(|s| (s.record.id(), s.score))
                .collect();
            filtered
                .into_iter()
                .filter_map(|record| {
                    scores
                        .get(&record.id())
                        .map(|score| ScoredRecord::new(record, *score))
                })
                .collect()
        }
        ResultOrdering::SimilarityRank => {
            let ids: HashSet<RecordId> = filtered.iter().map(PlotRecord::id).collect();
            semantic
                .into_iter()
                .filter(|s| ids.contains(&s.record.id()))
                .collect()
        }
    }
}

fn request_context(query: &SearchQuery, filter: Option<&SearchFilter>, threshold: f32) -> String {
    format!(
        "query={:?} filter={} threshold={}",
        query.describe(),
        filter.map_or_else(|| "none".to_string(), describe_filter),
        threshold
    )
}

impl fmt::Debug for HybridSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HybridSearch")
            .field("store", &self.store.name())
            .field("embedder", &self.embedder.name())
            .field("collection", &self.collection())
            .field("threshold", &self.threshold)
            .field("ordering", &self.ordering)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        COLLECTION, FailingEmbedder, FailingStore, FixedEmbedder, seeded_store,
    };
    use landmem_core::PlotSize;
    use landmem_vector::MockEmbeddingProvider;

    fn result_ids(results: &[ScoredRecord]) -> Vec<RecordId> {
        results.iter().map(|s| s.record.id()).collect()
    }

    async fn coordinator() -> (HybridSearch, Arc<FixedEmbedder>, Vec<RecordId>) {
        let (store, ids) = seeded_store().await;
        // Scores against the seeded records: A 0.6, B ~0.96, C 0.8.
        let embedder = Arc::new(FixedEmbedder::new(vec![0.6, 0.8, 0.0]));
        let search = HybridSearch::new(store, embedder.clone(), COLLECTION);
        (search, embedder, ids)
    }

    #[tokio::test]
    async fn test_defaults() {
        let (search, _, _) = coordinator().await;
        assert_eq!(search.threshold(), DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(search.ordering(), ResultOrdering::FilterOrder);
        assert_eq!(search.collection(), COLLECTION);
    }

    #[tokio::test]
    async fn test_unfiltered_returns_similarity_set_unchanged() {
        let (search, embedder, ids) = coordinator().await;
        let results = search.search("anything", None).await.unwrap();

        // A (0.6) is below the default 0.75 threshold.
        assert_eq!(result_ids(&results), vec![ids[1], ids[2]]);
        assert!(results[0].score > results[1].score);
        assert_eq!(embedder.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_filter_equals_unfiltered() {
        let (search, _, _) = coordinator().await;
        let plain = search.search("q", None).await.unwrap();
        let empty = search
            .search("q", Some(&SearchFilter::new()))
            .await
            .unwrap();
        let empty_lists = search
            .search("q", Some(&SearchFilter::new().with_neighborhoods(Vec::<String>::new())))
            .await
            .unwrap();

        assert_eq!(result_ids(&plain), result_ids(&empty));
        assert_eq!(result_ids(&plain), result_ids(&empty_lists));
    }

    #[tokio::test]
    async fn test_precomputed_embedding_skips_embedder() {
        let (search, embedder, ids) = coordinator().await;
        let results = search
            .search_with_threshold(vec![1.0, 0.0, 0.0], None, 0.9)
            .await
            .unwrap();

        assert_eq!(result_ids(&results), vec![ids[0]]);
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_filtered_result_is_exact_intersection() {
        let (search, _, ids) = coordinator().await;
        let large = SearchFilter::new().with_plot_sizes([PlotSize::Large]);

        // Similarity set {B, C}; filter set {A, C}.
        let results = search.search("q", Some(&large)).await.unwrap();
        assert_eq!(result_ids(&results), vec![ids[2]]);
        assert!(results.iter().all(|s| s.score >= DEFAULT_SIMILARITY_THRESHOLD));
    }

    #[tokio::test]
    async fn test_filter_order_versus_similarity_rank() {
        let (search, _, ids) = coordinator().await;
        let north_or_south = SearchFilter::new().with_neighborhoods(["North Shore", "South Bay"]);

        // Filter order is insertion order; similarity order is B, C, A.
        let by_filter = search
            .search_with_threshold("q", Some(&north_or_south), 0.0)
            .await
            .unwrap();
        assert_eq!(result_ids(&by_filter), vec![ids[0], ids[1], ids[2]]);

        let by_similarity = search
            .clone()
            .with_ordering(ResultOrdering::SimilarityRank)
            .search_with_threshold("q", Some(&north_or_south), 0.0)
            .await
            .unwrap();
        assert_eq!(
            result_ids(&by_similarity),
            vec![ids[1], ids[2], ids[0]]
        );
    }

    #[tokio::test]
    async fn test_invalid_filter_is_rejected_before_embedding() {
        let (search, embedder, _) = coordinator().await;
        let err = search
            .search("q", Some(&SearchFilter::new().with_min_floors(9).with_max_floors(2)))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(embedder.calls(), 0);
    }

    #[tokio::test]
    async fn test_nan_threshold_rejected() {
        let (search, _, _) = coordinator().await;
        let err = search
            .search_with_threshold("q", None, f32::NAN)
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_embedding_failure_propagates_as_embedding() {
        let (store, _) = seeded_store().await;
        let search = HybridSearch::new(store, Arc::new(FailingEmbedder), COLLECTION);

        let err = search
            .search("ocean view", Some(&SearchFilter::new().with_min_rank(1)))
            .await
            .unwrap_err();
        assert!(err.is_embedding());
        assert!(err.to_string().contains("hybrid_search"));
        assert!(err.to_string().contains("ocean view"));
    }

    #[tokio::test]
    async fn test_store_failure_fails_whole_search() {
        let store = Arc::new(FailingStore::default());
        let search = HybridSearch::new(
            store.clone(),
            Arc::new(MockEmbeddingProvider::new(crate::testing::DIM)),
            COLLECTION,
        );

        let err = search
            .search("q", Some(&SearchFilter::new().with_min_rank(1)))
            .await
            .unwrap_err();
        match err {
            Error::Query {
                operation, context, ..
            } => {
                assert_eq!(operation, "hybrid_search");
                assert!(context.contains("rankRange"));
            }
            other => panic!("expected query failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_generic_similarity_failure_becomes_query_failure() {
        let search = HybridSearch::new(
            Arc::new(FailingStore::generic()),
            Arc::new(MockEmbeddingProvider::new(crate::testing::DIM)),
            COLLECTION,
        );

        let err = search.search("ocean", None).await.unwrap_err();
        match err {
            Error::Query {
                operation,
                context,
                message,
            } => {
                assert_eq!(operation, "hybrid_search");
                assert!(context.contains("ocean"));
                assert!(message.contains("similarity_search"));
                assert!(message.contains("connection reset"));
            }
            other => panic!("expected query failure, got {other:?}"),
        }

        let filtered = SearchFilter::new().with_min_rank(1);
        assert!(
            search
                .search("ocean", Some(&filtered))
                .await
                .unwrap_err()
                .is_query()
        );
    }

    #[tokio::test]
    async fn test_unfiltered_search_never_queries_predicates() {
        let store = Arc::new(FailingStore::default());
        let search = HybridSearch::new(
            store.clone(),
            Arc::new(MockEmbeddingProvider::new(crate::testing::DIM)),
            COLLECTION,
        );

        assert!(search.search("q", None).await.unwrap_err().is_query());
        assert_eq!(
            store
                .predicate_calls
                .load(std::sync::atomic::Ordering::SeqCst),
            0
        );
        assert_eq!(
            store
                .similarity_calls
                .load(std::sync::atomic::Ordering::SeqCst),
            1
        );
    }

    #[tokio::test]
    async fn test_candidate_limit_caps_similarity_set() {
        let (search, _, ids) = coordinator().await;
        let results = search
            .with_candidate_limit(Some(1))
            .search_with_threshold("q", None, 0.0)
            .await
            .unwrap();
        assert_eq!(result_ids(&results), vec![ids[1]]);
    }

    #[tokio::test]
    async fn test_rarity_window() {
        let (search, embedder, ids) = coordinator().await;
        let hits = search.rarity_window(100, 500, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), ids[1]);
        assert_eq!(embedder.calls(), 0);
    }

    #[test]
    fn test_result_ordering_parse() {
        assert_eq!(
            "filter".parse::<ResultOrdering>().unwrap(),
            ResultOrdering::FilterOrder
        );
        assert_eq!(
            "Similarity".parse::<ResultOrdering>().unwrap(),
            ResultOrdering::SimilarityRank
        );
        assert!("random".parse::<ResultOrdering>().is_err());
        assert_eq!(ResultOrdering::SimilarityRank.to_string(), "similarity");
    }

    #[test]
    fn test_search_query_conversions() {
        assert_eq!(SearchQuery::from("x"), SearchQuery::Text("x".into()));
        assert_eq!(
            SearchQuery::from(vec![1.0, 2.0]).describe(),
            "<2-dimensional embedding>"
        );
    }
}
