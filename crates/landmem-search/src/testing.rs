//! Shared fixtures and collaborator doubles for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use landmem_core::model::PlotMetadataBuilder;
use landmem_core::{Error, PlotMetadata, PlotRecord, PlotSize, Predicate, RecordId, Result};
use landmem_vector::{EmbeddingProvider, MemoryPlotStore, PlotStore, ScoredRecord};

pub const COLLECTION: &str = "land_memories";
pub const DIM: usize = 3;

/// A valid builder in the North Shore with an ocean distance of 150m.
pub fn plot(name: &str, rank: u32) -> PlotMetadataBuilder {
    PlotMetadata::builder(name, rank)
        .neighborhood("North Shore")
        .ocean_meters(150.0)
        .plot_area(1000.0)
}

pub fn empty_store() -> Arc<MemoryPlotStore> {
    Arc::new(MemoryPlotStore::new(DIM))
}

/// Insert with a fixed embedding.
pub async fn insert(store: &dyn PlotStore, builder: PlotMetadataBuilder) -> RecordId {
    insert_embedded(store, builder, vec![1.0, 0.0, 0.0]).await
}

pub async fn insert_embedded(
    store: &dyn PlotStore,
    builder: PlotMetadataBuilder,
    embedding: Vec<f32>,
) -> RecordId {
    let record = PlotRecord::new(builder.build().unwrap(), embedding).unwrap();
    store.create(COLLECTION, record).await.unwrap()
}

/// A: North Shore/Large/rank 50, B: North Shore/Small/rank 300,
/// C: South Bay/Large/rank 600. Embeddings point along x, between x and y,
/// and along y respectively.
pub async fn seeded_store() -> (Arc<dyn PlotStore>, Vec<RecordId>) {
    let store = empty_store();
    let ids = vec![
        insert_embedded(
            &*store,
            plot("A", 50).plot_size(PlotSize::Large),
            vec![1.0, 0.0, 0.0],
        )
        .await,
        insert_embedded(
            &*store,
            plot("B", 300).plot_size(PlotSize::Small),
            vec![0.8, 0.6, 0.0],
        )
        .await,
        insert_embedded(
            &*store,
            plot("C", 600)
                .neighborhood("South Bay")
                .plot_size(PlotSize::Large),
            vec![0.0, 1.0, 0.0],
        )
        .await,
    ];
    (store, ids)
}

/// One record per plot size, in size order.
pub async fn one_of_each_size() -> (Arc<dyn PlotStore>, Vec<RecordId>) {
    let store = empty_store();
    let mut ids = Vec::new();
    for (i, size) in PlotSize::ALL.iter().enumerate() {
        let rank = u32::try_from(i).unwrap() + 1;
        ids.push(insert(&*store, plot(size.as_str(), rank).plot_size(*size)).await);
    }
    (store, ids)
}

/// Store whose every read fails with a backend error.
///
/// By default similarity searches fail with a typed query error and
/// creates with a persistence error; [`FailingStore::generic`] makes them
/// fail with an untyped operation error instead.
#[derive(Debug, Default)]
pub struct FailingStore {
    pub predicate_calls: AtomicUsize,
    pub similarity_calls: AtomicUsize,
    generic: bool,
}

impl FailingStore {
    pub fn generic() -> Self {
        Self {
            generic: true,
            ..Default::default()
        }
    }
}

const CONNECTION_RESET: &str = "Failed to list tables: connection reset";

#[async_trait]
impl PlotStore for FailingStore {
    async fn create(&self, _collection: &str, _record: PlotRecord) -> Result<RecordId> {
        if self.generic {
            return Err(Error::operation(CONNECTION_RESET));
        }
        Err(Error::persistence("create", "store offline"))
    }

    async fn get_by_id(&self, _collection: &str, _id: &RecordId) -> Result<Option<PlotRecord>> {
        Err(Error::operation("store offline"))
    }

    async fn query_by_predicate(
        &self,
        _collection: &str,
        _predicate: &Predicate,
        _limit: Option<usize>,
    ) -> Result<Vec<PlotRecord>> {
        self.predicate_calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::operation("store offline"))
    }

    async fn similarity_search(
        &self,
        collection: &str,
        _embedding: &[f32],
        threshold: f32,
        _limit: Option<usize>,
    ) -> Result<Vec<ScoredRecord>> {
        self.similarity_calls.fetch_add(1, Ordering::SeqCst);
        if self.generic {
            return Err(Error::operation(CONNECTION_RESET));
        }
        Err(Error::query(
            "similarity_search",
            format!("collection={collection} threshold={threshold}"),
            "vector index unavailable",
        ))
    }

    async fn count(&self, _collection: &str) -> Result<usize> {
        Ok(0)
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Embedder that always fails.
#[derive(Debug, Default)]
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Err(Error::embedding(text, "model offline"))
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Embedder returning one fixed vector and counting calls.
#[derive(Debug)]
pub struct FixedEmbedder {
    pub vector: Vec<f32>,
    pub calls: AtomicUsize,
}

impl FixedEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector.clone())
    }

    fn dimension(&self) -> usize {
        self.vector.len()
    }

    fn name(&self) -> &str {
        "fixed"
    }
}
