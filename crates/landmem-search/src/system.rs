//! The land memory facade.
//!
//! [`LandMemorySystem`] is what applications hold: it builds plot records
//! (description, embedding, id), ingests CSV exports, and exposes the
//! property search operations over the configured collection.

use std::io;
use std::path::Path;
use std::sync::Arc;

use landmem_core::{ConfigProvider, Error, PlotMetadata, PlotRecord, RecordId, Result, SearchFilter};
use landmem_vector::{CollectionStats, EmbeddingProvider, PlotStore, ScoredRecord, validate_collection_name};
use serde::Serialize;

use crate::hybrid::{DEFAULT_MATCH_COUNT, HybridSearch, ResultOrdering};
use crate::ingest::{CsvPlotReader, CsvPlotRow, RejectedRow};

/// Outcome of a CSV ingestion.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestReport {
    /// Ids of the records created, in file order.
    pub created: Vec<RecordId>,
    /// Rows skipped because their data was invalid.
    pub rejected: Vec<RejectedRow>,
}

impl IngestReport {
    /// Number of rows read.
    pub fn total(&self) -> usize {
        self.created.len() + self.rejected.len()
    }
}

/// Land plot memory over one collection of a store.
#[derive(Clone)]
pub struct LandMemorySystem {
    store: Arc<dyn PlotStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    search: HybridSearch,
    match_count: usize,
}

impl LandMemorySystem {
    /// Create a system over `collection`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unusable collection name or when
    /// the embedder's dimension differs from the store's.
    pub fn new(
        store: Arc<dyn PlotStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        collection: impl Into<String>,
    ) -> Result<Self> {
        let collection = collection.into();
        validate_collection_name(&collection)?;
        if embedder.dimension() != store.dimension() {
            return Err(Error::config(format!(
                "embedder '{}' produces {}-dimensional vectors but store '{}' holds {}",
                embedder.name(),
                embedder.dimension(),
                store.name(),
                store.dimension()
            )));
        }

        let search = HybridSearch::new(Arc::clone(&store), Arc::clone(&embedder), collection);
        Ok(Self {
            store,
            embedder,
            search,
            match_count: DEFAULT_MATCH_COUNT,
        })
    }

    /// Create a system over the collection named by `config`.
    pub fn from_config<C: ConfigProvider>(
        config: &C,
        store: Arc<dyn PlotStore>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        Self::new(store, embedder, config.collection())
    }

    /// Set the default similarity threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.search = self.search.with_threshold(threshold);
        self
    }

    /// Set the ordering of filtered search results.
    pub fn with_ordering(mut self, ordering: ResultOrdering) -> Self {
        self.search = self.search.with_ordering(ordering);
        self
    }

    /// Set the default number of results.
    pub fn with_match_count(mut self, match_count: usize) -> Self {
        self.match_count = match_count;
        self
    }

    /// The collection this system owns.
    pub fn collection(&self) -> &str {
        self.search.collection()
    }

    /// The underlying coordinator.
    pub fn hybrid(&self) -> &HybridSearch {
        &self.search
    }

    /// Describe, embed, and persist a new plot.
    ///
    /// # Errors
    ///
    /// Returns a validation error for invalid metadata, or the embedder's or
    /// store's failure tagged with `create_plot`.
    pub async fn create_plot(&self, metadata: PlotMetadata) -> Result<PlotRecord> {
        metadata.validate()?;
        let text = PlotRecord::description_for(&metadata);
        let name = metadata.name.clone();

        let embedding = self.embedder.embed(&text).await.map_err(|e| {
            log::error!("create_plot: embedding failed for '{name}': {e}");
            e.with_operation("create_plot", &name)
        })?;
        let record = PlotRecord::new(metadata, embedding)?;

        self.store
            .create(self.collection(), record.clone())
            .await
            .map_err(|e| {
                log::error!("create_plot: store rejected '{name}': {e}");
                e.into_persistence_failure("create_plot", &name)
            })?;
        log::debug!("Created plot '{}' as {}", name, record.id());
        Ok(record)
    }

    /// Create a plot from one CSV row.
    pub async fn create_from_csv_row(&self, row: &CsvPlotRow) -> Result<PlotRecord> {
        let metadata = row
            .to_metadata()
            .inspect_err(|e| log::error!("create_from_csv_row: invalid row {row:?}: {e}"))?;
        self.create_plot(metadata).await
    }

    /// Ingest every row of a CSV export.
    ///
    /// Rows with invalid data are reported in [`IngestReport::rejected`] and
    /// skipped. An embedder or store failure stops the ingestion; rows
    /// before it stay created.
    pub async fn ingest_csv<R: io::Read>(&self, reader: CsvPlotReader<R>) -> Result<IngestReport> {
        let mut report = IngestReport::default();

        for row in reader.read_all()? {
            let metadata = match row.metadata {
                Ok(metadata) => metadata,
                Err(e) => {
                    log::warn!("Skipping CSV line {}: {}", row.line, e);
                    report.rejected.push(RejectedRow {
                        line: row.line,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };
            let record = self.create_plot(metadata).await?;
            report.created.push(record.id());
        }

        log::info!(
            "Ingested {} plots into '{}' ({} rejected)",
            report.created.len(),
            self.collection(),
            report.rejected.len()
        );
        Ok(report)
    }

    /// Ingest a CSV file.
    pub async fn ingest_csv_path(&self, path: impl AsRef<Path>) -> Result<IngestReport> {
        self.ingest_csv(CsvPlotReader::from_path(path)?).await
    }

    /// Hybrid search, truncated to `limit` (default 20).
    pub async fn search_properties(
        &self,
        query: &str,
        filter: Option<&SearchFilter>,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredRecord>> {
        let mut results = self.search.search(query, filter).await?;
        results.truncate(limit.unwrap_or(self.match_count));
        Ok(results)
    }

    /// Hybrid search with an explicit threshold, truncated to `limit`.
    pub async fn search_properties_with_threshold(
        &self,
        query: &str,
        filter: Option<&SearchFilter>,
        threshold: f32,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredRecord>> {
        let mut results = self
            .search
            .search_with_threshold(query, filter, threshold)
            .await?;
        results.truncate(limit.unwrap_or(self.match_count));
        Ok(results)
    }

    /// Plots ranked within `[min_rank, max_rank]`, in store order, truncated
    /// to `limit` (default 20).
    pub async fn get_properties_by_rarity(
        &self,
        min_rank: u32,
        max_rank: u32,
        limit: Option<usize>,
    ) -> Result<Vec<PlotRecord>> {
        self.search
            .rarity_window(min_rank, max_rank, Some(limit.unwrap_or(self.match_count)))
            .await
            .inspect_err(|e| {
                log::error!("get_properties_by_rarity({min_rank}, {max_rank}) failed: {e}")
            })
    }

    /// Look up one plot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when no record has `id`.
    pub async fn get_plot(&self, id: &RecordId) -> Result<PlotRecord> {
        self.store
            .get_by_id(self.collection(), id)
            .await
            .map_err(|e| e.into_query_failure("get_plot", id.to_string()))?
            .ok_or_else(|| Error::not_found(format!("plot {id} in '{}'", self.collection())))
    }

    /// Record count and store details for the collection.
    pub async fn stats(&self) -> Result<CollectionStats> {
        Ok(CollectionStats {
            collection: self.collection().to_string(),
            count: self.store.count(self.collection()).await?,
            dimension: self.store.dimension(),
            backend: self.store.name().to_string(),
        })
    }

    /// Make created records durable.
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }
}

impl std::fmt::Debug for LandMemorySystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LandMemorySystem")
            .field("search", &self.search)
            .field("match_count", &self.match_count)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{COLLECTION, DIM, FailingEmbedder, FailingStore, plot};
    use landmem_core::PlotSize;
    use landmem_vector::{MemoryPlotStore, MockEmbeddingProvider};

    fn system() -> LandMemorySystem {
        let store = Arc::new(MemoryPlotStore::new(64));
        let embedder = Arc::new(MockEmbeddingProvider::new(64));
        // Every mock vector is non-negative, so threshold 0 admits all records.
        LandMemorySystem::new(store, embedder, COLLECTION)
            .unwrap()
            .with_threshold(0.0)
    }

    #[derive(Clone)]
    struct TestConfig;

    impl ConfigProvider for TestConfig {
        fn project_name(&self) -> &str {
            "test"
        }

        fn collection(&self) -> &str {
            "harbor_plots"
        }

        fn data_path(&self) -> Result<std::path::PathBuf> {
            Ok(std::path::PathBuf::from("/tmp"))
        }
    }

    #[test]
    fn test_new_rejects_dimension_mismatch() {
        let err = LandMemorySystem::new(
            Arc::new(MemoryPlotStore::new(8)),
            Arc::new(MockEmbeddingProvider::new(16)),
            COLLECTION,
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("16-dimensional"));
    }

    #[test]
    fn test_new_rejects_bad_collection() {
        assert!(
            LandMemorySystem::new(
                Arc::new(MemoryPlotStore::new(8)),
                Arc::new(MockEmbeddingProvider::new(8)),
                "bad name",
            )
            .is_err()
        );
    }

    #[test]
    fn test_from_config_uses_configured_collection() {
        let system = LandMemorySystem::from_config(
            &TestConfig,
            Arc::new(MemoryPlotStore::new(8)),
            Arc::new(MockEmbeddingProvider::new(8)),
        )
        .unwrap();
        assert_eq!(system.collection(), "harbor_plots");
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let system = system();
        let metadata = plot("Harbor Lot", 42)
            .plot_size(PlotSize::Large)
            .floors(3, 9)
            .build()
            .unwrap();

        let created = system.create_plot(metadata.clone()).await.unwrap();
        assert_eq!(created.text(), landmem_core::describe(&metadata));

        let fetched = system.get_plot(&created.id()).await.unwrap();
        assert_eq!(fetched.metadata(), &metadata);
        assert_eq!(fetched.text(), created.text());
    }

    #[tokio::test]
    async fn test_get_missing_plot_is_not_found() {
        let err = system().get_plot(&RecordId::new()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_north_shore_large_scenario() {
        let system = system();
        let a = system
            .create_plot(plot("A", 1).plot_size(PlotSize::Large).build().unwrap())
            .await
            .unwrap();
        system
            .create_plot(plot("B", 2).plot_size(PlotSize::Small).build().unwrap())
            .await
            .unwrap();
        system
            .create_plot(
                plot("C", 3)
                    .neighborhood("South Bay")
                    .plot_size(PlotSize::Large)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let filter = SearchFilter::new()
            .with_neighborhoods(["North Shore"])
            .with_plot_sizes([PlotSize::Large]);
        let filtered = system
            .hybrid()
            .filter_engine()
            .filter_records(&filter)
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id(), a.id());

        let searched = system
            .search_properties("large plot", Some(&filter), None)
            .await
            .unwrap();
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].record.id(), a.id());
    }

    #[tokio::test]
    async fn test_rarity_range_scenario() {
        let system = system();
        let mut ids = Vec::new();
        for rank in [50, 300, 600] {
            let record = system
                .create_plot(plot(&format!("Rank {rank}"), rank).build().unwrap())
                .await
                .unwrap();
            ids.push(record.id());
        }

        let hits = system
            .get_properties_by_rarity(100, 500, None)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id(), ids[1]);
    }

    #[tokio::test]
    async fn test_search_limit_defaults_to_match_count() {
        let system = system().with_match_count(2);
        for rank in 1..=4 {
            system
                .create_plot(plot(&format!("Lot {rank}"), rank).build().unwrap())
                .await
                .unwrap();
        }

        assert_eq!(
            system
                .search_properties("lot", None, None)
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            system
                .search_properties("lot", None, Some(3))
                .await
                .unwrap()
                .len(),
            3
        );
    }

    #[tokio::test]
    async fn test_ingest_csv_reports_created_and_rejected() {
        let system = system();
        let data = "Rank,Name,Neighborhood,Zoning Type,Plot Size,Building Size,\
Distance to Ocean,Distance to Ocean (m),Distance to Bay,Distance to Bay (m),\
Min # of Floors,Max # of Floors,Min Building Height (m),Max Building Height (m),Plot Area (m²)
1,Good,Nexus,Commercial,Large,Tall,Close,100,Close,100,5,50,20,200,3000
2,Broken,Nexus,Commercial,Huge,Tall,Close,100,Close,100,5,50,20,200,3000
3,Fine,Nexus,Residential,Small,Lowrise,Far,900,Far,900,1,3,3,10,500";

        let report = system
            .ingest_csv(CsvPlotReader::from_reader(data.as_bytes()))
            .await
            .unwrap();
        assert_eq!(report.created.len(), 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].line, 3);
        assert_eq!(report.total(), 3);
        assert_eq!(system.stats().await.unwrap().count, 2);
    }

    #[tokio::test]
    async fn test_create_plot_embedding_failure() {
        let system = LandMemorySystem::new(
            Arc::new(MemoryPlotStore::new(DIM)),
            Arc::new(FailingEmbedder),
            COLLECTION,
        )
        .unwrap();
        let err = system
            .create_plot(plot("Lot", 1).build().unwrap())
            .await
            .unwrap_err();
        assert!(err.is_embedding());
        assert!(err.to_string().contains("create_plot"));
    }

    #[tokio::test]
    async fn test_create_plot_store_failure() {
        let system = LandMemorySystem::new(
            Arc::new(FailingStore::default()),
            Arc::new(MockEmbeddingProvider::new(DIM)),
            COLLECTION,
        )
        .unwrap();
        let err = system
            .create_plot(plot("Lot", 1).build().unwrap())
            .await
            .unwrap_err();
        assert!(err.is_persistence());
    }

    #[tokio::test]
    async fn test_create_plot_generic_store_failure_is_persistence() {
        let system = LandMemorySystem::new(
            Arc::new(FailingStore::generic()),
            Arc::new(MockEmbeddingProvider::new(DIM)),
            COLLECTION,
        )
        .unwrap();
        let err = system
            .create_plot(plot("Lot", 1).build().unwrap())
            .await
            .unwrap_err();
        assert!(err.is_persistence());
        assert!(err.to_string().contains("create_plot"));
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_get_plot_store_failure_is_query_failure() {
        let system = LandMemorySystem::new(
            Arc::new(FailingStore::default()),
            Arc::new(MockEmbeddingProvider::new(DIM)),
            COLLECTION,
        )
        .unwrap();
        let err = system.get_plot(&RecordId::new()).await.unwrap_err();
        assert!(err.is_query());
    }

    #[tokio::test]
    async fn test_stats() {
        let system = system();
        let stats = system.stats().await.unwrap();
        assert_eq!(stats.collection, COLLECTION);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.dimension, 64);
        assert_eq!(stats.backend, "memory");
    }
}
