//! The plot store capability.
//!
//! A [`PlotStore`] persists [`PlotRecord`]s and answers two kinds of reads
//! natively: structured predicate queries and nearest-neighbour similarity
//! search. Every call names the collection it operates on; a store may hold
//! several collections, but a landmem deployment only ever touches the one
//! its configuration names.
//!
//! # Backends
//!
//! - [`MemoryPlotStore`](crate::memory::MemoryPlotStore): always available
//! - `LancedbPlotStore`: requires the `store-lancedb` feature

use std::sync::Arc;

use async_trait::async_trait;
use landmem_core::{Error, PlotRecord, Predicate, RecordId, Result};

use crate::memory::MemoryPlotStore;
use crate::types::{ScoredRecord, StoreConfig};

/// Store capability consumed by the search layer.
///
/// Implementations are expected to make each call independently atomic;
/// callers do no locking or retrying of their own.
#[async_trait]
pub trait PlotStore: Send + Sync {
    /// Persist a new record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Persistence`] on a duplicate id, a dimension
    /// mismatch, or a backend write failure.
    async fn create(&self, collection: &str, record: PlotRecord) -> Result<RecordId>;

    /// Look up a record by id. `Ok(None)` when absent.
    async fn get_by_id(&self, collection: &str, id: &RecordId) -> Result<Option<PlotRecord>>;

    /// Every record satisfying `predicate`, in store order (insertion order
    /// for the bundled backends), truncated to `limit` when given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] when the backend rejects the predicate.
    async fn query_by_predicate(
        &self,
        collection: &str,
        predicate: &Predicate,
        limit: Option<usize>,
    ) -> Result<Vec<PlotRecord>>;

    /// Records whose similarity to `embedding` is at least `threshold`,
    /// ranked by descending similarity, truncated to `limit` when given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`] when the vector width does not match the
    /// store or the backend fails.
    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        threshold: f32,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredRecord>>;

    /// Number of records in `collection` (zero if it does not exist).
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Make previous writes durable. A no-op for backends that write through.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Vector width every record must have.
    fn dimension(&self) -> usize;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}

/// Check that a collection name is usable as a table or file name.
///
/// # Errors
///
/// Returns a configuration error unless the name is non-empty and made of
/// ASCII letters, digits, `_` and `-`.
pub fn validate_collection_name(collection: &str) -> Result<()> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::config(format!(
            "Invalid collection name '{collection}': use letters, digits, '_' or '-'"
        )))
    }
}

/// Describe a vector width mismatch, or `None` when the widths agree.
pub(crate) fn dimension_mismatch(expected: usize, actual: usize) -> Option<String> {
    (expected != actual).then(|| format!("expected a {expected}-dimensional vector, got {actual}"))
}

/// Open the store named by `config.backend`.
///
/// `dimension` is used when `config.dimension` is `0`.
///
/// # Errors
///
/// Returns a configuration error for an unknown backend or one whose
/// feature is disabled, or the backend's own error when opening fails.
pub async fn create_plot_store(config: &StoreConfig, dimension: usize) -> Result<Arc<dyn PlotStore>> {
    let dimension = if config.dimension == 0 {
        dimension
    } else {
        config.dimension
    };
    if dimension == 0 {
        return Err(Error::config("store dimension must be greater than zero"));
    }

    match config.backend.as_str() {
        "memory" => {
            let store = match &config.path {
                Some(path) => MemoryPlotStore::open(path, dimension)?,
                None => MemoryPlotStore::new(dimension),
            };
            Ok(Arc::new(store))
        }
        #[cfg(feature = "store-lancedb")]
        "lancedb" => {
            let path = config
                .path
                .as_deref()
                .ok_or_else(|| Error::config("the lancedb store needs store.path"))?;
            Ok(Arc::new(
                crate::lancedb::LancedbPlotStore::connect(path, dimension).await?,
            ))
        }
        #[cfg(not(feature = "store-lancedb"))]
        "lancedb" => Err(Error::config(
            "store backend 'lancedb' requires the store-lancedb feature",
        )),
        other => Err(Error::config(format!(
            "Unknown store backend: '{other}'. Supported: memory, lancedb"
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================
