//! In-memory plot store.
//!
//! Keeps each collection as an insertion-ordered `Vec`, evaluates predicates
//! in-process, and answers similarity queries by brute-force cosine
//! similarity. When opened on a directory it loads any JSON snapshots found
//! there and writes them back on [`flush`](PlotStore::flush). Flushes copy
//! the records out under the read lock and write them on the blocking pool,
//! one flush at a time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use landmem_core::{Error, PlotRecord, Predicate, RecordId, Result};
use tokio::sync::{Mutex, RwLock};

use crate::persistence;
use crate::similarity::cosine_similarity;
use crate::store::{PlotStore, dimension_mismatch, validate_collection_name};
use crate::types::ScoredRecord;

/// Plot store backed by process memory.
#[derive(Debug)]
pub struct MemoryPlotStore {
    dimension: usize,
    snapshot_dir: Option<PathBuf>,
    collections: RwLock<HashMap<String, Vec<PlotRecord>>>,
    flush_lock: Mutex<()>,
}

impl MemoryPlotStore {
    /// An empty, non-persistent store.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            snapshot_dir: None,
            collections: RwLock::new(HashMap::new()),
            flush_lock: Mutex::new(()),
        }
    }

    /// A store persisted under `dir`, preloaded with any snapshots there.
    ///
    /// # Errors
    ///
    /// Fails when a snapshot cannot be read, or was written with a
    /// different vector width.
    pub fn open(dir: impl AsRef<Path>, dimension: usize) -> Result<Self> {
        let dir = dir.as_ref();
        let mut collections = HashMap::new();

        for collection in persistence::list_snapshots(dir)? {
            let (metadata, records) = persistence::load_snapshot(dir, &collection)?;
            if metadata.count > 0 && metadata.dimension != dimension {
                return Err(Error::config(format!(
                    "snapshot '{}' has dimension {}, but the store is configured for {}",
                    collection, metadata.dimension, dimension
                )));
            }
            log::info!(
                "Loaded {} records into collection '{}' from {}",
                records.len(),
                collection,
                dir.display()
            );
            collections.insert(collection, records);
        }

        Ok(Self {
            dimension,
            snapshot_dir: Some(dir.to_path_buf()),
            collections: RwLock::new(collections),
            flush_lock: Mutex::new(()),
        })
    }

    /// The snapshot directory, if persistent.
    pub fn snapshot_dir(&self) -> Option<&Path> {
        self.snapshot_dir.as_deref()
    }

    /// Every collection name currently held, sorted.
    pub async fn collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl PlotStore for MemoryPlotStore {
    async fn create(&self, collection: &str, record: PlotRecord) -> Result<RecordId> {
        validate_collection_name(collection)?;
        if let Some(message) = dimension_mismatch(self.dimension, record.dimension()) {
            return Err(Error::persistence("create", message));
        }

        let mut collections = self.collections.write().await;
        let records = collections.entry(collection.to_string()).or_default();
        let id = record.id();
        if records.iter().any(|r| r.id() == id) {
            return Err(Error::persistence(
                "create",
                format!("record {id} already exists in '{collection}'"),
            ));
        }
        records.push(record);
        Ok(id)
    }

    async fn get_by_id(&self, collection: &str, id: &RecordId) -> Result<Option<PlotRecord>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|records| records.iter().find(|r| r.id() == *id))
            .cloned())
    }

    async fn query_by_predicate(
        &self,
        collection: &str,
        predicate: &Predicate,
        limit: Option<usize>,
    ) -> Result<Vec<PlotRecord>> {
        let collections = self.collections.read().await;
        let Some(records) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(records
            .iter()
            .filter(|r| predicate.matches(r.metadata()))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        threshold: f32,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredRecord>> {
        if let Some(message) = dimension_mismatch(self.dimension, embedding.len()) {
            return Err(Error::query(
                "similarity_search",
                format!("collection={collection} threshold={threshold}"),
                message,
            ));
        }

        let collections = self.collections.read().await;
        let Some(records) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<ScoredRecord> = records
            .iter()
            .map(|r| ScoredRecord::new(r.clone(), cosine_similarity(embedding, r.embedding())))
            .filter(|s| s.score >= threshold)
            .collect();

        // Stable sort keeps insertion order among equal scores.
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        if let Some(limit) = limit {
            scored.truncate(limit);
        }
        Ok(scored)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len))
    }

    async fn flush(&self) -> Result<()> {
        let Some(dir) = &self.snapshot_dir else {
            return Ok(());
        };
        let _flushing = self.flush_lock.lock().await;
        let snapshot: Vec<(String, Vec<PlotRecord>)> = self
            .collections
            .read()
            .await
            .iter()
            .map(|(collection, records)| (collection.clone(), records.clone()))
            .collect();

        let dir = dir.clone();
        let dimension = self.dimension;
        tokio::task::spawn_blocking(move || {
            for (collection, records) in &snapshot {
                persistence::save_snapshot(&dir, collection, dimension, records)?;
            }
            Ok::<_, Error>(())
        })
        .await
        .map_err(|e| Error::persistence("flush", format!("snapshot task failed: {e}")))?
        .map_err(|e| Error::persistence("flush", e.to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "memory"
    }
}

// ============================================================================
// Tests
// ============================================================================
