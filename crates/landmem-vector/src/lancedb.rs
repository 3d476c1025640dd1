//! LanceDB plot store.
//!
//! Each collection is a LanceDB table. Every filterable metadata field is
//! flattened into its own scalar column so that [`Predicate::to_sql`] can be
//! pushed down as an `only_if` filter; the full metadata document is kept as
//! JSON for lossless reads.
//!
//! # Schema
//!
//! | Column | Type | Purpose |
//! |--------|------|---------|
//! | `id` | Utf8 | Record id (UUID) |
//! | `text` | Utf8 | Generated description |
//! | `metadata` | Utf8 | JSON-serialized `PlotMetadata` |
//! | `neighborhood`, `zoning`, `plot_size`, `building_type` | Utf8 | Membership filters |
//! | `ocean_category`, `bay_category` | Utf8 | Category filters |
//! | `ocean_meters`, `bay_meters`, `height_min`, `height_max`, `plot_area` | Float64 | Range filters |
//! | `floors_min`, `floors_max`, `rank` | UInt32 | Range filters |
//! | `vector` | FixedSizeList<Float32> | Embedding |
//!
//! # Feature Gate
//!
//! This module requires the `store-lancedb` feature.

use std::str::FromStr;
use std::sync::Arc;

use arrow_array::{
    Array, FixedSizeListArray, Float32Array, Float64Array, RecordBatch, RecordBatchIterator,
    StringArray, UInt32Array,
};
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use futures::TryStreamExt;
use landmem_core::{Error, PlotMetadata, PlotRecord, Predicate, RecordId, Result};
use lancedb::query::{ExecutableQuery, QueryBase};
use tokio::sync::Mutex;

use crate::store::{PlotStore, dimension_mismatch, validate_collection_name};
use crate::types::ScoredRecord;

/// LanceDB-backed plot store.
pub struct LancedbPlotStore {
    connection: lancedb::Connection,
    dimension: usize,
    path: String,
    // Serializes table creation and duplicate checks.
    write_lock: Mutex<()>,
}

impl LancedbPlotStore {
    /// Connect to (or create) the database at `db_path`.
    pub async fn connect(db_path: &str, dimension: usize) -> Result<Self> {
        let connection = lancedb::connect(db_path)
            .execute()
            .await
            .map_err(|e| Error::operation(format!("Failed to connect to LanceDB: {e}")))?;
        log::debug!("Connected to LanceDB at {db_path}");

        Ok(Self {
            connection,
            dimension,
            path: db_path.to_string(),
            write_lock: Mutex::new(()),
        })
    }

    async fn has_table(&self, collection: &str) -> Result<bool> {
        let names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| Error::operation(format!("Failed to list tables: {e}")))?;
        Ok(names.iter().any(|n| n == collection))
    }

    /// Open `collection`'s table, or `None` when it has never been written.
    async fn table(&self, collection: &str) -> Result<Option<lancedb::Table>> {
        if !self.has_table(collection).await? {
            return Ok(None);
        }
        let table = self
            .connection
            .open_table(collection)
            .execute()
            .await
            .map_err(|e| Error::operation(format!("Failed to open table {collection}: {e}")))?;
        Ok(Some(table))
    }

    async fn collect(
        stream: lancedb::arrow::SendableRecordBatchStream,
        operation: &str,
        context: &str,
    ) -> Result<Vec<RecordBatch>> {
        stream
            .try_collect()
            .await
            .map_err(|e| Error::query(operation, context, format!("Failed to collect results: {e}")))
    }
}

#[async_trait]
impl PlotStore for LancedbPlotStore {
    async fn create(&self, collection: &str, record: PlotRecord) -> Result<RecordId> {
        validate_collection_name(collection)?;
        if let Some(message) = dimension_mismatch(self.dimension, record.dimension()) {
            return Err(Error::persistence("create", message));
        }

        let id = record.id();
        let batch = build_record_batch(std::slice::from_ref(&record), self.dimension)
            .map_err(|e| Error::persistence("create", e.to_string()))?;
        let schema = batch.schema();
        let batches = RecordBatchIterator::new(vec![Ok(batch)], schema);

        let _guard = self.write_lock.lock().await;
        match self.table(collection).await? {
            Some(table) => {
                let existing = table
                    .count_rows(Some(format!("id = '{id}'")))
                    .await
                    .map_err(|e| Error::persistence("create", e.to_string()))?;
                if existing > 0 {
                    return Err(Error::persistence(
                        "create",
                        format!("record {id} already exists in '{collection}'"),
                    ));
                }
                table
                    .add(Box::new(batches))
                    .execute()
                    .await
                    .map_err(|e| Error::persistence("create", format!("Failed to add row: {e}")))?;
            }
            None => {
                self.connection
                    .create_table(collection, Box::new(batches))
                    .execute()
                    .await
                    .map_err(|e| {
                        Error::persistence("create", format!("Failed to create table: {e}"))
                    })?;
                log::info!("Created LanceDB table '{collection}'");
            }
        }
        Ok(id)
    }

    async fn get_by_id(&self, collection: &str, id: &RecordId) -> Result<Option<PlotRecord>> {
        let Some(table) = self.table(collection).await? else {
            return Ok(None);
        };
        let context = format!("id={id}");
        let stream = table
            .query()
            .only_if(format!("id = '{id}'"))
            .limit(1)
            .execute()
            .await
            .map_err(|e| Error::query("get_by_id", &context, e.to_string()))?;

        let batches = Self::collect(stream, "get_by_id", &context).await?;
        let mut records = Vec::new();
        for batch in &batches {
            records.extend(parse_records(batch)?);
        }
        Ok(records.into_iter().next())
    }

    async fn query_by_predicate(
        &self,
        collection: &str,
        predicate: &Predicate,
        limit: Option<usize>,
    ) -> Result<Vec<PlotRecord>> {
        let Some(table) = self.table(collection).await? else {
            return Ok(Vec::new());
        };
        let context = predicate.to_string();

        let mut query = table.query();
        if let Some(sql) = predicate.to_sql() {
            log::debug!("LanceDB filter on {collection}: {sql}");
            query = query.only_if(sql);
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }

        let stream = query
            .execute()
            .await
            .map_err(|e| Error::query("query_by_predicate", &context, e.to_string()))?;
        let batches = Self::collect(stream, "query_by_predicate", &context).await?;

        let mut records = Vec::new();
        for batch in &batches {
            records.extend(parse_records(batch)?);
        }
        Ok(records)
    }

    async fn similarity_search(
        &self,
        collection: &str,
        embedding: &[f32],
        threshold: f32,
        limit: Option<usize>,
    ) -> Result<Vec<ScoredRecord>> {
        let context = format!("collection={collection} threshold={threshold}");
        if let Some(message) = dimension_mismatch(self.dimension, embedding.len()) {
            return Err(Error::query("similarity_search", context, message));
        }
        let Some(table) = self.table(collection).await? else {
            return Ok(Vec::new());
        };

        let candidates = match limit {
            Some(limit) => limit,
            None => table
                .count_rows(None)
                .await
                .map_err(|e| Error::query("similarity_search", &context, e.to_string()))?,
        };
        if candidates == 0 {
            return Ok(Vec::new());
        }

        let stream = table
            .vector_search(embedding.to_vec())
            .map_err(|e| Error::query("similarity_search", &context, e.to_string()))?
            .distance_type(lancedb::DistanceType::Cosine)
            .limit(candidates)
            .execute()
            .await
            .map_err(|e| Error::query("similarity_search", &context, e.to_string()))?;
        let batches = Self::collect(stream, "similarity_search", &context).await?;

        let mut scored = Vec::new();
        for batch in &batches {
            let distances = batch
                .column_by_name("_distance")
                .and_then(|c| c.as_any().downcast_ref::<Float32Array>())
                .ok_or_else(|| Error::operation("Missing '_distance' column in results"))?;
            for (i, record) in parse_records(batch)?.into_iter().enumerate() {
                // Cosine distance is 1 - cosine similarity.
                let score = 1.0 - distances.value(i);
                if score >= threshold {
                    scored.push(ScoredRecord::new(record, score));
                }
            }
        }
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(scored)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        match self.table(collection).await? {
            Some(table) => table
                .count_rows(None)
                .await
                .map_err(|e| Error::operation(format!("Failed to count rows: {e}"))),
            None => Ok(0),
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "lancedb"
    }
}

impl std::fmt::Debug for LancedbPlotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LancedbPlotStore")
            .field("path", &self.path)
            .field("dimension", &self.dimension)
            .finish()
    }
}

// ============================================================================
// Arrow schema and batch construction
// ============================================================================

fn vector_item_field() -> Arc<Field> {
    Arc::new(Field::new("item", DataType::Float32, true))
}

/// Create the Arrow schema for a plot table.
fn make_schema(dimension: i32) -> Arc<Schema> {
    let utf8 = |name: &str| Field::new(name, DataType::Utf8, false);
    let float = |name: &str| Field::new(name, DataType::Float64, false);
    let uint = |name: &str| Field::new(name, DataType::UInt32, false);

    Arc::new(Schema::new(vec![
        utf8("id"),
        utf8("text"),
        utf8("metadata"),
        utf8("neighborhood"),
        utf8("zoning"),
        utf8("plot_size"),
        utf8("building_type"),
        utf8("ocean_category"),
        utf8("bay_category"),
        float("ocean_meters"),
        float("bay_meters"),
        uint("floors_min"),
        uint("floors_max"),
        float("height_min"),
        float("height_max"),
        uint("rank"),
        float("plot_area"),
        Field::new(
            "vector",
            DataType::FixedSizeList(vector_item_field(), dimension),
            false,
        ),
    ]))
}

/// Build an Arrow RecordBatch from plot records.
fn build_record_batch(records: &[PlotRecord], dimension: usize) -> Result<RecordBatch> {
    let width = i32::try_from(dimension)
        .map_err(|_| Error::config(format!("dimension {dimension} is too large")))?;
    let schema = make_schema(width);

    let text_col = |f: &dyn Fn(&PlotRecord) -> String| -> Arc<dyn Array> {
        Arc::new(StringArray::from(records.iter().map(f).collect::<Vec<_>>()))
    };
    let float_col = |f: &dyn Fn(&PlotMetadata) -> f64| -> Arc<dyn Array> {
        Arc::new(Float64Array::from(
            records.iter().map(|r| f(r.metadata())).collect::<Vec<_>>(),
        ))
    };
    let uint_col = |f: &dyn Fn(&PlotMetadata) -> u32| -> Arc<dyn Array> {
        Arc::new(UInt32Array::from(
            records.iter().map(|r| f(r.metadata())).collect::<Vec<_>>(),
        ))
    };

    let mut metadata_json = Vec::with_capacity(records.len());
    for record in records {
        metadata_json.push(serde_json::to_string(record.metadata())?);
    }

    let values = Float32Array::from(
        records
            .iter()
            .flat_map(|r| r.embedding().iter().copied())
            .collect::<Vec<_>>(),
    );
    let vectors = FixedSizeListArray::try_new(vector_item_field(), width, Arc::new(values), None)
        .map_err(|e| Error::operation(format!("Failed to create vector array: {e}")))?;

    RecordBatch::try_new(
        schema,
        vec![
            text_col(&|r| r.id().to_string()),
            text_col(&|r| r.text().to_string()),
            Arc::new(StringArray::from(metadata_json)),
            text_col(&|r| r.metadata().neighborhood.clone()),
            text_col(&|r| r.metadata().zoning.to_string()),
            text_col(&|r| r.metadata().plot_size.to_string()),
            text_col(&|r| r.metadata().building_type.to_string()),
            text_col(&|r| r.metadata().distances.ocean.category().to_string()),
            text_col(&|r| r.metadata().distances.bay.category().to_string()),
            float_col(&|m| m.distances.ocean.meters()),
            float_col(&|m| m.distances.bay.meters()),
            uint_col(&|m| m.building.floors.min),
            uint_col(&|m| m.building.floors.max),
            float_col(&|m| m.building.height.min),
            float_col(&|m| m.building.height.max),
            uint_col(&|m| m.rarity.rank()),
            float_col(&|m| m.plot_area),
            Arc::new(vectors),
        ],
    )
    .map_err(|e| Error::operation(format!("Failed to create RecordBatch: {e}")))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .ok_or_else(|| Error::operation(format!("Missing '{name}' column in results")))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| Error::operation(format!("'{name}' column is not StringArray")))
}

/// Rebuild plot records from a result batch.
fn parse_records(batch: &RecordBatch) -> Result<Vec<PlotRecord>> {
    let ids = string_column(batch, "id")?;
    let metadata = string_column(batch, "metadata")?;
    let vectors = batch
        .column_by_name("vector")
        .ok_or_else(|| Error::operation("Missing 'vector' column in results"))?
        .as_any()
        .downcast_ref::<FixedSizeListArray>()
        .ok_or_else(|| Error::operation("'vector' column is not FixedSizeListArray"))?;

    let mut records = Vec::with_capacity(batch.num_rows());
    for i in 0..batch.num_rows() {
        let id = RecordId::from_str(ids.value(i))?;
        let plot: PlotMetadata = serde_json::from_str(metadata.value(i))?;
        let row = vectors.value(i);
        let embedding = row
            .as_any()
            .downcast_ref::<Float32Array>()
            .ok_or_else(|| Error::operation("'vector' items are not Float32"))?
            .values()
            .to_vec();
        records.push(PlotRecord::with_id(id, plot, embedding)?);
    }
    Ok(records)
}

// ============================================================================
// Tests
// ============================================================================
