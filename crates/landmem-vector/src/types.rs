//! Common types for stores and embedding providers.
//!
//! These types are always available regardless of feature flags.

use landmem_core::PlotRecord;
use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration
// ============================================================================

/// Plot store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend type: "memory" or "lancedb".
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Snapshot directory (memory) or database directory (lancedb).
    ///
    /// The memory store keeps nothing on disk when this is unset.
    #[serde(default)]
    pub path: Option<String>,

    /// Vector width. `0` means "use the embedder's dimension".
    #[serde(default)]
    pub dimension: usize,
}

fn default_backend() -> String {
    "memory".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
            dimension: 0,
        }
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding provider: "mock" or "fastembed".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Embedding model name (e.g., "bge-small-en-v1.5").
    #[serde(default = "default_model")]
    pub model: String,

    /// Path to cache directory for embedding models.
    #[serde(default)]
    pub cache_path: Option<String>,

    /// Dimension of the mock provider (fastembed probes its own).
    #[serde(default = "default_dimension")]
    pub dimension: usize,
}

fn default_provider() -> String {
    "mock".to_string()
}

fn default_model() -> String {
    "bge-small-en-v1.5".to_string()
}

fn default_dimension() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            cache_path: None,
            dimension: default_dimension(),
        }
    }
}

// ============================================================================
// Search results
// ============================================================================

/// A record returned by a similarity search, with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// The matching record.
    pub record: PlotRecord,

    /// Cosine similarity to the query vector (higher is closer).
    pub score: f32,
}

impl ScoredRecord {
    /// Pair a record with its score.
    pub fn new(record: PlotRecord, score: f32) -> Self {
        Self { record, score }
    }
}

/// Summary of one stored collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    /// Collection name.
    pub collection: String,

    /// Number of records.
    pub count: usize,

    /// Vector width.
    pub dimension: usize,

    /// Backend name.
    pub backend: String,
}

// ============================================================================
// Tests
// ============================================================================
