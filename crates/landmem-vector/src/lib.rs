//! Embedding providers and plot stores for landmem.
//!
//! This crate supplies the two collaborators the search layer consumes: an
//! embedder that turns text into vectors and a store that persists plot
//! records and answers predicate and similarity queries.
//!
//! # Features
//!
//! - `store-lancedb`: Enable the LanceDB-backed plot store
//! - `embed-fastembed`: Enable local embedding generation via fastembed
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     landmem-vector                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider trait                                    │
//! │  ├── MockEmbeddingProvider (always available)               │
//! │  └── FastEmbedProvider (feature: embed-fastembed)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  PlotStore trait                                            │
//! │  ├── MemoryPlotStore (in-memory, JSON snapshots)            │
//! │  └── LancedbPlotStore (feature: store-lancedb)              │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use landmem_vector::{MemoryPlotStore, MockEmbeddingProvider, EmbeddingProvider, PlotStore};
//!
//! let embedder = MockEmbeddingProvider::new(64);
//! let store = MemoryPlotStore::new(embedder.dimension());
//!
//! let query = embedder.embed("large plot near the ocean").await?;
//! for hit in store.similarity_search("land_memories", &query, 0.75, Some(10)).await? {
//!     println!("{}: {:.3}", hit.record.metadata().name, hit.score);
//! }
//! ```

// Core modules (always available)
pub mod embedding;
pub mod memory;
pub mod persistence;
pub mod similarity;
pub mod store;
pub mod types;

// Feature-gated backend modules
#[cfg(feature = "embed-fastembed")]
pub mod fastembed;

#[cfg(feature = "store-lancedb")]
pub mod lancedb;

// Re-exports: core types
pub use types::{CollectionStats, EmbeddingConfig, ScoredRecord, StoreConfig};

// Re-exports: traits
pub use embedding::{EmbeddingProvider, MockEmbeddingProvider};
pub use store::{PlotStore, validate_collection_name};

// Re-exports: backends and helpers
pub use memory::MemoryPlotStore;
pub use persistence::SnapshotMetadata;
pub use similarity::cosine_similarity;

// Re-exports: factories
pub use embedding::create_embedding_provider;
pub use store::create_plot_store;

// Feature-gated re-exports
#[cfg(feature = "embed-fastembed")]
pub use fastembed::FastEmbedProvider;

#[cfg(feature = "store-lancedb")]
pub use lancedb::LancedbPlotStore;
