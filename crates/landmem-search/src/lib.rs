//! Metadata filtering, hybrid search, and CSV ingestion for landmem.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     landmem-search                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  LandMemorySystem (create, ingest, search facade)           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  HybridSearch (similarity ∩ filter by record id)            │
//! │  MetadataFilterEngine (SearchFilter -> Predicate -> store)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CsvPlotReader (spreadsheet export ingestion)               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use landmem_core::{PlotSize, SearchFilter};
//! use landmem_search::LandMemorySystem;
//! use landmem_vector::{MemoryPlotStore, MockEmbeddingProvider};
//!
//! let system = LandMemorySystem::new(
//!     Arc::new(MemoryPlotStore::new(64)),
//!     Arc::new(MockEmbeddingProvider::new(64)),
//!     "land_memories",
//! )?;
//! system.ingest_csv_path("plots.csv").await?;
//!
//! let filter = SearchFilter::new()
//!     .with_neighborhoods(["North Shore"])
//!     .with_plot_sizes([PlotSize::Large]);
//! for hit in system.search_properties("quiet plot by the ocean", Some(&filter), None).await? {
//!     println!("{} ({:.3})", hit.record.metadata().name, hit.score);
//! }
//! ```

pub mod filter;
pub mod hybrid;
pub mod ingest;
pub mod system;

#[cfg(test)]
mod testing;

// Re-exports
pub use filter::{MetadataFilterEngine, translate};
pub use hybrid::{
    DEFAULT_MATCH_COUNT, DEFAULT_SIMILARITY_THRESHOLD, HybridSearch, ResultOrdering, SearchQuery,
};
pub use ingest::{CsvPlotReader, CsvPlotRow, ParsedRow, RejectedRow};
pub use system::{IngestReport, LandMemorySystem};
