//! landmem core: shared types, traits, and errors.
//!
//! This crate provides the plot data model used across all landmem crates.
//! It has no internal landmem dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`model`]: Plot metadata, records, filters, and store predicates
//! - [`traits`]: Configuration abstraction

pub mod error;
pub mod model;
pub mod traits;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use model::{
    describe, BuildingType, DistanceCategory, PlotMetadata, PlotRecord, PlotSize, Predicate,
    RarityCategory, RecordId, SearchFilter, ZoningType,
};
pub use traits::{ConfigProvider, DEFAULT_COLLECTION};
