//! The plot data model.
//!
//! - [`enums`]: closed enumerations and the derived category buckets
//! - [`metadata`]: [`PlotMetadata`] and the description template
//! - [`record`]: stored [`PlotRecord`]s and their identifiers
//! - [`filter`]: the sparse [`SearchFilter`] specification
//! - [`predicate`]: store-level [`Predicate`]s

pub mod enums;
pub mod filter;
pub mod metadata;
pub mod predicate;
pub mod record;

pub use enums::{
    BuildingType, DistanceCategory, PlotSize, RarityCategory, ZoningType, CLOSE_MAX_METERS,
    MEDIUM_MAX_METERS,
};
pub use filter::{Bounds, BuildingFilter, DistanceFilter, DistanceFilters, RarityFilter, SearchFilter};
pub use metadata::{
    describe, BuildingEnvelope, Coordinates, Distance, Distances, PlotMetadata,
    PlotMetadataBuilder, Rarity, Span,
};
pub use predicate::{Constraint, NumericField, Predicate, TextField};
pub use record::{PlotRecord, RecordId};
