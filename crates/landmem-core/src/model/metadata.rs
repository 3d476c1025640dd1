//! Plot metadata: the structured attributes stored with every plot.
//!
//! Two attributes are derived rather than set: a [`Distance`]'s category is
//! always the bucketing of its meters, and a [`Rarity`]'s category is always
//! the bucketing of its rank. Both types keep their fields private so the
//! pairing cannot drift; deserialization recomputes an absent category and
//! rejects one that disagrees with its base value. Deserialized metadata is
//! also run through [`PlotMetadata::validate`].

use serde::{Deserialize, Serialize};

use super::enums::{BuildingType, DistanceCategory, PlotSize, RarityCategory, ZoningType};
use crate::{Error, Result};

// ============================================================================
// Derived-field types
// ============================================================================

/// Distance to a water body with its derived category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDistance")]
pub struct Distance {
    meters: f64,
    category: DistanceCategory,
}

#[derive(Deserialize)]
struct RawDistance {
    meters: f64,
    #[serde(default)]
    category: Option<DistanceCategory>,
}

impl Distance {
    /// Create a distance, deriving its category.
    ///
    /// # Errors
    ///
    /// Returns a validation error for negative or non-finite meters.
    pub fn new(meters: f64) -> Result<Self> {
        if !meters.is_finite() || meters < 0.0 {
            return Err(Error::validation(format!(
                "distance meters must be a non-negative number, got {meters}"
            )));
        }
        Ok(Self {
            meters,
            category: DistanceCategory::from_meters(meters),
        })
    }

    /// Create a distance from externally supplied parts.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `category` is not the bucketing of
    /// `meters`.
    pub fn from_parts(meters: f64, category: DistanceCategory) -> Result<Self> {
        let distance = Self::new(meters)?;
        if distance.category != category {
            return Err(Error::validation(format!(
                "distance category {category} does not match {meters}m (expected {})",
                distance.category
            )));
        }
        Ok(distance)
    }

    /// Distance in meters.
    pub fn meters(&self) -> f64 {
        self.meters
    }

    /// Derived category.
    pub fn category(&self) -> DistanceCategory {
        self.category
    }
}

impl TryFrom<RawDistance> for Distance {
    type Error = Error;

    fn try_from(raw: RawDistance) -> Result<Self> {
        match raw.category {
            Some(category) => Self::from_parts(raw.meters, category),
            None => Self::new(raw.meters),
        }
    }
}

/// Rarity rank with its derived category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRarity")]
pub struct Rarity {
    rank: u32,
    category: RarityCategory,
}

#[derive(Deserialize)]
struct RawRarity {
    rank: u32,
    #[serde(default)]
    category: Option<RarityCategory>,
}

impl Rarity {
    /// Create a rarity from a rank, deriving its category.
    ///
    /// # Errors
    ///
    /// Returns a validation error for rank 0.
    pub fn new(rank: u32) -> Result<Self> {
        if rank == 0 {
            return Err(Error::validation("rank must be a positive integer"));
        }
        Ok(Self {
            rank,
            category: RarityCategory::from_rank(rank),
        })
    }

    /// Create a rarity from externally supplied parts.
    ///
    /// # Errors
    ///
    /// Returns a validation error when `category` is not the bucketing of
    /// `rank`.
    pub fn from_parts(rank: u32, category: RarityCategory) -> Result<Self> {
        let rarity = Self::new(rank)?;
        if rarity.category != category {
            return Err(Error::validation(format!(
                "rarity category {category} does not match rank {rank} (expected {})",
                rarity.category
            )));
        }
        Ok(rarity)
    }

    /// Rank (1 is rarest).
    pub fn rank(&self) -> u32 {
        self.rank
    }

    /// Derived category.
    pub fn category(&self) -> RarityCategory {
        self.category
    }
}

impl TryFrom<RawRarity> for Rarity {
    type Error = Error;

    fn try_from(raw: RawRarity) -> Result<Self> {
        match raw.category {
            Some(category) => Self::from_parts(raw.rank, category),
            None => Self::new(raw.rank),
        }
    }
}

// ============================================================================
// Plain structured attributes
// ============================================================================

/// Inclusive numeric range; valid when `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span<T> {
    /// Lower end.
    pub min: T,
    /// Upper end.
    pub max: T,
}

impl<T: PartialOrd> Span<T> {
    /// Create a span.
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Whether `min <= max`.
    pub fn is_ordered(&self) -> bool {
        self.min <= self.max
    }
}

/// Distances to the ocean and to the bay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distances {
    /// Distance to the ocean.
    pub ocean: Distance,
    /// Distance to the bay.
    pub bay: Distance,
}

/// Permitted building envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingEnvelope {
    /// Floor count range.
    pub floors: Span<u32>,
    /// Building height range in meters.
    pub height: Span<f64>,
}

/// Map coordinates of a plot (informational, not filterable).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

// ============================================================================
// PlotMetadata
// ============================================================================

/// Structured attributes of a plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawPlotMetadata")]
pub struct PlotMetadata {
    /// Display name.
    pub name: String,

    /// Rank and derived rarity category.
    pub rarity: Rarity,

    /// Neighborhood (free-form, filterable).
    pub neighborhood: String,

    /// Zoning.
    pub zoning: ZoningType,

    /// Plot size class.
    pub plot_size: PlotSize,

    /// Building class.
    pub building_type: BuildingType,

    /// Ocean and bay distances.
    pub distances: Distances,

    /// Floors and height ranges.
    pub building: BuildingEnvelope,

    /// Plot area in square meters.
    pub plot_area: f64,

    /// Optional map coordinates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlotMetadata {
    name: String,
    rarity: Rarity,
    neighborhood: String,
    zoning: ZoningType,
    plot_size: PlotSize,
    building_type: BuildingType,
    distances: Distances,
    building: BuildingEnvelope,
    plot_area: f64,
    #[serde(default)]
    coordinates: Option<Coordinates>,
}

impl TryFrom<RawPlotMetadata> for PlotMetadata {
    type Error = Error;

    fn try_from(raw: RawPlotMetadata) -> Result<Self> {
        let plot = Self {
            name: raw.name,
            rarity: raw.rarity,
            neighborhood: raw.neighborhood,
            zoning: raw.zoning,
            plot_size: raw.plot_size,
            building_type: raw.building_type,
            distances: raw.distances,
            building: raw.building,
            plot_area: raw.plot_area,
            coordinates: raw.coordinates,
        };
        plot.validate()?;
        Ok(plot)
    }
}

impl PlotMetadata {
    /// Start building metadata for a named plot of the given rank.
    pub fn builder(name: impl Into<String>, rank: u32) -> PlotMetadataBuilder {
        PlotMetadataBuilder::new(name, rank)
    }

    /// Rank shortcut.
    pub fn rank(&self) -> u32 {
        self.rarity.rank()
    }

    /// Check every non-derived invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a validation error.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::validation("plot name must not be empty"));
        }
        if self.neighborhood.trim().is_empty() {
            return Err(Error::validation(format!(
                "plot '{}' has an empty neighborhood",
                self.name
            )));
        }
        if !self.building.floors.is_ordered() {
            return Err(Error::validation(format!(
                "plot '{}': floors min {} > max {}",
                self.name, self.building.floors.min, self.building.floors.max
            )));
        }
        let height = self.building.height;
        if !height.min.is_finite() || !height.max.is_finite() || height.min < 0.0 {
            return Err(Error::validation(format!(
                "plot '{}': building heights must be finite and non-negative",
                self.name
            )));
        }
        if !height.is_ordered() {
            return Err(Error::validation(format!(
                "plot '{}': height min {} > max {}",
                self.name, height.min, height.max
            )));
        }
        if !self.plot_area.is_finite() || self.plot_area <= 0.0 {
            return Err(Error::validation(format!(
                "plot '{}': plot area must be positive, got {}",
                self.name, self.plot_area
            )));
        }
        Ok(())
    }
}

/// Generate the human-readable description embedded for a plot.
///
/// Deterministic in the metadata: equal metadata always yields equal text.
pub fn describe(plot: &PlotMetadata) -> String {
    let b = &plot.building;
    let d = &plot.distances;
    format!(
        "{name} is a {size} {zoning} plot in {hood}. \
         It is a {building} building with {fmin} to {fmax} floors. \
         The plot area is {area}m² with building heights from {hmin}m to {hmax}m. \
         Located {ocat} from ocean ({om}m) and {bcat} from bay ({bm}m).",
        name = plot.name,
        size = plot.plot_size,
        zoning = plot.zoning,
        hood = plot.neighborhood,
        building = plot.building_type,
        fmin = b.floors.min,
        fmax = b.floors.max,
        area = plot.plot_area,
        hmin = b.height.min,
        hmax = b.height.max,
        ocat = d.ocean.category(),
        om = d.ocean.meters(),
        bcat = d.bay.category(),
        bm = d.bay.meters(),
    )
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`PlotMetadata`].
///
/// Unset attributes start at the smallest values of their domain
/// (`Residential`, `Nano`, `LowRise`, one floor, zero height, 1m² area) and
/// both distances start at 1000m. `build()` runs [`PlotMetadata::validate`].
#[derive(Debug, Clone)]
pub struct PlotMetadataBuilder {
    name: String,
    rank: u32,
    neighborhood: String,
    zoning: ZoningType,
    plot_size: PlotSize,
    building_type: BuildingType,
    ocean_meters: f64,
    bay_meters: f64,
    floors: Span<u32>,
    height: Span<f64>,
    plot_area: f64,
    coordinates: Option<Coordinates>,
}

impl PlotMetadataBuilder {
    fn new(name: impl Into<String>, rank: u32) -> Self {
        Self {
            name: name.into(),
            rank,
            neighborhood: String::new(),
            zoning: ZoningType::Residential,
            plot_size: PlotSize::Nano,
            building_type: BuildingType::LowRise,
            ocean_meters: 1000.0,
            bay_meters: 1000.0,
            floors: Span::new(1, 1),
            height: Span::new(0.0, 0.0),
            plot_area: 1.0,
            coordinates: None,
        }
    }

    /// Set the neighborhood.
    pub fn neighborhood(mut self, neighborhood: impl Into<String>) -> Self {
        self.neighborhood = neighborhood.into();
        self
    }

    /// Set the zoning.
    pub fn zoning(mut self, zoning: ZoningType) -> Self {
        self.zoning = zoning;
        self
    }

    /// Set the plot size class.
    pub fn plot_size(mut self, plot_size: PlotSize) -> Self {
        self.plot_size = plot_size;
        self
    }

    /// Set the building class.
    pub fn building_type(mut self, building_type: BuildingType) -> Self {
        self.building_type = building_type;
        self
    }

    /// Set the ocean distance in meters.
    pub fn ocean_meters(mut self, meters: f64) -> Self {
        self.ocean_meters = meters;
        self
    }

    /// Set the bay distance in meters.
    pub fn bay_meters(mut self, meters: f64) -> Self {
        self.bay_meters = meters;
        self
    }

    /// Set the floor range.
    pub fn floors(mut self, min: u32, max: u32) -> Self {
        self.floors = Span::new(min, max);
        self
    }

    /// Set the height range in meters.
    pub fn height(mut self, min: f64, max: f64) -> Self {
        self.height = Span::new(min, max);
        self
    }

    /// Set the plot area in square meters.
    pub fn plot_area(mut self, area: f64) -> Self {
        self.plot_area = area;
        self
    }

    /// Set map coordinates.
    pub fn coordinates(mut self, x: f64, y: f64) -> Self {
        self.coordinates = Some(Coordinates { x, y });
        self
    }

    /// Build and validate.
    ///
    /// # Errors
    ///
    /// Returns a validation error when any invariant is violated.
    pub fn build(self) -> Result<PlotMetadata> {
        let metadata = PlotMetadata {
            name: self.name,
            rarity: Rarity::new(self.rank)?,
            neighborhood: self.neighborhood,
            zoning: self.zoning,
            plot_size: self.plot_size,
            building_type: self.building_type,
            distances: Distances {
                ocean: Distance::new(self.ocean_meters)?,
                bay: Distance::new(self.bay_meters)?,
            },
            building: BuildingEnvelope {
                floors: self.floors,
                height: self.height,
            },
            plot_area: self.plot_area,
            coordinates: self.coordinates,
        };
        metadata.validate()?;
        Ok(metadata)
    }
}

// ============================================================================
// Tests
// ============================================================================
