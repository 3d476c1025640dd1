//! Sparse search filter specification.
//!
//! Mirrors the filterable fields of [`PlotMetadata`](super::PlotMetadata).
//! Every field is optional: a present field narrows the result set, an
//! absent field is unconstrained. Bounds are explicit `Option`s, so a bound
//! of `0` is a real constraint and never means "unset".

use serde::{Deserialize, Serialize};

use super::enums::{BuildingType, DistanceCategory, PlotSize, ZoningType};
use crate::{Error, Result};

/// Optional inclusive lower/upper bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    /// Lower bound (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<T>,
    /// Upper bound (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<T>,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    /// Both ends set.
    pub fn between(min: T, max: T) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    /// Whether neither end is set.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Whether `min <= max` (trivially true if either end is absent).
    pub fn is_ordered(&self) -> bool {
        match (self.min, self.max) {
            (Some(min), Some(max)) => min <= max,
            _ => true,
        }
    }
}

/// Constraints on one distance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceFilter {
    /// Record's meters must be `<=` this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_meters: Option<f64>,
    /// Record's category must equal this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<DistanceCategory>,
}

/// Constraints on ocean and bay distances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceFilters {
    /// Ocean distance constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocean: Option<DistanceFilter>,
    /// Bay distance constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bay: Option<DistanceFilter>,
}

/// Constraints on the building envelope.
///
/// `min` applies to the record's own minimum (`>=`), `max` to the record's
/// own maximum (`<=`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingFilter {
    /// Floor bounds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<Bounds<u32>>,
    /// Height bounds in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Bounds<f64>>,
}

/// Constraints on rarity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityFilter {
    /// Inclusive bounds on rank.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank_range: Option<Bounds<u32>>,
}

/// Sparse structured filter over plot metadata. All constraints are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    /// Neighborhood must be one of these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhoods: Option<Vec<String>>,

    /// Zoning must be one of these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoning_types: Option<Vec<ZoningType>>,

    /// Plot size must be one of these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_sizes: Option<Vec<PlotSize>>,

    /// Building type must be one of these.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_types: Option<Vec<BuildingType>>,

    /// Ocean/bay distance constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distances: Option<DistanceFilters>,

    /// Floors/height constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<BuildingFilter>,

    /// Rank constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rarity: Option<RarityFilter>,

    /// Plot area bounds in square meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plot_area: Option<Bounds<f64>>,
}

impl SearchFilter {
    /// An empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter constraining only the rank to `[min, max]`.
    pub fn rank_window(min: u32, max: u32) -> Self {
        Self {
            rarity: Some(RarityFilter {
                rank_range: Some(Bounds::between(min, max)),
            }),
            ..Self::default()
        }
    }

    /// Restrict to neighborhoods.
    pub fn with_neighborhoods<I, S>(mut self, neighborhoods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.neighborhoods = Some(neighborhoods.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict to zoning types.
    pub fn with_zoning_types(mut self, zoning: impl IntoIterator<Item = ZoningType>) -> Self {
        self.zoning_types = Some(zoning.into_iter().collect());
        self
    }

    /// Restrict to plot sizes.
    pub fn with_plot_sizes(mut self, sizes: impl IntoIterator<Item = PlotSize>) -> Self {
        self.plot_sizes = Some(sizes.into_iter().collect());
        self
    }

    /// Restrict to building types.
    pub fn with_building_types(mut self, types: impl IntoIterator<Item = BuildingType>) -> Self {
        self.building_types = Some(types.into_iter().collect());
        self
    }

    /// Ocean distance must be at most `meters`.
    pub fn with_max_ocean_meters(mut self, meters: f64) -> Self {
        self.ocean_mut().max_meters = Some(meters);
        self
    }

    /// Ocean distance category must equal `category`.
    pub fn with_ocean_category(mut self, category: DistanceCategory) -> Self {
        self.ocean_mut().category = Some(category);
        self
    }

    /// Bay distance must be at most `meters`.
    pub fn with_max_bay_meters(mut self, meters: f64) -> Self {
        self.bay_mut().max_meters = Some(meters);
        self
    }

    /// Bay distance category must equal `category`.
    pub fn with_bay_category(mut self, category: DistanceCategory) -> Self {
        self.bay_mut().category = Some(category);
        self
    }

    /// Record's minimum floors must be at least `floors`.
    pub fn with_min_floors(mut self, floors: u32) -> Self {
        self.floors_mut().min = Some(floors);
        self
    }

    /// Record's maximum floors must be at most `floors`.
    pub fn with_max_floors(mut self, floors: u32) -> Self {
        self.floors_mut().max = Some(floors);
        self
    }

    /// Record's minimum height must be at least `meters`.
    pub fn with_min_height(mut self, meters: f64) -> Self {
        self.height_mut().min = Some(meters);
        self
    }

    /// Record's maximum height must be at most `meters`.
    pub fn with_max_height(mut self, meters: f64) -> Self {
        self.height_mut().max = Some(meters);
        self
    }

    /// Rank must be at least `rank`.
    pub fn with_min_rank(mut self, rank: u32) -> Self {
        self.rank_mut().min = Some(rank);
        self
    }

    /// Rank must be at most `rank`.
    pub fn with_max_rank(mut self, rank: u32) -> Self {
        self.rank_mut().max = Some(rank);
        self
    }

    /// Plot area must be at least `area`.
    pub fn with_min_plot_area(mut self, area: f64) -> Self {
        self.plot_area.get_or_insert_with(Bounds::default).min = Some(area);
        self
    }

    /// Plot area must be at most `area`.
    pub fn with_max_plot_area(mut self, area: f64) -> Self {
        self.plot_area.get_or_insert_with(Bounds::default).max = Some(area);
        self
    }

    fn ocean_mut(&mut self) -> &mut DistanceFilter {
        self.distances
            .get_or_insert_with(DistanceFilters::default)
            .ocean
            .get_or_insert_with(DistanceFilter::default)
    }

    fn bay_mut(&mut self) -> &mut DistanceFilter {
        self.distances
            .get_or_insert_with(DistanceFilters::default)
            .bay
            .get_or_insert_with(DistanceFilter::default)
    }

    fn floors_mut(&mut self) -> &mut Bounds<u32> {
        self.building
            .get_or_insert_with(BuildingFilter::default)
            .floors
            .get_or_insert_with(Bounds::default)
    }

    fn height_mut(&mut self) -> &mut Bounds<f64> {
        self.building
            .get_or_insert_with(BuildingFilter::default)
            .height
            .get_or_insert_with(Bounds::default)
    }

    fn rank_mut(&mut self) -> &mut Bounds<u32> {
        self.rarity
            .get_or_insert_with(RarityFilter::default)
            .rank_range
            .get_or_insert_with(Bounds::default)
    }

    /// Reject internally inconsistent specifications.
    ///
    /// Checks `min <= max` for floors, height, rank, and plot area, and that
    /// every numeric bound is finite and non-negative. It does not
    /// cross-check a distance category against a meters bound.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if let Some(distances) = &self.distances {
            for (label, filter) in [("ocean", distances.ocean), ("bay", distances.bay)] {
                if let Some(meters) = filter.and_then(|f| f.max_meters) {
                    check_non_negative(&format!("distances.{label}.maxMeters"), meters)?;
                }
            }
        }
        if let Some(building) = &self.building {
            if let Some(floors) = building.floors {
                check_ordered("building.floors", &floors)?;
            }
            if let Some(height) = building.height {
                check_float_bounds("building.height", &height)?;
            }
        }
        if let Some(range) = self.rarity.and_then(|r| r.rank_range) {
            check_ordered("rarity.rankRange", &range)?;
        }
        if let Some(area) = &self.plot_area {
            check_float_bounds("plotArea", area)?;
        }
        Ok(())
    }
}

fn check_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(Error::validation(format!(
            "{field} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

fn check_ordered<T: PartialOrd + Copy + std::fmt::Display>(
    field: &str,
    bounds: &Bounds<T>,
) -> Result<()> {
    if !bounds.is_ordered() {
        if let (Some(min), Some(max)) = (bounds.min, bounds.max) {
            return Err(Error::validation(format!(
                "{field}: min {min} is greater than max {max}"
            )));
        }
    }
    Ok(())
}

fn check_float_bounds(field: &str, bounds: &Bounds<f64>) -> Result<()> {
    if let Some(min) = bounds.min {
        check_non_negative(&format!("{field}.min"), min)?;
    }
    if let Some(max) = bounds.max {
        check_non_negative(&format!("{field}.max"), max)?;
    }
    check_ordered(field, bounds)
}
