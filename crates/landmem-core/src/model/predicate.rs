//! Store-level predicates.
//!
//! A [`Predicate`] is a conjunction of typed [`Constraint`]s over known
//! metadata fields. Stores either evaluate it in-process
//! ([`Predicate::matches`]) or render it to a SQL `WHERE` clause
//! ([`Predicate::to_sql`]). Values are never spliced into SQL without
//! quoting, and fields come from a closed set, so there is no path for
//! caller text to become SQL syntax.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::metadata::PlotMetadata;

/// A string-valued metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Neighborhood,
    Zoning,
    PlotSize,
    BuildingType,
    OceanCategory,
    BayCategory,
}

impl TextField {
    /// Dotted path in the metadata document.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Neighborhood => "neighborhood",
            Self::Zoning => "zoning",
            Self::PlotSize => "plotSize",
            Self::BuildingType => "buildingType",
            Self::OceanCategory => "distances.ocean.category",
            Self::BayCategory => "distances.bay.category",
        }
    }

    /// Flattened column name used by tabular stores.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Neighborhood => "neighborhood",
            Self::Zoning => "zoning",
            Self::PlotSize => "plot_size",
            Self::BuildingType => "building_type",
            Self::OceanCategory => "ocean_category",
            Self::BayCategory => "bay_category",
        }
    }

    /// The field's value on `plot`.
    pub fn resolve<'a>(&self, plot: &'a PlotMetadata) -> &'a str {
        match self {
            Self::Neighborhood => &plot.neighborhood,
            Self::Zoning => plot.zoning.as_str(),
            Self::PlotSize => plot.plot_size.as_str(),
            Self::BuildingType => plot.building_type.as_str(),
            Self::OceanCategory => plot.distances.ocean.category().as_str(),
            Self::BayCategory => plot.distances.bay.category().as_str(),
        }
    }
}

/// A numeric metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    OceanMeters,
    BayMeters,
    FloorsMin,
    FloorsMax,
    HeightMin,
    HeightMax,
    Rank,
    PlotArea,
}

impl NumericField {
    /// Dotted path in the metadata document.
    pub fn path(&self) -> &'static str {
        match self {
            Self::OceanMeters => "distances.ocean.meters",
            Self::BayMeters => "distances.bay.meters",
            Self::FloorsMin => "building.floors.min",
            Self::FloorsMax => "building.floors.max",
            Self::HeightMin => "building.height.min",
            Self::HeightMax => "building.height.max",
            Self::Rank => "rarity.rank",
            Self::PlotArea => "plotArea",
        }
    }

    /// Flattened column name used by tabular stores.
    pub fn column(&self) -> &'static str {
        match self {
            Self::OceanMeters => "ocean_meters",
            Self::BayMeters => "bay_meters",
            Self::FloorsMin => "floors_min",
            Self::FloorsMax => "floors_max",
            Self::HeightMin => "height_min",
            Self::HeightMax => "height_max",
            Self::Rank => "rank",
            Self::PlotArea => "plot_area",
        }
    }

    /// The field's value on `plot`.
    pub fn resolve(&self, plot: &PlotMetadata) -> f64 {
        match self {
            Self::OceanMeters => plot.distances.ocean.meters(),
            Self::BayMeters => plot.distances.bay.meters(),
            Self::FloorsMin => f64::from(plot.building.floors.min),
            Self::FloorsMax => f64::from(plot.building.floors.max),
            Self::HeightMin => plot.building.height.min,
            Self::HeightMax => plot.building.height.max,
            Self::Rank => f64::from(plot.rarity.rank()),
            Self::PlotArea => plot.plot_area,
        }
    }
}

/// One atomic condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Constraint {
    /// Field value is one of `values`.
    OneOf { field: TextField, values: Vec<String> },
    /// Field value equals `value`.
    Equals { field: TextField, value: String },
    /// Field value `<= bound`.
    AtMost { field: NumericField, bound: f64 },
    /// Field value `>= bound`.
    AtLeast { field: NumericField, bound: f64 },
}

impl Constraint {
    /// Evaluate against a record's metadata.
    pub fn matches(&self, plot: &PlotMetadata) -> bool {
        match self {
            Self::OneOf { field, values } => {
                let actual = field.resolve(plot);
                values.iter().any(|v| v == actual)
            }
            Self::Equals { field, value } => field.resolve(plot) == value,
            Self::AtMost { field, bound } => field.resolve(plot) <= *bound,
            Self::AtLeast { field, bound } => field.resolve(plot) >= *bound,
        }
    }

    /// Render as a SQL boolean expression over flattened columns.
    pub fn to_sql(&self) -> String {
        match self {
            Self::OneOf { field, values } => {
                let list = values
                    .iter()
                    .map(|v| quote(v))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} IN ({list})", field.column())
            }
            Self::Equals { field, value } => format!("{} = {}", field.column(), quote(value)),
            Self::AtMost { field, bound } => format!("{} <= {bound}", field.column()),
            Self::AtLeast { field, bound } => format!("{} >= {bound}", field.column()),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OneOf { field, values } => {
                write!(f, "{} in [{}]", field.path(), values.join(", "))
            }
            Self::Equals { field, value } => write!(f, "{} = {value}", field.path()),
            Self::AtMost { field, bound } => write!(f, "{} <= {bound}", field.path()),
            Self::AtLeast { field, bound } => write!(f, "{} >= {bound}", field.path()),
        }
    }
}

/// Conjunction of constraints. An empty predicate matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    constraints: Vec<Constraint>,
}

impl Predicate {
    /// The predicate that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add a constraint.
    pub fn and(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Add a constraint in place.
    pub fn push(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// The constraints, in the order they were added.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Whether there are no constraints.
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Whether `plot` satisfies every constraint.
    pub fn matches(&self, plot: &PlotMetadata) -> bool {
        self.constraints.iter().all(|c| c.matches(plot))
    }

    /// Render as a SQL `WHERE` body, or `None` when unconstrained.
    pub fn to_sql(&self) -> Option<String> {
        if self.constraints.is_empty() {
            return None;
        }
        Some(
            self.constraints
                .iter()
                .map(Constraint::to_sql)
                .collect::<Vec<_>>()
                .join(" AND "),
        )
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraints.is_empty() {
            return f.write_str("(all)");
        }
        for (i, c) in self.constraints.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

/// Quote a string literal for SQL.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
