//! Closed enumerations of the plot schema.
//!
//! Each enumeration has one canonical spelling (used for serialization,
//! display, and store predicates). Parsing is case-insensitive and also
//! accepts the spellings used by earlier schema versions, which are mapped
//! onto the canonical variant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Upper bound (inclusive, meters) of the `Close` distance bucket.
pub const CLOSE_MAX_METERS: f64 = 300.0;

/// Upper bound (inclusive, meters) of the `Medium` distance bucket.
pub const MEDIUM_MAX_METERS: f64 = 700.0;

macro_rules! canonical_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $label:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $label $(, alias = $alias)*)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Canonical label.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let needle = s.trim();
                $(
                    if needle.eq_ignore_ascii_case($label)
                        || needle.eq_ignore_ascii_case(stringify!($variant))
                        $(|| needle.eq_ignore_ascii_case($alias))*
                    {
                        return Ok(Self::$variant);
                    }
                )+
                Err(Error::invalid_data(format!(
                    "Unknown {} '{}'. Expected one of: {}",
                    stringify!($name),
                    needle,
                    Self::ALL
                        .iter()
                        .map(|v| v.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                )))
            }
        }
    };
}

canonical_enum! {
    /// Land-use zoning of a plot.
    pub enum ZoningType {
        Residential => "Residential",
        Commercial => "Commercial",
        Industrial => "Industrial",
        Mixed => "Mixed" | "Mixed Use" | "MixedUse",
        Special => "Special",
        Legendary => "Legendary",
    }
}

canonical_enum! {
    /// Plot size class, smallest first.
    pub enum PlotSize {
        Nano => "Nano",
        Micro => "Micro",
        Small => "Small",
        Medium => "Medium" | "Mid",
        Large => "Large",
        Mega => "Mega" | "Mammoth",
        Giga => "Giga",
    }
}

canonical_enum! {
    /// Building class permitted on a plot, shortest first.
    pub enum BuildingType {
        LowRise => "LowRise" | "Lowrise",
        MidRise => "MidRise" | "Midrise",
        HighRise => "HighRise" | "Highrise",
        Skyscraper => "Skyscraper" | "Tall",
        Megascraper => "Megascraper" | "Megatall",
    }
}

canonical_enum! {
    /// Bucketed distance to a water body.
    pub enum DistanceCategory {
        Close => "Close",
        Medium => "Medium",
        Far => "Far",
    }
}

canonical_enum! {
    /// Bucketed rarity derived from a plot's rank.
    pub enum RarityCategory {
        UltraPremium => "Ultra Premium",
        Premium => "Premium",
        Standard => "Standard",
        Value => "Value",
        EntryLevel => "Entry Level",
    }
}

impl DistanceCategory {
    /// Bucket a distance in meters: `<= 300` Close, `<= 700` Medium, else Far.
    pub fn from_meters(meters: f64) -> Self {
        if meters <= CLOSE_MAX_METERS {
            Self::Close
        } else if meters <= MEDIUM_MAX_METERS {
            Self::Medium
        } else {
            Self::Far
        }
    }
}

impl RarityCategory {
    /// Bucket a rank: `<= 100`, `<= 500`, `<= 2000`, `<= 3000`, else Entry Level.
    pub fn from_rank(rank: u32) -> Self {
        match rank {
            0..=100 => Self::UltraPremium,
            101..=500 => Self::Premium,
            501..=2000 => Self::Standard,
            2001..=3000 => Self::Value,
            _ => Self::EntryLevel,
        }
    }
}
