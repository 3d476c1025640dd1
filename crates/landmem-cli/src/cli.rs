//! CLI argument parsing and command definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use landmem_core::{BuildingType, DistanceCategory, PlotSize, SearchFilter, ZoningType};

// ============================================================================
// CLI argument types
// ============================================================================

/// Land plot memory: metadata filtering and similarity search.
#[derive(Parser, Debug)]
#[command(name = "landmem", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "LANDMEM_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create plot records from a CSV export.
    Ingest {
        /// CSV file to read.
        path: PathBuf,
    },

    /// Search plots by text, optionally narrowed by metadata.
    Search(SearchArgs),

    /// List plots ranked within an inclusive range.
    Rarity {
        /// Lowest rank.
        min: u32,

        /// Highest rank.
        max: u32,

        /// Maximum number of plots.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show one plot by id.
    Show {
        /// Record id.
        id: String,

        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Show collection statistics.
    Stats {
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Arguments of `landmem search`.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text query.
    pub query: String,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// JSON file holding a search filter; flags override its fields.
    #[arg(long)]
    pub filter_json: Option<PathBuf>,

    /// Minimum similarity (defaults to search.similarity_threshold).
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Maximum number of results (defaults to search.match_count).
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Order of filtered results: filter or similarity.
    #[arg(long)]
    pub ordering: Option<String>,

    /// Print JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

/// Metadata filter flags.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    /// Neighborhood (repeatable).
    #[arg(long = "neighborhood")]
    pub neighborhoods: Vec<String>,

    /// Zoning type (repeatable or comma separated).
    #[arg(long, value_delimiter = ',')]
    pub zoning: Vec<ZoningType>,

    /// Plot size (repeatable or comma separated).
    #[arg(long = "plot-size", value_delimiter = ',')]
    pub plot_sizes: Vec<PlotSize>,

    /// Building type (repeatable or comma separated).
    #[arg(long = "building-type", value_delimiter = ',')]
    pub building_types: Vec<BuildingType>,

    #[arg(long)]
    pub max_ocean_meters: Option<f64>,

    #[arg(long)]
    pub ocean_category: Option<DistanceCategory>,

    #[arg(long)]
    pub max_bay_meters: Option<f64>,

    #[arg(long)]
    pub bay_category: Option<DistanceCategory>,

    #[arg(long)]
    pub min_floors: Option<u32>,

    #[arg(long)]
    pub max_floors: Option<u32>,

    #[arg(long)]
    pub min_height: Option<f64>,

    #[arg(long)]
    pub max_height: Option<f64>,

    #[arg(long)]
    pub min_rank: Option<u32>,

    #[arg(long)]
    pub max_rank: Option<u32>,

    #[arg(long)]
    pub min_plot_area: Option<f64>,

    #[arg(long)]
    pub max_plot_area: Option<f64>,
}

impl FilterArgs {
    /// Overlay the flags that were given onto `base`.
    pub fn apply(&self, mut filter: SearchFilter) -> SearchFilter {
        if !self.neighborhoods.is_empty() {
            filter = filter.with_neighborhoods(self.neighborhoods.iter().cloned());
        }
        if !self.zoning.is_empty() {
            filter = filter.with_zoning_types(self.zoning.iter().copied());
        }
        if !self.plot_sizes.is_empty() {
            filter = filter.with_plot_sizes(self.plot_sizes.iter().copied());
        }
        if !self.building_types.is_empty() {
            filter = filter.with_building_types(self.building_types.iter().copied());
        }
        if let Some(meters) = self.max_ocean_meters {
            filter = filter.with_max_ocean_meters(meters);
        }
        if let Some(category) = self.ocean_category {
            filter = filter.with_ocean_category(category);
        }
        if let Some(meters) = self.max_bay_meters {
            filter = filter.with_max_bay_meters(meters);
        }
        if let Some(category) = self.bay_category {
            filter = filter.with_bay_category(category);
        }
        if let Some(floors) = self.min_floors {
            filter = filter.with_min_floors(floors);
        }
        if let Some(floors) = self.max_floors {
            filter = filter.with_max_floors(floors);
        }
        if let Some(height) = self.min_height {
            filter = filter.with_min_height(height);
        }
        if let Some(height) = self.max_height {
            filter = filter.with_max_height(height);
        }
        if let Some(rank) = self.min_rank {
            filter = filter.with_min_rank(rank);
        }
        if let Some(rank) = self.max_rank {
            filter = filter.with_max_rank(rank);
        }
        if let Some(area) = self.min_plot_area {
            filter = filter.with_min_plot_area(area);
        }
        if let Some(area) = self.max_plot_area {
            filter = filter.with_max_plot_area(area);
        }
        filter
    }
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "search.match_count").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "search.match_count").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================
