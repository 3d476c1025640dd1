//! Command-line interface for landmem.
//!
//! # Key Abstractions
//!
//! - [`LandmemCli`]: loads configuration, builds the plot memory, and
//!   dispatches commands
//! - [`LandmemConfig`]: TOML/env configuration via `confyg`

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod handlers;
pub mod output;

pub use app::LandmemCli;
pub use cli::CliArgs;
pub use config::LandmemConfig;
